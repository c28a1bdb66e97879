//! Tag store seam
//!
//! The metadata record never talks to files directly. It reads and writes
//! whole namespaces through a [`TagStore`]; a [`StoreProvider`] opens one
//! store per file.

use super::{Namespace, Snapshot, TagMap};
use crate::error::{TaggerError, TaggerResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Per-file tag access, grouped by namespace
pub trait TagStore: Send {
    /// All tags of one namespace
    fn read(&mut self, namespace: Namespace) -> TaggerResult<TagMap>;

    /// Merge `tags` into the file; `None` values delete the tag
    ///
    /// Every key in `tags` belongs to `namespace`.
    fn write(&mut self, namespace: Namespace, tags: &Snapshot) -> TaggerResult<()>;
}

/// Opens a tag store for a file
pub trait StoreProvider: Send + Sync {
    fn open(&self, path: &Path) -> TaggerResult<Box<dyn TagStore>>;
}

/// In-memory tag store
///
/// Clones share the same tags, so a test can keep a handle and inspect what
/// the record wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tags: Arc<Mutex<TagMap>>,
    writes: Arc<Mutex<Vec<(Namespace, Snapshot)>>>,
}

impl MemoryStore {
    pub fn new(tags: TagMap) -> Self {
        Self {
            tags: Arc::new(Mutex::new(tags)),
            writes: Arc::default(),
        }
    }

    /// Current tags
    pub fn tags(&self) -> TagMap {
        self.tags.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Every write call received, in order
    pub fn writes(&self) -> Vec<(Namespace, Snapshot)> {
        self.writes.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl TagStore for MemoryStore {
    fn read(&mut self, namespace: Namespace) -> TaggerResult<TagMap> {
        let tags = self.tags.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(tags
            .iter()
            .filter(|(key, _)| Namespace::of(key) == Some(namespace))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }

    fn write(&mut self, namespace: Namespace, tags: &Snapshot) -> TaggerResult<()> {
        if let Some(key) = tags.keys().find(|k| Namespace::of(k) != Some(namespace)) {
            return Err(TaggerError::TagStore(format!(
                "{} is not a {} tag",
                key, namespace
            )));
        }

        let mut stored = self.tags.lock().unwrap_or_else(PoisonError::into_inner);
        for (key, value) in tags {
            match value {
                Some(value) => {
                    stored.insert(key.clone(), value.clone());
                }
                None => {
                    stored.remove(key);
                }
            }
        }
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((namespace, tags.clone()));
        Ok(())
    }
}

/// In-memory collection of files, each backed by a [`MemoryStore`]
#[derive(Debug, Clone, Default)]
pub struct MemoryLibrary {
    files: Arc<Mutex<HashMap<PathBuf, MemoryStore>>>,
}

impl MemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file and return a handle to its store
    pub fn insert(&self, path: impl Into<PathBuf>, tags: TagMap) -> MemoryStore {
        let store = MemoryStore::new(tags);
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into(), store.clone());
        store
    }

    pub fn get(&self, path: &Path) -> Option<MemoryStore> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
    }
}

impl StoreProvider for MemoryLibrary {
    fn open(&self, path: &Path) -> TaggerResult<Box<dyn TagStore>> {
        match self.get(path) {
            Some(store) => Ok(Box::new(store)),
            None => Err(TaggerError::TagStore(format!(
                "no tags for {}",
                path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::{TagValue, IPTC_GEO_LOCATION_TAG, LR_SUBJECT_TAG, PS_GEO_CITY_TAG};

    fn sample() -> TagMap {
        let mut tags = TagMap::new();
        tags.insert(LR_SUBJECT_TAG.to_string(), TagValue::List(vec!["A|B".to_string()]));
        tags.insert(IPTC_GEO_LOCATION_TAG.to_string(), "Main St".into());
        tags
    }

    #[test]
    fn test_read_is_scoped_by_namespace() {
        let mut store = MemoryStore::new(sample());
        let xmp = store.read(Namespace::Xmp).unwrap();
        assert_eq!(xmp.len(), 1);
        assert!(xmp.contains_key(LR_SUBJECT_TAG));
        assert!(store.read(Namespace::Exif).unwrap().is_empty());
    }

    #[test]
    fn test_write_merges_and_deletes() {
        let mut store = MemoryStore::new(sample());
        let handle = store.clone();

        let mut update = Snapshot::new();
        update.insert(IPTC_GEO_LOCATION_TAG.to_string(), None);
        store.write(Namespace::Iptc, &update).unwrap();

        let mut update = Snapshot::new();
        update.insert(PS_GEO_CITY_TAG.to_string(), Some("Ottawa".into()));
        store.write(Namespace::Xmp, &update).unwrap();

        let tags = handle.tags();
        assert!(!tags.contains_key(IPTC_GEO_LOCATION_TAG));
        assert_eq!(tags[PS_GEO_CITY_TAG], TagValue::from("Ottawa"));
        assert!(tags.contains_key(LR_SUBJECT_TAG));
        assert_eq!(handle.writes().len(), 2);
    }

    #[test]
    fn test_write_rejects_foreign_namespace() {
        let mut store = MemoryStore::default();
        let mut update = Snapshot::new();
        update.insert(PS_GEO_CITY_TAG.to_string(), Some("Ottawa".into()));
        assert!(store.write(Namespace::Iptc, &update).is_err());
    }

    #[test]
    fn test_library_open() {
        let library = MemoryLibrary::new();
        library.insert("/photos/a.jpg", sample());
        assert!(library.open(Path::new("/photos/a.jpg")).is_ok());
        assert!(library.open(Path::new("/photos/b.jpg")).is_err());
    }
}
