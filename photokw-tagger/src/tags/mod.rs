//! Tag model
//!
//! Tags are addressed by fully-qualified exiv2-style keys. The key prefix
//! names the namespace the tag is read from and written to:
//!
//! | prefix  | namespace |
//! |---------|-----------|
//! | `Exif.` | EXIF      |
//! | `Xmp.`  | XMP       |
//! | `Iptc.` | IPTC      |
//!
//! The location hierarchy is split between IPTC and Photoshop XMP tags;
//! writing it through a single namespace does not update correctly.

pub mod exiftool;
pub mod store;

pub use exiftool::{ExifTool, ExifToolStore};
pub use store::{MemoryLibrary, MemoryStore, StoreProvider, TagStore};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Source keyword list written by the catalog
pub const ACDSEE_KEYWORDS_TAG: &str = "Xmp.acdsee.keywords";
pub const DC_SUBJECT_TAG: &str = "Xmp.dc.subject";
pub const EXIF_GPS_LATITUDE_TAG: &str = "Xmp.exif.GPSLatitude";
pub const EXIF_GPS_LONGITUDE_TAG: &str = "Xmp.exif.GPSLongitude";
pub const EXIF_MAKE_TAG: &str = "Exif.Image.Make";
pub const EXIF_MODEL_TAG: &str = "Exif.Image.Model";
pub const IPTCEXT_EVENT_TAG: &str = "Xmp.iptcExt.Event";
pub const IPTCEXT_PERSON_TAG: &str = "Xmp.iptcExt.PersonInImage";
pub const IPTC_GEO_COUNTRY_CODE_TAG: &str = "Iptc.Application2.CountryCode";
pub const IPTC_GEO_LOCATION_TAG: &str = "Iptc.Application2.SubLocation";
pub const LR_SUBJECT_TAG: &str = "Xmp.lr.hierarchicalSubject";
pub const PS_GEO_CITY_TAG: &str = "Xmp.photoshop.City";
pub const PS_GEO_COUNTRY_TAG: &str = "Xmp.photoshop.Country";
pub const PS_GEO_STATE_TAG: &str = "Xmp.photoshop.State";
pub const XMP_CREATOR_TOOL_TAG: &str = "Xmp.xmp.CreatorTool";

/// Key of one field of the catalog's face region list (1-based index)
pub fn acdsee_region_entry(index: usize, field: &str) -> String {
    format!(
        "Xmp.acdsee-rs.Regions/acdsee-rs:RegionList[{}]/acdsee-rs:{}",
        index, field
    )
}

/// Tag value as stored in a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    Text(String),
    List(Vec<String>),
}

impl TagValue {
    /// Values as a list; a scalar becomes a one-element list
    pub fn to_list(&self) -> Vec<String> {
        match self {
            TagValue::Text(text) => vec![text.clone()],
            TagValue::List(items) => items.clone(),
        }
    }

    /// Scalar text; a list yields its first item
    pub fn as_text(&self) -> Option<&str> {
        match self {
            TagValue::Text(text) => Some(text),
            TagValue::List(items) => items.first().map(String::as_str),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            TagValue::Text(text) => text.is_empty(),
            TagValue::List(items) => items.is_empty(),
        }
    }
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        TagValue::Text(value.to_string())
    }
}

impl From<String> for TagValue {
    fn from(value: String) -> Self {
        TagValue::Text(value)
    }
}

impl From<Vec<String>> for TagValue {
    fn from(value: Vec<String>) -> Self {
        TagValue::List(value)
    }
}

/// Tags as read from a file
pub type TagMap = BTreeMap<String, TagValue>;

/// Tags to write; `None` removes the tag
pub type Snapshot = BTreeMap<String, Option<TagValue>>;

/// Tag group, selecting the read/write call of the tag store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Namespace {
    Exif,
    Xmp,
    Iptc,
}

impl Namespace {
    pub const ALL: [Namespace; 3] = [Namespace::Exif, Namespace::Xmp, Namespace::Iptc];

    /// Namespace of a fully-qualified key, `None` for unknown prefixes
    pub fn of(key: &str) -> Option<Self> {
        let (prefix, _) = key.split_once('.')?;
        match prefix {
            "Exif" => Some(Namespace::Exif),
            "Xmp" => Some(Namespace::Xmp),
            "Iptc" => Some(Namespace::Iptc),
            _ => None,
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            Namespace::Exif => "Exif",
            Namespace::Xmp => "Xmp",
            Namespace::Iptc => "Iptc",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Split a snapshot into one partial snapshot per namespace
///
/// Keys without a known namespace prefix are dropped.
pub fn partition(snapshot: &Snapshot) -> BTreeMap<Namespace, Snapshot> {
    let mut groups: BTreeMap<Namespace, Snapshot> = BTreeMap::new();
    for (key, value) in snapshot {
        match Namespace::of(key) {
            Some(namespace) => {
                groups
                    .entry(namespace)
                    .or_default()
                    .insert(key.clone(), value.clone());
            }
            None => tracing::warn!("Ignoring tag with unknown namespace: {}", key),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_from_key() {
        assert_eq!(Namespace::of(LR_SUBJECT_TAG), Some(Namespace::Xmp));
        assert_eq!(Namespace::of(EXIF_MAKE_TAG), Some(Namespace::Exif));
        assert_eq!(Namespace::of(IPTC_GEO_LOCATION_TAG), Some(Namespace::Iptc));
        assert_eq!(Namespace::of("Other.Tag"), None);
        assert_eq!(Namespace::of("NoDot"), None);
    }

    #[test]
    fn test_partition_spans_namespaces() {
        let mut snapshot = Snapshot::new();
        snapshot.insert(PS_GEO_CITY_TAG.to_string(), Some("Ottawa".into()));
        snapshot.insert(IPTC_GEO_COUNTRY_CODE_TAG.to_string(), Some("CA".into()));
        snapshot.insert(IPTC_GEO_LOCATION_TAG.to_string(), None);
        snapshot.insert(EXIF_MODEL_TAG.to_string(), Some("X100F".into()));

        let groups = partition(&snapshot);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[&Namespace::Iptc].len(), 2);
        assert_eq!(groups[&Namespace::Iptc][IPTC_GEO_LOCATION_TAG], None);
        assert_eq!(groups[&Namespace::Xmp].len(), 1);
        assert_eq!(groups[&Namespace::Exif].len(), 1);
    }

    #[test]
    fn test_tag_value_views() {
        let list = TagValue::List(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(list.to_list(), vec!["a", "b"]);
        assert_eq!(list.as_text(), Some("a"));
        assert_eq!(TagValue::from("x").to_list(), vec!["x"]);
        assert!(TagValue::List(vec![]).is_empty());
        assert!(TagValue::from("").is_empty());
    }

    #[test]
    fn test_untagged_json() {
        let text: TagValue = serde_json::from_str("\"Ottawa\"").unwrap();
        assert_eq!(text, TagValue::from("Ottawa"));
        let list: TagValue = serde_json::from_str("[\"a\",\"b\"]").unwrap();
        assert_eq!(list, TagValue::List(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn test_region_entry_key() {
        assert_eq!(
            acdsee_region_entry(2, "Name"),
            "Xmp.acdsee-rs.Regions/acdsee-rs:RegionList[2]/acdsee-rs:Name"
        );
    }
}
