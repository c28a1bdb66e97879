//! Metadata record for one file
//!
//! A [`MetadataRecord`] reads every tag of a file once, derives the keyword,
//! people, subject, event and place views from them, and stages new values in
//! a `pending` snapshot. The `original` snapshot holds the tracked tags as
//! read; a write is needed iff the two differ.
//!
//! # Lifecycle
//! 1. [`MetadataRecord::open`] reads the tags and resolves face regions
//! 2. [`MetadataRecord::fix_up`] and [`MetadataRecord::fix_up_geo`] stage
//!    changes, in any order or not at all
//! 3. [`MetadataRecord::write_changes`] writes `pending` one namespace at a
//!    time and makes it the new `original`
//! 4. [`MetadataRecord::close`] (or drop) releases the tag store

pub mod gps;

use crate::config::Settings;
use crate::error::TaggerResult;
use crate::geocode::mapper::geo_tags;
use crate::geocode::{Geocoder, PlaceComponent, PlaceComponents};
use crate::tags::{
    acdsee_region_entry, partition, Namespace, Snapshot, StoreProvider, TagMap, TagStore,
    TagValue, ACDSEE_KEYWORDS_TAG, DC_SUBJECT_TAG, EXIF_GPS_LATITUDE_TAG,
    EXIF_GPS_LONGITUDE_TAG, EXIF_MAKE_TAG, EXIF_MODEL_TAG, IPTCEXT_EVENT_TAG,
    IPTCEXT_PERSON_TAG, LR_SUBJECT_TAG, XMP_CREATOR_TOOL_TAG,
};
use gps::{unpack_gps, Coordinates};
use photokw_common::keywords::{remove_duplicates, PersonEntry, ResolverSession};
use photokw_common::KeywordPath;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Tags diffed between `original` and `pending`
const TRACKED_TAGS: [&str; 4] = [LR_SUBJECT_TAG, DC_SUBJECT_TAG, IPTCEXT_PERSON_TAG, IPTCEXT_EVENT_TAG];

/// Outcome of the last [`MetadataRecord::fix_up_geo`]
#[derive(Debug, Clone, PartialEq, Default)]
pub enum GeoStatus {
    #[default]
    NotAttempted,
    /// No GPS tags on the file
    NoCoordinates,
    /// Coordinates present but not resolved; geo tags left untouched
    Unresolved(String),
    Resolved(PlaceComponents),
}

pub struct MetadataRecord<'a> {
    path: PathBuf,
    settings: &'a Settings,
    store: Box<dyn TagStore>,
    data: TagMap,
    faces: Vec<PersonEntry>,
    unknowns: Vec<String>,
    original: Snapshot,
    pending: Snapshot,
    place_keyword: Option<KeywordPath>,
    geo_status: GeoStatus,
}

impl<'a> MetadataRecord<'a> {
    /// Open `path` through `provider` and read its tags
    pub fn open(
        path: &Path,
        provider: &dyn StoreProvider,
        settings: &'a Settings,
        session: &mut ResolverSession,
    ) -> TaggerResult<Self> {
        let store = provider.open(path)?;
        Self::from_store(path, store, settings, session)
    }

    /// Read every namespace of an already opened store
    pub fn from_store(
        path: &Path,
        mut store: Box<dyn TagStore>,
        settings: &'a Settings,
        session: &mut ResolverSession,
    ) -> TaggerResult<Self> {
        let mut data = TagMap::new();
        for namespace in Namespace::ALL {
            data.extend(store.read(namespace)?);
        }

        let original: Snapshot = tracked_tags()
            .filter_map(|key| data.get(key).map(|value| (key.to_string(), Some(value.clone()))))
            .collect();

        let mut record = Self {
            path: path.to_path_buf(),
            settings,
            store,
            data,
            faces: Vec::new(),
            unknowns: Vec::new(),
            pending: original.clone(),
            original,
            place_keyword: None,
            geo_status: GeoStatus::NotAttempted,
        };
        record.parse_regions(session);

        debug!(
            "Opened {}: {} tags, {} faces",
            record.path.display(),
            record.data.len(),
            record.faces.len()
        );
        Ok(record)
    }

    /// Resolve every face region, in region order
    fn parse_regions(&mut self, session: &mut ResolverSession) {
        let mut index = 1;
        while let Some(kind) = self.data.get(&acdsee_region_entry(index, "Type")) {
            let is_face = kind.as_text().is_some_and(|k| k.eq_ignore_ascii_case("face"));
            let name = self
                .data
                .get(&acdsee_region_entry(index, "Name"))
                .and_then(TagValue::as_text);

            if let (true, Some(name)) = (is_face, name) {
                match self.settings.people.person(name, session) {
                    Ok(entry) => {
                        if !entry.known && !self.unknowns.contains(&entry.name) {
                            self.unknowns.push(entry.name.clone());
                        }
                        self.faces.push(entry);
                    }
                    Err(e) => warn!("{}: skipping face '{}': {}", self.path.display(), name, e),
                }
            }
            index += 1;
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keywords written by the catalog; malformed entries are skipped
    fn source_keywords(&self) -> Vec<KeywordPath> {
        self.parse_keywords(self.data.get(ACDSEE_KEYWORDS_TAG))
    }

    fn parse_keywords(&self, value: Option<&TagValue>) -> Vec<KeywordPath> {
        value
            .map(TagValue::to_list)
            .unwrap_or_default()
            .iter()
            .filter_map(|keyword| match keyword.parse::<KeywordPath>() {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("{}: skipping keyword '{}': {}", self.path.display(), keyword, e);
                    None
                }
            })
            .collect()
    }

    /// Source keywords, face keywords and the place keyword, in that order
    fn candidate_keywords(&self) -> Vec<KeywordPath> {
        let mut keywords = self.source_keywords();
        keywords.extend(self.faces.iter().map(|face| face.path.clone()));
        keywords.extend(self.place_keyword.iter().cloned());
        keywords
    }

    /// People named by people keywords, then people found in face regions
    pub fn get_people(&self) -> Vec<String> {
        let people_prefix = &self.settings.config.people_prefix;
        let mut people: Vec<String> = self
            .source_keywords()
            .iter()
            .filter(|keyword| keyword.in_category(people_prefix))
            .map(|keyword| keyword.name().to_string())
            .collect();
        people.extend(self.faces.iter().map(|face| face.name.clone()));
        remove_duplicates(people)
    }

    /// Visible keywords: source, face and place keywords minus hidden ones
    pub fn get_keywords(&self) -> Vec<KeywordPath> {
        self.settings
            .exclusions
            .filter(remove_duplicates(self.candidate_keywords()))
    }

    /// Every keyword including hidden ones and anything already staged
    pub fn get_all_keywords(&self) -> Vec<KeywordPath> {
        let mut keywords = self.candidate_keywords();
        if let Some(Some(staged)) = self.pending.get(LR_SUBJECT_TAG) {
            keywords.extend(self.parse_keywords(Some(staged)));
        }
        remove_duplicates(keywords)
    }

    /// Leaf names of the visible keywords
    pub fn get_subjects(&self) -> Vec<String> {
        remove_duplicates(
            self.get_keywords()
                .iter()
                .map(|keyword| keyword.name().to_string())
                .collect(),
        )
    }

    /// Event string from the first event keyword
    ///
    /// The last `event_tag_count` topics below the event prefix are joined
    /// with the event separator; a count of 0 takes every topic.
    pub fn get_event(&self) -> Option<String> {
        let config = &self.settings.config;
        let keyword = self
            .source_keywords()
            .into_iter()
            .find(|keyword| keyword.in_category(&config.event_prefix))?;

        let topics = &keyword.topics()[1..];
        if topics.is_empty() {
            return None;
        }
        let count = match config.event_tag_count {
            0 => topics.len(),
            n => n.min(topics.len()),
        };
        Some(topics[topics.len() - count..].join(&config.event_separator))
    }

    pub fn get_creator(&self) -> String {
        self.data
            .get(XMP_CREATOR_TOOL_TAG)
            .and_then(TagValue::as_text)
            .unwrap_or("Unknown")
            .to_string()
    }

    pub fn get_make_model(&self) -> (Option<String>, Option<String>) {
        let text = |key: &str| {
            self.data
                .get(key)
                .and_then(TagValue::as_text)
                .map(|s| s.trim().to_string())
        };
        (text(EXIF_MAKE_TAG), text(EXIF_MODEL_TAG))
    }

    /// Place currently stored in the geo tags
    pub fn get_place(&self) -> PlaceComponents {
        let mut place = PlaceComponents::default();
        for (tag, value) in &self.data {
            if let (Some(component), Some(text)) = (PlaceComponent::from_tag(tag), value.as_text()) {
                if !text.is_empty() {
                    place.set(component, Some(text.to_string()));
                }
            }
        }
        place
    }

    /// Decimal coordinates, `None` unless both axes are present
    pub fn get_geo_coordinates(&self) -> TaggerResult<Option<Coordinates>> {
        let axis = |key: &str| self.data.get(key).and_then(TagValue::as_text);
        match (axis(EXIF_GPS_LATITUDE_TAG), axis(EXIF_GPS_LONGITUDE_TAG)) {
            (Some(lat), Some(lon)) => Ok(Some(Coordinates::new(unpack_gps(lat)?, unpack_gps(lon)?))),
            _ => Ok(None),
        }
    }

    /// Face names without a people mapping on this file
    pub fn unknown_people(&self) -> &[String] {
        &self.unknowns
    }

    pub fn faces(&self) -> &[PersonEntry] {
        &self.faces
    }

    pub fn place_keyword(&self) -> Option<&KeywordPath> {
        self.place_keyword.as_ref()
    }

    pub fn geo_status(&self) -> &GeoStatus {
        &self.geo_status
    }

    /// Tags of one namespace as read (or last written)
    pub fn tags(&self, namespace: Namespace) -> TagMap {
        self.data
            .iter()
            .filter(|(key, _)| Namespace::of(key) == Some(namespace))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    pub fn original(&self) -> &Snapshot {
        &self.original
    }

    pub fn pending(&self) -> &Snapshot {
        &self.pending
    }

    /// Stage a value; an empty value clears the tag
    ///
    /// Clearing only stages a removal when the tag was present originally.
    fn set_tag(&mut self, key: &str, value: Option<TagValue>) {
        match value.filter(|v| !v.is_empty()) {
            Some(value) => {
                self.pending.insert(key.to_string(), Some(value));
            }
            None if self.original.contains_key(key) => {
                if self.settings.verbose > 0 {
                    debug!("{}: removing {}", self.path.display(), key);
                }
                self.pending.insert(key.to_string(), None);
            }
            None => {
                self.pending.remove(key);
            }
        }
    }

    pub fn set_event(&mut self, event: Option<String>) {
        self.set_tag(IPTCEXT_EVENT_TAG, event.map(TagValue::Text));
    }

    pub fn set_keywords(&mut self, keywords: &[KeywordPath]) {
        let list: Vec<String> = keywords.iter().map(ToString::to_string).collect();
        self.set_tag(LR_SUBJECT_TAG, Some(TagValue::List(list)));
    }

    pub fn set_subjects(&mut self, subjects: &[String]) {
        self.set_tag(DC_SUBJECT_TAG, Some(TagValue::List(subjects.to_vec())));
    }

    pub fn set_people(&mut self, people: &[String]) {
        self.set_tag(IPTCEXT_PERSON_TAG, Some(TagValue::List(people.to_vec())));
    }

    /// Stage a new camera make and model
    pub fn set_make_model(&mut self, make: &str, model: &str) {
        self.set_tag(EXIF_MAKE_TAG, Some(TagValue::from(make)));
        self.set_tag(EXIF_MODEL_TAG, Some(TagValue::from(model)));
    }

    /// Recompute event, keywords, subjects and people from the source tags
    pub fn fix_up(&mut self) {
        let event = self.get_event();
        self.set_event(event);
        let keywords = self.get_keywords();
        self.set_keywords(&keywords);
        let subjects = self.get_subjects();
        self.set_subjects(&subjects);
        let people = self.get_people();
        self.set_people(&people);
    }

    /// Reverse geocode the GPS position into the location tags and a
    /// Places keyword
    ///
    /// Missing coordinates and geocoder failures leave every geo tag as is.
    pub async fn fix_up_geo(&mut self, geocoder: &dyn Geocoder) -> &GeoStatus {
        let coordinates = match self.get_geo_coordinates() {
            Ok(Some(coordinates)) => coordinates,
            Ok(None) => {
                info!("{}: no GPS coordinates", self.path.display());
                self.geo_status = GeoStatus::NoCoordinates;
                return &self.geo_status;
            }
            Err(e) => {
                warn!("{}: {}", self.path.display(), e);
                self.geo_status = GeoStatus::Unresolved(e.to_string());
                return &self.geo_status;
            }
        };

        let place = match geocoder.reverse(coordinates).await {
            Ok(place) => place,
            Err(e) => {
                warn!("{}: couldn't resolve {}: {}", self.path.display(), coordinates, e);
                self.geo_status = GeoStatus::Unresolved(e.to_string());
                return &self.geo_status;
            }
        };

        self.apply_place(&place);
        self.geo_status = GeoStatus::Resolved(place);
        &self.geo_status
    }

    fn apply_place(&mut self, place: &PlaceComponents) {
        for component in PlaceComponent::ALL {
            let tag = component.tag();
            match place.get(component) {
                Some(value) => {
                    self.pending.insert(tag.to_string(), Some(TagValue::from(value)));
                }
                // absent or empty tags stay as they are
                None => {
                    let present = matches!(self.original.get(tag), Some(Some(v)) if !v.is_empty());
                    if present {
                        self.pending.insert(tag.to_string(), None);
                    }
                }
            }
        }

        self.place_keyword = self.places_keyword(place);
        if let Some(keyword) = &self.place_keyword {
            debug!("{}: place keyword {}", self.path.display(), keyword);
        }
        let keywords = self.get_keywords();
        self.set_keywords(&keywords);
        let subjects = self.get_subjects();
        self.set_subjects(&subjects);
    }

    /// `<places prefix>|country|state|city[|location]` from the resolved slots
    fn places_keyword(&self, place: &PlaceComponents) -> Option<KeywordPath> {
        let config = &self.settings.config;
        let mut components = vec![PlaceComponent::Country, PlaceComponent::State, PlaceComponent::City];
        if config.keywords_location_included {
            components.push(PlaceComponent::Location);
        }

        let topics: Vec<&str> = components
            .into_iter()
            .filter_map(|component| place.get(component))
            .filter(|topic| !topic.is_empty())
            .collect();
        if topics.is_empty() {
            return None;
        }

        let mut path = vec![config.places_prefix.as_str()];
        path.extend(topics);
        match KeywordPath::new(path) {
            Ok(keyword) => Some(keyword),
            Err(e) => {
                warn!("{}: unusable place name: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Structural difference between `original` and `pending`
    pub fn needs_update(&self) -> bool {
        self.original != self.pending
    }

    /// Staged entries that differ from `original`
    pub fn changes(&self) -> Snapshot {
        let mut changes: Snapshot = self
            .pending
            .iter()
            .filter(|(key, value)| self.original.get(*key) != Some(*value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        for key in self.original.keys() {
            if !self.pending.contains_key(key) {
                changes.insert(key.clone(), None);
            }
        }
        changes
    }

    /// Write `pending` when it differs from `original` (or when forced)
    ///
    /// Returns whether anything was written. A dry run logs the changes and
    /// writes nothing.
    pub fn write_changes(&mut self, force: bool, dry_run: bool) -> TaggerResult<bool> {
        if !force && !self.needs_update() {
            debug!("{}: up to date", self.path.display());
            return Ok(false);
        }

        if dry_run {
            for (key, value) in self.changes() {
                match value {
                    Some(value) => info!("{}: would set {} = {:?}", self.path.display(), key, value),
                    None => info!("{}: would remove {}", self.path.display(), key),
                }
            }
            return Ok(false);
        }

        let mut staged = self.pending.clone();
        for key in self.original.keys() {
            staged.entry(key.clone()).or_insert(None);
        }

        for (namespace, tags) in partition(&staged) {
            debug!("{}: writing {} {} tags", self.path.display(), tags.len(), namespace);
            self.store.write(namespace, &tags)?;
        }

        for (key, value) in &staged {
            match value {
                Some(value) => {
                    self.data.insert(key.clone(), value.clone());
                }
                None => {
                    self.data.remove(key);
                }
            }
        }
        self.original = staged
            .into_iter()
            .filter_map(|(key, value)| value.map(|value| (key, Some(value))))
            .collect();
        self.pending = self.original.clone();

        info!("{}: updated", self.path.display());
        Ok(true)
    }

    /// Release the tag store
    pub fn close(self) {
        debug!("Closed {}", self.path.display());
    }
}

fn tracked_tags() -> impl Iterator<Item = &'static str> {
    TRACKED_TAGS
        .into_iter()
        .chain(geo_tags())
}
