//! Shared fixtures for photokw-tagger integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use photokw_common::config::TomlConfig;
use photokw_tagger::geocode::{GeocodeError, Geocoder, PlaceComponents};
use photokw_tagger::metadata::gps::Coordinates;
use photokw_tagger::tags::{
    acdsee_region_entry, TagMap, TagValue, ACDSEE_KEYWORDS_TAG, EXIF_GPS_LATITUDE_TAG,
    EXIF_GPS_LONGITUDE_TAG,
};
use photokw_tagger::{Overrides, Settings};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Builder for a file's tags
#[derive(Debug, Default, Clone)]
pub struct TagsBuilder {
    tags: TagMap,
    faces: usize,
}

impl TagsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keywords(mut self, keywords: &[&str]) -> Self {
        self.tags.insert(ACDSEE_KEYWORDS_TAG.to_string(), list(keywords));
        self
    }

    pub fn face(mut self, name: &str) -> Self {
        self.faces += 1;
        self.tags
            .insert(acdsee_region_entry(self.faces, "Type"), "Face".into());
        self.tags
            .insert(acdsee_region_entry(self.faces, "Name"), name.into());
        self
    }

    /// Ottawa, Parliament Hill
    pub fn ottawa_gps(self) -> Self {
        self.gps("45,25.4400N", "75,42.0600W")
    }

    pub fn gps(mut self, lat: &str, lon: &str) -> Self {
        self.tags.insert(EXIF_GPS_LATITUDE_TAG.to_string(), lat.into());
        self.tags.insert(EXIF_GPS_LONGITUDE_TAG.to_string(), lon.into());
        self
    }

    pub fn tag(mut self, key: &str, value: TagValue) -> Self {
        self.tags.insert(key.to_string(), value);
        self
    }

    pub fn build(self) -> TagMap {
        self.tags
    }
}

pub fn list(items: &[&str]) -> TagValue {
    TagValue::List(items.iter().map(|s| s.to_string()).collect())
}

pub fn settings(config: TomlConfig) -> Settings {
    Settings::resolve(config, None, Overrides::default()).unwrap()
}

pub fn ottawa() -> PlaceComponents {
    PlaceComponents {
        country_code: Some("CA".to_string()),
        country: Some("Canada".to_string()),
        state: Some("Ontario".to_string()),
        city: Some("Ottawa".to_string()),
        location: None,
    }
}

/// Geocoder returning a fixed result (or failing) and counting calls
pub struct StubGeocoder {
    result: Option<PlaceComponents>,
    calls: Arc<AtomicUsize>,
}

impl StubGeocoder {
    pub fn returning(place: PlaceComponents) -> Self {
        Self {
            result: Some(place),
            calls: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            result: None,
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn reverse(&self, coordinates: Coordinates) -> Result<PlaceComponents, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result
            .clone()
            .ok_or(GeocodeError::NoResult(coordinates))
    }
}
