//! Place component → write tag mapping
//!
//! The location hierarchy is split between IPTC (country code, sub-location)
//! and Photoshop XMP (country, state, city).

use crate::tags::{
    IPTC_GEO_COUNTRY_CODE_TAG, IPTC_GEO_LOCATION_TAG, PS_GEO_CITY_TAG, PS_GEO_COUNTRY_TAG,
    PS_GEO_STATE_TAG,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One slot of a reverse geocoding result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceComponent {
    CountryCode,
    Country,
    State,
    City,
    Location,
}

/// Generic component name, component, write tag
const MAPPING: [(&str, PlaceComponent, &str); 5] = [
    ("country_code", PlaceComponent::CountryCode, IPTC_GEO_COUNTRY_CODE_TAG),
    ("country", PlaceComponent::Country, PS_GEO_COUNTRY_TAG),
    ("state", PlaceComponent::State, PS_GEO_STATE_TAG),
    ("city", PlaceComponent::City, PS_GEO_CITY_TAG),
    ("location", PlaceComponent::Location, IPTC_GEO_LOCATION_TAG),
];

impl PlaceComponent {
    pub const ALL: [PlaceComponent; 5] = [
        PlaceComponent::CountryCode,
        PlaceComponent::Country,
        PlaceComponent::State,
        PlaceComponent::City,
        PlaceComponent::Location,
    ];

    /// Generic name (`"country_code"`, `"city"`, ...)
    pub fn name(self) -> &'static str {
        MAPPING
            .iter()
            .find(|(_, component, _)| *component == self)
            .map(|(name, _, _)| *name)
            .unwrap_or_default()
    }

    /// Tag this component is written to
    pub fn tag(self) -> &'static str {
        MAPPING
            .iter()
            .find(|(_, component, _)| *component == self)
            .map(|(_, _, tag)| *tag)
            .unwrap_or_default()
    }

    pub fn from_name(name: &str) -> Option<Self> {
        MAPPING
            .iter()
            .find(|(n, _, _)| *n == name)
            .map(|(_, component, _)| *component)
    }

    /// Component written to `tag`, if any
    pub fn from_tag(tag: &str) -> Option<Self> {
        MAPPING
            .iter()
            .find(|(_, _, t)| *t == tag)
            .map(|(_, component, _)| *component)
    }
}

impl fmt::Display for PlaceComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Write tag for a generic component name, `None` if unmapped
pub fn map_component(name: &str) -> Option<&'static str> {
    PlaceComponent::from_name(name).map(PlaceComponent::tag)
}

/// Every geo write tag
pub fn geo_tags() -> impl Iterator<Item = &'static str> {
    MAPPING.iter().map(|(_, _, tag)| *tag)
}
