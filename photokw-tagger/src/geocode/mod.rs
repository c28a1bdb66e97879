//! Reverse geocoding
//!
//! A [`Geocoder`] turns coordinates into [`PlaceComponents`]. Backends:
//! - [`NullGeocoder`]: nothing configured, every lookup fails
//! - [`GoogleGeocoder`]: Google Maps reverse geocoding API
//!
//! [`CachingGeocoder`] wraps either and reuses results for nearby points.

pub mod cache;
pub mod google;
pub mod mapper;

pub use cache::CachingGeocoder;
pub use google::GoogleGeocoder;
pub use mapper::{map_component, PlaceComponent};

use crate::metadata::gps::Coordinates;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

/// Reverse geocoding failure
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("no geocode backend configured")]
    NotConfigured,

    #[error("request failed: {0}")]
    Request(String),

    #[error("service returned status {0}")]
    Status(String),

    #[error("no address found for {0}")]
    NoResult(Coordinates),

    #[error("unexpected response: {0}")]
    Parse(String),
}

/// Place record; any slot may be unresolved
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceComponents {
    pub country_code: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub location: Option<String>,
}

impl PlaceComponents {
    pub fn get(&self, component: PlaceComponent) -> Option<&str> {
        match component {
            PlaceComponent::CountryCode => self.country_code.as_deref(),
            PlaceComponent::Country => self.country.as_deref(),
            PlaceComponent::State => self.state.as_deref(),
            PlaceComponent::City => self.city.as_deref(),
            PlaceComponent::Location => self.location.as_deref(),
        }
    }

    pub fn set(&mut self, component: PlaceComponent, value: Option<String>) {
        let slot = match component {
            PlaceComponent::CountryCode => &mut self.country_code,
            PlaceComponent::Country => &mut self.country,
            PlaceComponent::State => &mut self.state,
            PlaceComponent::City => &mut self.city,
            PlaceComponent::Location => &mut self.location,
        };
        *slot = value;
    }

    pub fn is_empty(&self) -> bool {
        PlaceComponent::ALL.iter().all(|c| self.get(*c).is_none())
    }
}

/// Coordinates → place components
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn reverse(&self, coordinates: Coordinates) -> Result<PlaceComponents, GeocodeError>;
}

/// Backend used when geocoding is not configured
#[derive(Debug, Default, Clone, Copy)]
pub struct NullGeocoder;

#[async_trait]
impl Geocoder for NullGeocoder {
    async fn reverse(&self, _coordinates: Coordinates) -> Result<PlaceComponents, GeocodeError> {
        error!("No geocode backend configured");
        Err(GeocodeError::NotConfigured)
    }
}

/// Build the configured backend
///
/// Unknown backends and a Google backend without API key fall back to
/// [`NullGeocoder`].
pub fn from_settings(backend: &str, api_key: Option<&str>, coalesce_m: f64) -> Box<dyn Geocoder> {
    match backend.to_lowercase().as_str() {
        "google" => match api_key {
            Some(key) if !key.is_empty() => match GoogleGeocoder::new(key) {
                Ok(google) => {
                    info!("Using Google geocoder (coalesce {}m)", coalesce_m);
                    Box::new(CachingGeocoder::new(google, coalesce_m))
                }
                Err(e) => {
                    error!("Failed to create Google geocoder: {}", e);
                    Box::new(NullGeocoder)
                }
            },
            _ => {
                warn!("Google geocoder selected but no API key set");
                Box::new(NullGeocoder)
            }
        },
        "none" | "" => Box::new(NullGeocoder),
        other => {
            warn!("Unknown geocode backend '{}'", other);
            Box::new(NullGeocoder)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_geocoder_fails() {
        let result = NullGeocoder.reverse(Coordinates::new(45.0, -75.0)).await;
        assert!(matches!(result, Err(GeocodeError::NotConfigured)));
    }

    #[tokio::test]
    async fn test_from_settings_without_key_is_null() {
        let geocoder = from_settings("google", None, 250.0);
        let result = geocoder.reverse(Coordinates::new(45.0, -75.0)).await;
        assert!(matches!(result, Err(GeocodeError::NotConfigured)));
    }

    #[test]
    fn test_components_accessors() {
        let mut place = PlaceComponents::default();
        assert!(place.is_empty());
        place.set(PlaceComponent::City, Some("Ottawa".to_string()));
        assert_eq!(place.get(PlaceComponent::City), Some("Ottawa"));
        assert!(!place.is_empty());
    }
}
