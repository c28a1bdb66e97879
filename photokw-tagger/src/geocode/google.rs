//! Google Maps reverse geocoding client
//!
//! API Documentation: https://developers.google.com/maps/documentation/geocoding/requests-reverse-geocoding

use super::{GeocodeError, Geocoder, PlaceComponent, PlaceComponents};
use crate::metadata::gps::Coordinates;
use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::{debug, info};

const BASE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Requests per second sent to the API
const REQUESTS_PER_SECOND: u32 = 10;

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    address_components: Vec<AddressComponent>,
}

#[derive(Debug, Deserialize)]
struct AddressComponent {
    long_name: String,
    short_name: String,
    #[serde(default)]
    types: Vec<String>,
}

/// Google address component type filling each place slot
const fn component_type(component: PlaceComponent) -> Option<&'static str> {
    match component {
        PlaceComponent::CountryCode => None,
        PlaceComponent::Country => Some("country"),
        PlaceComponent::State => Some("administrative_area_level_1"),
        PlaceComponent::City => Some("locality"),
        PlaceComponent::Location => Some("route"),
    }
}

/// Google reverse geocoder
pub struct GoogleGeocoder {
    client: Client,
    base_url: String,
    api_key: String,
    rate_limiter: RateLimiter<
        governor::state::direct::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl GoogleGeocoder {
    pub fn new(api_key: &str) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| GeocodeError::Request(e.to_string()))?;

        let quota = NonZeroU32::new(REQUESTS_PER_SECOND).unwrap_or(NonZeroU32::MIN);

        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
            api_key: api_key.to_string(),
            rate_limiter: RateLimiter::direct(Quota::per_second(quota)),
        })
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn reverse(&self, coordinates: Coordinates) -> Result<PlaceComponents, GeocodeError> {
        self.rate_limiter.until_ready().await;

        debug!("Querying Google geocoder: {}", coordinates);

        let latlng = coordinates.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("latlng", latlng.as_str()), ("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| GeocodeError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status.to_string()));
        }

        let body: GeocodeResponse = response
            .json()
            .await
            .map_err(|e| GeocodeError::Parse(e.to_string()))?;

        let place = decode_response(body, coordinates)?;
        info!("Geocoded {} to {:?}", coordinates, place);
        Ok(place)
    }
}

fn decode_response(
    body: GeocodeResponse,
    coordinates: Coordinates,
) -> Result<PlaceComponents, GeocodeError> {
    match body.status.as_str() {
        "OK" => {}
        "ZERO_RESULTS" => return Err(GeocodeError::NoResult(coordinates)),
        other => {
            return Err(GeocodeError::Status(match body.error_message {
                Some(message) => format!("{}: {}", other, message),
                None => other.to_string(),
            }))
        }
    }

    let first = body
        .results
        .into_iter()
        .next()
        .ok_or(GeocodeError::NoResult(coordinates))?;
    Ok(decode_address(&first.address_components))
}

fn decode_address(address: &[AddressComponent]) -> PlaceComponents {
    let find = |kind: &str| address.iter().find(|c| c.types.iter().any(|t| t == kind));

    let mut place = PlaceComponents {
        country_code: find("country").map(|c| c.short_name.clone()),
        ..Default::default()
    };
    for component in PlaceComponent::ALL {
        if let Some(kind) = component_type(component) {
            place.set(component, find(kind).map(|c| c.long_name.clone()));
        }
    }
    place
}
