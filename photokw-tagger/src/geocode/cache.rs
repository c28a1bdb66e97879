//! Distance-coalescing geocode cache
//!
//! Photos of one outing cluster tightly. A lookup within `coalesce_m` metres
//! of a previously resolved point returns that point's result without calling
//! the backend. Failures are not cached. Once full, the oldest result is
//! dropped for each new one.

use super::{GeocodeError, Geocoder, PlaceComponents};
use crate::metadata::gps::Coordinates;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Results kept by [`CachingGeocoder::new`]
pub const DEFAULT_CAPACITY: usize = 1024;

pub struct CachingGeocoder<G> {
    inner: G,
    coalesce_m: f64,
    capacity: usize,
    entries: Mutex<VecDeque<(Coordinates, PlaceComponents)>>,
}

impl<G: Geocoder> CachingGeocoder<G> {
    pub fn new(inner: G, coalesce_m: f64) -> Self {
        Self::with_capacity(inner, coalesce_m, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(inner: G, coalesce_m: f64, capacity: usize) -> Self {
        Self {
            inner,
            coalesce_m,
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::new()),
        }
    }

    /// Cached result of the nearest point within the coalesce radius
    pub fn lookup(&self, coordinates: &Coordinates) -> Option<PlaceComponents> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .iter()
            .map(|(point, place)| (point.distance_to(coordinates), place))
            .filter(|(distance, _)| *distance <= self.coalesce_m)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, place)| place.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl<G: Geocoder> Geocoder for CachingGeocoder<G> {
    async fn reverse(&self, coordinates: Coordinates) -> Result<PlaceComponents, GeocodeError> {
        if let Some(place) = self.lookup(&coordinates) {
            debug!("Geocode cache hit for {}", coordinates);
            return Ok(place);
        }

        let place = self.inner.reverse(coordinates).await?;
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back((coordinates, place.clone()));
        Ok(place)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingGeocoder {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Geocoder for CountingGeocoder {
        async fn reverse(&self, coordinates: Coordinates) -> Result<PlaceComponents, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if coordinates.latitude > 80.0 {
                return Err(GeocodeError::NoResult(coordinates));
            }
            Ok(PlaceComponents {
                city: Some(format!("City {:.2}", coordinates.latitude)),
                ..Default::default()
            })
        }
    }

    fn cache(coalesce_m: f64) -> (CachingGeocoder<CountingGeocoder>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let inner = CountingGeocoder {
            calls: Arc::clone(&calls),
        };
        (CachingGeocoder::new(inner, coalesce_m), calls)
    }

    #[tokio::test]
    async fn test_nearby_point_reuses_result() {
        let (geocoder, calls) = cache(250.0);
        let first = geocoder.reverse(Coordinates::new(45.4215, -75.6972)).await.unwrap();
        // ~110m north
        let second = geocoder.reverse(Coordinates::new(45.4225, -75.6972)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(geocoder.len(), 1);
    }

    #[tokio::test]
    async fn test_distant_point_calls_backend() {
        let (geocoder, calls) = cache(250.0);
        geocoder.reverse(Coordinates::new(45.4215, -75.6972)).await.unwrap();
        geocoder.reverse(Coordinates::new(43.6532, -79.3832)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(geocoder.len(), 2);
    }

    #[tokio::test]
    async fn test_oldest_result_dropped_when_full() {
        let calls = Arc::new(AtomicUsize::new(0));
        let inner = CountingGeocoder {
            calls: Arc::clone(&calls),
        };
        let geocoder = CachingGeocoder::with_capacity(inner, 250.0, 2);
        let ottawa = Coordinates::new(45.4215, -75.6972);
        let toronto = Coordinates::new(43.6532, -79.3832);
        let montreal = Coordinates::new(45.5019, -73.5674);

        for point in [ottawa, toronto, montreal] {
            geocoder.reverse(point).await.unwrap();
        }
        assert_eq!(geocoder.len(), 2);
        assert!(geocoder.lookup(&ottawa).is_none());
        assert!(geocoder.lookup(&montreal).is_some());

        geocoder.reverse(ottawa).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert!(geocoder.lookup(&toronto).is_none());
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let (geocoder, calls) = cache(250.0);
        assert!(geocoder.reverse(Coordinates::new(85.0, 0.0)).await.is_err());
        assert!(geocoder.reverse(Coordinates::new(85.0, 0.0)).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(geocoder.is_empty());
    }
}
