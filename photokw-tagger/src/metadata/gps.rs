//! GPS tag parsing
//!
//! XMP stores coordinates as `"<degrees>,<minutes><hemisphere>"`, for example
//! `"43,30.5N"`. A third seconds part (`"43,30,15N"`) is accepted as well.

use crate::error::{TaggerError, TaggerResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mean earth radius in metres
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Decimal degrees; south and west are negative
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance in metres (haversine)
    pub fn distance_to(&self, other: &Coordinates) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().asin()
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.latitude, self.longitude)
    }
}

/// Convert a sexagesimal GPS string to decimal degrees
///
/// `"43,30S"` → `-43.5`. The hemisphere letter is optional; `S` and `W`
/// negate the result.
pub fn unpack_gps(gps: &str) -> TaggerResult<f64> {
    let trimmed = gps.trim();
    let (body, sign) = match trimmed.chars().last() {
        Some('S') | Some('W') => (&trimmed[..trimmed.len() - 1], -1.0),
        Some('N') | Some('E') => (&trimmed[..trimmed.len() - 1], 1.0),
        _ => (trimmed, 1.0),
    };

    let parts: Vec<f64> = body
        .trim()
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|_| TaggerError::Gps(gps.to_string()))?;

    let degrees = match parts.as_slice() {
        [degrees, minutes] => degrees + minutes / 60.0,
        [degrees, minutes, seconds] => degrees + minutes / 60.0 + seconds / 3600.0,
        _ => return Err(TaggerError::Gps(gps.to_string())),
    };

    Ok(sign * degrees)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_hemispheres() {
        assert!(close(unpack_gps("43,30S").unwrap(), -43.5));
        assert!(close(unpack_gps("43,30N").unwrap(), 43.5));
        assert!(close(unpack_gps("75,42W").unwrap(), -75.7));
        assert!(close(unpack_gps("75,42E").unwrap(), 75.7));
    }

    #[test]
    fn test_exiftool_formatting() {
        assert!(close(unpack_gps("45,25.20000000 N").unwrap(), 45.42));
        assert!(close(unpack_gps("10,0,36S").unwrap(), -10.01));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(unpack_gps("").is_err());
        assert!(unpack_gps("43N").is_err());
        assert!(unpack_gps("north,south").is_err());
        assert!(unpack_gps("1,2,3,4E").is_err());
    }

    #[test]
    fn test_distance() {
        let ottawa = Coordinates::new(45.4215, -75.6972);
        assert!(close(ottawa.distance_to(&ottawa), 0.0));

        // One minute of latitude is about one nautical mile
        let north = Coordinates::new(45.4215 + 1.0 / 60.0, -75.6972);
        let d = ottawa.distance_to(&north);
        assert!((d - 1853.0).abs() < 5.0, "distance {}", d);
    }
}
