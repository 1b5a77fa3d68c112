//! Geographic primitives for port resolution.
//!
//! This crate provides:
//! - A validated latitude/longitude [`Coordinate`]
//! - Haversine great-circle distance
//! - Extraction of coordinate pairs from free text ("19.64, -155.99",
//!   "21.3 N 157.9 W")
//!
//! # Example
//!
//! ```
//! use portmatch_geo::{find_coordinates, haversine_distance, Coordinate};
//!
//! let juneau = Coordinate::new(58.3005, -134.4201);
//! let found = find_coordinates("Anchored at 57.0531, -135.3300").unwrap();
//!
//! let distance_km = haversine_distance(&juneau, &found.coordinate);
//! assert!((distance_km - 150.0).abs() < 20.0);
//! ```

mod error;
mod haversine;
mod parse;

pub use error::{GeoError, Result};
pub use haversine::{haversine_distance, EARTH_RADIUS_KM};
pub use parse::{find_coordinates, parse_coordinates, FoundCoordinates};

/// A geographic coordinate with latitude and longitude.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees (-90 to 90)
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180)
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate without validation.
    #[inline]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Creates a coordinate, rejecting non-finite or out-of-range values.
    pub fn validated(latitude: f64, longitude: f64) -> Result<Self> {
        let coord = Self::new(latitude, longitude);
        if coord.is_valid() {
            Ok(coord)
        } else {
            Err(GeoError::InvalidCoordinate(format!(
                "latitude {latitude} / longitude {longitude} outside [-90,90] / [-180,180]"
            )))
        }
    }

    /// Returns true if both values are finite and within range.
    #[inline]
    pub fn is_valid(&self) -> bool {
        is_valid_lat_lng(self.latitude, self.longitude)
    }

    /// Converts degrees to radians for internal calculations.
    #[inline]
    pub(crate) fn to_radians(self) -> (f64, f64) {
        (self.latitude.to_radians(), self.longitude.to_radians())
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self::new(lat, lng)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Range and finiteness check shared with entry validation elsewhere.
#[inline]
pub fn is_valid_lat_lng(lat: f64, lng: f64) -> bool {
    lat.is_finite()
        && lng.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lng)
}
