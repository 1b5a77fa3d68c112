//! Error types for the geo crate.

use thiserror::Error;

/// Result type alias for geo operations.
pub type Result<T> = std::result::Result<T, GeoError>;

/// Errors that can occur during geo operations.
#[derive(Debug, Error, PartialEq)]
pub enum GeoError {
    /// Latitude/longitude out of range or not finite
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    /// Text did not contain a recognizable coordinate pair
    #[error("Could not parse coordinates from {0:?}")]
    Parse(String),
}
