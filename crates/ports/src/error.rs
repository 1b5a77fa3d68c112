//! Error types for the ports crate.

use thiserror::Error;

/// Result type alias for ports operations.
pub type Result<T> = std::result::Result<T, PortsError>;

/// Errors raised while loading datasets or talking to collaborators.
///
/// The cache and resolver surfaces never return these; they log and degrade.
#[derive(Debug, Error)]
pub enum PortsError {
    /// A dataset could not be read or was not a JSON array
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// An entry violates the name/coordinate invariants
    #[error("Invalid port entry: {0}")]
    InvalidEntry(String),

    /// The key-value store failed
    #[error("Storage error: {0}")]
    Storage(#[from] portmatch_core::Error),

    /// The online geocoder failed or returned garbage
    #[error("Geocoder error: {0}")]
    Geocoder(String),

    /// JSON (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PortsError {
    /// Build a geocoder error from any displayable failure.
    pub fn geocoder(err: impl std::fmt::Display) -> Self {
        PortsError::Geocoder(err.to_string())
    }
}
