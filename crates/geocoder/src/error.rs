//! Error types for the geocoder client

use portmatch_ports::PortsError;
use thiserror::Error;

/// Result type alias for geocoder operations
pub type GeocodeResult<T> = Result<T, GeocodeError>;

/// Geocoder client errors
#[derive(Error, Debug)]
pub enum GeocodeError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider returned an error response
    #[error("Geocoder error ({status}): {message}")]
    ApiResponse {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// Circuit breaker is open
    #[error("Circuit breaker is open - geocoder temporarily unavailable")]
    CircuitOpen,

    /// All retry attempts exhausted
    #[error("All {attempts} retry attempts failed: {last_error}")]
    RetriesExhausted {
        /// Number of attempts made
        attempts: u32,
        /// Last error message
        last_error: String,
    },

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl GeocodeError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an API response error
    pub fn api_response(status: u16, message: impl Into<String>) -> Self {
        Self::ApiResponse {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(e) => e.is_connect() || e.is_timeout(),
            // 5xx and 429 (Nominatim throttling)
            Self::ApiResponse { status, .. } => *status >= 500 || *status == 429,
            Self::CircuitOpen
            | Self::Config(_)
            | Self::Json(_)
            | Self::InvalidUrl(_)
            | Self::RetriesExhausted { .. } => false,
        }
    }
}

impl From<GeocodeError> for PortsError {
    fn from(err: GeocodeError) -> Self {
        PortsError::geocoder(err)
    }
}
