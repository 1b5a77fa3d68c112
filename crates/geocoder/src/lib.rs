//! Online port lookup against a Nominatim-compatible search API
//!
//! This crate provides the resilient HTTP side of port resolution. It plugs
//! into [`portmatch_ports::PortResolver`] as a [`PortGeocoder`](portmatch_ports::PortGeocoder).
//!
//! # Features
//!
//! - **Environment-based configuration**: config section defaults with env overrides
//! - **Retry with exponential backoff**: Automatic retry for transient failures
//! - **Circuit breaker**: Stop calling a provider that keeps failing
//! - **Request correlation**: Track requests with unique IDs for debugging
//!
//! # Example
//!
//! ```rust,no_run
//! use portmatch_geocoder::NominatimClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = NominatimClient::new()?;
//!
//!     for port in client.search("Qaqortoq", 3).await? {
//!         println!("{} ({}, {})", port.name, port.lat, port.lng);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;

pub use client::{NominatimClient, NominatimPlace};
pub use config::{Environment, GeocoderConfig};
pub use error::{GeocodeError, GeocodeResult};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::client::NominatimClient;
    pub use crate::config::{Environment, GeocoderConfig};
    pub use crate::error::{GeocodeError, GeocodeResult};
}
