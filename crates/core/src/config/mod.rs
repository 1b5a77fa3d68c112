//! Configuration loading and schema definitions
//!
//! TOML settings for the ports cache, the resolver policy and the online
//! geocoder, shared by the library crates and the `portmatch` binary.

mod loader;
mod schema;

pub use loader::Config;
pub use schema::*;
