//! Core utilities shared by the portmatch crates
//!
//! This crate provides the plumbing the port resolver builds on:
//!
//! - **Error handling**: coded errors with context and recovery suggestions
//! - **Configuration**: TOML-based settings with defaults and validation
//! - **Storage**: async key-value store seam with memory and file backends
//! - **Clock**: injectable epoch-millisecond time source
//! - **Retry**: backoff policy and circuit breaker for remote calls
//!
//! # Example
//!
//! ```rust,no_run
//! use portmatch_core::config::Config;
//! use portmatch_core::storage::FileStore;
//!
//! let config = Config::load(None).expect("invalid configuration");
//! let store = match &config.schema.cache.storage_dir {
//!     Some(dir) => FileStore::open(dir),
//!     None => FileStore::open_default(),
//! }
//! .expect("storage directory not writable");
//! println!("Caching ports under {}", store.dir().display());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod clock;
pub mod config;
pub mod error;
pub mod retry;
pub mod storage;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::config::{Config, ConfigSchema};
    pub use crate::error::{Error, ErrorCode, Result, ResultExt};
    pub use crate::retry::{CircuitBreaker, CircuitBreakerConfig, CircuitState, RetryConfig};
    pub use crate::storage::{FileStore, KeyValueStore, MemoryStore};
}
