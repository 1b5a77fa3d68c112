//! Port-name resolution with a bounded LRU/TTL cache.
//!
//! This crate provides:
//! - [`PortEntry`] and its provenance ([`PortSource`])
//! - [`DatasetIndex`]: bundled curated + master port lists with fuzzy search
//! - [`PortsCache`]: persistent, bounded, expiring cache of resolved ports
//! - [`PortResolver`]: coordinates → local → online resolution pipeline
//! - [`PortGeocoder`]: the seam for online providers
//!
//! # Example
//!
//! ```rust,no_run
//! use portmatch_core::storage::MemoryStore;
//! use portmatch_ports::{DatasetIndex, PortResolver, PortsCache};
//! use std::sync::Arc;
//!
//! # async fn run() -> portmatch_ports::Result<()> {
//! let dataset = Arc::new(DatasetIndex::builtin()?);
//! let cache = Arc::new(PortsCache::new(Arc::new(MemoryStore::new())));
//! let resolver = PortResolver::new(dataset, cache);
//!
//! let port = resolver.resolve_port_by_name("History of the Port of Juneau").await;
//! assert_eq!(port.map(|p| p.name).as_deref(), Some("Juneau"));
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod dataset;
mod error;
pub mod geocoder;
mod model;
pub mod resolver;

pub use cache::{CacheStats, PortsCache, PortsCacheConfig, PORTS_CACHE_CONFIG};
pub use dataset::DatasetIndex;
pub use error::{PortsError, Result};
pub use geocoder::PortGeocoder;
pub use model::{PortEntry, PortMatch, PortSource};
pub use resolver::{PortResolver, ResolverConfig};
