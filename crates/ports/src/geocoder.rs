//! Seam for the online geocoding provider.

use crate::error::Result;
use crate::model::PortEntry;
use async_trait::async_trait;

/// An online place search that can return port candidates.
///
/// Implementations return candidates best-first. Failures are reported as
/// [`PortsError::Geocoder`](crate::PortsError::Geocoder); the resolver treats
/// them the same as an empty answer.
#[async_trait]
pub trait PortGeocoder: Send + Sync {
    /// Search for up to `limit` ports matching `query`.
    async fn search_ports_online(&self, query: &str, limit: usize) -> Result<Vec<PortEntry>>;

    /// Provider name for logs
    fn name(&self) -> &str {
        "geocoder"
    }
}
