//! Port resolution across coordinates, local data and the online geocoder.
//!
//! [`PortResolver::unified_port_search`] runs an ordered list of
//! [`ResolveStage`]s; the first one that resolves wins:
//!
//! 1. [`CoordinateStage`]: a "lat, lng" pair in the text
//! 2. [`LocalStage`]: cache snapshot + datasets above `high_confidence`
//! 3. [`OnlineStage`]: geocoder with suffix retries, gated by
//!    `min_online_confidence`, accepted results are cached
//!
//! When nothing resolves, the local matches (possibly empty) are returned.
//! The resolver never fails; provider and storage errors degrade to local
//! results.

mod stages;

pub use stages::{
    CoordinateStage, LocalStage, OnlineStage, ResolveContext, ResolveStage, StageOutcome,
};

use crate::cache::PortsCache;
use crate::dataset::DatasetIndex;
use crate::geocoder::PortGeocoder;
use crate::model::{compare_matches, PortEntry, PortMatch, PortSource};
use portmatch_core::config::ResolverSection;
use portmatch_search::{best_score, match_key};
use portmatch_telemetry::{metrics, Timer};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Counter names recorded in the telemetry registry.
pub mod counters {
    /// Query resolved from inline coordinates
    pub const COORDINATES: &str = "resolver.coordinates";
    /// Confident local match, no network
    pub const LOCAL_HIT: &str = "resolver.local_hit";
    /// Online candidate accepted and cached
    pub const ONLINE_ACCEPTED: &str = "resolver.online_accepted";
    /// Online candidate below the confidence gate
    pub const ONLINE_REJECTED: &str = "resolver.online_rejected";
    /// Geocoder error
    pub const ONLINE_FAILED: &str = "resolver.online_failed";
    /// No match at all
    pub const UNRESOLVED: &str = "resolver.unresolved";
    /// Latency histogram of `unified_port_search`, in ms
    pub const SEARCH_MS: &str = "resolver.search_ms";
}

/// Resolution policy.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverConfig {
    /// Local score at or above which the network is skipped
    pub high_confidence: f64,
    /// Minimum score for accepting an online candidate
    pub min_online_confidence: f64,
    /// Whether the online stage may run
    pub online_enabled: bool,
    /// Minimum spacing between geocoder requests
    pub batch_delay: Duration,
    /// Candidates requested per online query
    pub online_limit: usize,
    /// Suffixes tried in order when the bare query finds nothing online
    pub query_suffixes: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::from(&ResolverSection::default())
    }
}

impl From<&ResolverSection> for ResolverConfig {
    fn from(section: &ResolverSection) -> Self {
        Self {
            high_confidence: section.high_confidence,
            min_online_confidence: section.min_online_confidence,
            online_enabled: section.online_enabled,
            batch_delay: Duration::from_millis(section.batch_delay_ms),
            online_limit: section.online_limit,
            query_suffixes: section.query_suffixes.clone(),
        }
    }
}

/// Resolves free-text port labels to [`PortEntry`]s.
pub struct PortResolver {
    dataset: Arc<DatasetIndex>,
    cache: Arc<PortsCache>,
    config: ResolverConfig,
    stages: Vec<Box<dyn ResolveStage>>,
    online: bool,
}

impl PortResolver {
    /// Offline resolver over `dataset` and `cache`.
    pub fn new(dataset: Arc<DatasetIndex>, cache: Arc<PortsCache>) -> Self {
        let stages: Vec<Box<dyn ResolveStage>> = vec![Box::new(CoordinateStage), Box::new(LocalStage)];
        Self {
            dataset,
            cache,
            config: ResolverConfig::default(),
            stages,
            online: false,
        }
    }

    /// Enable the online stage backed by `geocoder`.
    pub fn with_geocoder(mut self, geocoder: Arc<dyn PortGeocoder>) -> Self {
        self.stages.retain(|stage| stage.name() != "online");
        self.stages.push(Box::new(OnlineStage::new(geocoder)));
        self.online = true;
        self
    }

    /// Replace the resolution policy.
    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Active policy
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Reference datasets
    pub fn dataset(&self) -> &DatasetIndex {
        &self.dataset
    }

    /// Backing cache
    pub fn cache(&self) -> &PortsCache {
        &self.cache
    }

    /// Whether a geocoder is configured and allowed
    pub fn is_online(&self) -> bool {
        self.online && self.config.online_enabled
    }

    /// Local-only ranked search over `cache_snapshot` and the datasets.
    ///
    /// Cached copies shadow dataset entries with the same normalized name.
    pub fn search_ports(&self, query: &str, cache_snapshot: &[PortEntry], limit: usize) -> Vec<PortMatch> {
        rank_local(&self.dataset, cache_snapshot, query, limit)
    }

    /// Full pipeline: coordinates, local, online, then local fallback.
    pub async fn unified_port_search(
        &self,
        query: &str,
        cache_snapshot: &[PortEntry],
        limit: usize,
    ) -> Vec<PortMatch> {
        if limit == 0 || query.trim().is_empty() {
            return Vec::new();
        }

        let _timer = Timer::start(counters::SEARCH_MS);
        let mut ctx = ResolveContext::new(
            query,
            cache_snapshot,
            limit,
            &self.dataset,
            &self.cache,
            &self.config,
        );

        for stage in &self.stages {
            if let StageOutcome::Resolved(matches) = stage.resolve(&mut ctx).await {
                debug!(query, stage = stage.name(), count = matches.len(), "Resolved");
                return matches;
            }
        }

        let local = ctx.into_local();
        if local.is_empty() {
            metrics().increment(counters::UNRESOLVED);
            debug!(query, "Unresolved port");
        }
        local
    }

    /// Best single match for `name`, refreshing its cache recency.
    pub async fn resolve_port_by_name(&self, name: &str) -> Option<PortEntry> {
        let snapshot = self.cache.load().await;
        let winner = self
            .unified_port_search(name, &snapshot, 1)
            .await
            .into_iter()
            .next()?
            .item;

        if winner.source == PortSource::Cache {
            self.cache.touch(&winner.name).await;
        }
        Some(winner)
    }

    /// Resolve each name in turn.
    ///
    /// Geocoder requests are spaced by `batch_delay`, so only names that
    /// reach the online stage wait.
    pub async fn resolve_many<S: AsRef<str>>(&self, names: &[S]) -> Vec<(String, Option<PortEntry>)> {
        let mut resolved = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            resolved.push((name.to_string(), self.resolve_port_by_name(name).await));
        }
        resolved
    }

    /// Insert or refresh a cached port.
    pub async fn upsert_cached_port(&self, entry: PortEntry) {
        self.cache.upsert(entry).await;
    }

    /// Remove a cached port by name.
    pub async fn remove_cached_port_by_name(&self, name: &str) -> bool {
        self.cache.remove_by_name(name).await
    }

    /// Drop the whole ports cache.
    pub async fn clear_ports_cache(&self) {
        self.cache.clear().await;
    }

    /// Live cache contents.
    pub async fn cached_ports(&self) -> Vec<PortEntry> {
        self.cache.load().await
    }
}

pub(crate) fn rank_local(
    dataset: &DatasetIndex,
    cache_snapshot: &[PortEntry],
    query: &str,
    limit: usize,
) -> Vec<PortMatch> {
    if limit == 0 || match_key(query).is_empty() {
        return Vec::new();
    }

    let cached = cache_snapshot.iter().filter_map(|entry| {
        let score = best_score(query, entry.names());
        (score >= dataset.min_score()).then(|| {
            let mut entry = entry.clone();
            entry.source = PortSource::Cache;
            PortMatch::new(entry, score)
        })
    });

    let mut seen = HashSet::new();
    let mut matches: Vec<PortMatch> = cached
        .chain(dataset.search(query, dataset.len()))
        .filter(|m| seen.insert(m.item.key()))
        .collect();

    matches.sort_by(compare_matches);
    matches.truncate(limit);
    matches
}
