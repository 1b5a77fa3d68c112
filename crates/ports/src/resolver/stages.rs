//! Resolution stages, evaluated in order until one resolves.

use super::{counters, rank_local, ResolverConfig};
use crate::cache::PortsCache;
use crate::dataset::DatasetIndex;
use crate::error::Result;
use crate::geocoder::PortGeocoder;
use crate::model::{PortEntry, PortMatch, PortSource};
use async_trait::async_trait;
use portmatch_geo::{parse_coordinates, GeoError};
use portmatch_search::{best_score, sanitize_port_query};
use portmatch_telemetry::metrics;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Coordinates closer than this to a known port borrow its name.
const LABEL_RADIUS_KM: f64 = 25.0;

/// Result of running one stage.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    /// Stop and return these matches
    Resolved(Vec<PortMatch>),
    /// Defer to the next stage
    Pass,
}

/// Per-call state shared by the stages.
pub struct ResolveContext<'a> {
    /// Raw caller text
    pub query: &'a str,
    /// Noise-stripped query
    pub sanitized: String,
    /// Cache contents the caller loaded
    pub cache_snapshot: &'a [PortEntry],
    /// Maximum number of matches to return
    pub limit: usize,
    /// Reference datasets
    pub dataset: &'a DatasetIndex,
    /// Persistent cache for accepted online results
    pub cache: &'a PortsCache,
    /// Thresholds and online policy
    pub config: &'a ResolverConfig,
    local: Option<Vec<PortMatch>>,
}

impl<'a> ResolveContext<'a> {
    pub(crate) fn new(
        query: &'a str,
        cache_snapshot: &'a [PortEntry],
        limit: usize,
        dataset: &'a DatasetIndex,
        cache: &'a PortsCache,
        config: &'a ResolverConfig,
    ) -> Self {
        Self {
            query,
            sanitized: sanitize_port_query(query),
            cache_snapshot,
            limit,
            dataset,
            cache,
            config,
            local: None,
        }
    }

    /// Local matches over the cache snapshot and datasets, computed once.
    pub fn local_matches(&mut self) -> &[PortMatch] {
        if self.local.is_none() {
            self.local = Some(rank_local(self.dataset, self.cache_snapshot, self.query, self.limit));
        }
        self.local.as_deref().unwrap_or_default()
    }

    pub(crate) fn into_local(mut self) -> Vec<PortMatch> {
        self.local_matches();
        self.local.unwrap_or_default()
    }
}

/// One strategy in the resolution pipeline.
#[async_trait]
pub trait ResolveStage: Send + Sync {
    /// Stage name for logs
    fn name(&self) -> &'static str;

    /// Try to resolve the query.
    async fn resolve(&self, ctx: &mut ResolveContext<'_>) -> StageOutcome;
}

/// A "lat, lng" pair in the raw text wins over any name lookup.
pub struct CoordinateStage;

#[async_trait]
impl ResolveStage for CoordinateStage {
    fn name(&self) -> &'static str {
        "coordinates"
    }

    async fn resolve(&self, ctx: &mut ResolveContext<'_>) -> StageOutcome {
        let found = match parse_coordinates(ctx.query) {
            Ok(found) => found,
            Err(GeoError::InvalidCoordinate(reason)) => {
                debug!(query = ctx.query, %reason, "Ignoring out-of-range coordinates");
                return StageOutcome::Pass;
            }
            Err(GeoError::Parse(_)) => return StageOutcome::Pass,
        };

        let coordinate = found.coordinate;
        let nearby = ctx
            .dataset
            .nearest(&coordinate, 1)
            .into_iter()
            .next()
            .filter(|(_, km)| *km <= LABEL_RADIUS_KM)
            .map(|(entry, _)| entry);

        let label = sanitize_port_query(&found.remainder(ctx.query));
        let name = if !label.is_empty() {
            label
        } else if let Some(port) = &nearby {
            port.name.clone()
        } else {
            coordinate.to_string()
        };

        let mut entry = PortEntry::new(name, coordinate.latitude, coordinate.longitude, PortSource::Unknown);
        if let Some(port) = nearby {
            entry.country = port.country;
            entry.region_code = port.region_code;
        }

        metrics().increment(counters::COORDINATES);
        debug!(query = ctx.query, name = %entry.name, %coordinate, "Resolved direct coordinates");
        StageOutcome::Resolved(vec![PortMatch::new(entry, 1.0)])
    }
}

/// Cache snapshot and datasets; resolves when the best match is confident.
pub struct LocalStage;

#[async_trait]
impl ResolveStage for LocalStage {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn resolve(&self, ctx: &mut ResolveContext<'_>) -> StageOutcome {
        let threshold = ctx.config.high_confidence;
        let query = ctx.query;
        let matches = ctx.local_matches();

        match matches.first() {
            Some(top) if top.score >= threshold => {
                metrics().increment(counters::LOCAL_HIT);
                debug!(
                    query,
                    name = %top.item.name,
                    source = %top.item.source,
                    score = top.score,
                    "Confident local match"
                );
                StageOutcome::Resolved(matches.to_vec())
            }
            Some(top) => {
                debug!(query, best = top.score, threshold, "Local match below confidence");
                StageOutcome::Pass
            }
            None => StageOutcome::Pass,
        }
    }
}

/// Online geocoder lookup with query-suffix retries and a confidence gate.
pub struct OnlineStage {
    geocoder: Arc<dyn PortGeocoder>,
    last_request: Mutex<Option<Instant>>,
}

impl OnlineStage {
    /// Stage backed by `geocoder`.
    pub fn new(geocoder: Arc<dyn PortGeocoder>) -> Self {
        Self {
            geocoder,
            last_request: Mutex::new(None),
        }
    }

    async fn lookup(&self, query: &str, config: &ResolverConfig) -> Result<Vec<PortEntry>> {
        let variants = std::iter::once(query.to_string())
            .chain(config.query_suffixes.iter().map(|suffix| format!("{query} {suffix}")));

        for variant in variants {
            self.pace(config.batch_delay).await;
            let candidates = self
                .geocoder
                .search_ports_online(&variant, config.online_limit)
                .await?;
            if !candidates.is_empty() {
                debug!(query = %variant, count = candidates.len(), "Online candidates");
                return Ok(candidates);
            }
            debug!(query = %variant, "No online candidates");
        }
        Ok(Vec::new())
    }

    /// Space consecutive provider requests at least `delay` apart.
    async fn pace(&self, delay: Duration) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < delay {
                tokio::time::sleep(delay - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[async_trait]
impl ResolveStage for OnlineStage {
    fn name(&self) -> &'static str {
        "online"
    }

    async fn resolve(&self, ctx: &mut ResolveContext<'_>) -> StageOutcome {
        if !ctx.config.online_enabled || ctx.sanitized.is_empty() {
            return StageOutcome::Pass;
        }

        let candidates = match self.lookup(&ctx.sanitized, ctx.config).await {
            Ok(candidates) => candidates,
            Err(e) => {
                metrics().increment(counters::ONLINE_FAILED);
                warn!(
                    provider = self.geocoder.name(),
                    query = %ctx.sanitized,
                    error = %e,
                    "Online lookup failed, using local results"
                );
                return StageOutcome::Pass;
            }
        };

        let Some(mut top) = candidates.into_iter().next() else {
            return StageOutcome::Pass;
        };

        let confidence = best_score(ctx.query, top.names());
        if confidence < ctx.config.min_online_confidence || top.validate().is_err() {
            metrics().increment(counters::ONLINE_REJECTED);
            info!(
                query = ctx.query,
                candidate = %top.name,
                confidence,
                threshold = ctx.config.min_online_confidence,
                "Rejected online candidate"
            );
            return StageOutcome::Pass;
        }

        top.source = PortSource::Online;
        top.original_query = Some(ctx.query.to_string());
        ctx.cache.upsert(top.clone()).await;

        metrics().increment(counters::ONLINE_ACCEPTED);
        info!(query = ctx.query, name = %top.name, confidence, "Accepted online match");

        let key = top.key();
        let limit = ctx.limit;
        let mut results = vec![PortMatch::new(top, confidence)];
        results.extend(
            ctx.local_matches()
                .iter()
                .filter(|m| m.item.key() != key)
                .cloned(),
        );
        results.truncate(limit);
        StageOutcome::Resolved(results)
    }
}
