//! Logging and lightweight metrics for portmatch
//!
//! This crate provides:
//! - `tracing` subscriber setup (compact text or JSON lines)
//! - A process-wide counter/histogram registry for resolver outcomes
//! - A drop-safe [`Timer`] that records elapsed milliseconds

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

/// Global metrics registry
static METRICS: Lazy<MetricsRegistry> = Lazy::new(MetricsRegistry::new);

/// Global session ID for correlating logs
static SESSION_ID: Lazy<String> = Lazy::new(|| Uuid::new_v4().to_string());

/// Initialize logging; `RUST_LOG` overrides `config.log_level`
pub fn init_with_config(config: &TelemetryConfig) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json {
        registry
            .with(fmt::layer().json().with_target(config.show_target).with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(config.show_target)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    };
    result.map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {e}"))?;

    tracing::debug!(
        session_id = %session_id(),
        version = env!("CARGO_PKG_VERSION"),
        "Telemetry initialized"
    );

    Ok(())
}

/// Get the current session ID
pub fn session_id() -> &'static str {
    &SESSION_ID
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Level filter used when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit JSON lines instead of compact text
    pub json: bool,
    /// Include the module target in each line
    pub show_target: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            json: false,
            show_target: false,
        }
    }
}

impl TelemetryConfig {
    /// Configuration with a specific level filter
    pub fn with_level(level: impl Into<String>) -> Self {
        Self {
            log_level: level.into(),
            ..Self::default()
        }
    }
}

/// Samples kept per histogram; older ones are dropped first.
pub const MAX_SAMPLES: usize = 1024;

/// Counters and latency samples keyed by metric name
pub struct MetricsRegistry {
    counters: RwLock<HashMap<String, AtomicU64>>,
    samples: RwLock<HashMap<String, VecDeque<f64>>>,
    started: Instant,
}

impl MetricsRegistry {
    fn new() -> Self {
        Self {
            counters: RwLock::new(HashMap::new()),
            samples: RwLock::new(HashMap::new()),
            started: Instant::now(),
        }
    }

    /// Add one to `name`
    pub fn increment(&self, name: &str) {
        let bumped = self
            .counters
            .read()
            .ok()
            .and_then(|counters| counters.get(name).map(|c| c.fetch_add(1, Ordering::Relaxed)))
            .is_some();
        if !bumped {
            if let Ok(mut counters) = self.counters.write() {
                counters
                    .entry(name.to_string())
                    .or_insert_with(|| AtomicU64::new(0))
                    .fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Current value of a counter (0 when never incremented)
    pub fn counter(&self, name: &str) -> u64 {
        self.counters
            .read()
            .ok()
            .and_then(|counters| counters.get(name).map(|c| c.load(Ordering::Relaxed)))
            .unwrap_or(0)
    }

    /// Record one sample for `name`, keeping the latest [`MAX_SAMPLES`]
    pub fn histogram(&self, name: &str, value: f64) {
        if let Ok(mut samples) = self.samples.write() {
            let window = samples.entry(name.to_string()).or_default();
            if window.len() == MAX_SAMPLES {
                window.pop_front();
            }
            window.push_back(value);
        }
    }

    /// Summary of the samples recorded for `name`
    pub fn histogram_stats(&self, name: &str) -> Option<HistogramStats> {
        let samples = self.samples.read().ok()?;
        samples.get(name).and_then(|values| HistogramStats::from_values(values))
    }

    /// Point-in-time copy of every metric
    pub fn snapshot(&self) -> MetricsSnapshot {
        let counters = self
            .counters
            .read()
            .map(|counters| {
                counters
                    .iter()
                    .map(|(name, value)| (name.clone(), value.load(Ordering::Relaxed)))
                    .collect()
            })
            .unwrap_or_default();

        let histograms = self
            .samples
            .read()
            .map(|samples| {
                samples
                    .iter()
                    .filter_map(|(name, values)| Some((name.clone(), HistogramStats::from_values(values)?)))
                    .collect()
            })
            .unwrap_or_default();

        MetricsSnapshot {
            session_id: session_id().to_string(),
            uptime_secs: self.started.elapsed().as_secs(),
            counters,
            histograms,
        }
    }
}

/// Serializable copy of the registry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub session_id: String,
    pub uptime_secs: u64,
    pub counters: BTreeMap<String, u64>,
    pub histograms: BTreeMap<String, HistogramStats>,
}

/// Sample summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub p50: f64,
    pub p95: f64,
}

impl HistogramStats {
    /// `None` for an empty sample set
    fn from_values<'a>(values: impl IntoIterator<Item = &'a f64>) -> Option<Self> {
        let mut sorted: Vec<f64> = values.into_iter().copied().collect();
        sorted.sort_by(f64::total_cmp);
        let (&min, &max) = (sorted.first()?, sorted.last()?);

        #[allow(clippy::cast_precision_loss)]
        let mean = sorted.iter().sum::<f64>() / sorted.len() as f64;
        Some(Self {
            count: sorted.len(),
            min,
            max,
            mean,
            p50: nearest_rank(&sorted, 0.50),
            p95: nearest_rank(&sorted, 0.95),
        })
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn nearest_rank(sorted: &[f64], quantile: f64) -> f64 {
    let idx = (quantile * (sorted.len() - 1) as f64).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Get the global metrics registry
pub fn metrics() -> &'static MetricsRegistry {
    &METRICS
}

/// Timer recording elapsed milliseconds into a histogram
pub struct Timer {
    name: String,
    start: Instant,
    recorded: bool,
}

impl Timer {
    /// Start a new timer
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: Instant::now(),
            recorded: false,
        }
    }

    /// Stop the timer and record the duration
    pub fn stop(mut self) -> Duration {
        self.record()
    }

    fn record(&mut self) -> Duration {
        let duration = self.start.elapsed();
        if !self.recorded {
            self.recorded = true;
            metrics().histogram(&self.name, duration.as_secs_f64() * 1000.0);
            tracing::trace!(
                metric = %self.name,
                duration_ms = duration.as_millis(),
                "Timer completed"
            );
        }
        duration
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.record();
    }
}
