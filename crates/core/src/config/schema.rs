//! Configuration schema definitions
//!
//! Every section and field is optional in the TOML file; missing values fall
//! back to the defaults below.

use serde::{Deserialize, Serialize};

/// Root configuration schema
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ConfigSchema {
    #[serde(default)]
    pub cache: CacheSection,

    #[serde(default)]
    pub resolver: ResolverSection,

    #[serde(default)]
    pub geocoder: GeocoderSection,

    #[serde(default)]
    pub logging: LoggingSection,
}

/// Ports cache settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheSection {
    /// Maximum number of cached ports
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Entry lifetime in days since it was saved
    #[serde(default = "default_ttl_days")]
    pub ttl_days: u64,

    /// Storage key holding the serialized cache
    #[serde(default = "default_cache_key")]
    pub cache_key: String,

    /// Directory for the file-backed store (platform data dir when unset)
    #[serde(default)]
    pub storage_dir: Option<String>,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            ttl_days: default_ttl_days(),
            cache_key: default_cache_key(),
            storage_dir: None,
        }
    }
}

impl CacheSection {
    /// TTL in milliseconds
    pub fn ttl_ms(&self) -> i64 {
        i64::try_from(self.ttl_days)
            .unwrap_or(i64::MAX / MS_PER_DAY)
            .saturating_mul(MS_PER_DAY)
    }
}

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

fn default_max_entries() -> usize {
    200
}

fn default_ttl_days() -> u64 {
    30
}

fn default_cache_key() -> String {
    "ports_cache_v1".to_string()
}

/// Resolution policy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolverSection {
    /// Local score at or above which the network is skipped
    #[serde(default = "default_high_confidence")]
    pub high_confidence: f64,

    /// Minimum score an online candidate needs to be accepted and cached
    #[serde(default = "default_min_online_confidence")]
    pub min_online_confidence: f64,

    /// Allow online geocoder lookups
    #[serde(default = "default_true")]
    pub online_enabled: bool,

    /// Pause between online lookups during batch resolution
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    /// Number of candidates requested from the geocoder
    #[serde(default = "default_online_limit")]
    pub online_limit: usize,

    /// Suffixes appended to the query when the plain online lookup is empty
    #[serde(default = "default_query_suffixes")]
    pub query_suffixes: Vec<String>,
}

impl Default for ResolverSection {
    fn default() -> Self {
        Self {
            high_confidence: default_high_confidence(),
            min_online_confidence: default_min_online_confidence(),
            online_enabled: true,
            batch_delay_ms: default_batch_delay_ms(),
            online_limit: default_online_limit(),
            query_suffixes: default_query_suffixes(),
        }
    }
}

fn default_high_confidence() -> f64 {
    0.9
}

fn default_min_online_confidence() -> f64 {
    0.6
}

fn default_batch_delay_ms() -> u64 {
    350
}

fn default_online_limit() -> usize {
    5
}

fn default_query_suffixes() -> Vec<String> {
    vec!["cruise port".to_string(), "port".to_string()]
}

fn default_true() -> bool {
    true
}

/// Online geocoder endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeocoderSection {
    /// Base URL of a Nominatim-compatible search API
    #[serde(default = "default_geocoder_url")]
    pub base_url: String,

    /// User-Agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Contact address forwarded to the provider
    #[serde(default)]
    pub email: Option<String>,
}

impl Default for GeocoderSection {
    fn default() -> Self {
        Self {
            base_url: default_geocoder_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            email: None,
        }
    }
}

fn default_geocoder_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_user_agent() -> String {
    concat!("portmatch/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

/// Log output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSection {
    /// Default level filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}
