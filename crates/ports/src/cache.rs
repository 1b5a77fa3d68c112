//! Bounded, persistent ports cache.
//!
//! The whole cache is one JSON array stored under a single key. Bounding and
//! expiry happen inline:
//!
//! - `load` drops entries older than the TTL (measured from `savedAt`)
//! - `save`/`upsert` evict least-recently-accessed entries over the cap
//!
//! Every operation is infallible from the caller's point of view. Storage
//! and decoding failures are logged at `warn` and degrade to an empty cache
//! or a skipped write.

use crate::model::{PortEntry, PortSource};
use portmatch_core::clock::{Clock, SystemClock};
use portmatch_core::config::CacheSection;
use portmatch_core::storage::KeyValueStore;
use portmatch_search::{match_key, normalize};
use serde::Serialize;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, info, warn};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Capacity, lifetime and storage key of the ports cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortsCacheConfig {
    /// Maximum number of persisted entries
    pub max_entries: usize,
    /// Entry lifetime in ms since `saved_at`
    pub ttl_ms: i64,
    /// Storage key holding the serialized array
    pub cache_key: Cow<'static, str>,
}

/// Default cache configuration.
pub const PORTS_CACHE_CONFIG: PortsCacheConfig = PortsCacheConfig {
    max_entries: 200,
    ttl_ms: 30 * DAY_MS,
    cache_key: Cow::Borrowed("ports_cache_v1"),
};

impl Default for PortsCacheConfig {
    fn default() -> Self {
        PORTS_CACHE_CONFIG
    }
}

impl From<&CacheSection> for PortsCacheConfig {
    fn from(section: &CacheSection) -> Self {
        Self {
            max_entries: section.max_entries,
            ttl_ms: section.ttl_ms(),
            cache_key: Cow::Owned(section.cache_key.clone()),
        }
    }
}

/// Snapshot of cache occupancy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Live (unexpired) entries
    pub entries: usize,
    /// Configured cap
    pub capacity: usize,
    /// Oldest `saved_at` among live entries
    pub oldest_saved_at: Option<i64>,
    /// Most recent `last_accessed` among live entries
    pub newest_access: Option<i64>,
}

/// LRU + TTL cache of resolved ports over a [`KeyValueStore`].
pub struct PortsCache {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    config: PortsCacheConfig,
}

impl PortsCache {
    /// Cache with the default configuration and the system clock.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_config(store, PORTS_CACHE_CONFIG)
    }

    /// Cache with an explicit configuration.
    pub fn with_config(store: Arc<dyn KeyValueStore>, config: PortsCacheConfig) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Active configuration
    pub fn config(&self) -> &PortsCacheConfig {
        &self.config
    }

    /// Live entries with both timestamps populated.
    ///
    /// Missing or corrupt data yields an empty list.
    pub async fn load(&self) -> Vec<PortEntry> {
        let now = self.clock.now_ms();
        let ttl = self.config.ttl_ms;

        let mut entries = self.read_stored().await;
        let before = entries.len();
        entries.retain(|entry| entry.saved_at.is_none_or(|saved| now.saturating_sub(saved) <= ttl));
        if entries.len() < before {
            debug!(expired = before - entries.len(), "Dropped expired cached ports");
        }

        for entry in &mut entries {
            entry.last_accessed = entry.last_accessed.or(entry.saved_at).or(Some(now));
            entry.saved_at = entry.saved_at.or(Some(now));
        }
        entries
    }

    /// Stamp, bound and persist `entries`.
    pub async fn save(&self, mut entries: Vec<PortEntry>) {
        let now = self.clock.now_ms();
        for entry in &mut entries {
            entry.saved_at.get_or_insert(now);
            entry.last_accessed.get_or_insert(now);
        }
        self.enforce_capacity(&mut entries);
        self.persist(&entries).await;
    }

    /// Delete the persisted collection.
    pub async fn clear(&self) {
        match self.store.remove_item(&self.config.cache_key).await {
            Ok(()) => info!(key = %self.config.cache_key, "Cleared ports cache"),
            Err(e) => warn!(key = %self.config.cache_key, error = %e, "Failed to clear ports cache"),
        }
    }

    /// Insert `entry`, or replace the cached entry with the same normalized name.
    ///
    /// The stored copy is tagged [`PortSource::Cache`] with fresh timestamps.
    pub async fn upsert(&self, mut entry: PortEntry) {
        let now = self.clock.now_ms();
        let key = entry.key();

        entry.source = PortSource::Cache;
        entry.saved_at = Some(now);
        entry.last_accessed = Some(now);

        let mut entries = self.load().await;
        match entries.iter_mut().find(|cached| cached.key() == key) {
            Some(existing) => {
                debug!(name = %entry.name, "Refreshing cached port");
                *existing = entry;
            }
            None => {
                info!(name = %entry.name, "Caching port");
                entries.push(entry);
            }
        }

        self.enforce_capacity(&mut entries);
        self.persist(&entries).await;
    }

    /// Remove every entry whose normalized display name matches `name`.
    ///
    /// Aliases are not consulted. Returns `false` without writing when
    /// nothing matched.
    pub async fn remove_by_name(&self, name: &str) -> bool {
        let key = normalize(name);
        let mut entries = self.load().await;
        let before = entries.len();
        entries.retain(|entry| entry.key() != key);

        if entries.len() == before {
            return false;
        }

        info!(name, removed = before - entries.len(), "Removed cached port");
        self.persist(&entries).await;
        true
    }

    /// Cached entry answering to `name` by display name or alias.
    pub async fn find(&self, name: &str) -> Option<PortEntry> {
        let key = match_key(name);
        self.load().await.into_iter().find(|entry| entry.answers_to(&key))
    }

    /// Mark the entry named `name` as just used.
    pub async fn touch(&self, name: &str) -> bool {
        let key = normalize(name);
        let now = self.clock.now_ms();
        let mut entries = self.load().await;

        let Some(entry) = entries.iter_mut().find(|entry| entry.key() == key) else {
            return false;
        };
        entry.last_accessed = Some(now);

        self.persist(&entries).await;
        true
    }

    /// Occupancy of the live cache.
    pub async fn stats(&self) -> CacheStats {
        let entries = self.load().await;
        CacheStats {
            entries: entries.len(),
            capacity: self.config.max_entries,
            oldest_saved_at: entries.iter().filter_map(|e| e.saved_at).min(),
            newest_access: entries.iter().filter_map(|e| e.last_accessed).max(),
        }
    }

    fn enforce_capacity(&self, entries: &mut Vec<PortEntry>) {
        let cap = self.config.max_entries;
        if entries.len() <= cap {
            return;
        }

        entries.sort_by_key(|entry| entry.last_accessed.unwrap_or(i64::MIN));
        let evicted = entries.len() - cap;
        entries.drain(..evicted);
        debug!(evicted, cap, "Evicted least recently used ports");
    }

    async fn read_stored(&self) -> Vec<PortEntry> {
        let raw = match self.store.get_item(&self.config.cache_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(key = %self.config.cache_key, error = %e, "Failed to read ports cache");
                return Vec::new();
            }
        };

        let items = match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(serde_json::Value::Array(items)) => items,
            Ok(_) => {
                warn!(key = %self.config.cache_key, "Ports cache is not a JSON array, ignoring");
                return Vec::new();
            }
            Err(e) => {
                warn!(key = %self.config.cache_key, error = %e, "Ports cache is corrupt, ignoring");
                return Vec::new();
            }
        };

        items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<PortEntry>(item) {
                Ok(entry) if entry.validate().is_ok() => Some(entry),
                Ok(entry) => {
                    debug!(name = %entry.name, "Dropping invalid cached port");
                    None
                }
                Err(e) => {
                    debug!(error = %e, "Dropping undecodable cached port");
                    None
                }
            })
            .collect()
    }

    async fn persist(&self, entries: &[PortEntry]) {
        let json = match serde_json::to_string(entries) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize ports cache");
                return;
            }
        };

        if let Err(e) = self.store.set_item(&self.config.cache_key, &json).await {
            warn!(key = %self.config.cache_key, error = %e, "Failed to write ports cache");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use portmatch_core::clock::ManualClock;
    use portmatch_core::storage::{FileStore, MemoryStore};
    use portmatch_core::{Error, Result as CoreResult};

    const T0: i64 = 1_700_000_000_000;

    fn port(name: &str) -> PortEntry {
        PortEntry::new(name, 10.0, 20.0, PortSource::Online)
    }

    fn cache_with_clock() -> (PortsCache, Arc<MemoryStore>, Arc<ManualClock>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(T0));
        let cache = PortsCache::new(store.clone()).with_clock(clock.clone());
        (cache, store, clock)
    }

    /// Store whose every call fails.
    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get_item(&self, _key: &str) -> CoreResult<Option<String>> {
            Err(Error::storage("disk on fire"))
        }

        async fn set_item(&self, _key: &str, _value: &str) -> CoreResult<()> {
            Err(Error::storage("disk on fire"))
        }

        async fn remove_item(&self, _key: &str) -> CoreResult<()> {
            Err(Error::storage("disk on fire"))
        }
    }

    #[test]
    fn test_default_config() {
        assert_eq!(PORTS_CACHE_CONFIG.max_entries, 200);
        assert_eq!(PORTS_CACHE_CONFIG.ttl_ms, 2_592_000_000);
        assert_eq!(PORTS_CACHE_CONFIG.cache_key, "ports_cache_v1");
        assert_eq!(PortsCacheConfig::from(&CacheSection::default()), PORTS_CACHE_CONFIG);
    }

    #[tokio::test]
    async fn test_load_empty_when_missing() {
        let (cache, _, _) = cache_with_clock();
        assert!(cache.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_save_bounds_and_evicts_oldest() {
        let (cache, _, _) = cache_with_clock();
        let max = PORTS_CACHE_CONFIG.max_entries;
        let n = max + 5;

        let entries: Vec<PortEntry> = (0..n)
            .map(|i| {
                let mut entry = port(&format!("Port{i}"));
                entry.saved_at = Some(T0);
                entry.last_accessed = Some(T0 + i as i64);
                entry
            })
            .collect();
        cache.save(entries).await;

        let loaded = cache.load().await;
        assert_eq!(loaded.len(), max);
        assert!(loaded.iter().all(|e| e.name != "Port0"));
        assert!(loaded.iter().all(|e| e.name != "Port4"));
        assert!(loaded.iter().any(|e| e.name == "Port5"));
        assert!(loaded.iter().any(|e| e.name == format!("Port{}", n - 1)));
    }

    #[tokio::test]
    async fn test_save_without_timestamps_keeps_newest_inserted() {
        let (cache, _, _) = cache_with_clock();
        let n = PORTS_CACHE_CONFIG.max_entries + 5;
        cache.save((0..n).map(|i| port(&format!("Port{i}"))).collect()).await;

        let loaded = cache.load().await;
        assert_eq!(loaded.len(), PORTS_CACHE_CONFIG.max_entries);
        assert!(loaded.iter().all(|e| e.name != "Port0"));
        assert!(loaded.iter().any(|e| e.name == format!("Port{}", n - 1)));
        assert!(loaded.iter().all(|e| e.saved_at == Some(T0) && e.last_accessed == Some(T0)));
    }

    #[tokio::test]
    async fn test_upsert_never_exceeds_cap() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(T0));
        let config = PortsCacheConfig {
            max_entries: 3,
            ..PORTS_CACHE_CONFIG
        };
        let cache = PortsCache::with_config(store, config).with_clock(clock.clone());

        for name in ["Juneau", "Sitka", "Skagway", "Ketchikan", "Hilo"] {
            cache.upsert(port(name)).await;
            clock.advance(1);
            assert!(cache.load().await.len() <= 3);
        }

        let names: Vec<String> = cache.load().await.into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["Skagway", "Ketchikan", "Hilo"]);
    }

    #[tokio::test]
    async fn test_upsert_round_trip() {
        let (cache, _, _) = cache_with_clock();
        let mut entry = port("Cozumél");
        entry.original_query = Some("Cozumel cruise port".to_string());
        cache.upsert(entry).await;

        let loaded = cache.load().await;
        assert_eq!(loaded.len(), 1);
        let cached = &loaded[0];
        assert_eq!(cached.key(), "cozumel");
        assert_eq!(cached.source, PortSource::Cache);
        assert_eq!(cached.saved_at, Some(T0));
        assert_eq!(cached.last_accessed, Some(T0));
        assert_eq!(cached.original_query.as_deref(), Some("Cozumel cruise port"));
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_normalized_name() {
        let (cache, _, clock) = cache_with_clock();
        cache.upsert(port("Cozumel")).await;
        clock.advance(1_000);

        let mut updated = PortEntry::new("COZUMÉL", 20.5083, -86.9458, PortSource::Online);
        updated.country = Some("MX".to_string());
        cache.upsert(updated).await;

        let loaded = cache.load().await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].country.as_deref(), Some("MX"));
        assert_eq!(loaded[0].saved_at, Some(T0 + 1_000));
        assert_eq!(loaded[0].source, PortSource::Cache);
    }

    #[tokio::test]
    async fn test_remove_by_name() {
        let (cache, store, _) = cache_with_clock();
        cache.upsert(port("Juneau")).await;
        cache.upsert(port("Sitka")).await;
        let before = store.get_item("ports_cache_v1").await.unwrap();

        assert!(!cache.remove_by_name("Ketchikan").await);
        assert_eq!(store.get_item("ports_cache_v1").await.unwrap(), before);

        assert!(cache.remove_by_name("  JUNEAU ").await);
        let loaded = cache.load().await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "Sitka");
    }

    #[tokio::test]
    async fn test_noise_words_keep_ports_distinct() {
        let (cache, _, _) = cache_with_clock();
        cache.upsert(port("Port of Spain")).await;
        cache.upsert(port("Spain")).await;

        let mut names: Vec<_> = cache.load().await.into_iter().map(|e| e.name).collect();
        names.sort();
        assert_eq!(names, vec!["Port of Spain", "Spain"]);

        assert!(cache.remove_by_name("Spain").await);
        let loaded = cache.load().await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "Port of Spain");
    }

    #[tokio::test]
    async fn test_remove_ignores_aliases() {
        let (cache, _, _) = cache_with_clock();
        cache
            .upsert(port("Charlotte Amalie").with_aliases(["St. Thomas"]))
            .await;

        assert!(!cache.remove_by_name("St. Thomas").await);
        assert!(cache.remove_by_name("charlotte amalie").await);
        assert!(cache.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_clear() {
        let (cache, store, _) = cache_with_clock();
        cache.upsert(port("Juneau")).await;
        cache.clear().await;

        assert!(cache.load().await.is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_ttl_expiry() {
        let (cache, _, clock) = cache_with_clock();
        cache.upsert(port("Juneau")).await;
        clock.advance(10 * DAY_MS);
        cache.upsert(port("Sitka")).await;

        clock.advance(20 * DAY_MS);
        let names: Vec<String> = cache.load().await.into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["Juneau", "Sitka"]);

        clock.advance(1);
        let names: Vec<String> = cache.load().await.into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["Sitka"]);
    }

    #[tokio::test]
    async fn test_load_backfills_timestamps() {
        let (cache, store, _) = cache_with_clock();
        let raw = serde_json::json!([
            {"name": "Juneau", "lat": 58.3, "lng": -134.4},
            {"name": "Sitka", "lat": 57.05, "lng": -135.33, "savedAt": T0 - 5}
        ]);
        store.set_item("ports_cache_v1", &raw.to_string()).await.unwrap();

        let loaded = cache.load().await;
        assert_eq!(loaded[0].saved_at, Some(T0));
        assert_eq!(loaded[0].last_accessed, Some(T0));
        assert_eq!(loaded[1].saved_at, Some(T0 - 5));
        assert_eq!(loaded[1].last_accessed, Some(T0 - 5));
    }

    #[tokio::test]
    async fn test_corrupt_data_recovers() {
        let (cache, store, _) = cache_with_clock();

        store.set_item("ports_cache_v1", "{not json").await.unwrap();
        assert!(cache.load().await.is_empty());

        store.set_item("ports_cache_v1", r#"{"name":"Juneau"}"#).await.unwrap();
        assert!(cache.load().await.is_empty());

        cache.upsert(port("Sitka")).await;
        assert_eq!(cache.load().await.len(), 1);
    }

    #[tokio::test]
    async fn test_bad_elements_dropped_individually() {
        let (cache, store, _) = cache_with_clock();
        let raw = r#"[
            {"name":"Juneau","lat":58.3,"lng":-134.4},
            {"name":"Broken","lat":"north","lng":-134.4},
            {"name":"Nowhere","lat":95.0,"lng":0.0},
            42
        ]"#;
        store.set_item("ports_cache_v1", raw).await.unwrap();

        let loaded = cache.load().await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "Juneau");
    }

    #[tokio::test]
    async fn test_extreme_saved_at_expires_without_overflow() {
        let (cache, store, _) = cache_with_clock();
        let raw = format!(
            r#"[
                {{"name":"Juneau","lat":58.3,"lng":-134.4,"savedAt":{}}},
                {{"name":"Sitka","lat":57.05,"lng":-135.33,"savedAt":{}}}
            ]"#,
            i64::MIN,
            T0 - 1_000
        );
        store.set_item("ports_cache_v1", &raw).await.unwrap();

        let loaded = cache.load().await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "Sitka");
    }

    #[tokio::test]
    async fn test_failing_store_is_swallowed() {
        let cache = PortsCache::new(Arc::new(BrokenStore));

        assert!(cache.load().await.is_empty());
        cache.save(vec![port("Juneau")]).await;
        cache.upsert(port("Juneau")).await;
        cache.clear().await;
        assert!(!cache.remove_by_name("Juneau").await);
        assert!(!cache.touch("Juneau").await);
        assert!(cache.find("Juneau").await.is_none());
    }

    #[tokio::test]
    async fn test_find_by_alias_and_touch() {
        let (cache, _, clock) = cache_with_clock();
        cache
            .upsert(PortEntry::new("Charlotte Amalie", 18.34, -64.93, PortSource::Online).with_aliases(["St. Thomas"]))
            .await;

        let found = cache.find("ST. THOMAS").await.unwrap();
        assert_eq!(found.name, "Charlotte Amalie");

        clock.advance(5_000);
        assert!(cache.touch("charlotte amalie").await);
        assert!(!cache.touch("Nassau").await);

        let touched = cache.find("Charlotte Amalie").await.unwrap();
        assert_eq!(touched.last_accessed, Some(T0 + 5_000));
        assert_eq!(touched.saved_at, Some(T0));
    }

    #[tokio::test]
    async fn test_touch_protects_from_eviction() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(T0));
        let config = PortsCacheConfig {
            max_entries: 2,
            ..PORTS_CACHE_CONFIG
        };
        let cache = PortsCache::with_config(store, config).with_clock(clock.clone());

        cache.upsert(port("Juneau")).await;
        clock.advance(1);
        cache.upsert(port("Sitka")).await;
        clock.advance(1);
        cache.touch("Juneau").await;
        clock.advance(1);
        cache.upsert(port("Hilo")).await;

        let names: Vec<String> = cache.load().await.into_iter().map(|e| e.name).collect();
        assert!(names.contains(&"Juneau".to_string()));
        assert!(!names.contains(&"Sitka".to_string()));
    }

    #[tokio::test]
    async fn test_stats() {
        let (cache, _, clock) = cache_with_clock();
        assert_eq!(
            cache.stats().await,
            CacheStats {
                entries: 0,
                capacity: 200,
                oldest_saved_at: None,
                newest_access: None,
            }
        );

        cache.upsert(port("Juneau")).await;
        clock.advance(100);
        cache.upsert(port("Sitka")).await;

        let stats = cache.stats().await;
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.oldest_saved_at, Some(T0));
        assert_eq!(stats.newest_access, Some(T0 + 100));
    }

    #[tokio::test]
    async fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileStore::open(dir.path()).unwrap());
        PortsCache::new(store.clone()).upsert(port("Juneau")).await;

        let reopened = Arc::new(FileStore::open(dir.path()).unwrap());
        let loaded = PortsCache::new(reopened).load().await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "Juneau");
    }

    proptest::proptest! {
        #[test]
        fn prop_upserts_stay_within_capacity(names in proptest::collection::vec("[a-h]", 1..30)) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            runtime.block_on(async {
                let clock = Arc::new(ManualClock::new(T0));
                let config = PortsCacheConfig { max_entries: 5, ..PORTS_CACHE_CONFIG };
                let cache = PortsCache::with_config(Arc::new(MemoryStore::new()), config).with_clock(clock.clone());

                for name in &names {
                    clock.advance(1);
                    cache.upsert(port(name)).await;
                }

                let loaded = cache.load().await;
                let keys: std::collections::HashSet<String> = loaded.iter().map(PortEntry::key).collect();
                proptest::prop_assert!(loaded.len() <= 5);
                proptest::prop_assert_eq!(keys.len(), loaded.len());
                proptest::prop_assert!(keys.contains(names.last().unwrap().as_str()));
                Ok(())
            })?;
        }
    }
}
