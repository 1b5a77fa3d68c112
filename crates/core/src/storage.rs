//! Persistent key-value storage
//!
//! A minimal string-to-string store modelled on on-device storage APIs:
//! one opaque string value per key. Implementations:
//!
//! - [`MemoryStore`]: process-local map, used in tests and for ephemeral runs
//! - [`FileStore`]: one file per key under a directory
//!
//! # Example
//!
//! ```rust,ignore
//! use portmatch_core::storage::{KeyValueStore, MemoryStore};
//!
//! let store = MemoryStore::new();
//! store.set_item("greeting", "hello").await?;
//! assert_eq!(store.get_item("greeting").await?, Some("hello".to_string()));
//! ```

use crate::error::{Error, ErrorCode, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Async string key-value store.
///
/// Calls may suspend on I/O. Concurrent writers are not serialized: the last
/// `set_item` to complete wins.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, `None` when absent.
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn remove_item(&self, key: &str) -> Result<()>;
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held
    pub fn len(&self) -> usize {
        self.items.read().map(|guard| guard.len()).unwrap_or(0)
    }

    /// Whether the store holds no keys
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn poisoned() -> Error {
        Error::new(
            ErrorCode::StorageLockPoisoned,
            "Failed to acquire memory store lock",
        )
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        let guard = self.items.read().map_err(|_| Self::poisoned())?;
        Ok(guard.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut guard = self.items.write().map_err(|_| Self::poisoned())?;
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        let mut guard = self.items.write().map_err(|_| Self::poisoned())?;
        guard.remove(key);
        Ok(())
    }
}

/// File-backed store: each key maps to `<dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            Error::from(e).with_context(format!("Creating storage directory {}", dir.display()))
        })?;
        Ok(Self { dir })
    }

    /// Open the store at the platform data directory (`<data_dir>/portmatch`)
    pub fn open_default() -> Result<Self> {
        Self::open(default_storage_dir())
    }

    /// Directory this store writes into
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(Error::invalid_key(key));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::from(e).with_context(format!("Reading {}", path.display()))),
        }
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        // Write to a sibling file first so readers never observe a torn value.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value)
            .await
            .map_err(|e| Error::from(e).with_context(format!("Writing {}", tmp.display())))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| Error::from(e).with_context(format!("Replacing {}", path.display())))?;
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::from(e).with_context(format!("Removing {}", path.display()))),
        }
    }
}

/// Default directory for persisted state
pub fn default_storage_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from(".data"))
        .join("portmatch")
}
