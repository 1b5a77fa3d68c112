//! Wiring from configuration to a ready resolver

use anyhow::{Context, Result};
use portmatch_core::config::Config;
use portmatch_core::storage::{FileStore, KeyValueStore};
use portmatch_geocoder::{GeocoderConfig, NominatimClient};
use portmatch_ports::{DatasetIndex, PortResolver, PortsCache, PortsCacheConfig, ResolverConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Command-line switches that change how the resolver is built
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    /// Never call the online geocoder
    pub offline: bool,
    /// Replace the bundled master list with this JSON file
    pub master_file: Option<PathBuf>,
}

/// Everything a command needs
pub struct App {
    pub config: Config,
    pub resolver: PortResolver,
}

impl App {
    /// Build the resolver described by `config`
    pub fn build(config: Config, options: &AppOptions) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> = Arc::new(match &config.schema.cache.storage_dir {
            Some(dir) => FileStore::open(dir),
            None => FileStore::open_default(),
        }
        .context("Failed to open the ports cache storage")?);

        let cache = PortsCache::with_config(store, PortsCacheConfig::from(&config.schema.cache));

        let dataset = match &options.master_file {
            Some(path) => DatasetIndex::with_master_file(path)
                .with_context(|| format!("Failed to load master ports from {}", path.display()))?,
            None => DatasetIndex::builtin().context("Bundled port datasets are invalid")?,
        };
        debug!(ports = dataset.len(), "Loaded port datasets");

        let mut resolver_config = ResolverConfig::from(&config.schema.resolver);
        if options.offline {
            resolver_config.online_enabled = false;
        }

        let mut resolver = PortResolver::new(Arc::new(dataset), Arc::new(cache));
        if resolver_config.online_enabled {
            let geocoder_config = GeocoderConfig::from(&config.schema.geocoder).with_env_overrides();
            let client = NominatimClient::with_config(geocoder_config).context("Invalid geocoder configuration")?;
            debug!(base_url = %client.config().base_url, "Online lookups enabled");
            resolver = resolver.with_geocoder(Arc::new(client));
        }

        Ok(Self {
            config,
            resolver: resolver.with_config(resolver_config),
        })
    }

    /// Whether lookups may reach the network
    pub fn is_online(&self) -> bool {
        self.resolver.is_online() && self.resolver.config().online_enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> Config {
        let mut config = Config::defaults();
        config.schema.cache.storage_dir = Some(dir.path().to_string_lossy().into_owned());
        config
    }

    #[tokio::test]
    async fn test_offline_app_resolves_locally() {
        let dir = TempDir::new().unwrap();
        let options = AppOptions {
            offline: true,
            ..AppOptions::default()
        };
        let app = App::build(config_in(&dir), &options).unwrap();

        assert!(!app.is_online());
        let port = app.resolver.resolve_port_by_name("Juneau").await.unwrap();
        assert_eq!(port.name, "Juneau");
    }

    #[test]
    fn test_online_app_has_geocoder() {
        let dir = TempDir::new().unwrap();
        let app = App::build(config_in(&dir), &AppOptions::default()).unwrap();
        assert!(app.is_online());
    }

    #[test]
    fn test_disabled_in_config_stays_offline() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        config.schema.resolver.online_enabled = false;

        let app = App::build(config, &AppOptions::default()).unwrap();
        assert!(!app.is_online());
    }

    #[test]
    fn test_missing_master_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let options = AppOptions {
            offline: true,
            master_file: Some(dir.path().join("missing.json")),
        };
        assert!(App::build(config_in(&dir), &options).is_err());
    }
}
