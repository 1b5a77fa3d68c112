//! Configuration file loading

use super::schema::ConfigSchema;
use crate::error::{Error, ErrorCode, Result, ResultExt};
use std::path::Path;

/// Configuration wrapper
#[derive(Debug, Clone)]
pub struct Config {
    pub schema: ConfigSchema,
    pub path: Option<String>,
}

impl Config {
    /// Load configuration from an explicit path, a discovered file, or defaults
    ///
    /// An explicit path that does not exist is an error; a missing discovered
    /// file is not.
    pub fn load(path: Option<&str>) -> Result<Self> {
        if let Some(p) = path {
            if !Path::new(p).exists() {
                return Err(Error::config_not_found(p));
            }
        }

        let config_path = path.map(String::from).or_else(find_config_file);

        let schema = match config_path {
            Some(ref p) => load_config_file(p)?,
            None => ConfigSchema::default(),
        };
        validate(&schema)?;

        Ok(Self {
            schema,
            path: config_path,
        })
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let schema: ConfigSchema = toml::from_str(content)?;
        validate(&schema)?;
        Ok(Self { schema, path: None })
    }

    /// Defaults only (no file)
    pub fn defaults() -> Self {
        Self {
            schema: ConfigSchema::default(),
            path: None,
        }
    }
}

/// Find configuration file in standard locations
fn find_config_file() -> Option<String> {
    let candidates = [
        ".portmatch.toml",
        "portmatch.toml",
        ".config/portmatch.toml",
    ];

    candidates
        .into_iter()
        .find(|candidate| Path::new(candidate).exists())
        .map(String::from)
}

/// Load and parse a TOML configuration file
fn load_config_file(path: &str) -> Result<ConfigSchema> {
    let content = std::fs::read_to_string(path)
        .map_err(Error::from)
        .context(format!("Reading config file {path}"))?;

    toml::from_str(&content)
        .map_err(Error::from)
        .context(format!("Parsing config file {path}"))
}

fn validate(schema: &ConfigSchema) -> Result<()> {
    if schema.cache.max_entries == 0 {
        return Err(Error::invalid_config_value(
            "cache.max_entries",
            "must be at least 1",
        ));
    }
    if schema.cache.cache_key.trim().is_empty() {
        return Err(Error::invalid_config_value("cache.cache_key", "must not be empty"));
    }

    for (key, value) in [
        ("resolver.high_confidence", schema.resolver.high_confidence),
        (
            "resolver.min_online_confidence",
            schema.resolver.min_online_confidence,
        ),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(Error::invalid_config_value(key, "must be within [0, 1]"));
        }
    }

    let url = &schema.geocoder.base_url;
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(Error::new(
            ErrorCode::InvalidConfigValue,
            format!("geocoder.base_url must start with http:// or https://, got {url:?}"),
        ));
    }

    Ok(())
}
