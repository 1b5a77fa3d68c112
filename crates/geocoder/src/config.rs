//! Configuration for the geocoder client
//!
//! Defaults come from the `[geocoder]` config section; environment
//! variables override them.

use crate::error::{GeocodeError, GeocodeResult};
use portmatch_core::config::GeocoderSection;
use portmatch_core::retry::RetryConfig;
use std::env;
use std::time::Duration;

/// Environment types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Local development, fail fast
    Development,
    /// Staging environment
    Staging,
    /// Production environment
    #[default]
    Production,
}

impl Environment {
    /// Parse from `PORTMATCH_ENV`
    pub fn from_env() -> Self {
        Self::parse(&env::var("PORTMATCH_ENV").unwrap_or_default())
    }

    /// Parse an environment name; unknown names mean production
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "development" | "dev" | "local" => Self::Development,
            "staging" | "stage" => Self::Staging,
            _ => Self::Production,
        }
    }

    /// Retry profile for this environment
    #[must_use]
    pub fn retry(self) -> RetryConfig {
        match self {
            Self::Development => RetryConfig::quick(),
            Self::Staging => RetryConfig::default(),
            Self::Production => RetryConfig::patient(),
        }
    }
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    /// Base URL of a Nominatim-compatible API
    pub base_url: String,
    /// User-Agent header (Nominatim rejects anonymous clients)
    pub user_agent: String,
    /// Contact address sent as the `email` parameter
    pub email: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Retry configuration
    pub retry: RetryConfig,
    /// Current environment
    pub environment: Environment,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self::from(&GeocoderSection::default())
    }
}

impl From<&GeocoderSection> for GeocoderConfig {
    fn from(section: &GeocoderSection) -> Self {
        let environment = Environment::default();
        Self {
            base_url: section.base_url.clone(),
            user_agent: section.user_agent.clone(),
            email: section.email.clone(),
            timeout: Duration::from_secs(section.timeout_secs),
            retry: environment.retry(),
            environment,
        }
    }
}

impl GeocoderConfig {
    /// Create configuration from environment variables over defaults
    ///
    /// Reads the following environment variables:
    /// - `PORTMATCH_GEOCODER_URL`: API base URL
    /// - `PORTMATCH_USER_AGENT`: User-Agent header
    /// - `PORTMATCH_TIMEOUT_SECS`: Request timeout in seconds
    /// - `PORTMATCH_CONTACT_EMAIL`: Contact address for the provider
    /// - `PORTMATCH_ENV`: Environment (development/staging/production)
    pub fn from_env() -> GeocodeResult<Self> {
        let config = Self::default().with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply process environment overrides
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    #[must_use]
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("PORTMATCH_GEOCODER_URL") {
            self.base_url = url;
        }
        if let Some(agent) = lookup("PORTMATCH_USER_AGENT") {
            self.user_agent = agent;
        }
        if let Some(secs) = lookup("PORTMATCH_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(email) = lookup("PORTMATCH_CONTACT_EMAIL") {
            self.email = Some(email);
        }
        if let Some(name) = lookup("PORTMATCH_ENV") {
            self.environment = Environment::parse(&name);
            self.retry = self.environment.retry();
        }
        self
    }

    /// Builder-style method to set base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Builder-style method to set timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder-style method to set retry config
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> GeocodeResult<()> {
        if self.base_url.is_empty() {
            return Err(GeocodeError::config("base_url cannot be empty"));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(GeocodeError::config("base_url must start with http:// or https://"));
        }

        if self.user_agent.trim().is_empty() {
            return Err(GeocodeError::config("user_agent cannot be empty"));
        }

        if self.timeout.is_zero() {
            return Err(GeocodeError::config("timeout cannot be zero"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = GeocoderConfig::default();
        assert_eq!(config.base_url, "https://nominatim.openstreetmap.org");
        assert!(config.user_agent.starts_with("portmatch/"));
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.environment, Environment::Production);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!(Environment::parse("dev"), Environment::Development);
        assert_eq!(Environment::parse(" Staging "), Environment::Staging);
        assert_eq!(Environment::parse(""), Environment::Production);
        assert_eq!(Environment::Development.retry().max_attempts, RetryConfig::quick().max_attempts);
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("PORTMATCH_GEOCODER_URL", "http://localhost:8080"),
            ("PORTMATCH_TIMEOUT_SECS", "3"),
            ("PORTMATCH_CONTACT_EMAIL", "ops@example.com"),
            ("PORTMATCH_ENV", "development"),
        ]);
        let config = GeocoderConfig::default()
            .with_overrides_from(|key| vars.get(key).map(|v| (*v).to_string()));

        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.email.as_deref(), Some("ops@example.com"));
        assert_eq!(config.environment, Environment::Development);
        assert!(config.user_agent.starts_with("portmatch/"));
    }

    #[test]
    fn test_unparseable_timeout_ignored() {
        let config = GeocoderConfig::default()
            .with_overrides_from(|key| (key == "PORTMATCH_TIMEOUT_SECS").then(|| "soon".to_string()));
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_validation() {
        assert!(GeocoderConfig::default().with_base_url("").validate().is_err());
        assert!(GeocoderConfig::default().with_base_url("ftp://x").validate().is_err());
        assert!(GeocoderConfig::default().with_timeout(Duration::ZERO).validate().is_err());

        let mut anonymous = GeocoderConfig::default();
        anonymous.user_agent = "  ".to_string();
        assert!(anonymous.validate().is_err());
    }
}
