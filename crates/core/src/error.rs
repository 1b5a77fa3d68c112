//! Coded errors for configuration and storage
//!
//! Every error carries a numeric [`ErrorCode`], an optional context line and
//! an optional hint telling the user how to recover.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // IO (2xxx)
    IoError = 2000,
    FileNotFound = 2001,
    PermissionDenied = 2002,

    // Configuration (3xxx)
    ConfigNotFound = 3001,
    ConfigParseError = 3002,
    InvalidConfigValue = 3004,

    // Storage (4xxx)
    StorageError = 4000,
    StorageKeyInvalid = 4001,
    StorageLockPoisoned = 4002,
    SerializationError = 4003,
}

impl ErrorCode {
    /// Numeric value
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Category name derived from the thousands digit
    pub fn category(self) -> &'static str {
        match self.code() / 1000 {
            2 => "IO",
            3 => "Configuration",
            4 => "Storage",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

/// Error shared by the configuration loader and the storage backends
#[derive(Error, Debug)]
pub struct Error {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// What was being done when it failed
    pub context: Option<String>,
    /// How to recover
    pub suggestion: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.context {
            Some(ctx) => write!(f, "{ctx}: {} ({})", self.message, self.code)?,
            None => write!(f, "{} ({})", self.message, self.code)?,
        }
        if let Some(hint) = &self.suggestion {
            write!(f, "\n  hint: {hint}")?;
        }
        Ok(())
    }
}

impl Error {
    /// Create a new error
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            suggestion: None,
            source: None,
        }
    }

    /// Attach what was being done
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Attach a recovery hint
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    #[must_use]
    fn caused_by(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Explicitly requested configuration file is missing
    pub fn config_not_found(path: impl AsRef<std::path::Path>) -> Self {
        Self::new(
            ErrorCode::ConfigNotFound,
            format!("Configuration file not found: {}", path.as_ref().display()),
        )
        .with_suggestion("Create a .portmatch.toml file or pass --config with a valid path")
    }

    /// Out-of-range or otherwise unusable configuration value
    pub fn invalid_config_value(key: &str, reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InvalidConfigValue,
            format!("Invalid value for `{key}`: {}", reason.into()),
        )
    }

    /// Key-value store failure
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageError, message)
    }

    /// Storage key that cannot be mapped onto the backing store
    pub fn invalid_key(key: &str) -> Self {
        Self::new(ErrorCode::StorageKeyInvalid, format!("Invalid storage key: {key:?}"))
            .with_suggestion("Use keys made of ASCII letters, digits, '-', '_' and '.'")
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorCode::PermissionDenied,
            _ => ErrorCode::IoError,
        };
        Error::new(code, err.to_string()).caused_by(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::new(ErrorCode::SerializationError, format!("JSON error: {err}")).caused_by(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::new(ErrorCode::ConfigParseError, format!("TOML parse error: {err}")).caused_by(err)
    }
}

/// Attach context to a failed [`Result`]
pub trait ResultExt<T> {
    /// Record what was being done when the error happened
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::FileNotFound.to_string(), "E2001");
        assert_eq!(ErrorCode::StorageError.to_string(), "E4000");
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::IoError.category(), "IO");
        assert_eq!(ErrorCode::StorageKeyInvalid.category(), "Storage");
        assert_eq!(ErrorCode::InvalidConfigValue.category(), "Configuration");
    }

    #[test]
    fn test_display_includes_context_and_hint() {
        let err = Error::config_not_found("/etc/portmatch.toml").with_context("Loading resolver settings");

        assert_eq!(err.code, ErrorCode::ConfigNotFound);
        let shown = err.to_string();
        assert!(shown.starts_with("Loading resolver settings: Configuration file not found"));
        assert!(shown.contains("(E3001)"));
        assert!(shown.contains("hint: Create a .portmatch.toml"));
    }

    #[test]
    fn test_io_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only volume");
        let err = Error::from(io);
        assert_eq!(err.code, ErrorCode::PermissionDenied);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_result_ext_adds_context() {
        let result: Result<()> = Err(Error::storage("boom"));
        let err = result.context("reading cache").unwrap_err();
        assert_eq!(err.context.as_deref(), Some("reading cache"));
    }
}
