//! Core error types for replybell-core.
//!
//! Only configuration errors are ever surfaced to the caller as failures.
//! Query and channel errors are caught where they happen, logged, and
//! degrade to "not busy" or "action failed" respectively. Front ends fold
//! their own I/O and serialization failures into [`CoreError`] as well.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for replybell-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Two threshold keys parse to the same number of seconds
    #[error("Duplicate notification threshold {seconds}s (keys '{first}' and '{second}')")]
    DuplicateThreshold {
        seconds: f64,
        first: String,
        second: String,
    },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// The host page could not be queried for its controls.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// The page is not available (not loaded yet, closed, unreadable)
    #[error("host page unavailable: {0}")]
    Unavailable(String),

    /// The page answered with something that is not a control list
    #[error("unexpected control data: {0}")]
    Malformed(String),
}

/// An alerting channel refused or failed to perform an action.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChannelError {
    /// The environment has no such capability
    #[error("{0} not supported in this environment")]
    Unsupported(&'static str),

    /// The capability exists but the call failed
    #[error("{channel} failed: {message}")]
    Failed {
        channel: &'static str,
        message: String,
    },
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    fn load(path: &str) -> Result<()> {
        Err(ConfigError::LoadFailed {
            path: PathBuf::from(path),
            message: "missing".to_string(),
        })?;
        Ok(())
    }

    fn parse(text: &str) -> Result<serde_json::Value> {
        Ok(serde_json::from_str(text)?)
    }

    fn write() -> Result<()> {
        Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))?;
        Ok(())
    }

    #[test]
    fn test_question_mark_wraps_source_errors() {
        let err = load("/tmp/replybell.toml").unwrap_err();
        assert!(matches!(err, CoreError::Config(ConfigError::LoadFailed { .. })));
        assert!(err.to_string().starts_with("Configuration error: Failed to load"));

        assert!(matches!(parse("{ nope").unwrap_err(), CoreError::Json(_)));
        assert!(matches!(write().unwrap_err(), CoreError::Io(_)));
    }

    #[test]
    fn test_toml_errors_become_parse_failures() {
        let err: ConfigError = toml::from_str::<toml::Value>("= broken").unwrap_err().into();
        assert!(matches!(err, ConfigError::ParseFailed(_)));
    }
}
