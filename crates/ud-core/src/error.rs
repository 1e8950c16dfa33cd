//! Configuration error types.
//!
//! Configuration errors are fatal: they abort initialization and the
//! directory never serves requests with a configuration that failed here.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read configuration file {path}: {source}")]
    Io {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration is not valid TOML or does not match the schema.
    #[error("cannot parse configuration: {0}")]
    Parse(String),

    /// A required field is absent or empty.
    #[error("missing required configuration field '{0}'")]
    Missing(&'static str),

    /// A field is present but unusable.
    #[error("invalid configuration field '{field}': {reason}")]
    Invalid {
        /// Offending field (dotted path).
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

impl ConfigError {
    /// Creates an invalid field error.
    #[must_use]
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
