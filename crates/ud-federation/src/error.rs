//! Federation error types.
//!
//! Leaf errors are converted with the [`Origin`] of the backend that raised
//! them, so a caller can tell a writable-store outage from a directory
//! outage. An outage is never folded into "not found".

use thiserror::Error;
use ud_core::ConfigError;
use ud_model::{ModelError, Origin};
use ud_storage::StorageError;

/// Errors returned by the combined user directory.
#[derive(Debug, Error)]
pub enum FederationError {
    /// Create on a username already present in the writable store.
    #[error("{entity_type} '{name}' already exists")]
    AlreadyExists {
        /// Type of record.
        entity_type: &'static str,
        /// Conflicting key.
        name: String,
    },

    /// Mutation or revocation of an absent record.
    #[error("{entity_type} '{name}' not found")]
    NotFound {
        /// Type of record.
        entity_type: &'static str,
        /// Missing key.
        name: String,
    },

    /// Mutation attempted against a backend that does not support it.
    #[error("Operation not supported by the {origin} backend: {operation}")]
    UnsupportedOperation {
        /// Rejected operation.
        operation: &'static str,
        /// Backend that rejected it.
        origin: Origin,
    },

    /// Configuration error (fatal, startup only).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Transient I/O failure from one of the leaves.
    #[error("{origin} backend unavailable: {message}")]
    BackendUnavailable {
        /// Backend that failed.
        origin: Origin,
        /// Failure description.
        message: String,
    },

    /// Username rejected by the normalization policy.
    #[error(transparent)]
    InvalidUsername(#[from] ModelError),

    /// Internal error.
    #[error("Internal federation error: {0}")]
    Internal(String),
}

impl FederationError {
    /// Converts a leaf error, recording which backend raised it.
    #[must_use]
    pub fn from_storage(origin: Origin, err: StorageError) -> Self {
        match err {
            StorageError::NotFound { entity_type, name } => Self::NotFound { entity_type, name },
            StorageError::Duplicate { entity_type, name } => {
                Self::AlreadyExists { entity_type, name }
            }
            StorageError::Unsupported { operation } => {
                Self::UnsupportedOperation { operation, origin }
            }
            StorageError::Unavailable(message) => Self::BackendUnavailable { origin, message },
            StorageError::InvalidData(msg) => {
                Self::Internal(format!("{origin} backend returned invalid data: {msg}"))
            }
            StorageError::Internal(msg) => Self::Internal(format!("{origin} backend: {msg}")),
        }
    }

    /// Creates a not found error for a user.
    #[must_use]
    pub fn user_not_found(username: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "User",
            name: username.into(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Checks if the caller may retry: only backend outages are transient.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::BackendUnavailable { .. })
    }

    /// Checks if this is a not found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Checks if this is an already exists error.
    #[must_use]
    pub const fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }

    /// Checks if this is an unsupported operation error.
    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedOperation { .. })
    }

    /// Returns the backend that failed, when the error came from a leaf.
    #[must_use]
    pub const fn origin(&self) -> Option<Origin> {
        match self {
            Self::UnsupportedOperation { origin, .. } | Self::BackendUnavailable { origin, .. } => {
                Some(*origin)
            }
            _ => None,
        }
    }
}

impl From<ConfigError> for FederationError {
    fn from(err: ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

/// Result type for federation operations.
pub type FederationResult<T> = Result<T, FederationError>;

/// Returns a converter for errors raised by the given leaf.
pub(crate) fn leaf(origin: Origin) -> impl Fn(StorageError) -> FederationError + Copy {
    move |err| FederationError::from_storage(origin, err)
}
