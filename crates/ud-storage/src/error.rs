//! Storage error types.

use thiserror::Error;

/// Errors that can occur in a leaf backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Record not found.
    #[error("{entity_type} '{name}' not found")]
    NotFound {
        /// Type of record (e.g., "User", "Delegation").
        entity_type: &'static str,
        /// Record key.
        name: String,
    },

    /// Record already present (unique key violation).
    #[error("{entity_type} '{name}' already exists")]
    Duplicate {
        /// Type of record.
        entity_type: &'static str,
        /// Conflicting key.
        name: String,
    },

    /// The backend does not support this operation at all.
    #[error("operation not supported by this backend: {operation}")]
    Unsupported {
        /// Rejected operation.
        operation: &'static str,
    },

    /// The backend could not be reached or did not answer.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The backend returned data that cannot be used.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Internal error.
    #[error("internal storage error: {0}")]
    Internal(String),
}

impl StorageError {
    /// Creates a not found error.
    #[must_use]
    pub fn not_found(entity_type: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            name: name.into(),
        }
    }

    /// Creates a duplicate error.
    #[must_use]
    pub fn duplicate(entity_type: &'static str, name: impl Into<String>) -> Self {
        Self::Duplicate {
            entity_type,
            name: name.into(),
        }
    }

    /// Creates an unsupported operation error.
    #[must_use]
    pub const fn unsupported(operation: &'static str) -> Self {
        Self::Unsupported { operation }
    }

    /// Creates an unavailable error.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Checks if this is a not found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Checks if this is a duplicate error.
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }

    /// Checks if this is an unsupported operation error.
    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }

    /// Checks if this is a transient backend failure.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
