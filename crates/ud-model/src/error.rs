//! Model validation errors.

use thiserror::Error;

/// Errors raised while constructing domain values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// The username does not satisfy the active username policy.
    #[error("invalid username '{username}': {reason}")]
    InvalidUsername {
        /// The rejected input.
        username: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}

impl ModelError {
    /// Creates an invalid username error.
    #[must_use]
    pub fn invalid_username(username: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidUsername {
            username: username.into(),
            reason,
        }
    }
}

/// Result type for model construction.
pub type ModelResult<T> = Result<T, ModelError>;
