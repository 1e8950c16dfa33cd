//! Authorization error types.

use std::fmt;

use ud_federation::FederationError;
use ud_storage::StorageError;

/// Delegation and authorization errors.
#[derive(Debug)]
pub enum AuthError {
    /// A principal or relation does not exist.
    NotFound(String),
    /// The user directory failed while resolving a principal.
    Directory(FederationError),
    /// The delegation store failed.
    Storage(StorageError),
}

impl AuthError {
    /// Checks if this is a not found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Checks if the caller may retry.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Directory(e) => e.is_transient(),
            Self::Storage(e) => e.is_unavailable(),
            Self::NotFound(_) => false,
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(what) => write!(f, "{what} not found"),
            Self::Directory(e) => write!(f, "directory error: {e}"),
            Self::Storage(e) => write!(f, "delegation store error: {e}"),
        }
    }
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Directory(e) => Some(e),
            Self::Storage(e) => Some(e),
            Self::NotFound(_) => None,
        }
    }
}

impl From<FederationError> for AuthError {
    fn from(err: FederationError) -> Self {
        Self::Directory(err)
    }
}

impl From<StorageError> for AuthError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { entity_type, name } => {
                Self::NotFound(format!("{entity_type} '{name}'"))
            }
            other => Self::Storage(other),
        }
    }
}

/// Result type for authorization operations.
pub type AuthResult<T> = Result<T, AuthError>;
