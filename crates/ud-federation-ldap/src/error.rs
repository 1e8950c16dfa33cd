//! LDAP-specific error types.
//!
//! ## Security Note
//!
//! Error messages must not carry passwords or bind credentials.

use thiserror::Error;
use ud_storage::StorageError;

/// LDAP-specific errors.
#[derive(Debug, Error)]
pub enum LdapError {
    /// Invalid configuration.
    #[error("LDAP configuration error: {0}")]
    Configuration(String),

    /// Connection URL must use LDAPS.
    #[error("Only LDAPS is supported: the URL must start with 'ldaps://'")]
    InsecureProtocol,

    /// Connection failed.
    #[error("LDAP connection failed: {0}")]
    Connection(String),

    /// Bind failed for a reason other than rejected credentials.
    #[error("LDAP bind failed: {0}")]
    Bind(String),

    /// The server rejected the configured service account credentials.
    #[error("LDAP service account credentials rejected: {0}")]
    ServiceBindRejected(String),

    /// Search operation failed.
    #[error("LDAP search failed: {0}")]
    Search(String),

    /// An entry could not be mapped to a user.
    #[error("Attribute mapping error: {0}")]
    AttributeMapping(String),

    /// Timeout error.
    #[error("LDAP operation timed out")]
    Timeout,

    /// The pool was closed while waiting for a connection.
    #[error("Connection pool closed")]
    PoolClosed,

    /// Underlying ldap3 error.
    #[error("LDAP error: {0}")]
    Ldap3(#[from] ldap3::LdapError),
}

impl LdapError {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates an attribute mapping error.
    #[must_use]
    pub fn mapping(msg: impl Into<String>) -> Self {
        Self::AttributeMapping(msg.into())
    }

    /// Checks if this error means the server could not be used.
    #[must_use]
    pub const fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection(_)
                | Self::Bind(_)
                | Self::Search(_)
                | Self::Timeout
                | Self::PoolClosed
                | Self::Ldap3(_)
        )
    }
}

/// Result type for LDAP operations.
pub type LdapResult<T> = Result<T, LdapError>;

impl From<LdapError> for StorageError {
    fn from(err: LdapError) -> Self {
        if err.is_connection_error() {
            return Self::Unavailable(err.to_string());
        }
        match err {
            LdapError::AttributeMapping(msg) => Self::InvalidData(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}
