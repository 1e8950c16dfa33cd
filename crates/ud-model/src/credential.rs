//! Credential model.
//!
//! ## Security Note
//!
//! [`Credential`] wraps the plaintext secret presented by a caller. Its
//! `Debug` output is redacted and it does not implement `Serialize`, so it
//! cannot end up in logs or audit records by accident.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A plaintext credential presented for creation or verification.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a plaintext secret.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Exposes the secret to a verifier or hasher.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns true if the secret is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Where the verifier for an identity's credential lives.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum CredentialReference {
    /// No credential is attached; authentication always fails.
    #[default]
    None,
    /// A hash held by the writable store.
    Local {
        /// Hash algorithm identifier (e.g. `argon2id`).
        algorithm: String,
    },
    /// A directory entry verified by binding against the external directory.
    DirectoryEntry {
        /// Distinguished name of the entry.
        dn: String,
    },
}

impl CredentialReference {
    /// Returns true if a verifier is attached.
    #[must_use]
    pub const fn is_present(&self) -> bool {
        !matches!(self, Self::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_is_redacted() {
        let credential = Credential::new("hunter2");
        let rendered = format!("{credential:?}");
        assert!(!rendered.contains("hunter2"));
        assert_eq!(credential.expose(), "hunter2");
    }

    #[test]
    fn reference_presence() {
        assert!(!CredentialReference::None.is_present());
        assert!(CredentialReference::Local {
            algorithm: "argon2id".to_string()
        }
        .is_present());
    }
}
