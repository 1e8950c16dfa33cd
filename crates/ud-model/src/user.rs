//! User identity model.
//!
//! A [`UserIdentity`] is the effective record returned for a username once
//! the directory has resolved which backend owns it. Usernames are only
//! constructed through a [`UsernamePolicy`], so every [`Username`] in the
//! process has already been normalized the same way.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::credential::CredentialReference;
use crate::error::{ModelError, ModelResult};

// ============================================================================
// Username
// ============================================================================

/// A normalized username.
///
/// Obtain one through [`UsernamePolicy::parse`]; there is no public
/// constructor that skips normalization.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Returns the normalized username.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the local part (everything before `@`, or the whole name).
    #[must_use]
    pub fn local_part(&self) -> &str {
        self.0.split_once('@').map_or(self.0.as_str(), |(local, _)| local)
    }

    /// Returns the domain part when the username is virtual-hosted.
    #[must_use]
    pub fn domain(&self) -> Option<&str> {
        self.0.split_once('@').map(|(_, domain)| domain)
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Username normalization rules, fixed when the directory is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UsernamePolicy {
    /// Keep the case of the local part as given.
    pub case_sensitive: bool,
    /// Require `local@domain` usernames.
    pub virtual_hosting: bool,
}

impl UsernamePolicy {
    /// Creates a policy.
    #[must_use]
    pub const fn new(case_sensitive: bool, virtual_hosting: bool) -> Self {
        Self {
            case_sensitive,
            virtual_hosting,
        }
    }

    /// Normalizes and validates a raw username.
    ///
    /// ## Errors
    ///
    /// Returns `ModelError::InvalidUsername` when the input is empty, contains
    /// whitespace or control characters, or does not match the virtual
    /// hosting mode.
    pub fn parse(&self, raw: &str) -> ModelResult<Username> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ModelError::invalid_username(raw, "username cannot be empty"));
        }
        if trimmed
            .chars()
            .any(|c| c.is_whitespace() || c.is_control())
        {
            return Err(ModelError::invalid_username(
                raw,
                "username cannot contain whitespace or control characters",
            ));
        }

        let normalized = match (self.virtual_hosting, trimmed.split_once('@')) {
            (true, Some((local, domain))) => {
                if local.is_empty() || domain.is_empty() || domain.contains('@') {
                    return Err(ModelError::invalid_username(
                        raw,
                        "expected exactly one '@' between local part and domain",
                    ));
                }
                format!("{}@{}", self.normalize_case(local), domain.to_lowercase())
            }
            (true, None) => {
                return Err(ModelError::invalid_username(
                    raw,
                    "virtual hosting requires a domain part",
                ));
            }
            (false, Some(_)) => {
                return Err(ModelError::invalid_username(
                    raw,
                    "domain parts are not allowed without virtual hosting",
                ));
            }
            (false, None) => self.normalize_case(trimmed),
        };

        Ok(Username(normalized))
    }

    fn normalize_case(&self, value: &str) -> String {
        if self.case_sensitive {
            value.to_string()
        } else {
            value.to_lowercase()
        }
    }
}

// ============================================================================
// Origin
// ============================================================================

/// Which leaf backend owns an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Origin {
    /// The writable, authoritative identity store.
    Writable,
    /// The externally synchronized, read-only directory.
    ReadOnly,
}

impl Origin {
    /// Returns the string representation used in logs and audit records.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Writable => "writable",
            Self::ReadOnly => "read-only",
        }
    }

    /// Returns true if identities of this origin may be mutated.
    #[must_use]
    pub const fn is_mutable(&self) -> bool {
        matches!(self, Self::Writable)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Attributes
// ============================================================================

/// Display attributes carried by an identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAttributes {
    /// Human readable name.
    pub display_name: Option<String>,
    /// Contact address.
    pub email: Option<String>,
    /// Backend specific attributes (multi-valued).
    #[serde(default)]
    pub extra: BTreeMap<String, Vec<String>>,
}

impl UserAttributes {
    /// Creates an empty attribute set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Sets the email address.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets a multi-valued backend attribute.
    #[must_use]
    pub fn with_extra(mut self, name: impl Into<String>, values: Vec<String>) -> Self {
        self.extra.insert(name.into(), values);
        self
    }

    /// Gets the first value of a backend attribute.
    #[must_use]
    pub fn first_extra(&self, name: &str) -> Option<&str> {
        self.extra
            .get(name)
            .and_then(|v| v.first())
            .map(String::as_str)
    }
}

// ============================================================================
// User identity
// ============================================================================

/// A resolved user identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserIdentity {
    /// Normalized username, unique per backend.
    pub username: Username,
    /// Backend that owns this record.
    pub origin: Origin,
    /// Display and backend attributes.
    pub attributes: UserAttributes,
    /// Where the credential verifier lives.
    pub credential: CredentialReference,
}

impl UserIdentity {
    /// Creates an identity with no attributes.
    #[must_use]
    pub fn new(username: Username, origin: Origin) -> Self {
        Self {
            username,
            origin,
            attributes: UserAttributes::default(),
            credential: CredentialReference::None,
        }
    }

    /// Sets the attributes.
    #[must_use]
    pub fn with_attributes(mut self, attributes: UserAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Sets the credential reference.
    #[must_use]
    pub fn with_credential(mut self, credential: CredentialReference) -> Self {
        self.credential = credential;
        self
    }

    /// Returns true if this identity may be mutated.
    #[must_use]
    pub const fn is_writable(&self) -> bool {
        self.origin.is_mutable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_insensitive_policy_lowercases() {
        let policy = UsernamePolicy::default();
        let username = policy.parse("  Alice ").unwrap();
        assert_eq!(username.as_str(), "alice");
    }

    #[test]
    fn case_sensitive_policy_keeps_case() {
        let policy = UsernamePolicy::new(true, false);
        assert_eq!(policy.parse("Alice").unwrap().as_str(), "Alice");
        assert_ne!(policy.parse("Alice").unwrap(), policy.parse("alice").unwrap());
    }

    #[test]
    fn rejects_empty_and_whitespace() {
        let policy = UsernamePolicy::default();
        assert!(policy.parse("").is_err());
        assert!(policy.parse("   ").is_err());
        assert!(policy.parse("john doe").is_err());
        assert!(policy.parse("tab\there").is_err());
    }

    #[test]
    fn virtual_hosting_requires_domain() {
        let policy = UsernamePolicy::new(true, true);
        assert!(policy.parse("bob").is_err());
        assert!(policy.parse("@example.com").is_err());
        assert!(policy.parse("bob@").is_err());
        assert!(policy.parse("a@b@c").is_err());

        let username = policy.parse("Bob@Example.COM").unwrap();
        assert_eq!(username.as_str(), "Bob@example.com");
        assert_eq!(username.local_part(), "Bob");
        assert_eq!(username.domain(), Some("example.com"));
    }

    #[test]
    fn domain_rejected_without_virtual_hosting() {
        let policy = UsernamePolicy::default();
        let err = policy.parse("bob@example.com").unwrap_err();
        assert!(err.to_string().contains("virtual hosting"));
    }

    #[test]
    fn origin_mutability() {
        assert!(Origin::Writable.is_mutable());
        assert!(!Origin::ReadOnly.is_mutable());
        assert_eq!(Origin::ReadOnly.to_string(), "read-only");
    }

    #[test]
    fn identity_builder() {
        let username = UsernamePolicy::default().parse("carol").unwrap();
        let identity = UserIdentity::new(username, Origin::ReadOnly).with_attributes(
            UserAttributes::new()
                .with_display_name("Carol")
                .with_extra("department", vec!["Ops".to_string()]),
        );

        assert!(!identity.is_writable());
        assert_eq!(identity.attributes.display_name.as_deref(), Some("Carol"));
        assert_eq!(identity.attributes.first_extra("department"), Some("Ops"));
        assert_eq!(identity.credential, CredentialReference::None);
    }

    #[test]
    fn username_serializes_as_plain_string() {
        let username = UsernamePolicy::default().parse("dave").unwrap();
        assert_eq!(serde_json::to_string(&username).unwrap(), "\"dave\"");
    }
}
