//! Maps LDAP entries to user identities.

use std::sync::Arc;

use ud_model::{CredentialReference, Origin, UserAttributes, UserIdentity, Username, UsernamePolicy};

use crate::config::LdapSettings;
use crate::error::{LdapError, LdapResult};
use crate::search::LdapEntry;

/// Maps user entries using the configured attribute names.
#[derive(Debug, Clone)]
pub struct LdapUserMapper {
    settings: Arc<LdapSettings>,
    policy: UsernamePolicy,
}

impl LdapUserMapper {
    /// Creates a mapper.
    #[must_use]
    pub const fn new(settings: Arc<LdapSettings>, policy: UsernamePolicy) -> Self {
        Self { settings, policy }
    }

    /// Extracts the normalized username of an entry.
    ///
    /// ## Errors
    ///
    /// Returns `LdapError::AttributeMapping` if the username attribute is
    /// missing or rejected by the username policy.
    pub fn username(&self, entry: &LdapEntry) -> LdapResult<Username> {
        let attribute = &self.settings.username_attribute;
        let raw = entry.get_attr(attribute).ok_or_else(|| {
            LdapError::mapping(format!("entry '{}' has no '{attribute}' value", entry.dn))
        })?;
        self.policy
            .parse(raw)
            .map_err(|e| LdapError::mapping(format!("entry '{}': {e}", entry.dn)))
    }

    /// Maps an entry to a read-only identity whose credential is verified
    /// by binding as the entry's DN.
    ///
    /// ## Errors
    ///
    /// See [`LdapUserMapper::username`].
    pub fn map_to_user(&self, entry: &LdapEntry) -> LdapResult<UserIdentity> {
        let username = self.username(entry)?;

        let mut attributes = UserAttributes::new();
        if let Some(name) = entry.get_attr(&self.settings.display_name_attribute) {
            attributes = attributes.with_display_name(name);
        }
        if let Some(email) = entry.get_attr(&self.settings.email_attribute) {
            attributes = attributes.with_email(email);
        }

        Ok(UserIdentity::new(username, Origin::ReadOnly)
            .with_attributes(attributes)
            .with_credential(CredentialReference::DirectoryEntry {
                dn: entry.dn.clone(),
            }))
    }
}
