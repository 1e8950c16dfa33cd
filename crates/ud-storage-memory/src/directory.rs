//! Static read-only directory.
//!
//! A fixed set of identities declared in configuration, for deployments
//! without an external directory server and for tests. Declared passwords
//! are hashed on load; the plaintext is not retained.

use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use ud_core::StaticDirectoryConfig;
use ud_model::{
    Credential, CredentialReference, Origin, UserAttributes, UserIdentity, Username,
    UsernamePolicy,
};
use ud_storage::{ReadOnlyDirectory, StorageError, StorageResult, UsernameStream};

use crate::password::PasswordHasherService;

struct StaticEntry {
    identity: UserIdentity,
    password_hash: Option<String>,
}

/// Read-only directory backed by a fixed list of users.
pub struct StaticDirectory {
    entries: BTreeMap<Username, StaticEntry>,
    hasher: PasswordHasherService,
}

impl StaticDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new(hasher: PasswordHasherService) -> Self {
        Self {
            entries: BTreeMap::new(),
            hasher,
        }
    }

    /// Builds a directory from its configuration section.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::InvalidData` if a username does not satisfy the
    /// policy or is declared twice.
    pub fn from_config(
        config: &StaticDirectoryConfig,
        policy: UsernamePolicy,
        hasher: PasswordHasherService,
    ) -> StorageResult<Self> {
        let mut directory = Self::new(hasher);
        for user in &config.users {
            let username = policy
                .parse(&user.username)
                .map_err(|e| StorageError::InvalidData(e.to_string()))?;

            let mut attributes = UserAttributes::new();
            attributes.display_name.clone_from(&user.display_name);
            attributes.email.clone_from(&user.email);

            directory.insert(username, attributes, user.password.as_deref())?;
        }

        tracing::info!(users = directory.entries.len(), "Static directory loaded");
        Ok(directory)
    }

    /// Adds an entry.
    ///
    /// A `None` password declares an identity that never authenticates.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::InvalidData` if the username is already declared.
    pub fn insert(
        &mut self,
        username: Username,
        attributes: UserAttributes,
        password: Option<&str>,
    ) -> StorageResult<()> {
        if self.entries.contains_key(&username) {
            return Err(StorageError::InvalidData(format!(
                "user '{username}' declared twice"
            )));
        }

        let password_hash = password.map(|p| self.hasher.hash(p)).transpose()?;
        let credential = if password_hash.is_some() {
            CredentialReference::DirectoryEntry {
                dn: format!("uid={username}"),
            }
        } else {
            CredentialReference::None
        };
        let identity = UserIdentity::new(username.clone(), Origin::ReadOnly)
            .with_attributes(attributes)
            .with_credential(credential);

        self.entries.insert(
            username,
            StaticEntry {
                identity,
                password_hash,
            },
        );
        Ok(())
    }

    /// Returns the number of declared users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no users are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl ReadOnlyDirectory for StaticDirectory {
    fn directory_type(&self) -> &'static str {
        "static"
    }

    async fn exists(&self, username: &Username) -> StorageResult<bool> {
        Ok(self.entries.contains_key(username))
    }

    async fn get(&self, username: &Username) -> StorageResult<Option<UserIdentity>> {
        Ok(self.entries.get(username).map(|e| e.identity.clone()))
    }

    async fn verify_credential(
        &self,
        username: &Username,
        credential: &Credential,
    ) -> StorageResult<bool> {
        match self.entries.get(username).and_then(|e| e.password_hash.as_deref()) {
            Some(hash) => self.hasher.verify(credential.expose(), hash),
            None => Ok(false),
        }
    }

    fn list(&self) -> UsernameStream<'_> {
        stream::iter(self.entries.keys().cloned().map(Ok)).boxed()
    }
}
