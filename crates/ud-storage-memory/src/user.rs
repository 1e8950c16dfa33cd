//! Writable identity store.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use ud_model::{
    Credential, CredentialReference, Origin, UserAttributes, UserIdentity, Username,
};
use ud_storage::{StorageError, StorageResult, UserRepository, UsernameStream};

use crate::password::PasswordHasherService;

const ENTITY: &str = "User";

#[derive(Clone)]
struct StoredUser {
    identity: UserIdentity,
    password_hash: Option<String>,
}

/// Authoritative, mutable identity store held in process memory.
///
/// Each username maps to one shard entry, so single-username mutations are
/// atomic and mutations on different usernames never contend on a global
/// lock. Hashing happens before an entry is locked.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: DashMap<Username, StoredUser>,
    hasher: PasswordHasherService,
}

impl InMemoryUserStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(hasher: PasswordHasherService) -> Self {
        Self {
            users: DashMap::new(),
            hasher,
        }
    }

    /// Returns the credential hasher.
    #[must_use]
    pub const fn hasher(&self) -> &PasswordHasherService {
        &self.hasher
    }

    fn insert(
        &self,
        username: &Username,
        attributes: UserAttributes,
        password_hash: Option<String>,
    ) -> StorageResult<UserIdentity> {
        match self.users.entry(username.clone()) {
            Entry::Occupied(_) => Err(StorageError::duplicate(ENTITY, username.as_str())),
            Entry::Vacant(slot) => {
                let credential = if password_hash.is_some() {
                    self.credential_reference()
                } else {
                    CredentialReference::None
                };
                let identity = UserIdentity::new(username.clone(), Origin::Writable)
                    .with_attributes(attributes)
                    .with_credential(credential);
                slot.insert(StoredUser {
                    identity: identity.clone(),
                    password_hash,
                });
                tracing::debug!(username = %username, "Stored writable identity");
                Ok(identity)
            }
        }
    }

    fn credential_reference(&self) -> CredentialReference {
        CredentialReference::Local {
            algorithm: self.hasher.policy().algorithm.as_str().to_string(),
        }
    }

    /// Replaces an outdated hash after a successful verification, unless the
    /// credential changed in the meantime.
    fn upgrade_hash(&self, username: &Username, secret: &str, previous: &str) {
        let fresh = match self.hasher.hash(secret) {
            Ok(hash) => hash,
            Err(e) => {
                tracing::warn!(username = %username, error = %e, "Credential rehash failed");
                return;
            }
        };

        if let Some(mut stored) = self.users.get_mut(username) {
            if stored.password_hash.as_deref() == Some(previous) {
                stored.password_hash = Some(fresh);
                stored.identity.credential = self.credential_reference();
                tracing::debug!(username = %username, "Credential rehashed with current policy");
            }
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserStore {
    fn origin(&self) -> Origin {
        Origin::Writable
    }

    async fn exists(&self, username: &Username) -> StorageResult<bool> {
        Ok(self.users.contains_key(username))
    }

    async fn get(&self, username: &Username) -> StorageResult<Option<UserIdentity>> {
        Ok(self.users.get(username).map(|u| u.identity.clone()))
    }

    async fn create(
        &self,
        username: &Username,
        credential: &Credential,
        attributes: UserAttributes,
    ) -> StorageResult<UserIdentity> {
        let password_hash = self.hasher.hash(credential.expose())?;
        self.insert(username, attributes, Some(password_hash))
    }

    async fn create_without_credential(
        &self,
        username: &Username,
        attributes: UserAttributes,
    ) -> StorageResult<UserIdentity> {
        self.insert(username, attributes, None)
    }

    async fn update(
        &self,
        username: &Username,
        attributes: UserAttributes,
    ) -> StorageResult<UserIdentity> {
        let mut stored = self
            .users
            .get_mut(username)
            .ok_or_else(|| StorageError::not_found(ENTITY, username.as_str()))?;
        stored.identity.attributes = attributes;
        Ok(stored.identity.clone())
    }

    async fn delete(&self, username: &Username) -> StorageResult<()> {
        self.users
            .remove(username)
            .map(|_| ())
            .ok_or_else(|| StorageError::not_found(ENTITY, username.as_str()))
    }

    async fn change_credential(
        &self,
        username: &Username,
        credential: &Credential,
    ) -> StorageResult<()> {
        if !self.users.contains_key(username) {
            return Err(StorageError::not_found(ENTITY, username.as_str()));
        }
        let password_hash = self.hasher.hash(credential.expose())?;

        let mut stored = self
            .users
            .get_mut(username)
            .ok_or_else(|| StorageError::not_found(ENTITY, username.as_str()))?;
        stored.password_hash = Some(password_hash);
        stored.identity.credential = self.credential_reference();
        Ok(())
    }

    async fn verify_credential(
        &self,
        username: &Username,
        credential: &Credential,
    ) -> StorageResult<bool> {
        // Copy the hash out so no shard lock is held while Argon2 runs.
        let Some(hash) = self
            .users
            .get(username)
            .and_then(|u| u.password_hash.clone())
        else {
            return Ok(false);
        };

        let verified = self.hasher.verify(credential.expose(), &hash)?;
        if verified && self.hasher.needs_rehash(&hash) {
            self.upgrade_hash(username, credential.expose(), &hash);
        }
        Ok(verified)
    }

    fn list(&self) -> UsernameStream<'_> {
        let mut names: Vec<Username> = self.users.iter().map(|e| e.key().clone()).collect();
        names.sort();
        stream::iter(names.into_iter().map(Ok)).boxed()
    }

    async fn count(&self) -> StorageResult<usize> {
        Ok(self.users.len())
    }
}
