//! Read-only directory glue.
//!
//! External directories only implement the lookup half of the capability
//! set. [`ReadOnlyUserRepository`] lifts such a directory into a full
//! [`UserRepository`] whose mutators fail with
//! [`StorageError::Unsupported`]. That failure is a fixed contract, not a
//! transient error; callers decide by origin before attempting a mutation.

use async_trait::async_trait;
use ud_model::{Credential, Origin, UserAttributes, UserIdentity, Username};

use crate::error::{StorageError, StorageResult};
use crate::user::{UserRepository, UsernameStream};

/// Lookup-only view over an externally synchronized identity source.
#[async_trait]
pub trait ReadOnlyDirectory: Send + Sync {
    /// Returns the directory type identifier (e.g. `"ldap"`).
    fn directory_type(&self) -> &'static str;

    /// Checks whether the username is present.
    async fn exists(&self, username: &Username) -> StorageResult<bool> {
        Ok(self.get(username).await?.is_some())
    }

    /// Gets a user by username.
    async fn get(&self, username: &Username) -> StorageResult<Option<UserIdentity>>;

    /// Verifies a credential against the directory.
    async fn verify_credential(
        &self,
        username: &Username,
        credential: &Credential,
    ) -> StorageResult<bool>;

    /// Lists every username, fetching incrementally where the source allows.
    fn list(&self) -> UsernameStream<'_>;

    /// Checks that the directory is reachable.
    async fn test_connection(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// A [`UserRepository`] over a [`ReadOnlyDirectory`].
#[derive(Debug)]
pub struct ReadOnlyUserRepository<D> {
    directory: D,
}

impl<D: ReadOnlyDirectory> ReadOnlyUserRepository<D> {
    /// Wraps a directory.
    #[must_use]
    pub const fn new(directory: D) -> Self {
        Self { directory }
    }

    /// Returns the wrapped directory.
    #[must_use]
    pub const fn directory(&self) -> &D {
        &self.directory
    }
}

#[async_trait]
impl<D: ReadOnlyDirectory> UserRepository for ReadOnlyUserRepository<D> {
    fn origin(&self) -> Origin {
        Origin::ReadOnly
    }

    async fn exists(&self, username: &Username) -> StorageResult<bool> {
        self.directory.exists(username).await
    }

    async fn get(&self, username: &Username) -> StorageResult<Option<UserIdentity>> {
        Ok(self.directory.get(username).await?.map(|mut identity| {
            identity.origin = Origin::ReadOnly;
            identity
        }))
    }

    async fn create(
        &self,
        _username: &Username,
        _credential: &Credential,
        _attributes: UserAttributes,
    ) -> StorageResult<UserIdentity> {
        Err(StorageError::unsupported("create user"))
    }

    async fn update(
        &self,
        _username: &Username,
        _attributes: UserAttributes,
    ) -> StorageResult<UserIdentity> {
        Err(StorageError::unsupported("update user"))
    }

    async fn delete(&self, _username: &Username) -> StorageResult<()> {
        Err(StorageError::unsupported("delete user"))
    }

    async fn change_credential(
        &self,
        _username: &Username,
        _credential: &Credential,
    ) -> StorageResult<()> {
        Err(StorageError::unsupported("change credential"))
    }

    async fn verify_credential(
        &self,
        username: &Username,
        credential: &Credential,
    ) -> StorageResult<bool> {
        self.directory.verify_credential(username, credential).await
    }

    fn list(&self) -> UsernameStream<'_> {
        self.directory.list()
    }

    async fn test_connection(&self) -> StorageResult<()> {
        self.directory.test_connection().await
    }
}
