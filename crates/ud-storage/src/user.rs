//! User repository trait.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::TryStreamExt;
use ud_model::{Credential, Origin, UserAttributes, UserIdentity, Username};

use crate::error::{StorageError, StorageResult};

/// A lazy, finite stream of usernames.
pub type UsernameStream<'a> = BoxStream<'a, StorageResult<Username>>;

/// The capability set shared by both leaf backends.
///
/// Implementations must be thread-safe. Each single-username mutation must
/// be atomic with respect to concurrent operations on the same username;
/// operations on different usernames are independent.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// The origin tag stamped on identities from this backend.
    fn origin(&self) -> Origin;

    /// Checks whether the username is present in this backend.
    async fn exists(&self, username: &Username) -> StorageResult<bool> {
        Ok(self.get(username).await?.is_some())
    }

    /// Gets a user by username.
    async fn get(&self, username: &Username) -> StorageResult<Option<UserIdentity>>;

    /// Creates a user.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Duplicate` if the username is already present
    /// in this backend.
    async fn create(
        &self,
        username: &Username,
        credential: &Credential,
        attributes: UserAttributes,
    ) -> StorageResult<UserIdentity>;

    /// Creates a user with no credential attached.
    ///
    /// The record exists for lookups but never authenticates until a
    /// credential is set with [`change_credential`](Self::change_credential).
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Duplicate` if the username is already present,
    /// or `StorageError::Unsupported` if the backend cannot hold such records.
    async fn create_without_credential(
        &self,
        _username: &Username,
        _attributes: UserAttributes,
    ) -> StorageResult<UserIdentity> {
        Err(StorageError::unsupported("create user without credential"))
    }

    /// Replaces a user's attributes.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if the user doesn't exist.
    async fn update(
        &self,
        username: &Username,
        attributes: UserAttributes,
    ) -> StorageResult<UserIdentity>;

    /// Deletes a user.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if the user doesn't exist, including
    /// when it was deleted by an earlier call.
    async fn delete(&self, username: &Username) -> StorageResult<()>;

    /// Replaces a user's credential.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if the user doesn't exist.
    async fn change_credential(
        &self,
        username: &Username,
        credential: &Credential,
    ) -> StorageResult<()>;

    /// Verifies a credential against this backend's verifier.
    ///
    /// Returns `Ok(false)` for unknown users and wrong credentials alike;
    /// errors are reserved for backend failures.
    async fn verify_credential(
        &self,
        username: &Username,
        credential: &Credential,
    ) -> StorageResult<bool>;

    /// Lists every username in this backend.
    ///
    /// The stream is lazy and finite. Consistency across the whole sequence
    /// under concurrent mutation is not guaranteed.
    fn list(&self) -> UsernameStream<'_>;

    /// Counts the users in this backend.
    async fn count(&self) -> StorageResult<usize> {
        self.list().try_fold(0, |n, _| async move { Ok(n + 1) }).await
    }

    /// Checks that the backend is reachable. Called once at initialization.
    async fn test_connection(&self) -> StorageResult<()> {
        Ok(())
    }
}
