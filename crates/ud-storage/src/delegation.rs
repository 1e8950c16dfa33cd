//! Delegation store trait.

use async_trait::async_trait;
use futures::stream::BoxStream;
use ud_model::{DelegationRelation, Username};

use crate::error::StorageResult;

/// Persistent set of (grantor, grantee) relations.
///
/// A relation means the grantee may act on behalf of the grantor. The store
/// does not check that either principal exists; that is the caller's job.
#[async_trait]
pub trait DelegationStore: Send + Sync {
    /// Adds a relation.
    ///
    /// Returns `true` if the relation was new. Granting an existing relation
    /// is a no-op that returns `false`.
    async fn grant(&self, grantor: &Username, grantee: &Username) -> StorageResult<bool>;

    /// Removes a relation.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if the relation doesn't exist.
    async fn revoke(&self, grantor: &Username, grantee: &Username) -> StorageResult<()>;

    /// Lists the users the grantee may act as, sorted.
    async fn list_grantors_for(&self, grantee: &Username) -> StorageResult<Vec<Username>>;

    /// Lists the users allowed to act as the grantor, sorted.
    async fn list_grantees_of(&self, grantor: &Username) -> StorageResult<Vec<Username>>;

    /// Removes every relation where `grantor` is the grantor.
    ///
    /// Returns the number of relations removed.
    async fn clear_grantor(&self, grantor: &Username) -> StorageResult<usize>;

    /// Streams every relation in the store.
    fn relations(&self) -> BoxStream<'_, StorageResult<DelegationRelation>>;

    /// Checks whether a single relation is present.
    async fn is_granted(&self, grantor: &Username, grantee: &Username) -> StorageResult<bool> {
        Ok(self.list_grantors_for(grantee).await?.contains(grantor))
    }
}
