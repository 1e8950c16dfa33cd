//! Administrative delegation management.
//!
//! Unlike the raw [`DelegationStore`], this path checks that both principals
//! resolve through the combined directory before a grant is written, and it
//! records every change as an audit event.
//!
//! Relations are not removed when a user is deleted. [`DelegationAdmin::purge_dangling`]
//! is the explicit maintenance operation for that.

use std::collections::HashMap;
use std::sync::Arc;

use futures::TryStreamExt;
use ud_core::{EventBuilder, EventType};
use ud_federation::CombinedUserDirectory;
use ud_model::{DelegationRelation, Username};
use ud_storage::DelegationStore;

use crate::error::{AuthError, AuthResult};

/// Outcome of a dangling-relation purge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeReport {
    /// Number of relations inspected.
    pub examined: usize,
    /// Relations removed because an endpoint no longer resolves.
    pub removed: Vec<DelegationRelation>,
}

/// Validated grant/revoke operations over a delegation store.
pub struct DelegationAdmin {
    directory: Arc<CombinedUserDirectory>,
    store: Arc<dyn DelegationStore>,
}

impl DelegationAdmin {
    /// Creates the administrative path.
    #[must_use]
    pub fn new(directory: Arc<CombinedUserDirectory>, store: Arc<dyn DelegationStore>) -> Self {
        Self { directory, store }
    }

    async fn require_user(&self, username: &Username) -> AuthResult<()> {
        if self.directory.exists(username).await? {
            Ok(())
        } else {
            Err(AuthError::NotFound(format!("User '{username}'")))
        }
    }

    /// Lets `grantee` act as `grantor`.
    ///
    /// Returns `true` if the relation is new; a repeated grant succeeds and
    /// returns `false`.
    ///
    /// ## Errors
    ///
    /// Returns `AuthError::NotFound` if either user does not resolve, and
    /// `AuthError::Directory` if the directory cannot answer.
    #[tracing::instrument(skip_all, fields(grantor = %grantor, grantee = %grantee))]
    pub async fn grant(&self, grantor: &Username, grantee: &Username) -> AuthResult<bool> {
        let result = self.validated_grant(grantor, grantee).await;

        let event = EventBuilder::new(EventType::DelegationGranted)
            .user(grantor.as_str())
            .target(grantee.as_str());
        match &result {
            Ok(added) => event.success().detail("new", added.to_string()).emit(),
            Err(e) => event.failure(e.to_string()).emit(),
        }
        result
    }

    async fn validated_grant(&self, grantor: &Username, grantee: &Username) -> AuthResult<bool> {
        self.require_user(grantor).await?;
        self.require_user(grantee).await?;
        Ok(self.store.grant(grantor, grantee).await?)
    }

    /// Removes a relation.
    ///
    /// ## Errors
    ///
    /// Returns `AuthError::NotFound` if the relation does not exist.
    #[tracing::instrument(skip_all, fields(grantor = %grantor, grantee = %grantee))]
    pub async fn revoke(&self, grantor: &Username, grantee: &Username) -> AuthResult<()> {
        let result: AuthResult<()> = self
            .store
            .revoke(grantor, grantee)
            .await
            .map_err(AuthError::from);

        let event = EventBuilder::new(EventType::DelegationRevoked)
            .user(grantor.as_str())
            .target(grantee.as_str());
        match &result {
            Ok(()) => event.success().emit(),
            Err(e) => event.failure(e.to_string()).emit(),
        }
        result
    }

    /// Lists the users `grantee` may act as.
    ///
    /// ## Errors
    ///
    /// Returns `AuthError::Storage` if the store fails.
    pub async fn list_grantors_for(&self, grantee: &Username) -> AuthResult<Vec<Username>> {
        Ok(self.store.list_grantors_for(grantee).await?)
    }

    /// Lists the users allowed to act as `grantor`.
    ///
    /// ## Errors
    ///
    /// Returns `AuthError::Storage` if the store fails.
    pub async fn list_grantees_of(&self, grantor: &Username) -> AuthResult<Vec<Username>> {
        Ok(self.store.list_grantees_of(grantor).await?)
    }

    /// Removes every grant made by `grantor`.
    ///
    /// ## Errors
    ///
    /// Returns `AuthError::Storage` if the store fails.
    #[tracing::instrument(skip_all, fields(grantor = %grantor))]
    pub async fn clear_grantor(&self, grantor: &Username) -> AuthResult<usize> {
        let removed = self.store.clear_grantor(grantor).await?;
        EventBuilder::new(EventType::DelegationCleared)
            .user(grantor.as_str())
            .detail("removed", removed.to_string())
            .emit();
        Ok(removed)
    }

    /// Removes relations whose grantor or grantee no longer resolves.
    ///
    /// Every endpoint is resolved before anything is removed, so a directory
    /// outage aborts the purge without side effects. An unreachable backend
    /// is never taken as proof that a user is gone.
    ///
    /// ## Errors
    ///
    /// Returns `AuthError::Directory` if the directory cannot answer, or
    /// `AuthError::Storage` if the store fails.
    #[tracing::instrument(skip_all)]
    pub async fn purge_dangling(&self) -> AuthResult<PurgeReport> {
        let relations: Vec<DelegationRelation> = self.store.relations().try_collect().await?;

        let mut resolved: HashMap<Username, bool> = HashMap::new();
        let mut dangling = Vec::new();
        for relation in &relations {
            let mut live = true;
            for endpoint in [&relation.grantor, &relation.grantee] {
                let cached = resolved.get(endpoint).copied();
                let exists = match cached {
                    Some(exists) => exists,
                    None => {
                        let exists = self.directory.exists(endpoint).await?;
                        resolved.insert(endpoint.clone(), exists);
                        exists
                    }
                };
                live &= exists;
            }
            if !live {
                dangling.push(relation.clone());
            }
        }

        let mut report = PurgeReport {
            examined: relations.len(),
            removed: Vec::with_capacity(dangling.len()),
        };
        for relation in dangling {
            match self.store.revoke(&relation.grantor, &relation.grantee).await {
                Ok(()) => {}
                // Revoked concurrently.
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e.into()),
            }
            EventBuilder::new(EventType::DanglingDelegationPurged)
                .user(relation.grantor.as_str())
                .target(relation.grantee.as_str())
                .emit();
            report.removed.push(relation);
        }

        tracing::info!(
            examined = report.examined,
            removed = report.removed.len(),
            "Dangling delegation purge finished"
        );
        Ok(report)
    }
}
