//! Impersonation checks.

use std::sync::Arc;

use ud_model::Username;
use ud_storage::DelegationStore;

use crate::error::AuthResult;

/// Answers "may the acting user act as the target user?".
///
/// The check is a pure relation lookup. It never asks the user directory
/// whether either principal exists, so a directory outage cannot change an
/// authorization decision. Callers that need existence must resolve the
/// users through the directory first.
#[derive(Clone)]
pub struct Authorizator {
    store: Arc<dyn DelegationStore>,
}

impl Authorizator {
    /// Creates an authorizator over a delegation store.
    #[must_use]
    pub fn new(store: Arc<dyn DelegationStore>) -> Self {
        Self { store }
    }

    /// Returns true if `acting` is `target`, or `target` has granted
    /// `acting` the right to act on its behalf.
    ///
    /// ## Errors
    ///
    /// Returns `AuthError::Storage` if the delegation store fails. Self
    /// action never touches the store and never fails.
    #[tracing::instrument(level = "debug", skip_all, fields(acting = %acting, target_user = %target))]
    pub async fn can_act_as(&self, acting: &Username, target: &Username) -> AuthResult<bool> {
        if acting == target {
            return Ok(true);
        }
        Ok(self.store.is_granted(target, acting).await?)
    }
}
