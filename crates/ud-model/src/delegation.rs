//! Delegation relation model.

use std::fmt;

use serde::Serialize;

use crate::user::Username;

/// "The grantee may act as the grantor."
///
/// Relations are ordered pairs. They outlive the identities they name:
/// deleting a user does not remove relations pointing at it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DelegationRelation {
    /// The principal whose identity may be assumed.
    pub grantor: Username,
    /// The principal allowed to assume it.
    pub grantee: Username,
}

impl DelegationRelation {
    /// Creates a relation.
    #[must_use]
    pub const fn new(grantor: Username, grantee: Username) -> Self {
        Self { grantor, grantee }
    }

    /// Returns true if the relation names the given user at either end.
    #[must_use]
    pub fn involves(&self, username: &Username) -> bool {
        &self.grantor == username || &self.grantee == username
    }
}

impl fmt::Display for DelegationRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.grantee, self.grantor)
    }
}
