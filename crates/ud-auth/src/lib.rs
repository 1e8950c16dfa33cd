//! # ud-auth
//!
//! Authorization on top of the federated user directory.
//!
//! - [`Authorizator`] answers "may A act as B?" from the delegation relation
//!   alone, without consulting the directory
//! - [`DelegationAdmin`] is the administrative path: grants are validated
//!   against the directory, and dangling relations can be purged
//!
//! ## Example
//!
//! ```ignore
//! let authorizator = Authorizator::new(store.clone());
//! let admin = DelegationAdmin::new(directory, store);
//!
//! admin.grant(&alice, &bob).await?;
//! assert!(authorizator.can_act_as(&bob, &alice).await?);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod admin;
pub mod authorizator;
pub mod error;

pub use admin::{DelegationAdmin, PurgeReport};
pub use authorizator::Authorizator;
pub use error::{AuthError, AuthResult};
