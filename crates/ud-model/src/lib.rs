//! # ud-model
//!
//! Domain models for the federated user directory.
//!
//! This crate defines the identity records shared by every backend
//! (usernames, identities, credentials) and the delegation relation
//! used by the authorization layer.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod credential;
pub mod delegation;
pub mod error;
pub mod user;

pub use credential::{Credential, CredentialReference};
pub use delegation::DelegationRelation;
pub use error::{ModelError, ModelResult};
pub use user::{Origin, UserAttributes, UserIdentity, Username, UsernamePolicy};
