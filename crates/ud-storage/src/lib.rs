//! # ud-storage
//!
//! Backend abstraction traits for the federated user directory.
//!
//! Both leaf backends present the same capability set so the federation
//! layer can hold two instances of it side by side:
//!
//! - [`UserRepository`] - exists/get/create/update/delete/change credential/list
//! - [`ReadOnlyDirectory`] - the lookup-only subset, lifted into a
//!   [`UserRepository`] by [`ReadOnlyUserRepository`] whose mutators always
//!   fail with [`StorageError::Unsupported`]
//! - [`DelegationStore`] - the "may act as" relation table

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod delegation;
pub mod directory;
pub mod error;
pub mod user;

pub use delegation::DelegationStore;
pub use directory::{ReadOnlyDirectory, ReadOnlyUserRepository};
pub use error::{StorageError, StorageResult};
pub use user::{UserRepository, UsernameStream};
