//! # ud-storage-memory
//!
//! In-process backends for the federated user directory.
//!
//! - [`InMemoryUserStore`] - the writable identity store, with Argon2 hashed
//!   credentials
//! - [`StaticDirectory`] - a read-only directory seeded from configuration
//! - [`InMemoryDelegationStore`] - the delegation relation table
//! - [`PasswordHasherService`] - credential hashing shared by the above

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod delegation;
pub mod directory;
pub mod password;
pub mod user;

pub use delegation::InMemoryDelegationStore;
pub use directory::StaticDirectory;
pub use password::{PasswordHasherService, PasswordPolicy};
pub use user::InMemoryUserStore;
