//! # ud-federation-ldap
//!
//! LDAP directory for the read-only side of the user directory.
//!
//! ## Security
//!
//! - Only LDAPS (`ldaps://`) URLs are accepted. Plain LDAP and STARTTLS are
//!   rejected when the directory is built.
//! - Every value placed in a search filter is escaped.
//! - User passwords are checked with a bind on a dedicated connection that
//!   is closed afterwards; they are never logged or kept.
//!
//! ## Example
//!
//! ```ignore
//! use ud_federation_ldap::LdapDirectory;
//! use ud_storage::ReadOnlyUserRepository;
//!
//! let directory = LdapDirectory::from_config(&ldap_config, policy)?;
//! directory.test_connection().await?;
//! let repository = ReadOnlyUserRepository::new(directory);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod connection;
pub mod error;
pub mod mapper;
pub mod provider;
pub mod search;

pub use config::LdapSettings;
pub use error::{LdapError, LdapResult};
pub use provider::LdapDirectory;
