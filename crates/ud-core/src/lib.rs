//! # ud-core
//!
//! Shared infrastructure for the federated user directory:
//!
//! - [`config`] - the immutable repository configuration loaded at startup
//! - [`error`] - configuration errors (fatal, startup only)
//! - [`event`] - structured audit events for identity and delegation changes

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod event;

pub use config::{
    HashAlgorithm, LdapDirectoryConfig, ReadOnlyDirectoryConfig, RepositoryConfiguration,
    StaticDirectoryConfig, StaticUserConfig, WritableStoreConfig, WritableStoreDriver,
};
pub use error::{ConfigError, ConfigResult};
pub use event::{Event, EventBuilder, EventOutcome, EventType};
