//! # ud-server
//!
//! Startup wiring for the federated user directory.
//!
//! - [`config`] - process settings from the environment
//! - [`bootstrap`] - ordered construction of every service from the
//!   repository configuration
//! - [`cli`] and [`commands`] - the `ud-server` binary

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bootstrap;
pub mod cli;
pub mod commands;
pub mod config;

pub use bootstrap::{initialize, BootstrapError, DirectoryServices, InitStep};
pub use config::ServerSettings;
