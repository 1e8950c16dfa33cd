//! Command-line argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Federated user directory.
#[derive(Debug, Parser)]
#[command(name = "ud-server")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Repository configuration file (overrides UD_CONFIG).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Initialize every backend and report their status.
    Check,

    /// List every username across both backends.
    ListUsers,

    /// Check whether one user may act as another.
    CanActAs {
        /// The user performing the action.
        acting: String,
        /// The user being acted as.
        target: String,
    },
}
