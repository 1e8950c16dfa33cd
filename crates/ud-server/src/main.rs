//! # ud-server
//!
//! Entry point for the federated user directory.

#![forbid(unsafe_code)]

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ud_core::RepositoryConfiguration;
use ud_server::cli::{Cli, Command};
use ud_server::commands::{run_can_act_as, run_check, run_list_users};
use ud_server::{initialize, ServerSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = ServerSettings::from_env();
    let cli = Cli::parse();
    let settings = settings.with_config_override(cli.config);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&settings.log_filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let path = settings.require_config_path()?;
    let config = RepositoryConfiguration::from_file(path)
        .with_context(|| format!("loading {}", path.display()))?;
    let services = initialize(config).await?;

    match cli.command {
        Command::Check => println!("{}", run_check(&services).await?),
        Command::ListUsers => {
            for username in run_list_users(&services).await? {
                println!("{username}");
            }
        }
        Command::CanActAs { acting, target } => {
            let allowed = run_can_act_as(&services, &acting, &target).await?;
            println!("{allowed}");
        }
    }

    Ok(())
}
