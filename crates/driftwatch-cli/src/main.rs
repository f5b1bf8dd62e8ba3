mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command, PolicyCommand};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run => commands::run(&cli.config).await,
        Command::Scan => commands::scan(&cli.config).await,
        Command::Status => commands::status(&cli.config).await,
        Command::Policy { command } => match command {
            PolicyCommand::Check { resource_id } => commands::policy_check(&cli.config, &resource_id).await,
        },
    }
}
