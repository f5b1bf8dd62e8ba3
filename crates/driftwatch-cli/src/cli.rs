use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "driftwatch",
    about = "Continuous cloud inventory reconciliation and Day-2 policy enforcement",
    version
)]
pub struct Cli {
    /// Path to the daemon's YAML configuration file.
    #[arg(long, short = 'c', default_value = "driftwatch.yaml", env = "DRIFTWATCH_CONFIG")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load config, wire the provider/store/policy set, and run the daemon until shutdown.
    Run,

    /// Perform one reconciliation tick against the configured store and print a summary.
    Scan,

    /// Print the current revision, resource count, and recent enforcement events.
    Status,

    /// Evaluate the policy set against a resource without enforcing.
    Policy {
        #[command(subcommand)]
        command: PolicyCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum PolicyCommand {
    /// Evaluate the policy set against one resource already present in the store.
    Check {
        /// The resource id to evaluate (its latest observation is used).
        resource_id: String,
    },
}
