//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pnorctl")]
#[command(
    author,
    version,
    about = "Host firmware (PNOR) version and factory reset tool",
    long_about = None
)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (TOML)
    /// Defaults to /etc/pnorctl.toml when present
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Flash tool backend [available: pflash, dummy[:image=<file>]]
    #[arg(short, long, global = true, default_value = "pflash")]
    pub tool: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read and decode the VERSION partition
    Version,

    /// Publish the host firmware image and show its activation
    Status,

    /// List partitions cleared by a factory reset
    Partitions,

    /// Clear every partition flagged for reprovisioning
    FactoryReset {
        /// Confirm the destructive operation
        #[arg(long)]
        yes: bool,
    },

    /// Clear the guard record partition only
    ClearGuard {
        /// Confirm the destructive operation
        #[arg(long)]
        yes: bool,
    },

    /// List supported flash tool backends
    ListTools,
}
