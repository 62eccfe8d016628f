//! pnorctl - Host firmware management for static-layout PNOR flash
//!
//! Reads the host firmware version off the PNOR, shows the activation that
//! a BMC would publish for it, and performs factory resets by clearing the
//! partitions flagged for reprovisioning.
//!
//! # Backends
//!
//! All flash access goes through a [`FlashTool`](pnor_core::tool::FlashTool):
//! - **pflash** - The external pflash binary; destructive operations
//!   suspend the hiomapd mediator while they run
//! - **dummy** - An in-memory PNOR for trying commands without hardware

mod cli;
mod commands;
mod tools;

use clap::Parser;
use cli::{Cli, Commands};
use pnor_core::config::Config;
use pnor_core::tool::Pnor;
use pnor_core::{ActivationEngine, ResetEngine};
use std::path::{Path, PathBuf};

/// Config file used when --config is not given
const DEFAULT_CONFIG: &str = "/etc/pnorctl.toml";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let backend = tools::open_backend(&cli.tool, &config)?;
    let pnor = Pnor::new(&*backend.tool);

    let result = match cli.command {
        Commands::Version => commands::run_version(&pnor, &config.partitions.version),
        Commands::Status => {
            let mut engine = ActivationEngine::new(pnor, &config);
            commands::run_status(&mut engine)
        }
        Commands::Partitions => commands::run_partitions(&pnor),
        Commands::FactoryReset { yes } => {
            let mut engine = ResetEngine::new(pnor, &*backend.mediator, &config);
            commands::run_factory_reset(&mut engine, yes)
        }
        Commands::ClearGuard { yes } => {
            let mut engine = ResetEngine::new(pnor, &*backend.mediator, &config);
            commands::run_clear_guard(&mut engine, yes)
        }
        Commands::ListTools => {
            commands::list_tools();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Load the configuration
///
/// An explicit path must exist. Without one, the default location is used
/// when present and built-in defaults otherwise.
fn load_config(path: Option<&Path>) -> pnor_core::Result<Config> {
    match path {
        Some(path) => Config::from_file(path),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG);
            if default.exists() {
                log::debug!("Using config {}", default.display());
                Config::from_file(&default)
            } else {
                Ok(Config::default())
            }
        }
    }
}
