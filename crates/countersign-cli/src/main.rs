//! Countersign CLI - approval workflow step.
//!
//! Prints the step's function definition, shows the resolved configuration,
//! and simulates one approval run against an in-memory host.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

mod commands;
mod config_bridge;
mod transport;

use commands::simulate::SimulateArgs;
use commands::{config, definition, simulate};
use countersign_telemetry::LogFormat;

/// Countersign - approve or deny requests from a chat channel
#[derive(Parser)]
#[command(name = "countersign")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Extra config file, merged over ~/.countersign/config.toml
    #[arg(long, global = true, env = "COUNTERSIGN_CONFIG")]
    config: Option<PathBuf>,

    /// Log format: pretty, compact, json or full
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the function definition as JSON
    Definition,

    /// View configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Run one approval through an in-memory host
    Simulate(SimulateArgs),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the resolved configuration as TOML
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let resolved = countersign_config::Config::load(cli.config.as_deref())
        .context("failed to load configuration")?;

    let mut log_config = config_bridge::to_log_config(&resolved.config);
    if cli.verbose {
        "debug".clone_into(&mut log_config.level);
    }
    if let Some(format) = cli.log_format {
        log_config = log_config.with_format(format);
    }
    if let Err(e) = countersign_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    match cli.command {
        Commands::Definition => definition::print_definition(),
        Commands::Config {
            command: ConfigCommands::Show,
        } => config::show_config(&resolved),
        Commands::Simulate(args) => {
            let settings = config_bridge::to_step_settings(&resolved.config);
            simulate::run_simulation(&args, settings, resolved.config.host.event_buffer).await
        },
    }
}
