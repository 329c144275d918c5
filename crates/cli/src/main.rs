//! # Stream Emulator CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - Configuration loading and validation
//! - Replay orchestration and lifecycle management
//! - Graceful shutdown handling

mod cli;
mod commands;
mod error;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_info, run_replay, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging based on CLI options
    init_logging(&cli)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Stream Emulator CLI starting"
    );

    let result = match (&cli.command, &cli.run) {
        (Some(Commands::Run(args)), _) | (None, Some(args)) => run_replay(args).await,
        (Some(Commands::Validate(args)), _) => run_validate(args),
        (Some(Commands::Info(args)), _) => run_info(args),
        // clap prints help before this when no arguments are given
        (None, None) => Err(anyhow::anyhow!("No command or configuration file given")),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Initialize logging based on CLI options
fn init_logging(cli: &Cli) -> Result<()> {
    let (level, respect_env) = if cli.quiet {
        ("warn", false)
    } else {
        let level = match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        (level, true)
    };

    observability::init_with_config(ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port: None,
        default_log_level: level.to_string(),
        respect_env,
    })
}
