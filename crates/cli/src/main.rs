//! # Raptor Pipeline CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - Configuration resolution and checks
//! - Stage sequencing for training and export

mod cli;
mod commands;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_check, run_export, run_info, run_normalize, run_prepare, run_train};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    observability::init_with_config(observability_config(&cli))?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "raptor pipeline starting"
    );

    let result = match &cli.command {
        Commands::Train(args) => run_train(args).await,
        Commands::Prepare(args) => run_prepare(args).await,
        Commands::Normalize(args) => run_normalize(args),
        Commands::Export(args) => run_export(args).await,
        Commands::Check(args) => run_check(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = format!("{e:#}"), "Command failed");
    }

    result
}

/// Logging configuration from CLI options
fn observability_config(cli: &Cli) -> ObservabilityConfig {
    let (default_log_level, ignore_env_filter) = if cli.quiet {
        ("warn", true)
    } else {
        let level = match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        (level, false)
    };

    ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port: None,
        default_log_level: default_log_level.to_string(),
        ignore_env_filter,
    }
}
