//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Raptor Pipeline - dataset preparation, training and export for raptor detection
#[derive(Parser, Debug)]
#[command(
    name = "raptor-pipeline",
    author,
    version,
    about = "Raptor detection training pipeline",
    long_about = "Pulls a versioned dataset from Roboflow, normalizes its data.yaml, \n\
                  trains and validates a YOLO detector through the `yolo` CLI and \n\
                  exports the best checkpoint to <project>/models."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "RAPTOR_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "RAPTOR_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Acquire the dataset, normalize it, train and validate
    Train(TrainArgs),

    /// Acquire and normalize the dataset without training
    Prepare(PrepareArgs),

    /// Normalize an existing dataset's data.yaml in place
    Normalize(NormalizeArgs),

    /// Export the trained checkpoint to <project>/models
    Export(ExportArgs),

    /// Check secrets and settings without touching the network
    Check(CheckArgs),

    /// Display resolved paths and settings
    Info(InfoArgs),
}

/// Where the pipeline lives and which settings it uses
#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    /// Pipeline directory; its parent is the project root
    #[arg(long, default_value = ".", env = "RAPTOR_PIPELINE_DIR")]
    pub pipeline_dir: PathBuf,

    /// Settings file (TOML or JSON); defaults to <project>/pipeline.toml if present
    #[arg(short, long, env = "RAPTOR_SETTINGS")]
    pub settings: Option<PathBuf>,
}

/// Arguments for the `train` command
#[derive(Args, Debug, Clone)]
pub struct TrainArgs {
    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Train on the dataset already at <project>/data/dataset
    #[arg(long)]
    pub skip_download: bool,

    /// Export the checkpoint after validation
    #[arg(long)]
    pub export: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "RAPTOR_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `prepare` command
#[derive(Args, Debug, Clone)]
pub struct PrepareArgs {
    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "RAPTOR_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `normalize` command
#[derive(Args, Debug, Clone)]
pub struct NormalizeArgs {
    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Dataset directory (defaults to <project>/data/dataset)
    #[arg(long)]
    pub dataset_dir: Option<PathBuf>,
}

/// Arguments for the `export` command
#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "RAPTOR_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `check` command
#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Output check result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}

/// Port 0 disables the metrics endpoint
pub fn metrics_port(port: u16) -> Option<u16> {
    if port == 0 {
        None
    } else {
        Some(port)
    }
}
