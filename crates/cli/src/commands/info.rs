//! `info` command implementation.

use anyhow::{Context, Result};
use config_loader::{ConfigLoader, ResolvedConfig};
use contracts::PipelineSettings;
use serde::Serialize;
use std::path::Path;
use tracing::info;

use crate::cli::InfoArgs;

/// Resolved configuration for JSON output
#[derive(Serialize)]
struct PipelineInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    settings_source: Option<String>,
    paths: Vec<PathInfo>,
    settings: PipelineSettings,
}

#[derive(Serialize)]
struct PathInfo {
    name: &'static str,
    path: String,
    exists: bool,
}

impl PathInfo {
    fn new(name: &'static str, path: &Path) -> Self {
        Self {
            name,
            path: path.display().to_string(),
            exists: path.exists(),
        }
    }
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(pipeline_dir = %args.pipeline.pipeline_dir.display(), "Loading pipeline info");

    let resolved = ConfigLoader::resolve(&args.pipeline.pipeline_dir, args.pipeline.settings.as_deref())
        .with_context(|| {
            format!(
                "Failed to resolve configuration from {}",
                args.pipeline.pipeline_dir.display()
            )
        })?;

    let info = build_info(&resolved);
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize pipeline info")?;
        println!("{json}");
    } else {
        print_info(&info)?;
    }

    Ok(())
}

fn build_info(resolved: &ResolvedConfig) -> PipelineInfo {
    let paths = &resolved.paths;
    PipelineInfo {
        settings_source: resolved
            .settings_source
            .as_ref()
            .map(|p| p.display().to_string()),
        paths: vec![
            PathInfo::new("pipeline_dir", paths.pipeline_dir()),
            PathInfo::new("project_root", paths.project_root()),
            PathInfo::new("secret_file", &paths.secret_file()),
            PathInfo::new("settings_file", &paths.settings_file()),
            PathInfo::new("dataset_dir", &paths.dataset_dir()),
            PathInfo::new("dataset_config", &paths.dataset_config()),
            PathInfo::new("runs_dir", &paths.runs_dir()),
            PathInfo::new("checkpoint", &paths.checkpoint()),
            PathInfo::new("exported_model", &paths.exported_model()),
        ],
        settings: resolved.settings.clone(),
    }
}

fn print_info(info: &PipelineInfo) -> Result<()> {
    println!("\n=== Pipeline Paths ===\n");
    for entry in &info.paths {
        let marker = if entry.exists { "✓" } else { "·" };
        println!("  {marker} {:<15} {}", entry.name, entry.path);
    }

    println!("\n=== Settings ===");
    println!(
        "  source: {}\n",
        info.settings_source.as_deref().unwrap_or("defaults")
    );
    let toml = ConfigLoader::to_toml(&info.settings).context("Failed to render settings")?;
    for line in toml.lines() {
        println!("  {line}");
    }
    println!();
    Ok(())
}
