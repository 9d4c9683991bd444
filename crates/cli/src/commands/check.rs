//! `check` command implementation.

use anyhow::{Context, Result};
use config_loader::{ConfigLoader, ResolvedConfig};
use serde::Serialize;
use tracing::info;

use crate::cli::CheckArgs;

/// Check result for JSON output
#[derive(Serialize)]
struct CheckResult {
    valid: bool,
    pipeline_dir: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<CheckSummary>,
}

#[derive(Serialize)]
struct CheckSummary {
    project_root: String,
    settings_source: Option<String>,
    dataset: String,
    run_name: String,
    export_format: String,
}

/// Execute the `check` command
///
/// Resolves configuration and credentials exactly as `train` would, without
/// contacting the dataset service.
pub fn run_check(args: &CheckArgs) -> Result<()> {
    info!(pipeline_dir = %args.pipeline.pipeline_dir.display(), "Checking configuration");

    let result = check_config(args);

    if args.json {
        let json =
            serde_json::to_string_pretty(&result).context("Failed to serialize check result")?;
        println!("{json}");
    } else {
        print_check_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration check failed")
    }
}

fn check_config(args: &CheckArgs) -> CheckResult {
    let pipeline_dir = args.pipeline.pipeline_dir.display().to_string();

    let resolved = match ConfigLoader::resolve(
        &args.pipeline.pipeline_dir,
        args.pipeline.settings.as_deref(),
    ) {
        Ok(resolved) => resolved,
        Err(e) => return invalid(pipeline_dir, e.to_string()),
    };

    let handle = match ConfigLoader::load_dataset_handle(&resolved.paths) {
        Ok(handle) => handle,
        Err(e) => return invalid(pipeline_dir, e.to_string()),
    };

    CheckResult {
        valid: true,
        pipeline_dir,
        error: None,
        warnings: collect_warnings(&resolved),
        summary: Some(CheckSummary {
            project_root: resolved.paths.project_root().display().to_string(),
            settings_source: resolved
                .settings_source
                .as_ref()
                .map(|p| p.display().to_string()),
            dataset: handle.slug(),
            run_name: resolved.settings.training.run_name.clone(),
            export_format: resolved.settings.export.format.to_string(),
        }),
    }
}

fn invalid(pipeline_dir: String, error: String) -> CheckResult {
    CheckResult {
        valid: false,
        pipeline_dir,
        error: Some(error),
        warnings: Vec::new(),
        summary: None,
    }
}

/// Collect non-fatal observations about the project layout
fn collect_warnings(resolved: &ResolvedConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    let paths = &resolved.paths;

    if resolved.settings_source.is_none() {
        warnings.push(format!(
            "No settings file at {} - using defaults",
            paths.settings_file().display()
        ));
    }

    let dataset_dir = paths.dataset_dir();
    if !dataset_dir.is_dir() {
        warnings.push(format!(
            "Dataset not downloaded yet ({})",
            dataset_dir.display()
        ));
    } else if !dataset_dir.join(contracts::VALID_IMAGES).is_dir() {
        warnings.push(
            "Dataset has no valid/images split - validation will run on training data".into(),
        );
    }

    if resolved.settings.training.batch == -1 {
        warnings.push("training.batch = -1 (auto-batch) requires a CUDA device".into());
    }

    warnings
}

fn print_check_result(result: &CheckResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.pipeline_dir);

        if let Some(ref summary) = result.summary {
            println!("\n  Project root: {}", summary.project_root);
            println!(
                "  Settings: {}",
                summary.settings_source.as_deref().unwrap_or("defaults")
            );
            println!("  Dataset: {}", summary.dataset);
            println!("  Run name: {}", summary.run_name);
            println!("  Export format: {}", summary.export_format);
        }

        if !result.warnings.is_empty() {
            println!("\n⚠ Warnings:");
            for warning in &result.warnings {
                println!("  - {warning}");
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.pipeline_dir);
        if let Some(ref error) = result.error {
            println!("\n  Error: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::PipelineArgs;
    use std::fs;

    fn args(anchor: &std::path::Path) -> CheckArgs {
        CheckArgs {
            pipeline: PipelineArgs {
                pipeline_dir: anchor.to_path_buf(),
                settings: None,
            },
            json: true,
        }
    }

    #[test]
    fn test_check_valid_project() {
        let root = tempfile::tempdir().unwrap();
        let anchor = root.path().join("training");
        fs::create_dir_all(&anchor).unwrap();
        fs::write(
            root.path().join(".env"),
            "ROBOFLOW_API_KEY=k\nROBOFLOW_WORKSPACE=birds\nROBOFLOW_PROJECT=raptors\nROBOFLOW_VERSION=3\n",
        )
        .unwrap();

        let result = check_config(&args(&anchor));
        assert!(result.valid);
        assert_eq!(result.summary.unwrap().dataset, "birds/raptors/3");
        assert!(result
            .warnings
            .iter()
            .any(|w| w.starts_with("Dataset not downloaded")));
    }

    #[test]
    fn test_check_blank_project() {
        let root = tempfile::tempdir().unwrap();
        let anchor = root.path().join("training");
        fs::create_dir_all(&anchor).unwrap();
        fs::write(
            root.path().join(".env"),
            "ROBOFLOW_API_KEY=k\nROBOFLOW_WORKSPACE=birds\nROBOFLOW_PROJECT=   \n",
        )
        .unwrap();

        let result = check_config(&args(&anchor));
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("ROBOFLOW_PROJECT"));
    }

    #[test]
    fn test_check_missing_secret_file() {
        let root = tempfile::tempdir().unwrap();
        let anchor = root.path().join("training");
        fs::create_dir_all(&anchor).unwrap();

        let result = check_config(&args(&anchor));
        assert!(!result.valid);
        assert!(result.error.unwrap().contains(".env"));
    }
}
