//! `normalize` command implementation.

use anyhow::Result;

use crate::cli::NormalizeArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `normalize` command on an existing dataset
pub fn run_normalize(args: &NormalizeArgs) -> Result<()> {
    let mut pipeline = Pipeline::configure(&PipelineConfig {
        pipeline_dir: args.pipeline.pipeline_dir.clone(),
        settings: args.pipeline.settings.clone(),
        load_dataset_handle: false,
        metrics_port: None,
    })?;

    let report = match &args.dataset_dir {
        Some(dir) => pipeline.normalize_at(dir)?,
        None => pipeline.normalize()?,
    };

    println!("Normalized: {}", report.config_path.display());
    println!("  path: {}", report.dataset_path.display());
    println!("  val:  {}", report.validation_split.relative_path());
    if report.removed_test {
        println!("  removed 'test' entry");
    }
    Ok(())
}
