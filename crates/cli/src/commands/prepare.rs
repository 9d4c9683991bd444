//! `prepare` command implementation.

use anyhow::Result;
use tracing::info;

use crate::cli::{metrics_port, PrepareArgs};
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `prepare` command: acquire and normalize only
pub async fn run_prepare(args: &PrepareArgs) -> Result<()> {
    let mut pipeline = Pipeline::configure(&PipelineConfig {
        pipeline_dir: args.pipeline.pipeline_dir.clone(),
        settings: args.pipeline.settings.clone(),
        load_dataset_handle: true,
        metrics_port: metrics_port(args.metrics_port),
    })?;

    let service = pipeline.dataset_service()?;
    let acquired = pipeline.acquire(service).await?;
    let normalized = pipeline.normalize()?;

    info!(
        dataset = %acquired.path.display(),
        val = normalized.validation_split.relative_path(),
        "dataset ready for training"
    );

    pipeline.into_stats().print_summary();
    Ok(())
}
