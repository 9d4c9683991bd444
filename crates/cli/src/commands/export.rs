//! `export` command implementation.

use anyhow::Result;
use tracing::info;

use crate::cli::{metrics_port, ExportArgs};
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `export` command
///
/// Paths are re-derived from configuration; nothing from a previous `train`
/// invocation is needed besides the checkpoint on disk.
pub async fn run_export(args: &ExportArgs) -> Result<()> {
    let mut pipeline = Pipeline::configure(&PipelineConfig {
        pipeline_dir: args.pipeline.pipeline_dir.clone(),
        settings: args.pipeline.settings.clone(),
        load_dataset_handle: false,
        metrics_port: metrics_port(args.metrics_port),
    })?;

    let exporter = pipeline.yolo();
    let exported = pipeline.export(exporter).await?;
    info!(path = %exported.path.display(), format = %exported.format, "export complete");

    pipeline.into_stats().print_summary();
    Ok(())
}
