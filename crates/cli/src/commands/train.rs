//! `train` command implementation.

use anyhow::Result;
use tracing::info;

use crate::cli::{metrics_port, TrainArgs};
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `train` command
///
/// configure -> acquire (unless skipped) -> normalize -> train + validate
/// [-> export]
pub async fn run_train(args: &TrainArgs) -> Result<()> {
    let mut pipeline = Pipeline::configure(&PipelineConfig {
        pipeline_dir: args.pipeline.pipeline_dir.clone(),
        settings: args.pipeline.settings.clone(),
        load_dataset_handle: !args.skip_download,
        metrics_port: metrics_port(args.metrics_port),
    })?;

    if args.skip_download {
        pipeline.skip_acquire()?;
    } else {
        let service = pipeline.dataset_service()?;
        pipeline.acquire(service).await?;
    }

    let normalized = pipeline.normalize()?;

    let trainer = pipeline.yolo();
    let report = pipeline.train(trainer, normalized.validation_split).await?;
    info!(
        map50_95 = report.metrics.map50_95,
        tag = report.tag(),
        "training run complete"
    );

    if args.export {
        let exporter = pipeline.yolo();
        pipeline.export(exporter).await?;
    }

    pipeline.into_stats().print_summary();
    Ok(())
}
