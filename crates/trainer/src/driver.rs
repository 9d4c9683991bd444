//! Train/validate and export sub-paths
//!
//! Both sub-paths find the checkpoint through `PipelinePaths::checkpoint`, so
//! the export entry point works without anything carried over from training.

use std::path::{Path, PathBuf};

use contracts::{
    ContractError, ExportRequest, ExportSettings, ExportedModel, ModelExporter, ModelTrainer,
    PipelinePaths, TrainRequest, TrainingArtifact, TrainingSettings, ValidateRequest,
    ValidationMetrics, ValidationSplit,
};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

/// Result of a train + validate run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub checkpoint: PathBuf,
    pub metrics: ValidationMetrics,
    pub split: ValidationSplit,
}

impl ValidationReport {
    /// `validation` or `validation-on-train`
    pub fn tag(&self) -> &'static str {
        self.split.metrics_tag()
    }

    /// Whether the metrics were measured on training data
    pub fn is_on_train(&self) -> bool {
        self.split == ValidationSplit::TrainFallback
    }
}

/// Build the training request from settings and paths
pub fn train_request(paths: &PipelinePaths, settings: &TrainingSettings) -> TrainRequest {
    TrainRequest {
        data_config: paths.dataset_config(),
        base_model: settings.base_model.clone(),
        epochs: settings.epochs,
        image_size: settings.image_size,
        batch: settings.batch,
        device: settings.device.clone(),
        project_dir: paths.runs_project_dir(),
        run_name: paths.run_name().to_string(),
        exist_ok: settings.exist_ok,
    }
}

/// Build the validation request from settings and paths
pub fn validate_request(paths: &PipelinePaths, settings: &TrainingSettings) -> ValidateRequest {
    ValidateRequest {
        checkpoint: paths.checkpoint(),
        data_config: paths.dataset_config(),
        image_size: settings.image_size,
        batch: settings.batch,
        device: settings.device.clone(),
        project_dir: paths.runs_project_dir(),
        run_name: paths.run_name().to_string(),
    }
}

/// Checkpoint at the convention path, or `CheckpointMissing`
pub fn locate_checkpoint(paths: &PipelinePaths) -> Result<TrainingArtifact, ContractError> {
    let checkpoint = paths.checkpoint();
    if checkpoint.is_file() {
        Ok(TrainingArtifact { checkpoint })
    } else {
        Err(ContractError::CheckpointMissing { path: checkpoint })
    }
}

/// Training sub-path driver
pub struct TrainingDriver<T: ModelTrainer> {
    trainer: T,
}

impl<T: ModelTrainer> TrainingDriver<T> {
    pub fn new(trainer: T) -> Self {
        Self { trainer }
    }

    pub fn trainer(&self) -> &T {
        &self.trainer
    }

    /// Train on the normalized dataset, then validate the best checkpoint
    ///
    /// `split` is what the normalizer wrote to `val`; it only tags the report.
    ///
    /// # Errors
    /// - Trainer failures
    /// - `CheckpointMissing` if training did not leave a checkpoint
    /// - `MetricsUnavailable` if validation printed no summary
    #[instrument(
        name = "training_run",
        skip(self, paths, settings),
        fields(trainer = %self.trainer.name(), run = %paths.run_name())
    )]
    pub async fn train_and_validate(
        &self,
        paths: &PipelinePaths,
        settings: &TrainingSettings,
        split: ValidationSplit,
    ) -> Result<ValidationReport, ContractError> {
        let request = train_request(paths, settings);
        info!(
            data = %request.data_config.display(),
            model = %request.base_model,
            epochs = request.epochs,
            imgsz = request.image_size,
            batch = request.batch,
            device = %request.device,
            "training started"
        );
        self.trainer.train(&request).await?;

        let artifact = locate_checkpoint(paths)?;
        info!(checkpoint = %artifact.checkpoint.display(), "training finished");

        let metrics = self
            .trainer
            .validate(&validate_request(paths, settings))
            .await?;

        let report = ValidationReport {
            checkpoint: artifact.checkpoint,
            metrics,
            split,
        };

        if report.is_on_train() {
            warn!(
                map50_95 = metrics.map50_95,
                tag = report.tag(),
                "validation ran on the training split; metrics are optimistic"
            );
        } else {
            info!(
                map50_95 = metrics.map50_95,
                map50 = ?metrics.map50,
                precision = ?metrics.precision,
                recall = ?metrics.recall,
                tag = report.tag(),
                "validation finished"
            );
        }

        Ok(report)
    }
}

/// Export sub-path driver
pub struct ExportDriver<E: ModelExporter> {
    exporter: E,
}

impl<E: ModelExporter> ExportDriver<E> {
    pub fn new(exporter: E) -> Self {
        Self { exporter }
    }

    pub fn exporter(&self) -> &E {
        &self.exporter
    }

    /// Export the checkpoint and move the result to `<root>/models/model.<ext>`
    ///
    /// # Errors
    /// - `CheckpointMissing` before the exporter is invoked
    /// - Exporter failures
    /// - `ExportArtifactMissing` if the exporter left nothing at the expected
    ///   path; the canonical destination is not touched in that case
    #[instrument(
        name = "model_export",
        skip(self, paths, settings),
        fields(exporter = %self.exporter.name(), format = %paths.export_format())
    )]
    pub async fn export(
        &self,
        paths: &PipelinePaths,
        settings: &ExportSettings,
    ) -> Result<ExportedModel, ContractError> {
        let artifact = locate_checkpoint(paths)?;
        let format = paths.export_format();

        let produced = paths.export_output();
        if tokio::fs::symlink_metadata(&produced).await.is_ok() {
            debug!(path = %produced.display(), "removing stale exporter output");
            tokio::fs::remove_file(&produced).await?;
        }

        let request = ExportRequest {
            checkpoint: artifact.checkpoint,
            format,
            image_size: settings.image_size,
        };
        info!(
            checkpoint = %request.checkpoint.display(),
            imgsz = request.image_size,
            "export started"
        );
        self.exporter.export(&request).await?;

        let models_dir = paths.models_dir();
        tokio::fs::create_dir_all(&models_dir).await?;

        if !produced.is_file() {
            return Err(ContractError::ExportArtifactMissing { path: produced });
        }

        let destination = paths.exported_model();
        replace_file(&produced, &destination).await?;
        info!(path = %destination.display(), "model exported");

        Ok(ExportedModel {
            path: destination,
            format,
        })
    }
}

/// Move `from` onto `to`, replacing an existing file
async fn replace_file(from: &Path, to: &Path) -> Result<(), ContractError> {
    if tokio::fs::symlink_metadata(to).await.is_ok() {
        warn!(path = %to.display(), "replacing existing exported model");
        tokio::fs::remove_file(to).await?;
    }
    if let Err(e) = tokio::fs::rename(from, to).await {
        warn!(error = %e, "rename failed, copying exported model instead");
        tokio::fs::copy(from, to).await?;
        tokio::fs::remove_file(from).await?;
    }
    Ok(())
}
