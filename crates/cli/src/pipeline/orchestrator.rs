//! Pipeline orchestrator - sequences the stages.
//!
//! Every stage is awaited to completion before the next one starts; stages
//! hand off through the paths in `PipelinePaths`. Collaborators (dataset
//! service, trainer, exporter) are passed in so the same sequencing runs
//! against mocks.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use config_loader::{ConfigLoader, ResolvedConfig};
use contracts::{ExportedModel, ModelExporter, ModelTrainer, RemoteDatasetHandle, ValidationSplit};
use dataset_acquirer::{AcquiredDataset, DatasetAcquirer, DatasetService, RoboflowClient};
use dataset_normalizer::NormalizeReport;
use observability::{Stage, StageOutcome};
use tracing::{info, warn};
use trainer::{ExportDriver, TrainingDriver, ValidationReport, YoloCli};

use super::PipelineStats;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Pipeline directory (anchor)
    pub pipeline_dir: PathBuf,

    /// Explicit settings file
    pub settings: Option<PathBuf>,

    /// Load the dataset handle from the secret file during configuration
    pub load_dataset_handle: bool,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    resolved: ResolvedConfig,
    handle: Option<RemoteDatasetHandle>,
    stats: PipelineStats,
}

impl Pipeline {
    /// Resolve configuration; nothing else runs if this fails
    pub fn configure(config: &PipelineConfig) -> Result<Self> {
        if let Some(port) = config.metrics_port {
            observability::init_metrics_only(port)?;
        }

        let mut stats = PipelineStats::default();
        let start = Instant::now();
        let result = resolve(config);
        record(&mut stats, Stage::Configure, start, &result);
        let (resolved, handle) = result?;

        Ok(Self {
            resolved,
            handle,
            stats,
        })
    }

    /// Resolved paths and settings
    pub fn resolved(&self) -> &ResolvedConfig {
        &self.resolved
    }

    /// Statistics collected so far
    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    /// Finish the run and hand back its statistics
    pub fn into_stats(self) -> PipelineStats {
        self.stats
    }

    /// Roboflow client for the configured API URL
    pub fn dataset_service(&self) -> Result<RoboflowClient> {
        let url = &self.resolved.settings.dataset.api_url;
        RoboflowClient::new(url).with_context(|| format!("Failed to create client for {url}"))
    }

    /// `yolo` CLI for the configured program
    pub fn yolo(&self) -> YoloCli {
        YoloCli::new(self.resolved.settings.training.program.clone())
    }

    /// Stage 2: fetch the dataset into `<root>/data/dataset`
    pub async fn acquire<S: DatasetService>(&mut self, service: S) -> Result<AcquiredDataset> {
        let handle = self
            .handle
            .clone()
            .context("Dataset handle was not loaded during configuration")?;
        let paths = &self.resolved.paths;
        let settings = &self.resolved.settings.dataset;

        let mut acquirer = DatasetAcquirer::new(service, settings.format.clone(), settings.replace);
        let target = paths.dataset_dir();
        let download_root = paths.download_root().to_path_buf();

        let result = timed(&mut self.stats, Stage::Acquire, async {
            acquirer
                .acquire(&handle, &target, &download_root)
                .await
                .with_context(|| format!("Failed to acquire dataset {}", handle.slug()))
        })
        .await;
        let acquired = result?;

        observability::record_dataset_acquired(acquired.version.images);
        self.stats.dataset = Some(acquired.version.clone());
        Ok(acquired)
    }

    /// Record that acquisition was skipped; the dataset must already exist
    pub fn skip_acquire(&mut self) -> Result<()> {
        let dataset_dir = self.resolved.paths.dataset_dir();
        self.stats
            .timings
            .record(Stage::Acquire, Default::default(), StageOutcome::Skipped);
        if !dataset_dir.is_dir() {
            anyhow::bail!(
                "Dataset directory not found: {} (run without --skip-download first)",
                dataset_dir.display()
            );
        }
        info!(path = %dataset_dir.display(), "using existing dataset");
        Ok(())
    }

    /// Stage 3: normalize `data.yaml` in the canonical dataset directory
    pub fn normalize(&mut self) -> Result<NormalizeReport> {
        let dataset_dir = self.resolved.paths.dataset_dir();
        self.normalize_at(&dataset_dir)
    }

    /// Stage 3 on an arbitrary dataset directory
    pub fn normalize_at(&mut self, dataset_dir: &Path) -> Result<NormalizeReport> {
        let start = Instant::now();
        let result = dataset_normalizer::normalize_dataset(dataset_dir).with_context(|| {
            format!("Failed to normalize dataset at {}", dataset_dir.display())
        });
        record(&mut self.stats, Stage::Normalize, start, &result);
        let report = result?;

        observability::record_validation_split(report.validation_split);
        self.stats.dataset_config = Some(report.config_path.clone());
        self.stats.validation_split = Some(report.validation_split);
        Ok(report)
    }

    /// Stage 4, training sub-path: train then validate
    pub async fn train<T: ModelTrainer>(
        &mut self,
        trainer: T,
        split: ValidationSplit,
    ) -> Result<ValidationReport> {
        let driver = TrainingDriver::new(trainer);
        let paths = &self.resolved.paths;
        let settings = &self.resolved.settings.training;

        let result = timed(&mut self.stats, Stage::Train, async {
            driver
                .train_and_validate(paths, settings, split)
                .await
                .context("Training failed")
        })
        .await;
        let report = result?;

        observability::record_validation_metrics(&report.metrics, report.split);
        self.stats.validation = Some(report.clone());
        Ok(report)
    }

    /// Stage 4, export sub-path
    pub async fn export<E: ModelExporter>(&mut self, exporter: E) -> Result<ExportedModel> {
        let driver = ExportDriver::new(exporter);
        let paths = &self.resolved.paths;
        let settings = &self.resolved.settings.export;

        let result = timed(&mut self.stats, Stage::Export, async {
            driver.export(paths, settings).await.context("Export failed")
        })
        .await;
        let exported = result?;

        self.stats.exported = Some(exported.clone());
        Ok(exported)
    }
}

fn resolve(config: &PipelineConfig) -> Result<(ResolvedConfig, Option<RemoteDatasetHandle>)> {
    let resolved = ConfigLoader::resolve(&config.pipeline_dir, config.settings.as_deref())
        .with_context(|| {
            format!(
                "Failed to resolve configuration from {}",
                config.pipeline_dir.display()
            )
        })?;

    let handle = if config.load_dataset_handle {
        let handle = ConfigLoader::load_dataset_handle(&resolved.paths).with_context(|| {
            format!(
                "Failed to load dataset credentials from {}",
                resolved.paths.secret_file().display()
            )
        })?;
        Some(handle)
    } else {
        None
    };

    Ok((resolved, handle))
}

/// Await a stage and record its timing
async fn timed<T, F>(stats: &mut PipelineStats, stage: Stage, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let start = Instant::now();
    let result = fut.await;
    record(stats, stage, start, &result);
    result
}

fn record<T>(stats: &mut PipelineStats, stage: Stage, start: Instant, result: &Result<T>) {
    let elapsed = start.elapsed();
    let outcome = match result {
        Ok(_) => {
            info!(stage = %stage, elapsed_secs = elapsed.as_secs_f64(), "stage finished");
            StageOutcome::Completed
        }
        Err(e) => {
            warn!(stage = %stage, error = format!("{e:#}"), "stage failed");
            StageOutcome::Failed
        }
    };
    stats.timings.record(stage, elapsed, outcome);
}
