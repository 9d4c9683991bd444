//! Requests handed to the external trainer/exporter and what comes back.

use std::path::PathBuf;

use serde::Serialize;

use crate::ExportFormat;

/// Training invocation
#[derive(Debug, Clone, PartialEq)]
pub struct TrainRequest {
    /// Normalized dataset config
    pub data_config: PathBuf,
    /// Pretrained weights to start from
    pub base_model: String,
    pub epochs: u32,
    pub image_size: u32,
    pub batch: i32,
    pub device: String,
    /// Directory runs are created under (`<root>/runs/detect`)
    pub project_dir: PathBuf,
    pub run_name: String,
    pub exist_ok: bool,
}

/// Validation invocation against a trained checkpoint
#[derive(Debug, Clone, PartialEq)]
pub struct ValidateRequest {
    pub checkpoint: PathBuf,
    pub data_config: PathBuf,
    pub image_size: u32,
    pub batch: i32,
    pub device: String,
    pub project_dir: PathBuf,
    /// Run name for the validation output directory
    pub run_name: String,
}

/// Export invocation
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    pub checkpoint: PathBuf,
    pub format: ExportFormat,
    pub image_size: u32,
}

/// Scalar validation aggregates
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValidationMetrics {
    /// Mean average precision over IoU 0.50:0.95
    pub map50_95: f64,
    /// Mean average precision at IoU 0.50
    pub map50: Option<f64>,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
}

/// Best checkpoint of a training run
///
/// Only path bookkeeping; contents are never read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingArtifact {
    pub checkpoint: PathBuf,
}

/// Exported model at its canonical location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedModel {
    pub path: PathBuf,
    pub format: ExportFormat,
}
