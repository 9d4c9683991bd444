//! Layered error definitions
//!
//! Categorized by stage: configuration / dataset / training / export

use std::path::PathBuf;

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Required configuration file is missing
    #[error("config file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Dataset Errors =====
    /// Remote dataset could not be acquired
    #[error("dataset acquisition error: {message}")]
    DatasetAcquisition { message: String },

    // ===== Training / Export Errors =====
    /// External trainer or exporter failed
    #[error("trainer '{program}' failed: {message}")]
    TrainerFailed { program: String, message: String },

    /// Validation output carried no summary metrics
    #[error("validation metrics unavailable: {message}")]
    MetricsUnavailable { message: String },

    /// Checkpoint missing at the convention path
    #[error("model file not found at {}", path.display())]
    CheckpointMissing { path: PathBuf },

    /// Exporter finished without producing its output
    #[error("export finished but {} was not found", path.display())]
    ExportArtifactMissing { path: PathBuf },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create missing configuration file error
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create dataset acquisition error
    pub fn dataset_acquisition(message: impl Into<String>) -> Self {
        Self::DatasetAcquisition {
            message: message.into(),
        }
    }

    /// Create trainer failure error
    pub fn trainer_failed(program: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TrainerFailed {
            program: program.into(),
            message: message.into(),
        }
    }

    /// Whether this error belongs to the configuration family.
    ///
    /// Configuration errors are raised before any network or training work.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::ConfigNotFound { .. } | Self::ConfigParse { .. } | Self::ConfigValidation { .. }
        )
    }
}
