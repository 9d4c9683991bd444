//! External trainer/exporter traits
//!
//! The training algorithm and the serialization format belong to external
//! components; the pipeline only hands them configuration and paths.

use crate::{ContractError, ExportRequest, TrainRequest, ValidateRequest, ValidationMetrics};

/// Model trainer trait
///
/// Implementations place the best checkpoint at
/// `<project_dir>/<run_name>/weights/best.pt`. Callers locate it through
/// `PipelinePaths::checkpoint`, never through a return value.
#[trait_variant::make(ModelTrainer: Send)]
pub trait LocalModelTrainer {
    /// Trainer name (used for logging/errors)
    fn name(&self) -> &str;

    /// Run training to completion
    async fn train(&self, request: &TrainRequest) -> Result<(), ContractError>;

    /// Validate a checkpoint and return the aggregate metrics
    async fn validate(&self, request: &ValidateRequest)
        -> Result<ValidationMetrics, ContractError>;
}

/// Model exporter trait
///
/// Implementations write their output next to the checkpoint, same stem,
/// extension given by the export format.
#[trait_variant::make(ModelExporter: Send)]
pub trait LocalModelExporter {
    /// Exporter name (used for logging/errors)
    fn name(&self) -> &str;

    /// Run the export to completion
    async fn export(&self, request: &ExportRequest) -> Result<(), ContractError>;
}
