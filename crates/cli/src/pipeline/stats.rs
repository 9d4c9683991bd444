//! Pipeline run summary.

use std::path::PathBuf;

use contracts::{ExportedModel, ValidationSplit};
use dataset_acquirer::DatasetVersion;
use observability::StageTimings;
use trainer::ValidationReport;

/// What one run produced, stage by stage
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Per-stage durations and outcomes
    pub timings: StageTimings,

    /// Dataset version installed by the acquirer
    pub dataset: Option<DatasetVersion>,

    /// Normalized dataset config
    pub dataset_config: Option<PathBuf>,

    /// Split the normalizer chose for validation
    pub validation_split: Option<ValidationSplit>,

    /// Validation metrics of the trained checkpoint
    pub validation: Option<ValidationReport>,

    /// Model written to the models directory
    pub exported: Option<ExportedModel>,
}

impl PipelineStats {
    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Pipeline Summary ===\n");

        if let Some(version) = &self.dataset {
            println!("Dataset");
            println!("  Version: {}", version.slug());
            if let Some(images) = version.images {
                println!("  Images:  {images}");
            }
        }

        if let Some(config) = &self.dataset_config {
            println!("  Config:  {}", config.display());
        }
        if let Some(split) = self.validation_split {
            println!("  Validation split: {}", split.relative_path());
        }

        if let Some(report) = &self.validation {
            println!("\nValidation ({})", report.tag());
            println!("  Checkpoint: {}", report.checkpoint.display());
            println!("  mAP50-95:   {:.4}", report.metrics.map50_95);
            if let Some(map50) = report.metrics.map50 {
                println!("  mAP50:      {map50:.4}");
            }
            if let Some(precision) = report.metrics.precision {
                println!("  Precision:  {precision:.4}");
            }
            if let Some(recall) = report.metrics.recall {
                println!("  Recall:     {recall:.4}");
            }
            if report.is_on_train() {
                println!("  ! measured on the training split");
            }
        }

        if let Some(model) = &self.exported {
            println!("\nExport");
            println!("  Format: {}", model.format);
            println!("  Model:  {}", model.path.display());
        }

        println!("\n{}", self.timings);
    }
}
