//! PipelinePaths - Config Loader output
//!
//! Every location the pipeline reads or writes, derived from one anchor
//! directory. Stages never build paths on their own; the training and export
//! sub-paths share the checkpoint contract defined here.

use std::path::{Path, PathBuf};

use crate::ExportFormat;

/// Secret file name, relative to the project root
pub const SECRET_FILE_NAME: &str = ".env";

/// Optional settings file name, relative to the project root
pub const SETTINGS_FILE_NAME: &str = "pipeline.toml";

/// Dataset config file name, relative to the dataset directory
pub const DATASET_CONFIG_FILE_NAME: &str = "data.yaml";

/// Task sub-directory the trainer nests runs under
pub const RUNS_TASK_DIR: &str = "detect";

/// Checkpoint file stem inside `<run>/weights`
pub const BEST_CHECKPOINT_STEM: &str = "best";

/// Checkpoint file extension
pub const CHECKPOINT_EXTENSION: &str = "pt";

/// Canonical exported model stem inside the models directory
pub const EXPORTED_MODEL_STEM: &str = "model";

/// Resolved absolute locations
///
/// Created once at pipeline start; immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelinePaths {
    pipeline_dir: PathBuf,
    project_root: PathBuf,
    run_name: String,
    export_format: ExportFormat,
}

impl PipelinePaths {
    /// Build paths from an absolute anchor and its parent
    ///
    /// Callers are expected to pass an absolute `pipeline_dir`; the config
    /// loader takes care of that.
    pub fn new(
        pipeline_dir: PathBuf,
        project_root: PathBuf,
        run_name: impl Into<String>,
        export_format: ExportFormat,
    ) -> Self {
        Self {
            pipeline_dir,
            project_root,
            run_name: run_name.into(),
            export_format,
        }
    }

    /// Directory the pipeline runs from (the anchor)
    pub fn pipeline_dir(&self) -> &Path {
        &self.pipeline_dir
    }

    /// Project root, one level above the anchor
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Run name the artifact paths are derived from
    pub fn run_name(&self) -> &str {
        &self.run_name
    }

    /// Export format the canonical model path is derived from
    pub fn export_format(&self) -> ExportFormat {
        self.export_format
    }

    /// `<root>/.env`
    pub fn secret_file(&self) -> PathBuf {
        self.project_root.join(SECRET_FILE_NAME)
    }

    /// `<root>/pipeline.toml`
    pub fn settings_file(&self) -> PathBuf {
        self.project_root.join(SETTINGS_FILE_NAME)
    }

    /// `<root>/data/dataset`
    pub fn dataset_dir(&self) -> PathBuf {
        self.project_root.join("data").join("dataset")
    }

    /// `<root>/data/dataset/data.yaml`
    pub fn dataset_config(&self) -> PathBuf {
        self.dataset_dir().join(DATASET_CONFIG_FILE_NAME)
    }

    /// Where the dataset service drops downloads before relocation
    pub fn download_root(&self) -> &Path {
        &self.pipeline_dir
    }

    /// `<root>/runs`
    pub fn runs_dir(&self) -> PathBuf {
        self.project_root.join("runs")
    }

    /// `<root>/runs/detect`, the project directory handed to the trainer
    pub fn runs_project_dir(&self) -> PathBuf {
        self.runs_dir().join(RUNS_TASK_DIR)
    }

    /// `<root>/runs/detect/<run>`
    pub fn run_dir(&self) -> PathBuf {
        self.runs_project_dir().join(&self.run_name)
    }

    /// `<root>/runs/detect/<run>/weights/best.pt`
    pub fn checkpoint(&self) -> PathBuf {
        self.run_dir()
            .join("weights")
            .join(format!("{BEST_CHECKPOINT_STEM}.{CHECKPOINT_EXTENSION}"))
    }

    /// Where the exporter writes: the checkpoint with its extension swapped
    pub fn export_output(&self) -> PathBuf {
        self.checkpoint()
            .with_extension(self.export_format.extension())
    }

    /// `<root>/models`
    pub fn models_dir(&self) -> PathBuf {
        self.project_root.join("models")
    }

    /// `<root>/models/model.<ext>`, the location inference consumers read
    pub fn exported_model(&self) -> PathBuf {
        self.models_dir().join(format!(
            "{EXPORTED_MODEL_STEM}.{}",
            self.export_format.extension()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PipelinePaths {
        PipelinePaths::new(
            PathBuf::from("/work/demo/training"),
            PathBuf::from("/work/demo"),
            "raptor_run",
            ExportFormat::Onnx,
        )
    }

    #[test]
    fn test_checkpoint_contract() {
        let paths = sample();
        assert_eq!(
            paths.checkpoint(),
            PathBuf::from("/work/demo/runs/detect/raptor_run/weights/best.pt")
        );
        assert_eq!(
            paths.export_output(),
            PathBuf::from("/work/demo/runs/detect/raptor_run/weights/best.onnx")
        );
    }

    #[test]
    fn test_canonical_locations() {
        let paths = sample();
        assert_eq!(paths.secret_file(), PathBuf::from("/work/demo/.env"));
        assert_eq!(paths.dataset_dir(), PathBuf::from("/work/demo/data/dataset"));
        assert_eq!(
            paths.dataset_config(),
            PathBuf::from("/work/demo/data/dataset/data.yaml")
        );
        assert_eq!(
            paths.exported_model(),
            PathBuf::from("/work/demo/models/model.onnx")
        );
        assert_eq!(paths.download_root(), Path::new("/work/demo/training"));
    }

    #[test]
    fn test_export_format_changes_extension() {
        let paths = PipelinePaths::new(
            PathBuf::from("/w/t"),
            PathBuf::from("/w"),
            "r",
            ExportFormat::Torchscript,
        );
        assert_eq!(paths.exported_model(), PathBuf::from("/w/models/model.torchscript"));
    }
}
