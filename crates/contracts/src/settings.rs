//! PipelineSettings - Config Loader output
//!
//! Hyperparameters and service settings. Every field defaults to the value the
//! pipeline has always used, so an absent settings file is a valid configuration.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Complete pipeline settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PipelineSettings {
    /// Remote dataset settings
    #[validate(nested)]
    pub dataset: DatasetSettings,

    /// External trainer settings
    #[validate(nested)]
    pub training: TrainingSettings,

    /// External exporter settings
    #[validate(nested)]
    pub export: ExportSettings,
}

/// Remote dataset settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DatasetSettings {
    /// Download format requested from the dataset service
    #[validate(length(min = 1))]
    pub format: String,

    /// Dataset service base URL
    #[validate(custom(function = "validate_http_url"))]
    pub api_url: String,

    /// How an existing dataset directory is replaced
    pub replace: ReplacePolicy,
}

impl Default for DatasetSettings {
    fn default() -> Self {
        Self {
            format: "yolov8".to_string(),
            api_url: "https://api.roboflow.com".to_string(),
            replace: ReplacePolicy::default(),
        }
    }
}

/// Replacement policy for the canonical dataset directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacePolicy {
    /// Delete the target before downloading; a failed download leaves nothing behind
    #[default]
    Destructive,
    /// Download first, then swap; a failed download keeps the old dataset
    Staged,
}

/// External trainer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct TrainingSettings {
    /// Trainer executable
    #[validate(length(min = 1))]
    pub program: String,

    /// Pretrained weights the run starts from
    #[validate(length(min = 1))]
    pub base_model: String,

    /// Epoch count, must be >= 1
    #[validate(range(min = 1))]
    pub epochs: u32,

    /// Square input size in pixels
    #[validate(range(min = 32, max = 4096), custom(function = "validate_stride"))]
    pub image_size: u32,

    /// Batch size; -1 lets the trainer pick
    #[validate(custom(function = "validate_batch"))]
    pub batch: i32,

    /// Device selector passed through to the trainer (e.g. "0", "cpu")
    #[validate(length(min = 1))]
    pub device: String,

    /// Run name namespacing every artifact of one training invocation
    #[validate(custom(function = "validate_run_name"))]
    pub run_name: String,

    /// Reuse an existing run directory instead of creating `<run_name>2`
    pub exist_ok: bool,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            program: "yolo".to_string(),
            base_model: "yolov8n.pt".to_string(),
            epochs: 100,
            image_size: 640,
            batch: 16,
            device: "0".to_string(),
            run_name: "raptor_run".to_string(),
            exist_ok: true,
        }
    }
}

/// External exporter settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ExportSettings {
    /// Interchange format
    pub format: ExportFormat,

    /// Square input size baked into the exported graph
    #[validate(range(min = 32, max = 4096), custom(function = "validate_stride"))]
    pub image_size: u32,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            format: ExportFormat::default(),
            image_size: 640,
        }
    }
}

/// Single-file interchange formats the exporter can produce next to a checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Onnx,
    Torchscript,
    Engine,
}

impl ExportFormat {
    /// Format identifier understood by the exporter
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Onnx => "onnx",
            Self::Torchscript => "torchscript",
            Self::Engine => "engine",
        }
    }

    /// Canonical file extension of the exporter output
    pub fn extension(&self) -> &'static str {
        // Each supported format happens to use its identifier as extension.
        self.as_str()
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn validate_stride(value: u32) -> Result<(), ValidationError> {
    if value % 32 == 0 {
        Ok(())
    } else {
        Err(ValidationError::new("stride").with_message("must be a multiple of 32".into()))
    }
}

fn validate_batch(value: i32) -> Result<(), ValidationError> {
    if value == -1 || value > 0 {
        Ok(())
    } else {
        Err(ValidationError::new("batch").with_message("must be > 0 or -1 (auto)".into()))
    }
}

fn validate_run_name(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("run_name").with_message("cannot be empty".into()));
    }
    if value.contains(['/', '\\']) || value == "." || value == ".." {
        return Err(ValidationError::new("run_name")
            .with_message("must be a single path component".into()));
    }
    Ok(())
}

fn validate_http_url(value: &str) -> Result<(), ValidationError> {
    if value.starts_with("https://") || value.starts_with("http://") {
        Ok(())
    } else {
        Err(ValidationError::new("api_url").with_message("must be an http(s) URL".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = PipelineSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.training.epochs, 100);
        assert_eq!(settings.training.run_name, "raptor_run");
        assert_eq!(settings.export.format, ExportFormat::Onnx);
    }

    #[test]
    fn test_batch_rules() {
        assert!(validate_batch(16).is_ok());
        assert!(validate_batch(-1).is_ok());
        assert!(validate_batch(0).is_err());
        assert!(validate_batch(-4).is_err());

        let mut settings = PipelineSettings::default();
        settings.training.batch = 0;
        assert!(settings.validate().is_err());
        settings.training.batch = -1;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_run_name_rejects_paths() {
        assert!(validate_run_name("raptor_run").is_ok());
        assert!(validate_run_name("a/b").is_err());
        assert!(validate_run_name("..").is_err());
        assert!(validate_run_name("  ").is_err());
    }

    #[test]
    fn test_image_size_stride() {
        assert!(validate_stride(640).is_ok());
        assert!(validate_stride(650).is_err());

        let mut settings = PipelineSettings::default();
        settings.training.image_size = 650;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_export_extension() {
        assert_eq!(ExportFormat::Onnx.extension(), "onnx");
        assert_eq!(ExportFormat::Torchscript.to_string(), "torchscript");
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{ "training": { "epochs": 5, "device": "cpu" } }"#;
        let settings: PipelineSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.training.epochs, 5);
        assert_eq!(settings.training.device, "cpu");
        assert_eq!(settings.training.batch, 16);
        assert_eq!(settings.dataset.format, "yolov8");
        assert_eq!(settings.dataset.replace, ReplacePolicy::Destructive);
    }
}
