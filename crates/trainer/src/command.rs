//! `yolo` command construction
//!
//! Pure functions from requests to argument vectors, kept apart from process
//! handling so they can be checked without the trainer installed.

use std::fmt;
use std::path::Path;

use contracts::{ExportRequest, TrainRequest, ValidateRequest};

/// Suffix appended to the run name for the validation output directory
pub const VALIDATION_RUN_SUFFIX: &str = "_val";

/// A program plus its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl fmt::Display for TrainerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

fn kv(key: &str, value: impl fmt::Display) -> String {
    format!("{key}={value}")
}

fn path_kv(key: &str, path: &Path) -> String {
    kv(key, path.display())
}

/// Python-style boolean literal expected by the CLI
fn py_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// `yolo detect train ...`
pub fn train_command(program: &str, request: &TrainRequest) -> TrainerCommand {
    let args = vec![
        "detect".to_string(),
        "train".to_string(),
        path_kv("data", &request.data_config),
        kv("model", &request.base_model),
        kv("epochs", request.epochs),
        kv("imgsz", request.image_size),
        kv("batch", request.batch),
        kv("device", &request.device),
        path_kv("project", &request.project_dir),
        kv("name", &request.run_name),
        kv("exist_ok", py_bool(request.exist_ok)),
    ];
    TrainerCommand {
        program: program.to_string(),
        args,
    }
}

/// `yolo detect val ...`
///
/// Validation output always goes to `<run_name>_val`, overwritten on rerun.
pub fn val_command(program: &str, request: &ValidateRequest) -> TrainerCommand {
    let args = vec![
        "detect".to_string(),
        "val".to_string(),
        path_kv("model", &request.checkpoint),
        path_kv("data", &request.data_config),
        kv("imgsz", request.image_size),
        kv("batch", request.batch),
        kv("device", &request.device),
        path_kv("project", &request.project_dir),
        kv("name", format!("{}{VALIDATION_RUN_SUFFIX}", request.run_name)),
        kv("exist_ok", py_bool(true)),
    ];
    TrainerCommand {
        program: program.to_string(),
        args,
    }
}

/// `yolo export ...`
pub fn export_command(program: &str, request: &ExportRequest) -> TrainerCommand {
    let args = vec![
        "export".to_string(),
        path_kv("model", &request.checkpoint),
        kv("format", request.format.as_str()),
        kv("imgsz", request.image_size),
    ];
    TrainerCommand {
        program: program.to_string(),
        args,
    }
}
