//! Dataset descriptors shared by the acquirer and the normalizer.

use std::fmt;

/// Training images split, relative to the dataset root
pub const TRAIN_IMAGES: &str = "train/images";

/// Validation images split, relative to the dataset root
pub const VALID_IMAGES: &str = "valid/images";

/// Remote dataset identity
///
/// Constructed once by the config loader from the secret file and consumed by
/// the dataset acquirer. `Debug` never prints the API key.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteDatasetHandle {
    /// Dataset service API key
    pub api_key: String,

    /// Workspace identifier
    pub workspace: String,

    /// Project identifier inside the workspace
    pub project: String,

    /// Dataset version number, starting at 1
    pub version: u32,
}

impl RemoteDatasetHandle {
    /// `<workspace>/<project>/<version>`, used in logs and error messages
    pub fn slug(&self) -> String {
        format!("{}/{}/{}", self.workspace, self.project, self.version)
    }
}

impl fmt::Debug for RemoteDatasetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteDatasetHandle")
            .field("api_key", &"<redacted>")
            .field("workspace", &self.workspace)
            .field("project", &self.project)
            .field("version", &self.version)
            .finish()
    }
}

/// Which split the trainer validates against
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationSplit {
    /// A real `valid/images` split exists
    Validation,
    /// No validation split on disk; the training split is reused
    TrainFallback,
}

impl ValidationSplit {
    /// Value written to the `val` key of the dataset config
    pub fn relative_path(&self) -> &'static str {
        match self {
            Self::Validation => VALID_IMAGES,
            Self::TrainFallback => TRAIN_IMAGES,
        }
    }

    /// Tag attached to reported metrics
    pub fn metrics_tag(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::TrainFallback => "validation-on-train",
        }
    }
}
