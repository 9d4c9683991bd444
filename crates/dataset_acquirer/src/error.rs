//! Dataset acquisition error types

use std::path::PathBuf;

use contracts::ContractError;
use thiserror::Error;

/// Dataset acquirer specific error
#[derive(Debug, Error)]
pub enum AcquireError {
    /// API key rejected
    #[error("dataset service rejected the API key: {message}")]
    Unauthorized { message: String },

    /// Workspace, project or version does not exist
    #[error("{kind} '{name}' not found on the dataset service")]
    NotFound { kind: &'static str, name: String },

    /// Service answered with an unexpected status or body
    #[error("dataset service error ({status}) for {url}: {message}")]
    Service {
        status: u16,
        url: String,
        message: String,
    },

    /// Requested export is not available for download
    #[error("no '{format}' export link for dataset {dataset}")]
    ExportUnavailable { format: String, dataset: String },

    /// Transport error; the request URL is stripped since it carries the API key
    #[error("dataset service request failed: {0}")]
    Http(reqwest::Error),

    /// Downloaded archive could not be unpacked
    #[error("failed to unpack dataset archive into {}: {message}", dest.display())]
    Archive { dest: PathBuf, message: String },

    /// Service reported a location that does not exist locally
    #[error("downloaded dataset not found at {}", path.display())]
    DownloadMissing { path: PathBuf },

    /// Moving the downloaded tree into place failed
    #[error("failed to move {} to {}: {source}", from.display(), to.display())]
    Relocate {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Filesystem error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped ContractError
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl AcquireError {
    /// Create not-found error
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }
}

impl From<reqwest::Error> for AcquireError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.without_url())
    }
}

impl From<AcquireError> for ContractError {
    fn from(err: AcquireError) -> Self {
        match err {
            AcquireError::Contract(inner) => inner,
            other => ContractError::dataset_acquisition(other.to_string()),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, AcquireError>;
