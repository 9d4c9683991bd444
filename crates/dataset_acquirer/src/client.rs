//! Dataset service abstraction
//!
//! Defines the trait for talking to the remote dataset service, supporting the
//! real HTTP client and the mock used in tests.

use std::future::Future;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// A dataset version resolved on the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetVersion {
    pub workspace: String,
    pub project: String,
    pub version: u32,
    /// Human-readable version name, when the service provides one
    pub name: Option<String>,
    /// Image count, when the service provides one
    pub images: Option<u64>,
}

impl DatasetVersion {
    /// `<workspace>/<project>/<version>`
    pub fn slug(&self) -> String {
        format!("{}/{}/{}", self.workspace, self.project, self.version)
    }

    /// Directory name the service extracts this version into
    pub fn download_dir_name(&self) -> String {
        format!("{}-{}", self.project, self.version)
    }
}

/// Handle to a finished download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedDataset {
    /// Where the service actually put the extracted tree
    pub location: PathBuf,
    pub format: String,
}

/// Dataset service trait
///
/// Call order: `authenticate` -> `resolve_version` -> `download`.
pub trait DatasetService: Send + Sync {
    /// Authenticate with the API key
    fn authenticate(&mut self, api_key: &str) -> impl Future<Output = Result<()>> + Send;

    /// Resolve workspace, project and version
    ///
    /// # Returns
    /// The resolved version; `NotFound` if any level does not exist
    fn resolve_version(
        &self,
        workspace: &str,
        project: &str,
        version: u32,
    ) -> impl Future<Output = Result<DatasetVersion>> + Send;

    /// Download a version in the given format
    ///
    /// The service picks the final location under `download_root`; callers must
    /// read it back from the returned handle.
    fn download(
        &self,
        version: &DatasetVersion,
        format: &str,
        download_root: &Path,
    ) -> impl Future<Output = Result<DownloadedDataset>> + Send;
}
