//! DatasetAcquirer core implementation
//!
//! Pulls a dataset version from the service and installs it at the canonical
//! dataset directory.

use std::path::{Path, PathBuf};

use contracts::{RemoteDatasetHandle, ReplacePolicy};
use tracing::{info, instrument, warn};

use crate::client::{DatasetService, DatasetVersion};
use crate::error::{AcquireError, Result};
use crate::relocate;

/// Dataset installed at the target directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquiredDataset {
    /// Canonical dataset directory
    pub path: PathBuf,
    /// Version that was installed
    pub version: DatasetVersion,
}

/// Dataset Acquirer
///
/// Always produces a clean, service-authoritative tree: whatever was at the
/// target before is removed. With `ReplacePolicy::Destructive` it is removed
/// before the download starts; with `ReplacePolicy::Staged` only after the
/// download succeeded.
pub struct DatasetAcquirer<S: DatasetService> {
    service: S,
    format: String,
    policy: ReplacePolicy,
}

impl<S: DatasetService> DatasetAcquirer<S> {
    /// Create a new DatasetAcquirer
    pub fn new(service: S, format: impl Into<String>, policy: ReplacePolicy) -> Self {
        Self {
            service,
            format: format.into(),
            policy,
        }
    }

    /// Access the underlying service
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Fetch `handle` and install it at `target_dir`
    ///
    /// `download_root` is where the service may put its download; the actual
    /// location is read back from the service.
    ///
    /// # Errors
    /// Any service error, a missing download location, or a failed move. No
    /// cleanup is attempted on failure.
    #[instrument(
        name = "dataset_acquire",
        skip(self, handle, target_dir, download_root),
        fields(dataset = %handle.slug(), policy = ?self.policy)
    )]
    pub async fn acquire(
        &mut self,
        handle: &RemoteDatasetHandle,
        target_dir: &Path,
        download_root: &Path,
    ) -> Result<AcquiredDataset> {
        info!(target = %target_dir.display(), "acquiring dataset");

        self.service.authenticate(&handle.api_key).await?;
        let version = self
            .service
            .resolve_version(&handle.workspace, &handle.project, handle.version)
            .await?;

        if self.policy == ReplacePolicy::Destructive {
            clear_target(target_dir).await?;
        }

        info!(format = %self.format, "downloading dataset");
        let downloaded = self
            .service
            .download(&version, &self.format, download_root)
            .await?;

        let location = downloaded.location;
        if !location.is_dir() {
            return Err(AcquireError::DownloadMissing { path: location });
        }

        if self.policy == ReplacePolicy::Staged {
            clear_target(target_dir).await?;
        }

        if location != target_dir {
            info!(
                from = %location.display(),
                to = %target_dir.display(),
                "moving dataset into place"
            );
            relocate::move_dir(&location, target_dir).await?;
        }

        info!(path = %target_dir.display(), "dataset installed");

        Ok(AcquiredDataset {
            path: target_dir.to_path_buf(),
            version,
        })
    }
}

/// Remove an existing target directory (or stray file) recursively
async fn clear_target(target_dir: &Path) -> Result<()> {
    match tokio::fs::symlink_metadata(target_dir).await {
        Ok(meta) if meta.is_dir() => {
            warn!(path = %target_dir.display(), "removing existing dataset directory");
            tokio::fs::remove_dir_all(target_dir).await?;
        }
        Ok(_) => {
            warn!(path = %target_dir.display(), "removing file at dataset location");
            tokio::fs::remove_file(target_dir).await?;
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_client::{MockConfig, MockDatasetService};
    use std::fs;

    fn handle(version: u32) -> RemoteDatasetHandle {
        RemoteDatasetHandle {
            api_key: "key".into(),
            workspace: "birds".into(),
            project: "raptors".into(),
            version,
        }
    }

    struct Layout {
        _root: tempfile::TempDir,
        target: PathBuf,
        downloads: PathBuf,
    }

    fn layout() -> Layout {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("data").join("dataset");
        let downloads = root.path().join("training");
        fs::create_dir_all(&downloads).unwrap();
        Layout {
            target,
            downloads,
            _root: root,
        }
    }

    #[tokio::test]
    async fn test_acquire_installs_dataset() {
        let l = layout();
        let mut acquirer =
            DatasetAcquirer::new(MockDatasetService::new(), "yolov8", ReplacePolicy::Destructive);

        let acquired = acquirer
            .acquire(&handle(2), &l.target, &l.downloads)
            .await
            .unwrap();

        assert_eq!(acquired.path, l.target);
        assert_eq!(acquired.version.version, 2);
        assert!(l.target.join("data.yaml").is_file());
        assert!(l.target.join("train/images").is_dir());
        assert!(!l.downloads.join("raptors-2").exists());
        assert_eq!(
            acquirer.service().requested_versions(),
            vec![("birds".to_string(), "raptors".to_string(), 2)]
        );
    }

    #[tokio::test]
    async fn test_existing_target_is_replaced() {
        let l = layout();
        fs::create_dir_all(l.target.join("stale/nested")).unwrap();
        fs::write(l.target.join("manual_copy.txt"), b"old").unwrap();

        let mut acquirer =
            DatasetAcquirer::new(MockDatasetService::new(), "yolov8", ReplacePolicy::Destructive);
        acquirer
            .acquire(&handle(1), &l.target, &l.downloads)
            .await
            .unwrap();

        assert!(!l.target.join("stale").exists());
        assert!(!l.target.join("manual_copy.txt").exists());
        assert!(l.target.join("data.yaml").is_file());
    }

    #[tokio::test]
    async fn test_destructive_failure_leaves_target_deleted() {
        let l = layout();
        fs::create_dir_all(&l.target).unwrap();
        fs::write(l.target.join("data.yaml"), b"old").unwrap();

        let service = MockDatasetService::with_config(MockConfig {
            fail_download: true,
            ..Default::default()
        });
        let mut acquirer = DatasetAcquirer::new(service, "yolov8", ReplacePolicy::Destructive);
        let result = acquirer.acquire(&handle(1), &l.target, &l.downloads).await;

        assert!(result.is_err());
        assert!(!l.target.exists());
    }

    #[tokio::test]
    async fn test_staged_failure_keeps_old_dataset() {
        let l = layout();
        fs::create_dir_all(&l.target).unwrap();
        fs::write(l.target.join("data.yaml"), b"old").unwrap();

        let service = MockDatasetService::with_config(MockConfig {
            fail_download: true,
            ..Default::default()
        });
        let mut acquirer = DatasetAcquirer::new(service, "yolov8", ReplacePolicy::Staged);
        let result = acquirer.acquire(&handle(1), &l.target, &l.downloads).await;

        assert!(result.is_err());
        assert_eq!(fs::read(l.target.join("data.yaml")).unwrap(), b"old");
    }

    #[tokio::test]
    async fn test_staged_success_swaps_in_new_tree() {
        let l = layout();
        fs::create_dir_all(&l.target).unwrap();
        fs::write(l.target.join("old.txt"), b"old").unwrap();

        let mut acquirer =
            DatasetAcquirer::new(MockDatasetService::new(), "yolov8", ReplacePolicy::Staged);
        acquirer
            .acquire(&handle(1), &l.target, &l.downloads)
            .await
            .unwrap();

        assert!(!l.target.join("old.txt").exists());
        assert!(l.target.join("data.yaml").is_file());
    }

    #[tokio::test]
    async fn test_missing_download_location() {
        let l = layout();
        let service = MockDatasetService::with_config(MockConfig {
            report_missing_location: true,
            ..Default::default()
        });
        let mut acquirer = DatasetAcquirer::new(service, "yolov8", ReplacePolicy::Destructive);
        let err = acquirer
            .acquire(&handle(1), &l.target, &l.downloads)
            .await
            .unwrap_err();

        assert!(matches!(err, AcquireError::DownloadMissing { .. }));
    }

    #[tokio::test]
    async fn test_auth_failure_touches_nothing() {
        let l = layout();
        fs::create_dir_all(&l.target).unwrap();

        let service = MockDatasetService::with_config(MockConfig {
            fail_auth: true,
            ..Default::default()
        });
        let mut acquirer = DatasetAcquirer::new(service, "yolov8", ReplacePolicy::Destructive);
        let err = acquirer
            .acquire(&handle(1), &l.target, &l.downloads)
            .await
            .unwrap_err();

        assert!(matches!(err, AcquireError::Unauthorized { .. }));
        assert!(l.target.exists());
        assert_eq!(acquirer.service().download_count(), 0);
    }
}
