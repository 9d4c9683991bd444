//! Mock dataset service
//!
//! Writes a small yolov8-style tree instead of downloading; supports failure
//! injection and records what was requested.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use tracing::instrument;

use crate::client::{DatasetService, DatasetVersion, DownloadedDataset};
use crate::error::{AcquireError, Result};

/// Mock service configuration
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Reject the API key
    pub fail_auth: bool,
    /// Fail every download request
    pub fail_download: bool,
    /// Report a location that was never written
    pub report_missing_location: bool,
    /// Write a `valid/` split
    pub include_valid_split: bool,
    /// Write a `test/` split
    pub include_test_split: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            fail_auth: false,
            fail_download: false,
            report_missing_location: false,
            include_valid_split: true,
            include_test_split: true,
        }
    }
}

/// Mock dataset service
pub struct MockDatasetService {
    config: MockConfig,
    /// Requested (workspace, project, version) triples
    requested: Mutex<Vec<(String, String, u32)>>,
    authenticated: Mutex<bool>,
    downloads: AtomicUsize,
}

impl MockDatasetService {
    /// Create default mock service
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    /// Create mock service with configuration
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            config,
            requested: Mutex::new(Vec::new()),
            authenticated: Mutex::new(false),
            downloads: AtomicUsize::new(0),
        }
    }

    /// Every resolved (workspace, project, version)
    pub fn requested_versions(&self) -> Vec<(String, String, u32)> {
        self.requested.lock().unwrap().clone()
    }

    /// Number of download calls
    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    fn ensure_authenticated(&self) -> Result<()> {
        if *self.authenticated.lock().unwrap() {
            Ok(())
        } else {
            Err(AcquireError::Unauthorized {
                message: "not authenticated".into(),
            })
        }
    }

    fn write_tree(&self, root: &Path, version: &DatasetVersion) -> std::io::Result<()> {
        let mut splits = vec!["train"];
        if self.config.include_valid_split {
            splits.push("valid");
        }
        if self.config.include_test_split {
            splits.push("test");
        }

        for split in &splits {
            fs::create_dir_all(root.join(split).join("images"))?;
            fs::create_dir_all(root.join(split).join("labels"))?;
            fs::write(root.join(split).join("images").join("raptor_0.jpg"), b"jpeg")?;
            fs::write(
                root.join(split).join("labels").join("raptor_0.txt"),
                b"0 0.5 0.5 0.2 0.2\n",
            )?;
        }

        let mut yaml = String::from("train: ../train/images\nval: ../valid/images\n");
        if self.config.include_test_split {
            yaml.push_str("test: ../test/images\n");
        }
        yaml.push_str("nc: 1\nnames:\n- raptor\n");
        yaml.push_str(&format!(
            "roboflow:\n  workspace: {}\n  project: {}\n  version: {}\n  license: CC BY 4.0\n",
            version.workspace, version.project, version.version
        ));
        fs::write(root.join("data.yaml"), yaml)
    }
}

impl Default for MockDatasetService {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetService for MockDatasetService {
    #[instrument(name = "mock_dataset_authenticate", skip(self, api_key))]
    async fn authenticate(&mut self, api_key: &str) -> Result<()> {
        if self.config.fail_auth || api_key.is_empty() {
            return Err(AcquireError::Unauthorized {
                message: "mock rejected api key".into(),
            });
        }
        *self.authenticated.lock().unwrap() = true;
        Ok(())
    }

    #[instrument(name = "mock_dataset_resolve_version", skip(self))]
    async fn resolve_version(
        &self,
        workspace: &str,
        project: &str,
        version: u32,
    ) -> Result<DatasetVersion> {
        self.ensure_authenticated()?;
        self.requested
            .lock()
            .unwrap()
            .push((workspace.to_string(), project.to_string(), version));

        Ok(DatasetVersion {
            workspace: workspace.to_string(),
            project: project.to_string(),
            version,
            name: Some(format!("mock v{version}")),
            images: Some(1),
        })
    }

    #[instrument(name = "mock_dataset_download", skip(self, version, download_root))]
    async fn download(
        &self,
        version: &DatasetVersion,
        format: &str,
        download_root: &Path,
    ) -> Result<DownloadedDataset> {
        self.ensure_authenticated()?;
        self.downloads.fetch_add(1, Ordering::SeqCst);

        if self.config.fail_download {
            return Err(AcquireError::ExportUnavailable {
                format: format.to_string(),
                dataset: version.slug(),
            });
        }

        let location = download_root.join(version.download_dir_name());
        if !self.config.report_missing_location {
            self.write_tree(&location, version)?;
        }

        Ok(DownloadedDataset {
            location,
            format: format.to_string(),
        })
    }
}
