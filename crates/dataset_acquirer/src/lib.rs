//! # Dataset Acquirer
//!
//! Remote dataset acquisition module.
//!
//! Responsibilities:
//! - Authenticate against the dataset service and resolve workspace/project/version
//! - Download the requested export and unpack it where the service chooses
//! - Relocate the download into the canonical dataset directory, replacing prior contents
//! - Provide a mock service for tests

pub mod acquirer;
pub mod archive;
pub mod client;
pub mod error;
pub mod mock_client;
pub mod relocate;
pub mod roboflow;

pub use acquirer::{AcquiredDataset, DatasetAcquirer};
pub use client::{DatasetService, DatasetVersion, DownloadedDataset};
pub use contracts::{RemoteDatasetHandle, ReplacePolicy};
pub use error::{AcquireError, Result};
pub use mock_client::{MockConfig, MockDatasetService};
pub use roboflow::{ExportPolling, RoboflowClient};
