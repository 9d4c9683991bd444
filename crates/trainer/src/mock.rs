//! Mock trainer and exporter
//!
//! Write the files the real `yolo` CLI would write, without training anything.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use contracts::{
    ContractError, ExportRequest, ModelExporter, ModelTrainer, TrainRequest, ValidateRequest,
    ValidationMetrics, BEST_CHECKPOINT_STEM, CHECKPOINT_EXTENSION,
};

/// Metrics returned by `MockTrainer` unless overridden
pub const MOCK_METRICS: ValidationMetrics = ValidationMetrics {
    map50_95: 0.5,
    map50: Some(0.75),
    precision: Some(0.8),
    recall: Some(0.7),
};

/// Mock trainer
pub struct MockTrainer {
    write_checkpoint: bool,
    metrics: ValidationMetrics,
    train_requests: Mutex<Vec<TrainRequest>>,
    train_calls: AtomicUsize,
    validate_calls: AtomicUsize,
}

impl MockTrainer {
    /// Trainer that leaves a checkpoint and returns `MOCK_METRICS`
    pub fn new() -> Self {
        Self {
            write_checkpoint: true,
            metrics: MOCK_METRICS,
            train_requests: Mutex::new(Vec::new()),
            train_calls: AtomicUsize::new(0),
            validate_calls: AtomicUsize::new(0),
        }
    }

    /// Trainer that "succeeds" without writing a checkpoint
    pub fn without_checkpoint() -> Self {
        Self {
            write_checkpoint: false,
            ..Self::new()
        }
    }

    /// Override the metrics returned by `validate`
    pub fn with_metrics(mut self, metrics: ValidationMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn train_calls(&self) -> usize {
        self.train_calls.load(Ordering::SeqCst)
    }

    pub fn validate_calls(&self) -> usize {
        self.validate_calls.load(Ordering::SeqCst)
    }

    /// Every training request received
    pub fn train_requests(&self) -> Vec<TrainRequest> {
        self.train_requests.lock().unwrap().clone()
    }
}

impl Default for MockTrainer {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelTrainer for MockTrainer {
    fn name(&self) -> &str {
        "mock-trainer"
    }

    async fn train(&self, request: &TrainRequest) -> Result<(), ContractError> {
        self.train_calls.fetch_add(1, Ordering::SeqCst);
        self.train_requests.lock().unwrap().push(request.clone());

        if self.write_checkpoint {
            let weights = request.project_dir.join(&request.run_name).join("weights");
            tokio::fs::create_dir_all(&weights).await?;
            let checkpoint = weights
                .join(BEST_CHECKPOINT_STEM)
                .with_extension(CHECKPOINT_EXTENSION);
            tokio::fs::write(checkpoint, b"mock weights").await?;
        }
        Ok(())
    }

    async fn validate(&self, request: &ValidateRequest) -> Result<ValidationMetrics, ContractError> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        if !request.checkpoint.is_file() {
            return Err(ContractError::CheckpointMissing {
                path: request.checkpoint.clone(),
            });
        }
        Ok(self.metrics)
    }
}

/// Mock exporter
pub struct MockExporter {
    write_output: bool,
    export_calls: AtomicUsize,
}

impl MockExporter {
    /// Exporter that writes its output next to the checkpoint
    pub fn new() -> Self {
        Self {
            write_output: true,
            export_calls: AtomicUsize::new(0),
        }
    }

    /// Exporter that completes without producing anything
    pub fn without_output() -> Self {
        Self {
            write_output: false,
            ..Self::new()
        }
    }

    pub fn export_calls(&self) -> usize {
        self.export_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelExporter for MockExporter {
    fn name(&self) -> &str {
        "mock-exporter"
    }

    async fn export(&self, request: &ExportRequest) -> Result<(), ContractError> {
        self.export_calls.fetch_add(1, Ordering::SeqCst);
        if self.write_output {
            let output = request.checkpoint.with_extension(request.format.extension());
            tokio::fs::write(output, format!("exported {}", request.format)).await?;
        }
        Ok(())
    }
}
