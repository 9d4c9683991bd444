//! # Trainer
//!
//! Drives the external trainer and exporter.
//!
//! - `YoloCli`: `ModelTrainer`/`ModelExporter` over the Ultralytics `yolo` program
//! - `TrainingDriver`: train, locate the checkpoint, validate, report metrics
//! - `ExportDriver`: export the checkpoint to `<root>/models/model.<ext>`
//! - `MockTrainer`/`MockExporter`: file-level stand-ins for tests

pub mod command;
pub mod driver;
pub mod metrics_parser;
pub mod mock;
pub mod yolo;

pub use command::{export_command, train_command, val_command, TrainerCommand};
pub use driver::{locate_checkpoint, ExportDriver, TrainingDriver, ValidationReport};
pub use metrics_parser::parse_validation_summary;
pub use mock::{MockExporter, MockTrainer, MOCK_METRICS};
pub use yolo::{ProcessOutput, YoloCli};
