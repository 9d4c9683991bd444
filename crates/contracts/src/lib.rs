//! # Contracts
//!
//! Frozen interface contracts shared by every pipeline stage.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Stage hand-off
//! Stages communicate through well-known file paths (`PipelinePaths`), not
//! in-memory handles.

mod artifacts;
mod dataset;
mod error;
mod paths;
mod settings;
mod trainer;

pub use artifacts::*;
pub use dataset::*;
pub use error::*;
pub use paths::*;
pub use settings::*;
pub use trainer::{LocalModelExporter, LocalModelTrainer, ModelExporter, ModelTrainer};
