//! # Dataset Normalizer
//!
//! Rewrites a downloaded dataset's `data.yaml` into the form the trainer expects.
//!
//! Rules:
//! - `path` becomes the absolute dataset directory, with `..` and links resolved
//! - `train` is always `train/images`
//! - `val` is `valid/images` when that directory exists, otherwise `train/images`
//!   (validation then runs on training data; a warning is emitted)
//! - `test` is dropped
//! - every other key is left as it was
//!
//! Normalizing an already normalized dataset rewrites identical content.

mod config;

pub use config::{DatasetConfig, PATH_KEY, TEST_KEY, TRAIN_KEY, VAL_KEY};
pub use contracts::ValidationSplit;

use std::path::{Path, PathBuf};

use contracts::{ContractError, DATASET_CONFIG_FILE_NAME, TRAIN_IMAGES, VALID_IMAGES};
use tracing::{info, instrument, warn};

/// Outcome of a normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeReport {
    /// Config file that was rewritten
    pub config_path: PathBuf,
    /// Absolute dataset directory written to `path`
    pub dataset_path: PathBuf,
    /// Split written to `val`
    pub validation_split: ValidationSplit,
    /// Whether a `test` key was dropped
    pub removed_test: bool,
}

/// Normalize `<dataset_dir>/data.yaml` in place
///
/// # Errors
/// - `ConfigNotFound` if the config file is absent
/// - `ConfigParse` if it is not a YAML mapping
/// - IO errors while writing it back
#[instrument(name = "dataset_normalize", skip_all, fields(dataset = %dataset_dir.display()))]
pub fn normalize_dataset(dataset_dir: &Path) -> Result<NormalizeReport, ContractError> {
    let config_path = dataset_dir.join(DATASET_CONFIG_FILE_NAME);
    let mut config = DatasetConfig::load(&config_path)?;

    let dataset_path = std::fs::canonicalize(dataset_dir)?;
    let validation_split = detect_validation_split(&dataset_path);
    let removed_test = apply_rules(&mut config, &dataset_path, validation_split);

    config.save(&config_path)?;

    info!(
        config = %config_path.display(),
        val = validation_split.relative_path(),
        removed_test,
        "dataset config normalized"
    );

    Ok(NormalizeReport {
        config_path,
        dataset_path,
        validation_split,
        removed_test,
    })
}

/// Decide which split the trainer validates on
pub fn detect_validation_split(dataset_dir: &Path) -> ValidationSplit {
    if dataset_dir.join(VALID_IMAGES).is_dir() {
        ValidationSplit::Validation
    } else {
        warn!(
            dataset = %dataset_dir.display(),
            "'valid' split not found, using 'train' for validation; \
             reported metrics will be measured on training data"
        );
        ValidationSplit::TrainFallback
    }
}

/// Apply the normalization rules; returns whether `test` was removed
pub fn apply_rules(
    config: &mut DatasetConfig,
    dataset_path: &Path,
    validation_split: ValidationSplit,
) -> bool {
    config.set_str(PATH_KEY, dataset_path.to_string_lossy());
    config.set_str(VAL_KEY, validation_split.relative_path());
    config.set_str(TRAIN_KEY, TRAIN_IMAGES);
    config.remove(TEST_KEY).is_some()
}
