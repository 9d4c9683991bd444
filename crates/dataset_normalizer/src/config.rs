//! Dataset config document
//!
//! `data.yaml` is kept as an ordered YAML mapping so keys the pipeline does
//! not own (`nc`, `names`, `roboflow`, ...) survive a rewrite untouched.

use std::path::Path;

use contracts::ContractError;
use serde_yaml::{Mapping, Value};

/// Dataset root key
pub const PATH_KEY: &str = "path";
/// Training split key
pub const TRAIN_KEY: &str = "train";
/// Validation split key
pub const VAL_KEY: &str = "val";
/// Held-out test split key
pub const TEST_KEY: &str = "test";

/// Parsed dataset config
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetConfig {
    entries: Mapping,
}

impl DatasetConfig {
    /// Parse a YAML document; the top level must be a mapping
    pub fn from_yaml_str(content: &str) -> Result<Self, ContractError> {
        let value: Value = serde_yaml::from_str(content).map_err(|e| ContractError::ConfigParse {
            message: format!("YAML parse error: {e}"),
            source: Some(Box::new(e)),
        })?;

        match value {
            Value::Mapping(entries) => Ok(Self { entries }),
            other => Err(ContractError::config_parse(format!(
                "dataset config must be a mapping, got {}",
                value_kind(&other)
            ))),
        }
    }

    /// Read and parse a config file
    pub fn load(path: &Path) -> Result<Self, ContractError> {
        if !path.is_file() {
            return Err(ContractError::config_not_found(path));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Serialize back to YAML
    pub fn to_yaml_string(&self) -> Result<String, ContractError> {
        serde_yaml::to_string(&self.entries)
            .map_err(|e| ContractError::config_parse(format!("YAML serialize error: {e}")))
    }

    /// Write to `path`, replacing its contents
    pub fn save(&self, path: &Path) -> Result<(), ContractError> {
        std::fs::write(path, self.to_yaml_string()?)?;
        Ok(())
    }

    /// String value of `key`, if present and a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(Value::as_str)
    }

    /// Raw value of `key`
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Whether `key` is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Set `key` to a string; an existing key keeps its position
    pub fn set_str(&mut self, key: &str, value: impl Into<String>) {
        self.entries
            .insert(Value::String(key.to_string()), Value::String(value.into()));
    }

    /// Remove `key`, keeping the order of the remaining keys
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    /// Keys in document order (non-string keys are skipped)
    pub fn keys(&self) -> Vec<&str> {
        self.entries.keys().filter_map(Value::as_str).collect()
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "an empty document",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
