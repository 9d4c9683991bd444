//! Secret file loading
//!
//! The secret file is dotenv-formatted. Its pairs are read into a `SecretStore`
//! instead of the process environment, and the dataset handle is built from
//! that store explicitly.

use std::collections::HashMap;
use std::path::Path;

use contracts::{ContractError, RemoteDatasetHandle};
use tracing::debug;

/// API key entry
pub const API_KEY_VAR: &str = "ROBOFLOW_API_KEY";
/// Workspace entry
pub const WORKSPACE_VAR: &str = "ROBOFLOW_WORKSPACE";
/// Project entry
pub const PROJECT_VAR: &str = "ROBOFLOW_PROJECT";
/// Optional version entry
pub const VERSION_VAR: &str = "ROBOFLOW_VERSION";

/// Version used when the secret file does not name one
pub const DEFAULT_DATASET_VERSION: u32 = 1;

/// Key/value pairs read from the secret file
#[derive(Default, Clone)]
pub struct SecretStore {
    values: HashMap<String, String>,
}

impl SecretStore {
    /// Read a dotenv file
    ///
    /// # Errors
    /// - File missing -> `ConfigNotFound`
    /// - Malformed line -> `ConfigParse`
    pub fn from_path(path: &Path) -> Result<Self, ContractError> {
        if !path.is_file() {
            return Err(ContractError::config_not_found(path));
        }

        let iter = dotenvy::from_path_iter(path).map_err(|e| ContractError::ConfigParse {
            message: format!("cannot read secret file {}: {e}", path.display()),
            source: Some(Box::new(e)),
        })?;

        let mut values = HashMap::new();
        for item in iter {
            let (key, value) = item.map_err(|e| ContractError::ConfigParse {
                message: format!("secret file parse error in {}: {e}", path.display()),
                source: Some(Box::new(e)),
            })?;
            values.insert(key, value);
        }

        debug!(path = %path.display(), entries = values.len(), "secret file loaded");
        Ok(Self { values })
    }

    /// Build a store from in-memory pairs
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Look up a non-blank value, trimmed
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the store has no entries
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Build the remote dataset handle
    ///
    /// # Errors
    /// `ConfigValidation` if API key, workspace or project is missing/blank, or
    /// if the version is present but not a positive integer.
    pub fn dataset_handle(&self) -> Result<RemoteDatasetHandle, ContractError> {
        let api_key = self.required(API_KEY_VAR)?;
        let workspace = self.required(WORKSPACE_VAR)?;
        let project = self.required(PROJECT_VAR)?;

        let version = match self.get(VERSION_VAR) {
            None => DEFAULT_DATASET_VERSION,
            Some(raw) => match raw.parse::<u32>() {
                Ok(0) => {
                    return Err(ContractError::config_validation(
                        VERSION_VAR,
                        "dataset versions start at 1",
                    ))
                }
                Ok(v) => v,
                Err(_) => {
                    return Err(ContractError::config_validation(
                        VERSION_VAR,
                        format!("expected an integer, got '{raw}'"),
                    ))
                }
            },
        };

        Ok(RemoteDatasetHandle {
            api_key: api_key.to_string(),
            workspace: workspace.to_string(),
            project: project.to_string(),
            version,
        })
    }

    fn required(&self, key: &str) -> Result<&str, ContractError> {
        self.get(key)
            .ok_or_else(|| ContractError::config_validation(key, "missing or empty in secret file"))
    }
}

impl std::fmt::Debug for SecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<_> = self.values.keys().collect();
        keys.sort();
        f.debug_struct("SecretStore").field("keys", &keys).finish()
    }
}
