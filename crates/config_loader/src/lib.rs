//! # Config Loader
//!
//! Configuration resolution for the pipeline.
//!
//! Responsibilities:
//! - Resolve every canonical path from one anchor directory
//! - Load secrets into an explicit `RemoteDatasetHandle`
//! - Parse and validate the optional settings file (TOML/JSON)
//!
//! Nothing here touches the network or any dataset/model state.
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let resolved = ConfigLoader::resolve(Path::new("training"), None).unwrap();
//! let handle = ConfigLoader::load_dataset_handle(&resolved.paths).unwrap();
//! println!("dataset: {}", handle.slug());
//! ```

mod parser;
mod secrets;
mod validator;

pub use contracts::{PipelinePaths, PipelineSettings};
pub use parser::ConfigFormat;
pub use secrets::{
    SecretStore, API_KEY_VAR, DEFAULT_DATASET_VERSION, PROJECT_VAR, VERSION_VAR, WORKSPACE_VAR,
};

use contracts::{ContractError, RemoteDatasetHandle};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Paths and settings resolved at pipeline start
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub paths: PipelinePaths,
    pub settings: PipelineSettings,
    /// Settings file actually read, if any
    pub settings_source: Option<PathBuf>,
}

/// Configuration loader
///
/// Provides static methods to resolve paths and load configuration.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Resolve paths and settings from the pipeline anchor directory
    ///
    /// The project root is the anchor's parent. Settings come from
    /// `settings_override` if given (must exist), otherwise from
    /// `<root>/pipeline.toml` if present, otherwise defaults.
    ///
    /// # Errors
    /// - Anchor missing or without a parent
    /// - Explicit settings file missing
    /// - Settings parse/validation failure
    pub fn resolve(
        anchor: &Path,
        settings_override: Option<&Path>,
    ) -> Result<ResolvedConfig, ContractError> {
        let (pipeline_dir, project_root) = Self::resolve_anchor(anchor)?;

        let default_settings = project_root.join(contracts::SETTINGS_FILE_NAME);
        let settings_source = match settings_override {
            Some(path) if !path.is_file() => return Err(ContractError::config_not_found(path)),
            Some(path) => Some(path.to_path_buf()),
            None if default_settings.is_file() => Some(default_settings),
            None => None,
        };

        let settings = match &settings_source {
            Some(path) => Self::load_settings_from_path(path)?,
            None => {
                debug!("no settings file, using defaults");
                PipelineSettings::default()
            }
        };

        let paths = PipelinePaths::new(
            pipeline_dir,
            project_root,
            settings.training.run_name.clone(),
            settings.export.format,
        );

        info!(
            project_root = %paths.project_root().display(),
            pipeline_dir = %paths.pipeline_dir().display(),
            settings = ?settings_source,
            "configuration resolved"
        );

        Ok(ResolvedConfig {
            paths,
            settings,
            settings_source,
        })
    }

    /// Load the dataset handle from `<root>/.env`
    ///
    /// # Errors
    /// - Secret file missing
    /// - API key, workspace or project missing/blank
    /// - Version not a positive integer
    pub fn load_dataset_handle(paths: &PipelinePaths) -> Result<RemoteDatasetHandle, ContractError> {
        let store = SecretStore::from_path(&paths.secret_file())?;
        let handle = store.dataset_handle()?;
        info!(
            workspace = %handle.workspace,
            project = %handle.project,
            version = handle.version,
            "dataset handle loaded"
        );
        Ok(handle)
    }

    /// Load settings from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    pub fn load_settings_from_path(path: &Path) -> Result<PipelineSettings, ContractError> {
        let format = Self::detect_format(path)?;
        let content = std::fs::read_to_string(path)?;
        Self::load_settings_from_str(&content, format)
    }

    /// Load settings from string
    pub fn load_settings_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<PipelineSettings, ContractError> {
        let settings = parser::parse(content, format)?;
        validator::validate(&settings)?;
        Ok(settings)
    }

    /// Serialize settings to TOML string
    pub fn to_toml(settings: &PipelineSettings) -> Result<String, ContractError> {
        toml::to_string_pretty(settings)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Make the anchor absolute and derive the project root
    fn resolve_anchor(anchor: &Path) -> Result<(PathBuf, PathBuf), ContractError> {
        if !anchor.is_dir() {
            return Err(ContractError::config_not_found(anchor));
        }
        let pipeline_dir = std::fs::canonicalize(anchor)?;
        let project_root = pipeline_dir
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| {
                ContractError::config_validation(
                    "pipeline_dir",
                    format!("{} has no parent directory", pipeline_dir.display()),
                )
            })?;
        Ok((pipeline_dir, project_root))
    }

    /// Infer settings format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn project() -> (tempfile::TempDir, PathBuf) {
        let root = tempfile::tempdir().unwrap();
        let anchor = root.path().join("training");
        fs::create_dir_all(&anchor).unwrap();
        (root, anchor)
    }

    #[test]
    fn test_resolve_defaults() {
        let (root, anchor) = project();
        let resolved = ConfigLoader::resolve(&anchor, None).unwrap();
        let canonical_root = fs::canonicalize(root.path()).unwrap();

        assert_eq!(resolved.paths.project_root(), canonical_root);
        assert_eq!(
            resolved.paths.dataset_dir(),
            canonical_root.join("data").join("dataset")
        );
        assert_eq!(resolved.settings, PipelineSettings::default());
        assert!(resolved.settings_source.is_none());
    }

    #[test]
    fn test_resolve_reads_project_settings() {
        let (root, anchor) = project();
        fs::write(
            root.path().join("pipeline.toml"),
            "[training]\nrun_name = \"hawk_run\"\n",
        )
        .unwrap();

        let resolved = ConfigLoader::resolve(&anchor, None).unwrap();
        assert_eq!(resolved.settings.training.run_name, "hawk_run");
        assert!(resolved
            .paths
            .checkpoint()
            .ends_with("runs/detect/hawk_run/weights/best.pt"));
    }

    #[test]
    fn test_explicit_settings_must_exist() {
        let (root, anchor) = project();
        let err =
            ConfigLoader::resolve(&anchor, Some(&root.path().join("missing.toml"))).unwrap_err();
        assert!(matches!(err, ContractError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let (root, anchor) = project();
        let path = root.path().join("custom.json");
        fs::write(&path, r#"{ "training": { "epochs": 0 } }"#).unwrap();
        let err = ConfigLoader::resolve(&anchor, Some(&path)).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_missing_anchor() {
        let (root, _) = project();
        let err = ConfigLoader::resolve(&root.path().join("nope"), None).unwrap_err();
        assert!(matches!(err, ContractError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_missing_secret_file() {
        let (_root, anchor) = project();
        let resolved = ConfigLoader::resolve(&anchor, None).unwrap();
        let err = ConfigLoader::load_dataset_handle(&resolved.paths).unwrap_err();
        assert!(matches!(err, ContractError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_round_trip_toml() {
        let mut settings = PipelineSettings::default();
        settings.training.epochs = 12;
        let serialized = ConfigLoader::to_toml(&settings).unwrap();
        let parsed = ConfigLoader::load_settings_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(parsed, settings);
    }
}
