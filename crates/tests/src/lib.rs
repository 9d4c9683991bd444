//! # Integration Tests
//!
//! End-to-end scenarios across crates, with mock collaborators in place of
//! the dataset service and the `yolo` CLI.

/// Project fixture shared by the scenarios
#[cfg(test)]
mod fixture {
    use std::fs;
    use std::path::{Path, PathBuf};

    use config_loader::{ConfigLoader, ResolvedConfig};

    pub const SECRETS: &str =
        "ROBOFLOW_API_KEY=secret-key\nROBOFLOW_WORKSPACE=birds\nROBOFLOW_PROJECT=raptors\n";

    /// `<tmp>/training` as the pipeline directory, `<tmp>` as project root
    pub struct Project {
        _dir: tempfile::TempDir,
        pub anchor: PathBuf,
    }

    impl Project {
        pub fn new(secrets: Option<&str>) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let anchor = dir.path().join("training");
            fs::create_dir_all(&anchor).unwrap();
            if let Some(secrets) = secrets {
                fs::write(dir.path().join(".env"), secrets).unwrap();
            }
            Self { _dir: dir, anchor }
        }

        pub fn resolve(&self) -> ResolvedConfig {
            ConfigLoader::resolve(&self.anchor, None).unwrap()
        }

        pub fn write_settings(&self, content: &str) {
            let root = self.anchor.parent().unwrap();
            fs::write(root.join("pipeline.toml"), content).unwrap();
        }
    }

    pub fn write_file(path: &Path, content: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
}

#[cfg(test)]
mod config_tests {
    use config_loader::ConfigLoader;
    use contracts::ContractError;
    use dataset_acquirer::{AcquiredDataset, DatasetAcquirer, MockDatasetService, ReplacePolicy};

    use crate::fixture::{Project, SECRETS};

    /// Configuration followed by acquisition, in pipeline order
    async fn configure_then_acquire(
        project: &Project,
        acquirer: &mut DatasetAcquirer<MockDatasetService>,
    ) -> Result<AcquiredDataset, ContractError> {
        let resolved = ConfigLoader::resolve(&project.anchor, None)?;
        let handle = ConfigLoader::load_dataset_handle(&resolved.paths)?;
        let paths = &resolved.paths;
        Ok(acquirer
            .acquire(&handle, &paths.dataset_dir(), paths.download_root())
            .await?)
    }

    #[tokio::test]
    async fn test_missing_project_is_configuration_error() {
        let project = Project::new(Some("ROBOFLOW_API_KEY=k\nROBOFLOW_WORKSPACE=birds\n"));
        let mut acquirer =
            DatasetAcquirer::new(MockDatasetService::new(), "yolov8", ReplacePolicy::Destructive);

        let err = configure_then_acquire(&project, &mut acquirer)
            .await
            .unwrap_err();

        assert!(err.is_configuration());
        assert!(acquirer.service().requested_versions().is_empty());
        assert_eq!(acquirer.service().download_count(), 0);
        assert!(!project.anchor.parent().unwrap().join("data").exists());
    }

    #[tokio::test]
    async fn test_complete_secrets_reach_the_service() {
        let project = Project::new(Some(SECRETS));
        let mut acquirer =
            DatasetAcquirer::new(MockDatasetService::new(), "yolov8", ReplacePolicy::Destructive);

        configure_then_acquire(&project, &mut acquirer).await.unwrap();

        assert_eq!(acquirer.service().requested_versions().len(), 1);
        assert_eq!(acquirer.service().download_count(), 1);
    }

    #[test]
    fn test_empty_api_key_is_configuration_error() {
        let project = Project::new(Some(
            "ROBOFLOW_API_KEY=\nROBOFLOW_WORKSPACE=birds\nROBOFLOW_PROJECT=raptors\n",
        ));
        let err = ConfigLoader::load_dataset_handle(&project.resolve().paths).unwrap_err();
        assert!(matches!(err, ContractError::ConfigValidation { .. }));
    }

    #[test]
    fn test_secret_file_does_not_touch_environment() {
        let project = Project::new(Some(SECRETS));
        let handle = ConfigLoader::load_dataset_handle(&project.resolve().paths).unwrap();

        assert_eq!(handle.slug(), "birds/raptors/1");
        assert!(std::env::var("ROBOFLOW_WORKSPACE").is_err());
        assert!(!format!("{handle:?}").contains("secret-key"));
    }

    #[test]
    fn test_settings_drive_path_contract() {
        let project = Project::new(Some(SECRETS));
        project.write_settings("[training]\nrun_name = \"hawk\"\n\n[export]\nformat = \"torchscript\"\n");

        let resolved = project.resolve();
        assert!(resolved
            .paths
            .checkpoint()
            .ends_with("runs/detect/hawk/weights/best.pt"));
        assert!(resolved
            .paths
            .exported_model()
            .ends_with("models/model.torchscript"));
    }

    #[test]
    fn test_directory_producing_export_format_rejected() {
        let project = Project::new(Some(SECRETS));
        project.write_settings("[export]\nformat = \"openvino\"\n");
        let err = ConfigLoader::resolve(&project.anchor, None).unwrap_err();
        assert!(err.is_configuration());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::fs;

    use config_loader::ConfigLoader;
    use contracts::{ContractError, ValidationSplit};
    use dataset_acquirer::{DatasetAcquirer, MockConfig, MockDatasetService};
    use dataset_normalizer::{normalize_dataset, DatasetConfig, TEST_KEY, TRAIN_KEY, VAL_KEY};
    use trainer::{ExportDriver, MockExporter, MockTrainer, TrainingDriver};

    use crate::fixture::{write_file, Project, SECRETS};

    /// Scenario A: no version in the secret file means version 1 is requested
    #[tokio::test]
    async fn test_default_version_requested() {
        let project = Project::new(Some(SECRETS));
        let resolved = project.resolve();
        let handle = ConfigLoader::load_dataset_handle(&resolved.paths).unwrap();

        let mut acquirer = DatasetAcquirer::new(
            MockDatasetService::new(),
            resolved.settings.dataset.format.clone(),
            resolved.settings.dataset.replace,
        );
        acquirer
            .acquire(
                &handle,
                &resolved.paths.dataset_dir(),
                resolved.paths.download_root(),
            )
            .await
            .unwrap();

        assert_eq!(
            acquirer.service().requested_versions(),
            vec![("birds".to_string(), "raptors".to_string(), 1)]
        );
    }

    /// Scenario B: stale content at the target is gone after acquisition
    #[tokio::test]
    async fn test_existing_dataset_replaced() {
        let project = Project::new(Some(SECRETS));
        let resolved = project.resolve();
        let dataset_dir = resolved.paths.dataset_dir();
        write_file(&dataset_dir.join("notes/old.txt"), b"stale");
        write_file(&dataset_dir.join("data.yaml"), b"nc: 99\n");

        let handle = ConfigLoader::load_dataset_handle(&resolved.paths).unwrap();
        let mut acquirer = DatasetAcquirer::new(
            MockDatasetService::new(),
            "yolov8",
            resolved.settings.dataset.replace,
        );
        acquirer
            .acquire(&handle, &dataset_dir, resolved.paths.download_root())
            .await
            .unwrap();

        assert!(!dataset_dir.join("notes").exists());
        let content = fs::read_to_string(dataset_dir.join("data.yaml")).unwrap();
        assert!(!content.contains("nc: 99"));
        assert!(dataset_dir.join("train/images").is_dir());
    }

    /// Scenario C: export without a checkpoint never reaches the exporter
    #[tokio::test]
    async fn test_export_without_checkpoint() {
        let project = Project::new(Some(SECRETS));
        let resolved = project.resolve();
        let driver = ExportDriver::new(MockExporter::new());

        let err = driver
            .export(&resolved.paths, &resolved.settings.export)
            .await
            .unwrap_err();

        assert!(matches!(err, ContractError::CheckpointMissing { .. }));
        assert!(err.to_string().contains("model file not found"));
        assert_eq!(driver.exporter().export_calls(), 0);
    }

    /// Scenario D: exporter completes without output
    #[tokio::test]
    async fn test_export_without_output() {
        let project = Project::new(Some(SECRETS));
        let resolved = project.resolve();
        write_file(&resolved.paths.checkpoint(), b"weights");
        let driver = ExportDriver::new(MockExporter::without_output());

        let err = driver
            .export(&resolved.paths, &resolved.settings.export)
            .await
            .unwrap_err();

        assert!(matches!(err, ContractError::ExportArtifactMissing { .. }));
        assert!(!resolved.paths.exported_model().exists());
        assert_eq!(driver.exporter().export_calls(), 1);
    }

    /// Scenario D with a model from an earlier export already in place
    #[tokio::test]
    async fn test_export_without_output_keeps_existing_model() {
        let project = Project::new(Some(SECRETS));
        let resolved = project.resolve();
        write_file(&resolved.paths.checkpoint(), b"weights");
        write_file(&resolved.paths.exported_model(), b"previous model");

        let err = ExportDriver::new(MockExporter::without_output())
            .export(&resolved.paths, &resolved.settings.export)
            .await
            .unwrap_err();

        assert!(matches!(err, ContractError::ExportArtifactMissing { .. }));
        assert_eq!(
            fs::read(resolved.paths.exported_model()).unwrap(),
            b"previous model"
        );
    }

    /// Acquire -> normalize -> train -> validate -> export
    #[tokio::test]
    async fn test_full_pipeline_with_mocks() {
        let project = Project::new(Some(SECRETS));
        let resolved = project.resolve();
        let paths = &resolved.paths;
        let handle = ConfigLoader::load_dataset_handle(paths).unwrap();

        let mut acquirer = DatasetAcquirer::new(
            MockDatasetService::new(),
            "yolov8",
            resolved.settings.dataset.replace,
        );
        acquirer
            .acquire(&handle, &paths.dataset_dir(), paths.download_root())
            .await
            .unwrap();

        let normalized = normalize_dataset(&paths.dataset_dir()).unwrap();
        assert_eq!(normalized.validation_split, ValidationSplit::Validation);
        assert!(normalized.removed_test);

        let config = DatasetConfig::load(&paths.dataset_config()).unwrap();
        assert_eq!(config.get_str(VAL_KEY), Some("valid/images"));
        assert_eq!(config.get_str(TRAIN_KEY), Some("train/images"));
        assert!(!config.contains_key(TEST_KEY));
        assert!(config.contains_key("roboflow"));

        let training = TrainingDriver::new(MockTrainer::new());
        let report = training
            .train_and_validate(paths, &resolved.settings.training, normalized.validation_split)
            .await
            .unwrap();
        assert_eq!(report.checkpoint, paths.checkpoint());
        assert_eq!(report.tag(), "validation");

        let requests = training.trainer().train_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].data_config, paths.dataset_config());
        assert_eq!(requests[0].project_dir, paths.runs_project_dir());

        let export = ExportDriver::new(MockExporter::new());
        let exported = export
            .export(paths, &resolved.settings.export)
            .await
            .unwrap();
        assert_eq!(exported.path, paths.exported_model());
        assert!(exported.path.is_file());
    }

    /// Missing `valid/` split: training still runs, metrics are tagged
    #[tokio::test]
    async fn test_fallback_split_end_to_end() {
        let project = Project::new(Some(SECRETS));
        let resolved = project.resolve();
        let paths = &resolved.paths;
        let handle = ConfigLoader::load_dataset_handle(paths).unwrap();

        let service = MockDatasetService::with_config(MockConfig {
            include_valid_split: false,
            include_test_split: false,
            ..Default::default()
        });
        let mut acquirer =
            DatasetAcquirer::new(service, "yolov8", resolved.settings.dataset.replace);
        acquirer
            .acquire(&handle, &paths.dataset_dir(), paths.download_root())
            .await
            .unwrap();

        let normalized = normalize_dataset(&paths.dataset_dir()).unwrap();
        assert_eq!(normalized.validation_split, ValidationSplit::TrainFallback);

        let first = fs::read(paths.dataset_config()).unwrap();
        normalize_dataset(&paths.dataset_dir()).unwrap();
        assert_eq!(first, fs::read(paths.dataset_config()).unwrap());

        let report = TrainingDriver::new(MockTrainer::new())
            .train_and_validate(paths, &resolved.settings.training, normalized.validation_split)
            .await
            .unwrap();
        assert_eq!(report.tag(), "validation-on-train");
    }

    /// Export runs on its own, re-deriving the checkpoint from configuration
    #[tokio::test]
    async fn test_export_after_separate_training_run() {
        let project = Project::new(Some(SECRETS));
        {
            let resolved = project.resolve();
            write_file(&resolved.paths.dataset_config(), b"nc: 1\nnames: [raptor]\n");
            TrainingDriver::new(MockTrainer::new())
                .train_and_validate(
                    &resolved.paths,
                    &resolved.settings.training,
                    ValidationSplit::Validation,
                )
                .await
                .unwrap();
        }

        let resolved = project.resolve();
        let exported = ExportDriver::new(MockExporter::new())
            .export(&resolved.paths, &resolved.settings.export)
            .await
            .unwrap();
        assert!(exported.path.ends_with("models/model.onnx"));
    }
}

#[cfg(test)]
mod observability_tests {
    use std::time::Duration;

    use observability::{Stage, StageOutcome, StageTimings};

    #[test]
    fn test_timings_summary_lists_every_stage() {
        let mut timings = StageTimings::new();
        for stage in [Stage::Configure, Stage::Acquire, Stage::Normalize, Stage::Train] {
            timings.record(stage, Duration::from_millis(5), StageOutcome::Completed);
        }
        let rendered = timings.to_string();
        for name in ["configure", "acquire", "normalize", "train"] {
            assert!(rendered.contains(name));
        }
    }
}
