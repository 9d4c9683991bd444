//! Roboflow REST client
//!
//! Implements `DatasetService` over the public Roboflow API:
//! `/` (auth), `/<ws>`, `/<ws>/<project>`, `/<ws>/<project>/<version>` and
//! `/<ws>/<project>/<version>/<format>` which returns a signed archive link.
//! The API key is always sent as a query parameter and never logged; request
//! errors have their URL stripped before they leave this module.
//!
//! Requesting a format the version was never exported in starts generation
//! on the service. The client keeps polling the export endpoint until a link
//! shows up or `ExportPolling::max_wait` runs out.

use std::path::Path;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::archive;
use crate::client::{DatasetService, DatasetVersion, DownloadedDataset};
use crate::error::{AcquireError, Result};

#[derive(Debug, Deserialize)]
struct WorkspaceResponse {
    workspace: WorkspaceInfo,
}

#[derive(Debug, Deserialize)]
struct WorkspaceInfo {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProjectResponse {
    project: ProjectInfo,
}

#[derive(Debug, Deserialize)]
struct ProjectInfo {
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    version: VersionInfo,
}

#[derive(Debug, Deserialize)]
struct VersionInfo {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    images: Option<u64>,
    #[serde(default)]
    exports: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ExportResponse {
    #[serde(default)]
    export: Option<ExportInfo>,
    /// Generation progress while the export is being built
    #[serde(default)]
    progress: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ExportInfo {
    link: String,
}

/// How long to wait for the service to generate a missing export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportPolling {
    /// Delay between two export requests
    pub interval: Duration,
    /// Give up once this much time has passed since the first request
    pub max_wait: Duration,
}

impl Default for ExportPolling {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_wait: Duration::from_secs(600),
        }
    }
}

/// Roboflow dataset service client
pub struct RoboflowClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    polling: ExportPolling,
}

impl RoboflowClient {
    /// Create a client against the given API base URL
    pub fn new(base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("raptor-pipeline/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: None,
            polling: ExportPolling::default(),
        })
    }

    /// Override how long a missing export is waited for
    pub fn with_export_polling(mut self, polling: ExportPolling) -> Self {
        self.polling = polling;
        self
    }

    /// Base URL without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> String {
        let mut url = self.base_url.clone();
        url.push('/');
        url.push_str(&segments.join("/"));
        url
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| AcquireError::Unauthorized {
            message: "client is not authenticated".into(),
        })
    }

    /// GET an API endpoint and decode its JSON body
    ///
    /// `kind`/`name` describe what a 404 means for this endpoint.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        api_key: &str,
        kind: &'static str,
        name: &str,
    ) -> Result<T> {
        debug!(url = %url, "dataset service request");
        let response = self
            .http
            .get(url)
            .query(&[("api_key", api_key)])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, url, kind, name, body))
    }

    /// Poll the export endpoint until it hands out an archive link
    async fn export_link(
        &self,
        url: &str,
        api_key: &str,
        version: &DatasetVersion,
        format: &str,
    ) -> Result<String> {
        let slug = format!("{}/{format}", version.slug());
        let deadline = Instant::now() + self.polling.max_wait;
        let mut attempts = 0u32;

        loop {
            let export: ExportResponse = self.get_json(url, api_key, "export", &slug).await?;
            attempts += 1;
            if let Some(info) = export.export {
                if attempts > 1 {
                    info!(attempts, "export generated");
                }
                return Ok(info.link);
            }

            if attempts == 1 {
                info!(export = %slug, "export not generated yet, waiting for the service");
            } else {
                debug!(progress = ?export.progress, attempts, "export still generating");
            }

            if Instant::now() + self.polling.interval > deadline {
                warn!(export = %slug, attempts, "gave up waiting for export");
                return Err(AcquireError::ExportUnavailable {
                    format: format.to_string(),
                    dataset: version.slug(),
                });
            }
            tokio::time::sleep(self.polling.interval).await;
        }
    }

    /// Stream the archive behind `link` into `path`
    ///
    /// # Returns
    /// Number of bytes written
    async fn fetch_archive(&self, link: &str, path: &Path) -> Result<u64> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut response = self.http.get(link).send().await?.error_for_status()?;
        let mut file = tokio::fs::File::create(path).await?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok(written)
    }
}

fn status_error(
    status: StatusCode,
    url: &str,
    kind: &'static str,
    name: &str,
    body: String,
) -> AcquireError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AcquireError::Unauthorized { message: body }
        }
        StatusCode::NOT_FOUND => AcquireError::not_found(kind, name),
        other => AcquireError::Service {
            status: other.as_u16(),
            url: url.to_string(),
            message: body,
        },
    }
}

impl DatasetService for RoboflowClient {
    #[instrument(name = "roboflow_authenticate", skip(self, api_key), fields(base_url = %self.base_url))]
    async fn authenticate(&mut self, api_key: &str) -> Result<()> {
        let url = self.endpoint(&[""]);
        let _: serde_json::Value = self.get_json(&url, api_key, "api key", "<redacted>").await?;
        self.api_key = Some(api_key.to_string());
        info!("authenticated with dataset service");
        Ok(())
    }

    #[instrument(name = "roboflow_resolve_version", skip(self))]
    async fn resolve_version(
        &self,
        workspace: &str,
        project: &str,
        version: u32,
    ) -> Result<DatasetVersion> {
        let api_key = self.api_key()?;

        let ws: WorkspaceResponse = self
            .get_json(&self.endpoint(&[workspace]), api_key, "workspace", workspace)
            .await?;
        debug!(workspace = ?ws.workspace.name, "workspace resolved");

        let project_slug = format!("{workspace}/{project}");
        let proj: ProjectResponse = self
            .get_json(
                &self.endpoint(&[workspace, project]),
                api_key,
                "project",
                &project_slug,
            )
            .await?;
        if let Some(kind) = proj.project.kind.as_deref() {
            if kind != "object-detection" {
                warn!(project = %project_slug, kind, "project is not an object-detection project");
            }
        }
        debug!(project = ?proj.project.name, "project resolved");

        let version_str = version.to_string();
        let version_slug = format!("{project_slug}/{version}");
        let ver: VersionResponse = self
            .get_json(
                &self.endpoint(&[workspace, project, &version_str]),
                api_key,
                "version",
                &version_slug,
            )
            .await?;

        info!(
            version = %version_slug,
            images = ?ver.version.images,
            exports = ?ver.version.exports,
            "dataset version resolved"
        );

        Ok(DatasetVersion {
            workspace: workspace.to_string(),
            project: project.to_string(),
            version,
            name: ver.version.name,
            images: ver.version.images,
        })
    }

    #[instrument(
        name = "roboflow_download",
        skip(self, version, download_root),
        fields(dataset = %version.slug(), format = %format)
    )]
    async fn download(
        &self,
        version: &DatasetVersion,
        format: &str,
        download_root: &Path,
    ) -> Result<DownloadedDataset> {
        let api_key = self.api_key()?;
        let version_str = version.version.to_string();
        let url = self.endpoint(&[&version.workspace, &version.project, &version_str, format]);
        let link = self.export_link(&url, api_key, version, format).await?;

        let dir_name = version.download_dir_name();
        let archive_path = download_root.join(format!("{dir_name}.zip"));
        info!(archive = %archive_path.display(), "downloading dataset archive");
        let bytes = self.fetch_archive(&link, &archive_path).await?;
        info!(bytes, "dataset archive downloaded");

        let location = download_root.join(dir_name);
        archive::extract(&archive_path, &location).await?;
        if let Err(e) = tokio::fs::remove_file(&archive_path).await {
            warn!(archive = %archive_path.display(), error = %e, "failed to remove dataset archive");
        }

        Ok(DownloadedDataset {
            location,
            format: format.to_string(),
        })
    }
}
