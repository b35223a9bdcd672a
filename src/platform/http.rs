//! Contrast Scan REST client.

use super::{CodeArtifact, Project, ScanHandle, ScanPlatform, ScanState, ScanSummary};
use crate::config::PlatformCredentials;
use crate::error::{IoOperation, Result, ScanError};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tracing::debug;
use url::Url;

const USER_AGENT: &str = concat!("contrast-scan-action/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    content: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScanResource {
    id: String,
    #[serde(default)]
    project_id: Option<String>,
    #[serde(default)]
    organization_id: Option<String>,
}

/// [`ScanPlatform`] backed by the Contrast Scan REST API.
#[derive(Clone)]
pub struct HttpScanPlatform {
    client: Client,
    /// Root of the scan API, e.g. `https://host/Contrast/api/sast`
    api_root: String,
    organization_id: String,
    authorization: String,
    api_key: String,
}

impl std::fmt::Debug for HttpScanPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpScanPlatform")
            .field("api_root", &self.api_root)
            .field("organization_id", &self.organization_id)
            .finish_non_exhaustive()
    }
}

impl HttpScanPlatform {
    /// Connect to the platform at `api_url` (the TeamServer base, e.g.
    /// `https://app.contrastsecurity.com/Contrast`).
    pub fn new(api_url: &Url, creds: &PlatformCredentials) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            // The completion pipeline issues requests from its own short-lived
            // runtime; pooled connections must not outlive it.
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|source| ScanError::Transport {
                endpoint: api_url.to_string(),
                source,
            })?;

        let token = STANDARD.encode(format!("{}:{}", creds.user, creds.service_key));

        Ok(Self {
            client,
            api_root: format!("{}/api/sast", api_url.as_str().trim_end_matches('/')),
            organization_id: creds.org_id.clone(),
            authorization: token,
            api_key: creds.api_key.clone(),
        })
    }

    fn projects_endpoint(&self) -> String {
        format!(
            "{}/organizations/{}/projects",
            self.api_root, self.organization_id
        )
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("Authorization", &self.authorization)
            .header("API-Key", &self.api_key)
    }

    /// Send a request and turn non-2xx answers into `PlatformApi` errors.
    async fn send(&self, endpoint: &str, builder: RequestBuilder) -> Result<Response> {
        debug!(endpoint, "Calling Contrast API");
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|source| ScanError::Transport {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ScanError::PlatformApi {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body,
        })
    }

    async fn read_json<T: DeserializeOwned>(&self, endpoint: &str, response: Response) -> Result<T> {
        let body = response
            .bytes()
            .await
            .map_err(|source| ScanError::Transport {
                endpoint: endpoint.to_string(),
                source,
            })?;
        serde_json::from_slice(&body).map_err(|e| ScanError::MalformedResponse {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let response = self.send(endpoint, self.client.get(endpoint)).await?;
        self.read_json(endpoint, response).await
    }
}

#[async_trait]
impl ScanPlatform for HttpScanPlatform {
    async fn find_project(&self, name: &str) -> Result<Option<Project>> {
        let endpoint = self.projects_endpoint();
        let request = self
            .client
            .get(&endpoint)
            .query(&[("unique", "true"), ("name", name)]);
        let response = self.send(&endpoint, request).await?;
        let page: Page<Project> = self.read_json(&endpoint, response).await?;

        Ok(page.content.into_iter().find(|p| p.name == name))
    }

    async fn create_project(&self, name: &str, language: &str) -> Result<Project> {
        let endpoint = self.projects_endpoint();
        let body = json!({
            "name": name,
            "language": language,
            "includeNamespaceFilters": [],
            "excludeNamespaceFilters": [],
        });
        let response = self
            .send(&endpoint, self.client.post(&endpoint).json(&body))
            .await?;
        self.read_json(&endpoint, response).await
    }

    async fn upload_code_artifact(
        &self,
        project: &Project,
        artifact: &Path,
        prescan: Option<&Path>,
    ) -> Result<CodeArtifact> {
        let endpoint = format!("{}/{}/code-artifacts", self.projects_endpoint(), project.id);

        let bytes = tokio::fs::read(artifact)
            .await
            .map_err(|e| ScanError::io(artifact, IoOperation::Read, e))?;
        let filename = artifact
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "artifact".to_string());
        let mut form = Form::new().part("filename", Part::bytes(bytes).file_name(filename));

        if let Some(prescan) = prescan {
            let metadata = tokio::fs::read(prescan)
                .await
                .map_err(|e| ScanError::io(prescan, IoOperation::Read, e))?;
            let part = Part::bytes(metadata)
                .file_name("prescan.json")
                .mime_str("application/json")
                .map_err(|source| ScanError::Transport {
                    endpoint: endpoint.clone(),
                    source,
                })?;
            form = form.part("metadata", part);
        }

        let response = self
            .send(&endpoint, self.client.post(&endpoint).multipart(form))
            .await?;
        self.read_json(&endpoint, response).await
    }

    async fn start_scan(
        &self,
        project: &Project,
        artifact: &CodeArtifact,
        label: &str,
    ) -> Result<ScanHandle> {
        let endpoint = format!("{}/{}/scans", self.projects_endpoint(), project.id);
        let body = json!({ "codeArtifactId": artifact.id, "label": label });
        let response = self
            .send(&endpoint, self.client.post(&endpoint).json(&body))
            .await?;
        let scan: ScanResource = self.read_json(&endpoint, response).await?;

        Ok(ScanHandle {
            status_endpoint: format!("{}/{}", endpoint, scan.id),
            organization_id: scan
                .organization_id
                .unwrap_or_else(|| self.organization_id.clone()),
            project_id: scan.project_id.unwrap_or_else(|| project.id.clone()),
            scan_id: scan.id,
            label: label.to_string(),
        })
    }

    async fn scan_state(&self, handle: &ScanHandle) -> Result<ScanState> {
        self.get_json(&handle.status_endpoint).await
    }

    async fn fetch_sarif(&self, handle: &ScanHandle) -> Result<Vec<u8>> {
        let endpoint = format!("{}/raw-output", handle.status_endpoint);
        let request = self
            .client
            .get(&endpoint)
            .header("Accept", "application/sarif+json, application/json");
        let response = self.send(&endpoint, request).await?;
        let body = response
            .bytes()
            .await
            .map_err(|source| ScanError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;
        Ok(body.to_vec())
    }

    async fn scan_summary(&self, handle: &ScanHandle) -> Result<ScanSummary> {
        let endpoint = format!("{}/summary", handle.status_endpoint);
        self.get_json(&endpoint).await
    }
}
