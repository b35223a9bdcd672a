//! End-to-end remote scan workflow.
//!
//! Project lookup, upload and scan start run on the orchestrator's own small
//! runtime. Waiting for results happens in [`ScanCompletionPipeline`], which
//! owns a separate scheduler, so the orchestrator calls it from plain
//! synchronous code between its async steps.

use crate::config::GitHubContext;
use crate::delivery::{DeliveryRequest, ResultDelivery};
use crate::error::{IoOperation, Result, ScanError};
use crate::pipeline::{DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT, ScanCompletionPipeline};
use crate::platform::{
    CodeArtifact, DEFAULT_PROJECT_LANGUAGE, Project, ScanHandle, ScanPlatform,
};
use crate::prescan;
use crate::sarif::{SarifDocument, SarifEncoder};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

/// Local inputs and outputs of one scan.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    /// Source tree the pre-scan manifest is built from
    pub source_dir: PathBuf,
    pub prescan_out: PathBuf,
    pub sarif_out: PathBuf,
    /// Built artifact to upload
    pub artifact: PathBuf,
}

/// Runs a scan from project lookup through GitHub delivery.
pub struct ScanOrchestrator {
    runtime: Runtime,
    platform: Arc<dyn ScanPlatform>,
    delivery: Arc<dyn ResultDelivery>,
    github: GitHubContext,
    api_url: Url,
    encoder: SarifEncoder,
    timeout: Duration,
    poll_interval: Duration,
    interrupt: CancellationToken,
}

impl ScanOrchestrator {
    pub fn new(
        platform: Arc<dyn ScanPlatform>,
        delivery: Arc<dyn ResultDelivery>,
        github: GitHubContext,
        api_url: Url,
    ) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("contrast-scan")
            .enable_all()
            .build()
            .map_err(ScanError::Scheduler)?;

        Ok(Self {
            runtime,
            platform,
            delivery,
            github,
            api_url,
            encoder: SarifEncoder::new(),
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            interrupt: CancellationToken::new(),
        })
    }

    /// Overall budget for waiting on the scan and collecting its results.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_encoder(mut self, encoder: SarifEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    /// Token that stops a running scan wait when cancelled.
    pub fn interrupt_token(&self) -> CancellationToken {
        self.interrupt.clone()
    }

    /// Cancel the interrupt token when the process receives Ctrl-C.
    pub fn interrupt_on_ctrl_c(&self) {
        let interrupt = self.interrupt.clone();
        self.runtime.spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Received interrupt signal");
                interrupt.cancel();
            }
        });
    }

    /// Run the whole workflow. Returns GitHub's acknowledgment body.
    pub fn run(&self, request: &ScanRequest) -> Result<String> {
        prescan::generate(&request.source_dir, &request.prescan_out)?;

        let project = self.step(self.find_or_create_project())?;
        let artifact = self.step(self.upload(&project, request))?;
        let handle = self.step(self.start_scan(&project, &artifact))?;
        info!(scan_id = %handle.scan_id, "Scan started");
        info!("Scan URL: {}", scan_url(&self.api_url, &handle));

        ScanCompletionPipeline::new(Arc::clone(&self.platform))
            .with_poll_interval(self.poll_interval)
            .with_interrupt(self.interrupt.clone())
            .run(&handle, &request.sarif_out, self.timeout)?;

        self.step(self.upload_sarif(request))
    }

    fn step<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    async fn find_or_create_project(&self) -> Result<Project> {
        let name = self.github.project_name();
        if let Some(project) = self.platform.find_project(name).await? {
            debug!(project_id = %project.id, "Found existing project");
            return Ok(project);
        }

        info!("Creating project with name: '{name}'");
        self.platform
            .create_project(name, DEFAULT_PROJECT_LANGUAGE)
            .await
    }

    async fn upload(&self, project: &Project, request: &ScanRequest) -> Result<CodeArtifact> {
        if project.archived {
            return Err(ScanError::ProjectArchived(project.name.clone()));
        }

        let file_name = request
            .artifact
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        info!("Uploading {file_name} to Contrast Scan");

        self.platform
            .upload_code_artifact(project, &request.artifact, Some(&request.prescan_out))
            .await
            .inspect_err(|_| error!("Failed to upload code artifact to Contrast Scan"))
    }

    async fn start_scan(&self, project: &Project, artifact: &CodeArtifact) -> Result<ScanHandle> {
        let label = self.github.scan_label();
        info!(
            "Starting scan for project [{}] with label [{label}]",
            project.name
        );
        self.platform
            .start_scan(project, artifact, &label)
            .await
            .inspect_err(|_| error!(artifact_id = %artifact.id, "Failed to start scan"))
    }

    async fn upload_sarif(&self, request: &ScanRequest) -> Result<String> {
        let raw = tokio::fs::read(&request.sarif_out)
            .await
            .map_err(|e| ScanError::io(&request.sarif_out, IoOperation::Read, e))?;

        let document = SarifDocument::parse(&raw)?;
        let payload = self.encoder.encode(&document, &raw)?;
        if let Some(warning) = payload.truncation_warning() {
            warn!("{warning}");
        }
        debug!(
            results = payload.result_count(),
            encoded_bytes = payload.encoded_size(),
            tool_name = payload.tool_name(),
            "Encoded sarif"
        );

        let delivery = DeliveryRequest::new(&self.github, payload);
        let ack = self.delivery.deliver(&delivery).await.into_result()?;
        Ok(ack)
    }
}

/// Link to the scan in the Contrast web UI, on the API URL's host.
pub fn scan_url(api_url: &Url, handle: &ScanHandle) -> String {
    format!(
        "{}/Contrast/static/ng/index.html#/{}/scans/{}/scans/{}",
        api_url.origin().ascii_serialization(),
        handle.organization_id,
        handle.project_id,
        handle.scan_id
    )
}
