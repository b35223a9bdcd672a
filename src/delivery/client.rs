use super::{ACCEPTED_STATUS, DeliveryError, DeliveryOutcome, DeliveryRequest, ResultDelivery};
use crate::config::GitHubContext;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use std::time::Duration;
use tracing::{debug, info, warn};

const USER_AGENT: &str = concat!("contrast-scan-action/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";

/// Uploads SARIF analyses to the GitHub code scanning API.
///
/// Each call to [`deliver`](ResultDelivery::deliver) is a single POST with
/// no retry.
#[derive(Clone)]
pub struct ResultDeliveryClient {
    client: Client,
    endpoint: String,
    token: String,
}

impl std::fmt::Debug for ResultDeliveryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultDeliveryClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl ResultDeliveryClient {
    pub fn new(context: &GitHubContext) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(DeliveryError::Transport)?;

        Ok(Self {
            client,
            endpoint: context.code_scanning_endpoint(),
            token: context.token.clone(),
        })
    }

    /// Send analyses to `endpoint` instead of the repository's code scanning URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post(&self, request: &DeliveryRequest) -> Result<String, DeliveryError> {
        debug!(
            endpoint = %self.endpoint,
            git_ref = %request.git_ref,
            commit_sha = %request.commit_sha,
            tool_name = %request.tool_name,
            bytes = request.sarif.len(),
            "Uploading sarif to GitHub"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(ACCEPT, GITHUB_MEDIA_TYPE)
            .json(request)
            .send()
            .await
            .map_err(DeliveryError::Transport)?;

        let status = response.status().as_u16();
        if status == ACCEPTED_STATUS {
            // Accepted even when the acknowledgment body cannot be read.
            return Ok(response.text().await.unwrap_or_default());
        }

        let body = response.text().await.map_err(DeliveryError::Transport)?;
        Err(DeliveryError::Status { status, body })
    }
}

#[async_trait]
impl ResultDelivery for ResultDeliveryClient {
    async fn deliver(&self, request: &DeliveryRequest) -> DeliveryOutcome {
        match self.post(request).await {
            Ok(ack) => {
                info!("Sarif uploaded to GitHub code scanning");
                DeliveryOutcome::Accepted(ack)
            }
            Err(err) => {
                warn!(error = %err, "Sarif upload was not accepted");
                DeliveryOutcome::Failed(err)
            }
        }
    }
}
