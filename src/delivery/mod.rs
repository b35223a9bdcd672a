//! Delivery of encoded SARIF to GitHub code scanning.

pub mod client;

pub use client::ResultDeliveryClient;

use crate::config::GitHubContext;
use crate::sarif::EncodedPayload;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Workspace path GitHub Actions checks repositories out to.
pub const CHECKOUT_URI: &str = "file:///github/workspace";

/// The only status code GitHub uses to acknowledge a SARIF upload.
pub const ACCEPTED_STATUS: u16 = 202;

/// Error type for delivery failures.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("GitHub API call failed with http status code {status} and body: {body}")]
    Status { status: u16, body: String },

    #[error("GitHub API call failed: {0}")]
    Transport(#[source] reqwest::Error),
}

impl DeliveryError {
    /// HTTP status of the rejected request, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(_) => None,
        }
    }
}

/// Body of a code scanning SARIF upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryRequest {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub commit_sha: String,
    /// gzip + base64 encoded SARIF
    pub sarif: String,
    pub checkout_uri: String,
    pub tool_name: String,
}

impl DeliveryRequest {
    pub fn new(context: &GitHubContext, payload: EncodedPayload) -> Self {
        let tool_name = payload.tool_name().to_string();
        Self {
            git_ref: context.git_ref.clone(),
            commit_sha: context.sha.clone(),
            sarif: payload.into_string(),
            checkout_uri: CHECKOUT_URI.to_string(),
            tool_name,
        }
    }
}

/// Result of a single delivery attempt.
#[derive(Debug)]
pub enum DeliveryOutcome {
    /// GitHub accepted the analysis; carries the response body.
    Accepted(String),
    Failed(DeliveryError),
}

impl DeliveryOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    pub fn into_result(self) -> Result<String, DeliveryError> {
        match self {
            Self::Accepted(ack) => Ok(ack),
            Self::Failed(err) => Err(err),
        }
    }
}

/// Destination for encoded results.
#[async_trait]
pub trait ResultDelivery: Send + Sync {
    async fn deliver(&self, request: &DeliveryRequest) -> DeliveryOutcome;
}
