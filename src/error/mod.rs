//! Error types for contrast-scan-action.
//!
//! `ScanError` is the crate-wide error. Each step of a remote scan maps its
//! failures onto one of its variants so the binary can pick an exit code
//! without inspecting messages:
//! - transport and platform API failures while talking to Contrast
//! - validation failures from the SARIF encoder
//! - delivery failures from GitHub code scanning
//! - timeouts, interruptions and local I/O failures from the completion pipeline

mod context;

pub use context::IoOperation;

use crate::config::ConfigError;
use crate::delivery::DeliveryError;
use crate::platform::ScanStatus;
use crate::sarif::ValidationError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Unified error type for all scan orchestration steps.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Required configuration was missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Local filesystem operation failed.
    #[error("Failed to {operation} {path}: {source}")]
    Io {
        path: PathBuf,
        operation: IoOperation,
        #[source]
        source: std::io::Error,
    },

    /// Network, DNS or protocol failure talking to the scan platform.
    #[error("Transport error calling {endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The scan platform answered with a non-success status.
    #[error("Contrast API call {endpoint} failed with http status code {status} and body: {body}")]
    PlatformApi {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The scan platform answered with a body we could not interpret.
    #[error("Malformed response from {endpoint}: {message}")]
    MalformedResponse { endpoint: String, message: String },

    /// Artifacts cannot be uploaded to an archived project.
    #[error("Project '{0}' is archived; code artifacts cannot be uploaded to it")]
    ProjectArchived(String),

    /// The remote scan reached a terminal state other than completed.
    #[error("Scan {scan_id} finished with status {status}{}", failure_suffix(.message))]
    ScanFailed {
        scan_id: String,
        status: ScanStatus,
        message: Option<String>,
    },

    /// The SARIF document violates a code scanning payload limit.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// GitHub code scanning did not accept the analysis.
    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    /// The completion pipeline ran past its overall deadline.
    #[error("Failed to retrieve Contrast Scan results in {budget}")]
    Timeout { budget: String, timeout: Duration },

    /// The caller asked the pipeline to stop while it was waiting.
    #[error("Interrupted while retrieving Contrast Scan results")]
    Interrupted,

    /// The completion pipeline could not start its background scheduler.
    #[error("Failed to start scan scheduler: {0}")]
    Scheduler(#[source] std::io::Error),

    /// A background task ended without producing a result of its own.
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ScanError {
    /// Create an Io error from a path, operation and source.
    pub fn io(path: impl Into<PathBuf>, operation: IoOperation, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            operation,
            source,
        }
    }

    /// Check if the pipeline deadline elapsed.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ScanError::Timeout { .. })
    }

    /// Check if the error was raised before any upload was attempted
    /// because the payload violates a receiver limit.
    pub fn is_validation(&self) -> bool {
        matches!(self, ScanError::Validation(_))
    }

    /// Check if the error comes from missing or invalid configuration.
    pub fn is_config(&self) -> bool {
        matches!(self, ScanError::Config(_))
    }
}

fn failure_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

/// Result type alias for scan orchestration operations.
pub type Result<T> = std::result::Result<T, ScanError>;
