//! Contrast Scan platform client.
//!
//! The orchestrator and completion pipeline only talk to the platform through
//! [`ScanPlatform`], so tests can drive them with a scripted fake while the
//! binary uses [`HttpScanPlatform`].

pub mod http;

pub use http::HttpScanPlatform;

use crate::error::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Language recorded on projects created by this tool.
pub const DEFAULT_PROJECT_LANGUAGE: &str = "JAVA";

/// A Contrast Scan project.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub language: Option<String>,
}

/// An uploaded code artifact.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeArtifact {
    pub id: String,
    #[serde(default)]
    pub filename: Option<String>,
}

/// Identifies a started scan and where to query its state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanHandle {
    pub organization_id: String,
    pub project_id: String,
    pub scan_id: String,
    pub label: String,
    /// Absolute URL of the scan resource.
    pub status_endpoint: String,
}

/// Lifecycle states reported for a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanStatus {
    Waiting,
    Running,
    Completed,
    Failed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl ScanStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    pub fn is_failure(self) -> bool {
        matches!(self, Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "WAITING"),
            Self::Running => write!(f, "RUNNING"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Failed => write!(f, "FAILED"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Point-in-time state of a scan.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanState {
    pub status: ScanStatus,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Result counts the platform computes for a finished scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub total_new_results: u64,
    #[serde(default)]
    pub total_fixed_results: u64,
}

/// Operations the scan workflow needs from the Contrast platform.
///
/// Implementations perform exactly one remote call per method and never retry.
#[async_trait]
pub trait ScanPlatform: Send + Sync {
    /// Look up a project by its unique name.
    async fn find_project(&self, name: &str) -> Result<Option<Project>>;

    async fn create_project(&self, name: &str, language: &str) -> Result<Project>;

    /// Upload `artifact` together with the optional pre-scan manifest.
    async fn upload_code_artifact(
        &self,
        project: &Project,
        artifact: &Path,
        prescan: Option<&Path>,
    ) -> Result<CodeArtifact>;

    async fn start_scan(
        &self,
        project: &Project,
        artifact: &CodeArtifact,
        label: &str,
    ) -> Result<ScanHandle>;

    async fn scan_state(&self, handle: &ScanHandle) -> Result<ScanState>;

    /// Download the SARIF results of a completed scan.
    async fn fetch_sarif(&self, handle: &ScanHandle) -> Result<Vec<u8>>;

    async fn scan_summary(&self, handle: &ScanHandle) -> Result<ScanSummary>;
}
