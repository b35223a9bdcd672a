use super::unwrap_joined;
use crate::error::{IoOperation, Result, ScanError};
use crate::platform::{ScanHandle, ScanPlatform, ScanStatus, ScanSummary};
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Terminal outcome of a scan: the completed scan, or why it did not complete.
pub type CompletionSignal = Result<CompletedScan>;

/// A scan that reached `COMPLETED`.
///
/// Cloning is cheap; each post-completion action takes its own clone.
#[derive(Clone)]
pub struct CompletedScan {
    handle: Arc<ScanHandle>,
    platform: Arc<dyn ScanPlatform>,
}

impl std::fmt::Debug for CompletedScan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletedScan")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

impl CompletedScan {
    pub fn handle(&self) -> &ScanHandle {
        &self.handle
    }

    /// Download the SARIF results and write them to `path`.
    pub async fn save_sarif(&self, path: &Path) -> Result<()> {
        let sarif = self.platform.fetch_sarif(&self.handle).await?;
        debug!(path = %path.display(), bytes = sarif.len(), "Saving sarif results");
        tokio::fs::write(path, sarif)
            .await
            .map_err(|e| ScanError::io(path, IoOperation::Write, e))
    }

    pub async fn summary(&self) -> Result<ScanSummary> {
        self.platform.scan_summary(&self.handle).await
    }
}

/// A completion signal that has not resolved yet.
///
/// Dropping it abandons the wait; the poll task stops at its next
/// cancellation check or when its scheduler shuts down.
#[derive(Debug)]
pub struct PendingCompletion {
    task: JoinHandle<CompletionSignal>,
}

impl Future for PendingCompletion {
    type Output = CompletionSignal;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.task).poll(cx).map(unwrap_joined)
    }
}

/// Polls a scan until it reaches a terminal state.
#[derive(Clone)]
pub struct CompletionAwaiter {
    platform: Arc<dyn ScanPlatform>,
    poll_interval: Duration,
}

impl CompletionAwaiter {
    pub fn new(platform: Arc<dyn ScanPlatform>, poll_interval: Duration) -> Self {
        Self {
            platform,
            poll_interval,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Start waiting for `handle` on `scheduler`.
    ///
    /// The poll loop checks `cancel` at every suspension point and resolves
    /// to `Interrupted` once it fires.
    pub fn await_completion(
        &self,
        handle: Arc<ScanHandle>,
        scheduler: &Handle,
        cancel: CancellationToken,
    ) -> PendingCompletion {
        let platform = Arc::clone(&self.platform);
        let interval = self.poll_interval;
        let task = scheduler.spawn(poll_until_terminal(platform, handle, interval, cancel));
        PendingCompletion { task }
    }
}

async fn poll_until_terminal(
    platform: Arc<dyn ScanPlatform>,
    handle: Arc<ScanHandle>,
    interval: Duration,
    cancel: CancellationToken,
) -> CompletionSignal {
    loop {
        let state = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ScanError::Interrupted),
            state = platform.scan_state(&handle) => state?,
        };

        match state.status {
            ScanStatus::Completed => {
                info!(scan_id = %handle.scan_id, "Scan completed.");
                return Ok(CompletedScan { handle, platform });
            }
            status if status.is_failure() => {
                return Err(ScanError::ScanFailed {
                    scan_id: handle.scan_id.clone(),
                    status,
                    message: state.error_message,
                });
            }
            status => debug!(scan_id = %handle.scan_id, %status, "Scan in progress"),
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ScanError::Interrupted),
            _ = tokio::time::sleep(interval) => {}
        }
    }
}
