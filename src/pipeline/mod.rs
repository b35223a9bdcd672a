//! Scan completion pipeline.
//!
//! Waits for a remote scan to finish on a dedicated background scheduler,
//! then runs the two post-completion actions (save SARIF, log the summary)
//! under one overall deadline.

mod awaiter;
mod completion;
mod scheduler;

pub use awaiter::{CompletedScan, CompletionAwaiter, CompletionSignal, PendingCompletion};
pub use completion::{DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT, ScanCompletionPipeline, describe_budget};

use crate::error::{Result, ScanError};
use tokio::task::JoinError;

/// Flatten a joined task result so callers see the task's own error rather
/// than the join wrapper. A join failure carries no inner error (the task
/// panicked or was cancelled) and is reported as-is.
pub(crate) fn unwrap_joined<T>(joined: std::result::Result<Result<T>, JoinError>) -> Result<T> {
    match joined {
        Ok(result) => result,
        Err(e) => Err(ScanError::Task(e)),
    }
}
