use super::awaiter::{CompletedScan, CompletionAwaiter, PendingCompletion};
use super::scheduler::Scheduler;
use super::unwrap_joined;
use crate::error::{IoOperation, Result, ScanError};
use crate::platform::{ScanHandle, ScanPlatform, ScanSummary};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Overall budget for waiting on a scan and collecting its results.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Delay between scan status queries.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Stand-in deadline for budgets too large to add to the current instant.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

enum Wait {
    Finished(Result<()>),
    TimedOut,
    Interrupted,
}

/// Waits for a scan to complete, then saves its SARIF and logs its summary.
pub struct ScanCompletionPipeline {
    awaiter: CompletionAwaiter,
    interrupt: CancellationToken,
    live_workers: Arc<AtomicUsize>,
}

impl ScanCompletionPipeline {
    pub fn new(platform: Arc<dyn ScanPlatform>) -> Self {
        Self {
            awaiter: CompletionAwaiter::new(platform, DEFAULT_POLL_INTERVAL),
            interrupt: CancellationToken::new(),
            live_workers: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.awaiter = self.awaiter.with_poll_interval(interval);
        self
    }

    /// Use `token` as the caller's interrupt signal.
    ///
    /// Cancelling it stops a running pipeline with `Interrupted`. The pipeline
    /// never resets the token, so the caller still observes the interrupt.
    pub fn with_interrupt(mut self, token: CancellationToken) -> Self {
        self.interrupt = token;
        self
    }

    /// Threads currently alive in this pipeline's scheduler. Zero whenever
    /// `run` is not executing.
    pub fn live_workers(&self) -> usize {
        self.live_workers.load(Ordering::SeqCst)
    }

    /// Wait for `handle` to complete, write its SARIF to `results_path` and
    /// log its summary, all within `overall_timeout` of this call.
    ///
    /// Blocks the calling thread. Must not be called from inside an async
    /// runtime.
    pub fn run(
        &self,
        handle: &ScanHandle,
        results_path: &Path,
        overall_timeout: Duration,
    ) -> Result<()> {
        let started = Instant::now();
        let deadline = started
            .checked_add(overall_timeout)
            .unwrap_or_else(|| started + FAR_FUTURE);
        let results_path = absolute(results_path);

        if let Some(reports_dir) = results_path.parent() {
            debug!(dir = %reports_dir.display(), "Creating reports directory");
            std::fs::create_dir_all(reports_dir).map_err(|e| {
                error!("Failed to create Contrast Scan reports directory");
                ScanError::io(reports_dir, IoOperation::CreateDir, e)
            })?;
        }

        let scheduler =
            Scheduler::start(Arc::clone(&self.live_workers)).map_err(ScanError::Scheduler)?;
        let work = self.interrupt.child_token();

        let pending = self.awaiter.await_completion(
            Arc::new(handle.clone()),
            scheduler.handle(),
            work.clone(),
        );
        let task = scheduler.spawn(complete_then_fan_out(pending, results_path));

        let outcome = scheduler.block_on(async {
            tokio::select! {
                biased;
                _ = self.interrupt.cancelled() => Wait::Interrupted,
                joined = tokio::time::timeout_at(deadline.into(), task) => match joined {
                    Ok(joined) => Wait::Finished(unwrap_joined(joined)),
                    Err(_) => Wait::TimedOut,
                },
            }
        });

        // Outstanding work is abandoned; dropping the scheduler discards it.
        work.cancel();
        drop(scheduler);

        match outcome {
            Wait::Finished(Ok(())) => Ok(()),
            Wait::Finished(Err(e)) => {
                error!(error = %e, "Failed to retrieve Contrast Scan results");
                Err(e)
            }
            Wait::TimedOut => {
                let budget = describe_budget(overall_timeout);
                error!("Failed to retrieve Contrast Scan results in {budget}");
                Err(ScanError::Timeout {
                    budget,
                    timeout: overall_timeout,
                })
            }
            Wait::Interrupted => {
                error!("Interrupted while retrieving Contrast Scan results");
                Err(ScanError::Interrupted)
            }
        }
    }
}

async fn complete_then_fan_out(pending: PendingCompletion, results_path: PathBuf) -> Result<()> {
    let completed = pending.await?;

    let save = tokio::spawn(save_results(completed.clone(), results_path));
    let summarize = tokio::spawn(log_summary(completed));

    tokio::try_join!(joined(save), joined(summarize))?;
    Ok(())
}

async fn joined<T>(task: JoinHandle<Result<T>>) -> Result<T> {
    unwrap_joined(task.await)
}

async fn save_results(completed: CompletedScan, results_path: PathBuf) -> Result<()> {
    completed.save_sarif(&results_path).await?;
    info!(path = %results_path.display(), "Saved sarif results");
    Ok(())
}

async fn log_summary(completed: CompletedScan) -> Result<()> {
    let summary = completed.summary().await?;
    for line in summary_lines(&summary) {
        info!("{line}");
    }
    Ok(())
}

pub(crate) fn summary_lines(summary: &ScanSummary) -> Vec<String> {
    vec![
        "Scan completed.".to_string(),
        "Summary from Contrast Teamserver:".to_string(),
        format!("New Results\t{}", summary.total_new_results),
        format!("Fixed Results\t{}", summary.total_fixed_results),
        format!("Total Results\t{}", summary.total_results),
    ]
}

/// Render a timeout budget for diagnostics: whole minutes when the budget
/// divides evenly, otherwise seconds (milliseconds below one second).
pub fn describe_budget(budget: Duration) -> String {
    let millis = budget.as_millis();
    let (amount, unit) = if millis >= 60_000 && millis % 60_000 == 0 {
        (millis / 60_000, "minute")
    } else if millis >= 1_000 {
        (millis / 1_000, "second")
    } else {
        (millis, "millisecond")
    };

    if amount == 1 {
        format!("{amount} {unit}")
    } else {
        format!("{amount} {unit}s")
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
