use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;
use tracing::debug;

/// How long shutdown waits for worker threads to exit.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Single-worker runtime owned by one pipeline invocation.
///
/// The runtime is shut down when the scheduler is dropped, so every exit
/// path of the owning scope releases its threads. `live` counts the threads
/// the runtime currently has running.
pub(crate) struct Scheduler {
    runtime: Option<Runtime>,
}

impl Scheduler {
    pub(crate) fn start(live: Arc<AtomicUsize>) -> std::io::Result<Self> {
        let started = Arc::clone(&live);
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("contrast-scan-await")
            .enable_all()
            .on_thread_start(move || {
                started.fetch_add(1, Ordering::SeqCst);
            })
            .on_thread_stop(move || {
                live.fetch_sub(1, Ordering::SeqCst);
            })
            .build()?;

        Ok(Self {
            runtime: Some(runtime),
        })
    }

    fn runtime(&self) -> &Runtime {
        self.runtime
            .as_ref()
            .unwrap_or_else(|| unreachable!("runtime is only taken on drop"))
    }

    pub(crate) fn handle(&self) -> &Handle {
        self.runtime().handle()
    }

    pub(crate) fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.runtime().spawn(future)
    }

    /// Block the calling thread until `future` resolves.
    pub(crate) fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime().block_on(future)
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_timeout(SHUTDOWN_GRACE);
            debug!("Scan scheduler shut down");
        }
    }
}
