//! Ownership of a spawned background task.

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;

use crate::lifecycle::Shutdown;

/// A spawned task plus the signal that stops it.
///
/// `stop` is idempotent: the first call signals and joins the task, and
/// racing callers wait for that join to finish. Dropping the
/// owner signals the task as well, so it never outlives its owner.
#[derive(Debug)]
pub struct BackgroundTask {
    name: &'static str,
    shutdown: Shutdown,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl BackgroundTask {
    /// Spawn `make(receiver)` on the current Tokio runtime.
    pub fn spawn<F, Fut>(name: &'static str, make: F) -> Self
    where
        F: FnOnce(broadcast::Receiver<()>) -> Fut,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let shutdown = Shutdown::new();
        let handle = tokio::spawn(make(shutdown.subscribe()));
        tracing::debug!(task = name, "Background task started");
        Self {
            name,
            shutdown,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Signal the task and wait for it to finish. Safe to call repeatedly and
    /// concurrently; only the first call does the work.
    pub async fn stop(&self) {
        self.shutdown.trigger();

        // Held across the join so no caller returns while the task still runs.
        let mut slot = self.handle.lock().await;
        let Some(handle) = slot.take() else {
            return;
        };

        if let Err(e) = handle.await {
            if e.is_panic() {
                tracing::error!(task = self.name, "Background task panicked");
            }
        }
        tracing::debug!(task = self.name, "Background task stopped");
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown.is_triggered()
    }
}

impl Drop for BackgroundTask {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}
