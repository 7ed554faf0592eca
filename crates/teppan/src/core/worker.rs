//! Ownership of the background collection task.

use std::sync::{Arc, atomic::{AtomicBool, Ordering}};
use tokio::{task::JoinHandle, sync::Notify};

/// A handle to the single background task that collects and dispatches batches.
///
/// The task receives a running flag and a notifier. Submitters call
/// [`notify`](Self::notify) after enqueueing so the task wakes immediately
/// instead of waiting out its next deadline. Dropping the handle stops the
/// task.
///
/// # Example
///
/// ```ignore
/// let worker = BatchWorkerHandle::new(|running, notifier| {
///     tokio::spawn(async move {
///         while running.load(Ordering::SeqCst) {
///             // cut and dispatch ready batches
///             notifier.notified().await;
///         }
///     })
/// });
///
/// worker.notify();
/// ```
pub struct BatchWorkerHandle {
    /// Cleared to ask the task to exit
    running: Arc<AtomicBool>,

    /// `None` once shutdown has begun
    handle: Option<JoinHandle<()>>,

    /// Wakes the task
    notifier: Arc<Notify>,
}

impl BatchWorkerHandle {
    /// Spawns the background task through `task`.
    ///
    /// # Parameters
    ///
    /// * `task` - Receives the running flag and notifier, spawns the task and
    ///   returns its `JoinHandle`
    pub fn new<F>(task: F) -> Self
    where
        F: FnOnce(Arc<AtomicBool>, Arc<Notify>) -> JoinHandle<()>,
    {
        let running = Arc::new(AtomicBool::new(true));
        let notifier = Arc::new(Notify::new());
        let handle = task(running.clone(), notifier.clone());

        Self {
            running,
            handle: Some(handle),
            notifier,
        }
    }

    /// Wakes the task to look for new work.
    ///
    /// A notification sent while the task is busy is remembered, so a
    /// submission is never missed.
    pub fn notify(&self) {
        self.notifier.notify_one();
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Asks the task to stop without waiting for it.
    pub fn shutdown(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.notifier.notify_one();
        // Dropping the JoinHandle detaches the task; it exits on its next wake-up
        self.handle.take();
    }

    /// Asks the task to stop and waits until it has exited.
    pub async fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.notifier.notify_one();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for BatchWorkerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
