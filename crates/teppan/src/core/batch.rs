use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use tracing::debug;

use crate::error::OptimizerError;
use super::handler::BatchHandler;
use super::queue::PendingQueue;
use super::strategy::BatchPolicy;

/// Longest the loop sleeps when nothing is queued.
const IDLE_POLL: Duration = Duration::from_millis(100);

/// The collection loop: cuts ready batches and hands each to `handler`.
///
/// The loop wakes on every submission and otherwise sleeps until the
/// earliest deadline reported by the queue, so a waiting request is looked
/// at again exactly when its strategy says it may be ready. Each batch is
/// dispatched on its own task, so a slow model does not hold up the others.
///
/// When `running` is cleared, whatever is still queued is rejected with
/// [`OptimizerError::ShuttingDown`] before the loop returns.
pub async fn collection_loop<BH: BatchHandler>(
    handler: Arc<BH>,
    running: Arc<AtomicBool>,
    notifier: Arc<Notify>,
    waiting_requests: Arc<Mutex<PendingQueue>>,
    policy: BatchPolicy,
) {
    loop {
        if !running.load(Ordering::SeqCst) {
            break;
        }

        let cut = {
            let mut queue = waiting_requests.lock().await;
            queue.cut_ready(&policy, Instant::now())
        };

        for batch in cut.batches {
            let waited_ms = batch
                .requests()
                .first()
                .map_or(0, |r| r.arrived_at().elapsed().as_millis() as u64);
            debug!(model = %batch.model().revision(), batch_size = batch.len(), waited_ms, "dispatching batch");
            let handler = handler.clone();
            tokio::spawn(async move {
                handler.handle(batch).await;
            });
        }

        let deadline = cut.next_deadline.unwrap_or_else(|| Instant::now() + IDLE_POLL);
        // Either new work arrived or a deadline passed; both mean re-evaluate
        let _ = tokio::time::timeout_at(deadline, notifier.notified()).await;
    }

    let abandoned = waiting_requests.lock().await.drain_all();
    if !abandoned.is_empty() {
        debug!(count = abandoned.len(), "rejecting queued requests on shutdown");
        handler.reject(abandoned, OptimizerError::ShuttingDown);
    }
}
