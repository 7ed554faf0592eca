use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::communication::{PendingRequest, ResultHandle};
use crate::config::BatchConfig;
use crate::core::batch::collection_loop;
use crate::core::dispatch::PredictorDispatch;
use crate::core::queue::PendingQueue;
use crate::core::strategy::BatchPolicy;
use crate::core::worker::BatchWorkerHandle;
use crate::error::{ConfigError, OptimizerError};
use crate::model::ModelHandle;
use crate::predictor::Features;
use super::stats::{CoordinatorSnapshot, CoordinatorStats};

/// Turns single-item requests into model-homogeneous batches.
///
/// One background collection loop serves every model. [`submit`](Self::submit)
/// only enqueues and wakes that loop; the caller then awaits the returned
/// [`ResultHandle`]. Each cut batch becomes exactly one predictor call, and
/// the outputs are written back to the members' slots by position.
///
/// Must be created inside a Tokio runtime. Dropping the coordinator stops the
/// loop, and any request still queued at that point resolves to
/// [`OptimizerError::ShuttingDown`].
pub struct BatchCoordinator {
    waiting_requests: Arc<Mutex<PendingQueue>>,
    stats: Arc<CoordinatorStats>,
    config: BatchConfig,
    handle: BatchWorkerHandle,
}

impl BatchCoordinator {
    pub fn new(config: BatchConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let waiting_requests = Arc::new(Mutex::new(PendingQueue::new()));
        let stats = Arc::new(CoordinatorStats::default());

        let worker_handle = BatchWorkerHandle::new({
            let waiting_requests = waiting_requests.clone();
            let dispatch = Arc::new(PredictorDispatch::new(stats.clone()));
            let policy = BatchPolicy::new(config.clone());

            move |running, notifier| {
                tokio::spawn(collection_loop(
                    dispatch,
                    running,
                    notifier,
                    waiting_requests,
                    policy,
                ))
            }
        });

        Ok(Self {
            waiting_requests,
            stats,
            config,
            handle: worker_handle,
        })
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Enqueues `input` for `model` and returns the handle to await.
    ///
    /// Never waits for the batch to form. If the coordinator has been stopped
    /// the handle resolves immediately to [`OptimizerError::ShuttingDown`].
    pub async fn submit(&self, model: &ModelHandle, input: Features) -> ResultHandle {
        let (request, handle) = PendingRequest::new(model.clone(), input);

        let depth = {
            let mut queue = self.waiting_requests.lock().await;
            // Checked under the lock: the loop drains the queue only after the flag is cleared
            if !self.handle.is_running() {
                drop(queue);
                let (_, mut slot) = request.into_parts();
                let _ = slot.fulfill(Err(OptimizerError::ShuttingDown));
                return handle;
            }
            queue.push(request);
            queue.depth(model)
        };
        debug!(model = %model.revision(), request_id = %handle.request_id(), depth, "request queued");

        self.handle.notify();
        handle
    }

    /// Stops batching for a registration that was replaced or removed.
    ///
    /// Requests already queued for it are still dispatched.
    pub async fn retire(&self, model: &ModelHandle) {
        self.waiting_requests.lock().await.retire(model);
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_running()
    }

    pub async fn queue_depth(&self) -> usize {
        self.waiting_requests.lock().await.len()
    }

    pub async fn stats(&self) -> CoordinatorSnapshot {
        let depth = self.queue_depth().await;
        self.stats.snapshot(depth)
    }

    /// Stops the collection loop and waits for it to exit.
    pub async fn shutdown(&mut self) {
        self.handle.stop().await;
    }
}
