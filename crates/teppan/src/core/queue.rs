//! Per-model FIFO queues of pending requests.

use std::collections::{HashMap, VecDeque};

use tokio::time::Instant;
use uuid::Uuid;

use crate::communication::{Batch, PendingRequest};
use crate::model::ModelHandle;
use super::strategy::{BatchPolicy, Decision};

struct ModelQueue {
    model: ModelHandle,
    requests: VecDeque<PendingRequest>,
    smoothed_depth: f64,
    retired: bool,
}

impl ModelQueue {
    fn new(model: ModelHandle) -> Self {
        Self {
            model,
            requests: VecDeque::new(),
            smoothed_depth: 1.0,
            retired: false,
        }
    }

    fn oldest(&self) -> Option<Instant> {
        self.requests.front().map(PendingRequest::arrived_at)
    }
}

/// What one pass over the queues produced.
pub struct CutResult {
    /// Batches ready for dispatch, oldest head first.
    pub batches: Vec<Batch>,
    /// Earliest instant at which a still-queued model must be re-evaluated.
    pub next_deadline: Option<Instant>,
}

/// All requests waiting to be batched, grouped by model registration.
///
/// Requests for one model keep their arrival order. Across models nothing is
/// ordered; each pass visits queues by the age of their head so no model is
/// starved by a busier one.
#[derive(Default)]
pub struct PendingQueue {
    queues: HashMap<Uuid, ModelQueue>,
    len: usize,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of requests waiting for `model`'s registration.
    pub fn depth(&self, model: &ModelHandle) -> usize {
        self.queues.get(&model.registration()).map_or(0, |q| q.requests.len())
    }

    pub fn push(&mut self, request: PendingRequest) {
        let queue = self
            .queues
            .entry(request.model().registration())
            .or_insert_with(|| ModelQueue::new(request.model().clone()));
        queue.retired = false;
        queue.requests.push_back(request);
        self.len += 1;
    }

    /// Stops tracking `model`'s registration once its queue has drained.
    ///
    /// Requests already queued for it are still dispatched with the predictor
    /// they were submitted for.
    pub fn retire(&mut self, model: &ModelHandle) {
        let registration = model.registration();
        let drained = match self.queues.get_mut(&registration) {
            Some(queue) => {
                queue.retired = true;
                queue.requests.is_empty()
            }
            None => false,
        };
        if drained {
            self.queues.remove(&registration);
        }
    }

    /// Cuts every batch the policy considers ready at `now`.
    pub fn cut_ready(&mut self, policy: &BatchPolicy, now: Instant) -> CutResult {
        let mut order: Vec<(Instant, Uuid)> = self
            .queues
            .iter()
            .filter_map(|(registration, queue)| queue.oldest().map(|oldest| (oldest, *registration)))
            .collect();
        order.sort();

        let mut batches = vec![];
        let mut next_deadline: Option<Instant> = None;

        for (_, registration) in order {
            let Some(queue) = self.queues.get_mut(&registration) else {
                continue;
            };
            while let Some(oldest) = queue.oldest() {
                let depth = queue.requests.len();
                match policy.decide(depth, oldest, queue.smoothed_depth, now) {
                    Decision::Cut(size) => {
                        queue.smoothed_depth = policy.smooth(queue.smoothed_depth, depth);
                        let size = size.min(depth).min(policy.max_batch_size());
                        let requests: Vec<PendingRequest> = queue.requests.drain(..size).collect();
                        self.len -= requests.len();
                        batches.push(Batch::new(queue.model.clone(), requests));
                    }
                    Decision::WaitUntil(deadline) => {
                        next_deadline = Some(next_deadline.map_or(deadline, |d| d.min(deadline)));
                        break;
                    }
                }
            }
            if queue.retired && queue.requests.is_empty() {
                self.queues.remove(&registration);
            }
        }

        CutResult {
            batches,
            next_deadline,
        }
    }

    /// Removes every queued request, oldest model first.
    pub fn drain_all(&mut self) -> Vec<PendingRequest> {
        let mut queues: Vec<ModelQueue> = self.queues.drain().map(|(_, q)| q).collect();
        queues.sort_by_key(ModelQueue::oldest);
        self.len = 0;
        queues.into_iter().flat_map(|q| q.requests).collect()
    }
}
