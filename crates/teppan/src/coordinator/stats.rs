use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::Serialize;

/// Counters updated by the dispatch step.
#[derive(Debug, Default)]
pub struct CoordinatorStats {
    batches_dispatched: AtomicU64,
    requests_dispatched: AtomicU64,
    failed_batches: AtomicU64,
    largest_batch: AtomicUsize,
}

impl CoordinatorStats {
    pub(crate) fn record_batch(&self, size: usize, succeeded: bool) {
        self.batches_dispatched.fetch_add(1, Ordering::Relaxed);
        self.requests_dispatched.fetch_add(size as u64, Ordering::Relaxed);
        self.largest_batch.fetch_max(size, Ordering::Relaxed);
        if !succeeded {
            self.failed_batches.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self, queue_depth: usize) -> CoordinatorSnapshot {
        let batches = self.batches_dispatched.load(Ordering::Relaxed);
        let requests = self.requests_dispatched.load(Ordering::Relaxed);
        CoordinatorSnapshot {
            batches_dispatched: batches,
            requests_dispatched: requests,
            failed_batches: self.failed_batches.load(Ordering::Relaxed),
            largest_batch: self.largest_batch.load(Ordering::Relaxed),
            mean_batch_size: if batches == 0 {
                0.0
            } else {
                requests as f64 / batches as f64
            },
            queue_depth,
        }
    }
}

/// Point-in-time view of the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinatorSnapshot {
    pub batches_dispatched: u64,
    pub requests_dispatched: u64,
    pub failed_batches: u64,
    pub largest_batch: usize,
    pub mean_batch_size: f64,
    pub queue_depth: usize,
}
