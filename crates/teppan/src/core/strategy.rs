//! Batch admission: deciding, per model queue, whether to cut a batch now.

use tokio::time::Instant;

use crate::config::{BatchConfig, BatchStrategy};

/// Outcome of evaluating one model queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Take this many requests from the head of the queue.
    Cut(usize),
    /// Nothing to do before this instant unless new work arrives.
    WaitUntil(Instant),
}

/// Applies the configured [`BatchStrategy`] to a queue snapshot.
///
/// Every strategy shares two rules:
/// * a full `max_batch_size` batch is cut immediately
/// * once the oldest request has waited `max_wait_time_ms`, whatever is
///   queued is cut as a partial batch
#[derive(Debug, Clone)]
pub struct BatchPolicy {
    config: BatchConfig,
}

impl BatchPolicy {
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }

    pub fn max_batch_size(&self) -> usize {
        self.config.max_batch_size
    }

    /// Evaluates a queue holding `depth` requests whose head arrived at `oldest`.
    ///
    /// # Parameters
    ///
    /// * `depth` - Number of queued requests for the model, must be non-zero
    /// * `oldest` - Arrival time of the head of the queue
    /// * `smoothed_depth` - Adaptive depth estimate for the model
    /// * `now` - Current time
    pub fn decide(&self, depth: usize, oldest: Instant, smoothed_depth: f64, now: Instant) -> Decision {
        let max = self.config.max_batch_size;
        let forced_at = oldest + self.config.max_wait_time();

        if depth >= max {
            return Decision::Cut(max);
        }
        if now >= forced_at {
            return Decision::Cut(depth);
        }

        match self.config.strategy {
            BatchStrategy::FixedSize => Decision::WaitUntil(forced_at),
            BatchStrategy::TimeWindow => {
                let window_closes = oldest + self.config.time_window();
                if depth >= self.config.min_batch_size || now >= window_closes {
                    Decision::Cut(depth)
                } else {
                    Decision::WaitUntil(window_closes.min(forced_at))
                }
            }
            BatchStrategy::Adaptive => {
                if depth >= self.adaptive_target(smoothed_depth) {
                    Decision::Cut(depth)
                } else {
                    Decision::WaitUntil(forced_at)
                }
            }
        }
    }

    /// Batch size the adaptive strategy waits for.
    pub fn adaptive_target(&self, smoothed_depth: f64) -> usize {
        let target = smoothed_depth.round();
        if !target.is_finite() || target < 1.0 {
            return 1;
        }
        (target as usize).min(self.config.max_batch_size)
    }

    /// Folds the depth observed at a cut into the running estimate.
    pub fn smooth(&self, previous: f64, observed: usize) -> f64 {
        let alpha = self.config.smoothing();
        alpha * observed as f64 + (1.0 - alpha) * previous
    }
}
