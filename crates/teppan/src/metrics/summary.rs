use std::collections::BTreeMap;

use serde::Serialize;

/// Latency and usage statistics for one model over its rolling window.
///
/// Counters (`total_predictions`, `errors`, `cache_hit_rate`) cover the
/// model's lifetime; latency and batch statistics cover the window only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub total_predictions: u64,
    pub errors: u64,
    pub window_len: usize,
    pub mean_latency_ms: f64,
    pub p50_latency_ms: f64,
    pub p95_latency_ms: f64,
    pub p99_latency_ms: f64,
    pub cache_hit_rate: f64,
    /// Mean size of the batches that dispatched requests were served in.
    pub mean_batch_size: f64,
    pub quantized_share: f64,
    pub throughput_per_sec: f64,
    /// Whether P95 latency is within the configured target.
    pub target_met: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub models: BTreeMap<String, ModelSummary>,
}

impl PerformanceSummary {
    pub fn model(&self, model_id: &str) -> Option<&ModelSummary> {
        self.models.get(model_id)
    }

    pub fn total_predictions(&self) -> u64 {
        self.models.values().map(|m| m.total_predictions).sum()
    }
}

/// Nearest-rank percentile of an ascending slice, `p` in `[0, 1]`.
pub(crate) fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (sorted.len() as f64 * p) as usize;
    sorted[rank.min(sorted.len() - 1)]
}
