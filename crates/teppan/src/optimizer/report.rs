use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::CacheStats;
use crate::coordinator::CoordinatorSnapshot;
use crate::metrics::ModelSummary;
use crate::quantization::QuantizationProfile;

/// Snapshot returned by [`InferenceOptimizer::performance_summary`](super::InferenceOptimizer::performance_summary).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizerSummary {
    pub generated_at: DateTime<Utc>,
    pub models: BTreeMap<String, ModelSummary>,
    pub quantization: BTreeMap<String, QuantizationProfile>,
    pub cache: CacheStats,
    pub batching: CoordinatorSnapshot,
}

impl OptimizerSummary {
    pub fn model(&self, model_id: &str) -> Option<&ModelSummary> {
        self.models.get(model_id)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    /// Serving, but slower than targeted or running without its cache store.
    Degraded,
    /// No longer accepting batched requests.
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub registered_models: usize,
    pub queue_depth: usize,
    pub cache_store_errors: u64,
    /// Models whose P95 latency is above target.
    pub slow_models: Vec<String>,
}
