use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// One completed prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferenceMetric {
    pub request_id: Uuid,
    pub model_id: String,
    pub latency: Duration,
    /// Size of the batch the request was served in; `0` for cache hits.
    pub batch_size: usize,
    pub cache_hit: bool,
    pub quantized: bool,
    pub completed_at: DateTime<Utc>,
}

impl InferenceMetric {
    pub fn new(model_id: &str, latency: Duration, batch_size: usize, cache_hit: bool, quantized: bool) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            model_id: model_id.to_string(),
            latency,
            batch_size,
            cache_hit,
            quantized,
            completed_at: Utc::now(),
        }
    }

    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }

    pub fn latency_ms(&self) -> f64 {
        self.latency.as_nanos() as f64 / 1e6
    }
}
