use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::trace;

use crate::config::TrackerConfig;
use super::summary::percentile;
use super::{InferenceMetric, ModelSummary, PerformanceSummary};

struct Sample {
    latency_ms: f64,
    batch_size: usize,
    cache_hit: bool,
    quantized: bool,
    recorded_at: Instant,
}

#[derive(Default)]
struct ModelWindow {
    samples: VecDeque<Sample>,
    total: u64,
    hits: u64,
    misses: u64,
    errors: u64,
}

impl ModelWindow {
    fn push(&mut self, sample: Sample, capacity: usize) {
        self.total += 1;
        if sample.cache_hit {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        if self.samples.len() == capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    fn summarize(&self, target_p95_ms: f64, now: Instant) -> ModelSummary {
        let len = self.samples.len();
        let mut latencies: Vec<f64> = self.samples.iter().map(|s| s.latency_ms).collect();
        latencies.sort_by(f64::total_cmp);

        let mean = |sum: f64, n: usize| if n == 0 { 0.0 } else { sum / n as f64 };
        let dispatched: Vec<usize> = self
            .samples
            .iter()
            .filter(|s| !s.cache_hit)
            .map(|s| s.batch_size)
            .collect();
        let quantized = self.samples.iter().filter(|s| s.quantized).count();

        let throughput_per_sec = match self.samples.front() {
            Some(oldest) => {
                let span = now.duration_since(oldest.recorded_at).as_secs_f64();
                if span > 0.0 { len as f64 / span } else { 0.0 }
            }
            None => 0.0,
        };

        let p95 = percentile(&latencies, 0.95);
        ModelSummary {
            total_predictions: self.total,
            errors: self.errors,
            window_len: len,
            mean_latency_ms: mean(latencies.iter().sum(), len),
            p50_latency_ms: percentile(&latencies, 0.5),
            p95_latency_ms: p95,
            p99_latency_ms: percentile(&latencies, 0.99),
            cache_hit_rate: mean(self.hits as f64, (self.hits + self.misses) as usize),
            mean_batch_size: mean(dispatched.iter().sum::<usize>() as f64, dispatched.len()),
            quantized_share: mean(quantized as f64, len),
            throughput_per_sec,
            target_met: p95 <= target_p95_ms,
        }
    }
}

/// Rolling per-model latency, batch and cache statistics.
///
/// Each model has its own window behind its own lock, so recording for one
/// model never contends with another.
pub struct PerformanceTracker {
    config: TrackerConfig,
    windows: RwLock<HashMap<String, Arc<Mutex<ModelWindow>>>>,
}

impl PerformanceTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            windows: RwLock::new(HashMap::new()),
        }
    }

    async fn window(&self, model_id: &str) -> Arc<Mutex<ModelWindow>> {
        if let Some(window) = self.windows.read().await.get(model_id) {
            return window.clone();
        }
        self.windows
            .write()
            .await
            .entry(model_id.to_string())
            .or_default()
            .clone()
    }

    pub async fn record(&self, metric: &InferenceMetric) {
        trace!(
            model = %metric.model_id,
            request_id = %metric.request_id,
            latency_ms = metric.latency_ms(),
            batch_size = metric.batch_size,
            cache_hit = metric.cache_hit,
            "recording prediction"
        );
        let sample = Sample {
            latency_ms: metric.latency_ms(),
            batch_size: metric.batch_size,
            cache_hit: metric.cache_hit,
            quantized: metric.quantized,
            recorded_at: Instant::now(),
        };
        let window = self.window(&metric.model_id).await;
        window.lock().await.push(sample, self.config.window_size.max(1));
    }

    /// Counts a prediction that ended in an error.
    pub async fn record_failure(&self, model_id: &str) {
        let window = self.window(model_id).await;
        window.lock().await.errors += 1;
    }

    /// Drops all statistics for `model_id`.
    pub async fn forget(&self, model_id: &str) {
        self.windows.write().await.remove(model_id);
    }

    pub async fn model_summary(&self, model_id: &str) -> Option<ModelSummary> {
        let window = self.windows.read().await.get(model_id)?.clone();
        let summary = window.lock().await.summarize(self.config.target_p95_ms, Instant::now());
        Some(summary)
    }

    pub async fn summary(&self) -> PerformanceSummary {
        let windows: Vec<(String, Arc<Mutex<ModelWindow>>)> = self
            .windows
            .read()
            .await
            .iter()
            .map(|(id, window)| (id.clone(), window.clone()))
            .collect();

        let now = Instant::now();
        let mut summary = PerformanceSummary::default();
        for (model_id, window) in windows {
            let model = window.lock().await.summarize(self.config.target_p95_ms, now);
            summary.models.insert(model_id, model);
        }
        summary
    }
}
