//! # Teppan
//!
//! A batched, cached, quantization-aware inference serving core. It sits
//! between callers asking for single predictions and a trained model, and
//! cuts per-request latency and cost with three techniques: precision-reduced
//! models, adaptive request batching and a compressed result cache.
//!
//! ## Overview
//!
//! Callers register models and ask for predictions through
//! [`InferenceOptimizer`]. Each prediction flows through:
//!
//! 1. The [`ResultCache`], keyed by a digest of the model revision and the
//!    exact input. A hit returns immediately.
//! 2. The [`BatchCoordinator`], which queues the request with others for the
//!    same model and dispatches each batch to the model in a single call.
//! 3. The [`PerformanceTracker`], which records latency, batch size and cache
//!    outcome for every completed request.
//!
//! ## Architecture
//!
//! ### Predictor
//!
//! The [`Predictor`] trait is the only thing a model has to implement: map a
//! batch of feature vectors to a batch of outputs, in order. The numeric
//! runtime behind it is opaque to this crate.
//!
//! ### Batching
//!
//! One background loop per coordinator collects requests into per-model FIFO
//! queues and decides when to cut a batch using the configured
//! [`BatchStrategy`]:
//!
//! - `fixed_size` - wait for `max_batch_size` requests
//! - `time_window` - cut once `min_batch_size` requests are queued or the
//!   window has elapsed
//! - `adaptive` - wait for a target size that follows recent queue depth
//!
//! Every strategy cuts a full batch immediately and never holds a request
//! longer than `max_wait_time_ms`. Each request resolves exactly once, through
//! its own [`ResultHandle`], with its own output or with the batch's error.
//!
//! ### Caching
//!
//! Results are stored in any [`KeyValueStore`] with a TTL and gzip compression
//! for large payloads. The cache is best-effort: an unreachable store only
//! costs latency, never correctness.
//!
//! ### Quantization
//!
//! A [`QuantizationStrategy`] per runtime can be registered with the
//! optimizer. Models registered with a [`QuantizationKind`] their runtime does
//! not support are served unmodified.
//!
//! ## Configuration
//!
//! [`OptimizerConfig`] can be built in code or parsed from TOML:
//!
//! ```toml
//! [batching]
//! strategy = "time_window"
//! max_batch_size = 16
//! time_window_ms = 20
//!
//! [cache]
//! ttl_secs = 600
//! ```
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events and never installs a subscriber.

mod communication;
mod core;
mod model;

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod metrics;
pub mod optimizer;
pub mod predictor;
pub mod quantization;

pub use cache::{CacheStats, InMemoryStore, KeyValueStore, ResultCache};
pub use communication::{BatchedOutput, ResultHandle};
pub use config::{BatchConfig, BatchStrategy, CacheConfig, OptimizerConfig, TrackerConfig};
pub use coordinator::{BatchCoordinator, CoordinatorSnapshot};
pub use error::{ConfigError, OptimizerError, PredictorError, QuantizationError, Result, StoreError};
pub use metrics::{InferenceMetric, ModelSummary, PerformanceSummary, PerformanceTracker};
pub use model::{ModelHandle, ModelRevision};
pub use optimizer::{
    HealthReport, HealthStatus, InferenceOptimizer, ModelInfo, OptimizerSummary, PredictOptions,
    RegisterOptions,
};
pub use predictor::{Features, Output, Predictor};
pub use quantization::{QuantizationKind, QuantizationProfile, QuantizationStrategy, Quantized};
