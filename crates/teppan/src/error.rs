//! Error types shared across the crate.
//!
//! [`OptimizerError`] is what callers of the public API observe. It is `Clone`
//! because a single failed batch resolves every member request with the same
//! error value.

use thiserror::Error;

/// Convenience alias used throughout the public API.
pub type Result<T, E = OptimizerError> = std::result::Result<T, E>;

/// Failure raised by a [`Predictor`](crate::predictor::Predictor) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct PredictorError {
    message: String,
}

impl PredictorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Failure raised by a [`KeyValueStore`](crate::cache::KeyValueStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store operation failed: {0}")]
    Operation(String),
}

/// Failure raised by a [`QuantizationStrategy`](crate::quantization::QuantizationStrategy).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantizationError {
    #[error("{kind} quantization is not supported for runtime `{runtime}`")]
    Unsupported { kind: String, runtime: String },

    #[error("quantization failed: {0}")]
    Failed(String),
}

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("max_batch_size must be greater than 0")]
    InvalidMaxBatchSize,

    #[error("min_batch_size ({min}) must be between 1 and max_batch_size ({max})")]
    InvalidMinBatchSize { min: usize, max: usize },

    #[error("max_wait_time_ms must be greater than 0")]
    InvalidMaxWaitTime,

    #[error("cache ttl_secs must be greater than 0")]
    InvalidCacheTtl,

    #[error("tracking window_size must be greater than 0")]
    InvalidWindowSize,

    #[error("p95 target must be a positive number of milliseconds")]
    InvalidLatencyTarget,

    #[error("model id must not be empty")]
    EmptyModelId,

    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

/// Raised when a result slot is written more than once.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotError {
    #[error("result slot for request {0} was already fulfilled")]
    AlreadyFulfilled(uuid::Uuid),
}

/// Errors returned by the optimizer and the batch coordinator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptimizerError {
    #[error("model not registered: {0}")]
    ModelNotRegistered(String),

    #[error("predictor failed for model {model}: {source}")]
    Predictor {
        model: String,
        #[source]
        source: PredictorError,
    },

    #[error("predictor for model {model} returned {actual} outputs for a batch of {expected}")]
    OutputCountMismatch {
        model: String,
        expected: usize,
        actual: usize,
    },

    #[error("empty batch submitted for model {0}")]
    EmptyBatch(String),

    #[error("batch coordinator is shutting down")]
    ShuttingDown,

    #[error("request {0} was dropped before a result was produced")]
    Dropped(uuid::Uuid),

    #[error(transparent)]
    Slot(#[from] SlotError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl OptimizerError {
    pub(crate) fn predictor(model: &str, source: PredictorError) -> Self {
        Self::Predictor {
            model: model.to_string(),
            source,
        }
    }
}
