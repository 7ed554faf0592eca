//! Configuration for the optimizer and its components.
//!
//! Every field has a serde default, so partial TOML documents are accepted:
//!
//! ```toml
//! [batching]
//! strategy = "time_window"
//! max_batch_size = 16
//! time_window_ms = 5
//!
//! [cache]
//! ttl_secs = 60
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How the collection loop decides when to cut a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStrategy {
    /// Wait for `max_batch_size` requests, forcing a partial batch after `max_wait_time_ms`.
    FixedSize,
    /// Cut after `time_window_ms` or once `min_batch_size` requests are queued.
    TimeWindow,
    /// Batch size follows the smoothed queue depth.
    #[default]
    Adaptive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default)]
    pub strategy: BatchStrategy,

    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    #[serde(default = "default_min_batch_size")]
    pub min_batch_size: usize,

    #[serde(default = "default_time_window_ms")]
    pub time_window_ms: u64,

    /// Upper bound on how long any request may sit unbatched.
    #[serde(default = "default_max_wait_time_ms")]
    pub max_wait_time_ms: u64,

    /// Smoothing factor for the adaptive strategy's queue depth estimate.
    #[serde(default = "default_adaptive_smoothing")]
    pub adaptive_smoothing: f64,
}

fn default_max_batch_size() -> usize {
    32
}

fn default_min_batch_size() -> usize {
    1
}

fn default_time_window_ms() -> u64 {
    10
}

fn default_max_wait_time_ms() -> u64 {
    50
}

fn default_adaptive_smoothing() -> f64 {
    0.3
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            strategy: BatchStrategy::default(),
            max_batch_size: default_max_batch_size(),
            min_batch_size: default_min_batch_size(),
            time_window_ms: default_time_window_ms(),
            max_wait_time_ms: default_max_wait_time_ms(),
            adaptive_smoothing: default_adaptive_smoothing(),
        }
    }
}

impl BatchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_batch_size == 0 {
            return Err(ConfigError::InvalidMaxBatchSize);
        }
        if self.min_batch_size == 0 || self.min_batch_size > self.max_batch_size {
            return Err(ConfigError::InvalidMinBatchSize {
                min: self.min_batch_size,
                max: self.max_batch_size,
            });
        }
        if self.max_wait_time_ms == 0 {
            return Err(ConfigError::InvalidMaxWaitTime);
        }
        Ok(())
    }

    pub fn max_wait_time(&self) -> Duration {
        Duration::from_millis(self.max_wait_time_ms)
    }

    pub fn time_window(&self) -> Duration {
        Duration::from_millis(self.time_window_ms)
    }

    /// Smoothing clamped into `(0, 1]`.
    pub(crate) fn smoothing(&self) -> f64 {
        if self.adaptive_smoothing.is_finite() && self.adaptive_smoothing > 0.0 {
            self.adaptive_smoothing.min(1.0)
        } else {
            default_adaptive_smoothing()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Number of recent entries kept in process. Zero disables the fast path.
    #[serde(default = "default_local_capacity")]
    pub local_capacity: usize,

    /// Payloads smaller than this are stored without compression.
    #[serde(default = "default_compression_threshold")]
    pub compression_threshold_bytes: usize,
}

fn default_ttl_secs() -> u64 {
    300
}

fn default_local_capacity() -> usize {
    1024
}

fn default_compression_threshold() -> usize {
    256
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            local_capacity: default_local_capacity(),
            compression_threshold_bytes: default_compression_threshold(),
        }
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ttl_secs == 0 {
            return Err(ConfigError::InvalidCacheTtl);
        }
        Ok(())
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Metrics retained per model before the oldest are evicted.
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    #[serde(default = "default_target_p95_ms")]
    pub target_p95_ms: f64,
}

fn default_window_size() -> usize {
    10_000
}

fn default_target_p95_ms() -> f64 {
    500.0
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            target_p95_ms: default_target_p95_ms(),
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size == 0 {
            return Err(ConfigError::InvalidWindowSize);
        }
        if !(self.target_p95_ms.is_finite() && self.target_p95_ms > 0.0) {
            return Err(ConfigError::InvalidLatencyTarget);
        }
        Ok(())
    }
}

/// Top level configuration for [`InferenceOptimizer`](crate::InferenceOptimizer).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    #[serde(default)]
    pub batching: BatchConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub tracking: TrackerConfig,
}

impl OptimizerConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.batching.validate()?;
        self.cache.validate()?;
        self.tracking.validate()
    }
}
