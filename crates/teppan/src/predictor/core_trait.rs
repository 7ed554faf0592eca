use async_trait::async_trait;

use crate::error::PredictorError;

/// A single input feature vector.
pub type Features = Vec<f64>;

/// The output produced for one input.
pub type Output = Vec<f64>;

/// Defines a model that maps a batch of feature vectors to a batch of outputs.
///
/// # Implementation Notes
///
/// Implementations should:
/// * Accept any non-empty batch
/// * Return exactly one output per input, in input order
/// * Be thread-safe; the optimizer shares a predictor across tasks
///
/// # Example
///
/// ```ignore
/// use teppan::{Predictor, PredictorError, Features, Output};
/// use async_trait::async_trait;
///
/// struct Scale(f64);
///
/// #[async_trait]
/// impl Predictor for Scale {
///     async fn predict(&self, batch: &[Features]) -> Result<Vec<Output>, PredictorError> {
///         Ok(batch.iter().map(|x| x.iter().map(|v| v * self.0).collect()).collect())
///     }
/// }
/// ```
#[async_trait]
pub trait Predictor: Send + Sync {
    /// Runs the model over every input in `batch`.
    async fn predict(&self, batch: &[Features]) -> Result<Vec<Output>, PredictorError>;

    /// Name of the numeric runtime backing this predictor.
    ///
    /// Used to look up which quantization strategies apply to it.
    fn runtime(&self) -> &str {
        "generic"
    }

    /// Approximate in-memory footprint in bytes, if known.
    fn size_estimate(&self) -> Option<u64> {
        None
    }

    /// Prepares the predictor for its first real request.
    ///
    /// Called once at registration when preloading is requested.
    async fn warm_up(&self) -> Result<(), PredictorError> {
        Ok(())
    }
}
