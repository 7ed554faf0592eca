use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{PredictorError, QuantizationError};
use crate::predictor::{Features, Output, Predictor};
use super::{QuantizationKind, QuantizationStrategy, Quantized};

// Wraps the predictor without changing its outputs and reports a 4x smaller footprint
pub(crate) struct MockStrategy {
    kind: QuantizationKind,
    fail: bool,
}

impl MockStrategy {
    pub fn new(kind: QuantizationKind) -> Self {
        Self { kind, fail: false }
    }

    pub fn failing(kind: QuantizationKind) -> Self {
        Self { kind, fail: true }
    }
}

struct Wrapped {
    inner: Arc<dyn Predictor>,
    runtime: String,
}

#[async_trait]
impl Predictor for Wrapped {
    async fn predict(&self, batch: &[Features]) -> Result<Vec<Output>, PredictorError> {
        self.inner.predict(batch).await
    }

    fn runtime(&self) -> &str {
        &self.runtime
    }

    fn size_estimate(&self) -> Option<u64> {
        self.inner.size_estimate().map(|s| s / 4)
    }

    async fn warm_up(&self) -> Result<(), PredictorError> {
        self.inner.warm_up().await
    }
}

#[async_trait]
impl QuantizationStrategy for MockStrategy {
    fn kind(&self) -> QuantizationKind {
        self.kind
    }

    async fn apply(&self, predictor: Arc<dyn Predictor>) -> Result<Quantized, QuantizationError> {
        if self.fail {
            return Err(QuantizationError::Failed("calibration diverged".into()));
        }
        let size_before = predictor.size_estimate().unwrap_or_default();
        let runtime = format!("{}-{}", predictor.runtime(), self.kind);
        Ok(Quantized {
            predictor: Arc::new(Wrapped {
                inner: predictor,
                runtime,
            }),
            size_before,
            size_after: size_before / 4,
        })
    }
}
