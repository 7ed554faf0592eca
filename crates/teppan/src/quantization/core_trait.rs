use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::QuantizationError;
use crate::predictor::Predictor;

/// Precision-reduction strategies a model can be registered with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantizationKind {
    #[default]
    None,
    ReducedPrecision,
    MixedPrecision,
}

impl QuantizationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuantizationKind::None => "none",
            QuantizationKind::ReducedPrecision => "reduced_precision",
            QuantizationKind::MixedPrecision => "mixed_precision",
        }
    }
}

impl fmt::Display for QuantizationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The result of applying a [`QuantizationStrategy`].
pub struct Quantized {
    pub predictor: Arc<dyn Predictor>,
    pub size_before: u64,
    pub size_after: u64,
}

/// Transforms a predictor into a precision-reduced equivalent.
///
/// One implementation exists per numeric runtime and kind; the optimizer
/// selects it through a [`QuantizationRegistry`](super::QuantizationRegistry)
/// keyed by [`Predictor::runtime`]. The numeric work happens entirely inside
/// the strategy.
#[async_trait]
pub trait QuantizationStrategy: Send + Sync {
    fn kind(&self) -> QuantizationKind;

    async fn apply(&self, predictor: Arc<dyn Predictor>) -> Result<Quantized, QuantizationError>;
}
