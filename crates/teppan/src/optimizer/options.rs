use serde::{Deserialize, Serialize};

use crate::quantization::QuantizationKind;

/// How a model is prepared when it is registered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterOptions {
    pub quantization: QuantizationKind,
    /// Run [`Predictor::warm_up`](crate::predictor::Predictor::warm_up) before
    /// the first request.
    pub preload: bool,
    /// Pins the revision used in cache keys.
    ///
    /// Leave unset to mint a fresh revision per registration, which makes
    /// results cached for any earlier registration unreachable. Pin it only
    /// when the predictor is known to behave identically, e.g. to keep a
    /// shared cache warm across restarts.
    pub revision: Option<String>,
}

impl RegisterOptions {
    pub fn with_quantization(mut self, kind: QuantizationKind) -> Self {
        self.quantization = kind;
        self
    }

    pub fn preloaded(mut self) -> Self {
        self.preload = true;
        self
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }
}

/// Per-call switches for [`InferenceOptimizer::predict`](super::InferenceOptimizer::predict).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictOptions {
    pub use_cache: bool,
    pub use_batching: bool,
}

impl Default for PredictOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            use_batching: true,
        }
    }
}

impl PredictOptions {
    pub fn uncached(mut self) -> Self {
        self.use_cache = false;
        self
    }

    pub fn unbatched(mut self) -> Self {
        self.use_batching = false;
        self
    }
}
