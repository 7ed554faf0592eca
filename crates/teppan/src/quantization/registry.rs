use std::collections::HashMap;
use std::sync::Arc;

use tokio::time::Instant;
use tracing::{info, warn};

use crate::predictor::Predictor;
use super::{QuantizationKind, QuantizationProfile, QuantizationStrategy};

/// Capability table mapping (runtime, kind) to the strategy that implements it.
#[derive(Default)]
pub struct QuantizationRegistry {
    strategies: HashMap<(String, QuantizationKind), Arc<dyn QuantizationStrategy>>,
}

impl QuantizationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `strategy` available to predictors reporting `runtime`.
    ///
    /// Replaces any strategy previously registered for the same runtime and kind.
    pub fn register(&mut self, runtime: impl Into<String>, strategy: Arc<dyn QuantizationStrategy>) {
        let kind = strategy.kind();
        self.strategies.insert((runtime.into(), kind), strategy);
    }

    pub fn lookup(&self, runtime: &str, kind: QuantizationKind) -> Option<Arc<dyn QuantizationStrategy>> {
        self.strategies.get(&(runtime.to_string(), kind)).cloned()
    }

    pub fn supports(&self, runtime: &str, kind: QuantizationKind) -> bool {
        kind == QuantizationKind::None || self.lookup(runtime, kind).is_some()
    }

    /// Quantizes `predictor` with `kind`, falling back to the original
    /// predictor when no strategy applies or the strategy fails.
    pub async fn quantize(
        &self,
        model_id: &str,
        predictor: Arc<dyn Predictor>,
        kind: QuantizationKind,
    ) -> (Arc<dyn Predictor>, QuantizationProfile) {
        let size = predictor.size_estimate();
        if kind == QuantizationKind::None {
            return (predictor, QuantizationProfile::unquantized(model_id, kind, size));
        }

        let runtime = predictor.runtime().to_string();
        let Some(strategy) = self.lookup(&runtime, kind) else {
            warn!(model = model_id, %kind, runtime = %runtime, "quantization not supported, using original predictor");
            let profile = QuantizationProfile {
                fallback_reason: Some(format!("no {kind} strategy for runtime `{runtime}`")),
                ..QuantizationProfile::unquantized(model_id, kind, size)
            };
            return (predictor, profile);
        };

        let started = Instant::now();
        match strategy.apply(predictor.clone()).await {
            Ok(quantized) => {
                let profile = QuantizationProfile {
                    model_id: model_id.to_string(),
                    requested: kind,
                    applied: kind,
                    duration: started.elapsed(),
                    size_before: Some(quantized.size_before),
                    size_after: Some(quantized.size_after),
                    fallback_reason: None,
                };
                info!(
                    model = model_id,
                    %kind,
                    duration_ms = profile.duration.as_secs_f64() * 1000.0,
                    compression_ratio = ?profile.compression_ratio(),
                    "model quantized"
                );
                (quantized.predictor, profile)
            }
            Err(e) => {
                warn!(model = model_id, %kind, runtime = %runtime, error = %e, "quantization failed, using original predictor");
                let profile = QuantizationProfile {
                    duration: started.elapsed(),
                    fallback_reason: Some(e.to_string()),
                    ..QuantizationProfile::unquantized(model_id, kind, size)
                };
                (predictor, profile)
            }
        }
    }
}
