use std::time::Duration;

use serde::Serialize;

use super::QuantizationKind;

/// What quantization did to a model at registration time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuantizationProfile {
    pub model_id: String,
    pub requested: QuantizationKind,
    pub applied: QuantizationKind,
    pub duration: Duration,
    pub size_before: Option<u64>,
    pub size_after: Option<u64>,
    /// Why `applied` differs from `requested`, if it does.
    pub fallback_reason: Option<String>,
}

impl QuantizationProfile {
    /// Profile for a model registered as-is.
    pub fn unquantized(model_id: &str, requested: QuantizationKind, size: Option<u64>) -> Self {
        Self {
            model_id: model_id.to_string(),
            requested,
            applied: QuantizationKind::None,
            duration: Duration::ZERO,
            size_before: size,
            size_after: size,
            fallback_reason: None,
        }
    }

    pub fn is_quantized(&self) -> bool {
        self.applied != QuantizationKind::None
    }

    /// `size_before / size_after`, when both sizes are known.
    pub fn compression_ratio(&self) -> Option<f64> {
        match (self.size_before, self.size_after) {
            (Some(before), Some(after)) if after > 0 => Some(before as f64 / after as f64),
            _ => None,
        }
    }
}
