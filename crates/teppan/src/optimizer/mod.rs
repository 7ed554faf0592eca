//! # Inference optimizer
//!
//! The public entry point. [`InferenceOptimizer`] owns the model registry,
//! the quantization capability table, the result cache, the batch coordinator
//! and the performance tracker, and routes each prediction through them.

mod inference;
mod options;
mod registry;
mod report;

pub use inference::InferenceOptimizer;
pub use options::{PredictOptions, RegisterOptions};
pub use registry::{ModelInfo, RegisteredModel};
pub use report::{HealthReport, HealthStatus, OptimizerSummary};
