//! Per-model performance tracking.

mod metric;
mod summary;
mod tracker;

pub use metric::InferenceMetric;
pub use summary::{ModelSummary, PerformanceSummary};
pub use tracker::PerformanceTracker;
