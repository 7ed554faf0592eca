mod batcher;
mod stats;

pub use batcher::BatchCoordinator;
pub use stats::{CoordinatorSnapshot, CoordinatorStats};
