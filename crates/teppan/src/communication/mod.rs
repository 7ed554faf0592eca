mod batch;
mod queue_item;
mod result_handle;
mod result_slot;

pub use batch::Batch;
pub use queue_item::PendingRequest;
pub use result_handle::{BatchedOutput, ResultHandle};
pub use result_slot::ResultSlot;
