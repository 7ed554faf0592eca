use async_trait::async_trait;
use tracing::trace;

use crate::communication::{Batch, PendingRequest};
use crate::error::OptimizerError;

#[async_trait]
pub trait BatchHandler: Send + Sync + 'static {
    /// Run one batch and resolve every member's slot.
    async fn handle(&self, batch: Batch);

    /// Resolve requests that will never be dispatched.
    fn reject(&self, requests: Vec<PendingRequest>, error: OptimizerError) {
        for request in requests {
            trace!(request_id = %request.id(), error = %error, "rejecting request");
            let (_, mut slot) = request.into_parts();
            // Rejected requests were never handed to a dispatcher
            let _ = slot.fulfill(Err(error.clone()));
        }
    }
}
