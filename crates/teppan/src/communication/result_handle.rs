use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use uuid::Uuid;

use crate::error::OptimizerError;
use crate::predictor::Output;
use super::result_slot::SlotResult;

/// The output for one request plus the size of the batch that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchedOutput {
    pub output: Output,
    pub batch_size: usize,
}

/// # ResultHandle
///
/// An awaitable, single-assignment result for one submitted request.
///
/// Wraps the receiving half of a Tokio oneshot channel. Dropping the handle is
/// how a caller cancels; the dispatcher still resolves the matching slot and
/// the result is simply discarded.
#[derive(Debug)]
pub struct ResultHandle {
    request_id: Uuid,
    receiver: oneshot::Receiver<SlotResult>,
}

impl ResultHandle {
    pub(crate) fn new(request_id: Uuid, receiver: oneshot::Receiver<SlotResult>) -> Self {
        Self {
            request_id,
            receiver,
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }
}

impl Future for ResultHandle {
    type Output = Result<BatchedOutput, OptimizerError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let request_id = this.request_id;
        Pin::new(&mut this.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(OptimizerError::Dropped(request_id))))
    }
}
