use tokio::sync::oneshot;
use tracing::debug;
use uuid::Uuid;

use crate::error::{OptimizerError, SlotError};
use super::result_handle::{BatchedOutput, ResultHandle};

pub(crate) type SlotResult = Result<BatchedOutput, OptimizerError>;

/// # ResultSlot
///
/// The writing half of a single-assignment result.
///
/// A `ResultSlot` is created together with a [`ResultHandle`]. Exactly one
/// writer (the batch dispatch step) fulfills it; every later attempt is
/// rejected with [`SlotError::AlreadyFulfilled`] and the first result stands.
///
/// ## Abandoned callers
///
/// If the caller dropped its handle before the result arrived, fulfillment
/// still succeeds. The result is discarded, since nobody is waiting for it.
///
/// If the slot itself is dropped unfulfilled, the handle resolves to
/// [`OptimizerError::Dropped`] instead of hanging.
#[derive(Debug)]
pub struct ResultSlot {
    /// Request this slot belongs to
    request_id: Uuid,

    /// Taken on first fulfillment
    sender: Option<oneshot::Sender<SlotResult>>,
}

impl ResultSlot {
    /// Creates a connected slot/handle pair for `request_id`.
    pub fn channel(request_id: Uuid) -> (Self, ResultHandle) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                request_id,
                sender: Some(tx),
            },
            ResultHandle::new(request_id, rx),
        )
    }

    pub fn is_fulfilled(&self) -> bool {
        self.sender.is_none()
    }

    /// Writes the result for this request.
    ///
    /// # Returns
    ///
    /// `Ok(())` the first time, `Err(SlotError::AlreadyFulfilled)` afterwards.
    pub fn fulfill(&mut self, result: SlotResult) -> Result<(), SlotError> {
        let sender = self
            .sender
            .take()
            .ok_or(SlotError::AlreadyFulfilled(self.request_id))?;

        if sender.send(result).is_err() {
            debug!(request_id = %self.request_id, "caller gave up before the result was ready");
        }
        Ok(())
    }
}
