use tokio::time::Instant;
use uuid::Uuid;

use crate::model::ModelHandle;
use crate::predictor::Features;
use super::result_handle::ResultHandle;
use super::result_slot::ResultSlot;

/// # PendingRequest
///
/// A single queued prediction: the input, the model it targets and the slot
/// its result will be written to.
///
/// The coordinator owns a `PendingRequest` from enqueue until dispatch, when
/// it is split into its input (stacked into the batch) and its slot (fulfilled
/// with the output at the same position).
#[derive(Debug)]
pub struct PendingRequest {
    /// Unique request identifier
    id: Uuid,

    /// Model and revision this request targets
    model: ModelHandle,

    /// The features to run through the model
    input: Features,

    /// When the request entered the queue
    arrived_at: Instant,

    /// Where the result goes
    slot: ResultSlot,
}

impl PendingRequest {
    /// Creates a request and the handle its caller awaits.
    ///
    /// # Parameters
    ///
    /// * `model` - The model the input is for
    /// * `input` - The feature vector
    ///
    /// # Returns
    ///
    /// The queued request together with its [`ResultHandle`]
    pub fn new(model: ModelHandle, input: Features) -> (Self, ResultHandle) {
        let id = Uuid::new_v4();
        let (slot, handle) = ResultSlot::channel(id);
        (
            Self {
                id,
                model,
                input,
                arrived_at: Instant::now(),
                slot,
            },
            handle,
        )
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn model(&self) -> &ModelHandle {
        &self.model
    }

    pub fn arrived_at(&self) -> Instant {
        self.arrived_at
    }

    /// Splits the request into its input and its result slot.
    pub fn into_parts(self) -> (Features, ResultSlot) {
        (self.input, self.slot)
    }
}
