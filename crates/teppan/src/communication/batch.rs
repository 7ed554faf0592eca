use crate::model::ModelHandle;
use crate::predictor::Features;
use super::queue_item::PendingRequest;
use super::result_slot::ResultSlot;

/// # Batch
///
/// An ordered group of requests for the same model registration, cut from the
/// pending queue in one step.
///
/// Position matters: the `i`th input handed to the predictor belongs to the
/// `i`th request, and the `i`th output is written back to that request's slot.
/// A batch is consumed by dispatch, so its members can never be re-enqueued.
#[derive(Debug)]
pub struct Batch {
    model: ModelHandle,
    requests: Vec<PendingRequest>,
}

impl Batch {
    /// Builds a batch from requests that were already grouped by model.
    pub fn new(model: ModelHandle, requests: Vec<PendingRequest>) -> Self {
        debug_assert!(
            requests.iter().all(|r| r.model().registration() == model.registration()),
            "batch members must share one model registration"
        );
        Self { model, requests }
    }

    pub fn model(&self) -> &ModelHandle {
        &self.model
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn requests(&self) -> &[PendingRequest] {
        &self.requests
    }

    /// Separates the stacked inputs from the slots they answer to, keeping order.
    pub fn into_parts(self) -> (ModelHandle, Vec<Features>, Vec<ResultSlot>) {
        let (inputs, slots) = self
            .requests
            .into_iter()
            .map(PendingRequest::into_parts)
            .unzip();
        (self.model, inputs, slots)
    }
}
