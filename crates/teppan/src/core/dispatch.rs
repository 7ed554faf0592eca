use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::communication::{Batch, BatchedOutput, ResultSlot};
use crate::coordinator::CoordinatorStats;
use crate::error::{OptimizerError, Result};
use crate::model::ModelHandle;
use crate::predictor::{Features, Output};
use super::handler::BatchHandler;

/// Runs `inputs` through the model as one call and checks the output count.
///
/// Shared by batched dispatch and the direct, unbatched path.
pub async fn run_predictor(model: &ModelHandle, inputs: &[Features]) -> Result<Vec<Output>> {
    if inputs.is_empty() {
        return Err(OptimizerError::EmptyBatch(model.id().to_string()));
    }
    let outputs = model
        .predictor()
        .predict(inputs)
        .await
        .map_err(|e| OptimizerError::predictor(model.id(), e))?;

    if outputs.len() != inputs.len() {
        return Err(OptimizerError::OutputCountMismatch {
            model: model.id().to_string(),
            expected: inputs.len(),
            actual: outputs.len(),
        });
    }
    Ok(outputs)
}

/// Resolves each slot with the output at the same position.
fn fan_out(slots: &mut [ResultSlot], outputs: Vec<Output>) {
    let batch_size = slots.len();
    for (slot, output) in slots.iter_mut().zip(outputs) {
        if let Err(e) = slot.fulfill(Ok(BatchedOutput { output, batch_size })) {
            error!(error = %e, "result slot written twice");
        }
    }
}

fn fail_all(slots: &mut [ResultSlot], error: &OptimizerError) {
    for slot in slots.iter_mut() {
        if let Err(e) = slot.fulfill(Err(error.clone())) {
            error!(error = %e, "result slot written twice");
        }
    }
}

/// The production [`BatchHandler`]: one predictor call per batch.
pub struct PredictorDispatch {
    stats: Arc<CoordinatorStats>,
}

impl PredictorDispatch {
    pub fn new(stats: Arc<CoordinatorStats>) -> Self {
        Self { stats }
    }
}

#[async_trait]
impl BatchHandler for PredictorDispatch {
    async fn handle(&self, batch: Batch) {
        let (model, inputs, mut slots) = batch.into_parts();
        let size = inputs.len();
        if size == 0 {
            return;
        }

        match run_predictor(&model, &inputs).await {
            Ok(outputs) => {
                debug!(model = %model.revision(), batch_size = size, "batch completed");
                self.stats.record_batch(size, true);
                fan_out(&mut slots, outputs);
            }
            Err(e) => {
                error!(model = %model.revision(), batch_size = size, error = %e, "batch failed");
                self.stats.record_batch(size, false);
                fail_all(&mut slots, &e);
            }
        }
    }
}
