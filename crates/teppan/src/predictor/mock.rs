use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::PredictorError;
use super::{Features, Output, Predictor};

// Multiplies every feature by a constant and records each batch it receives
pub(crate) struct MockPredictor {
    factor: f64,
    runtime: &'static str,
    size: Option<u64>,
    fail_with: Option<String>,
    succeed_first: usize,
    drop_last_output: bool,
    fail_warm_up: bool,
    delay: Option<Duration>,
    batches: Mutex<Vec<Vec<Features>>>,
    warm_ups: AtomicUsize,
}

impl MockPredictor {
    pub fn scaling(factor: f64) -> Self {
        Self {
            factor,
            runtime: "mock",
            size: Some(4_000_000),
            fail_with: None,
            succeed_first: 0,
            drop_last_output: false,
            fail_warm_up: false,
            delay: None,
            batches: Mutex::new(vec![]),
            warm_ups: AtomicUsize::new(0),
        }
    }

    pub fn doubling() -> Self {
        Self::scaling(2.0)
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::doubling()
        }
    }

    // Serves the first `calls` batches, then fails every later one
    pub fn failing_after(calls: usize, message: &str) -> Self {
        Self {
            succeed_first: calls,
            ..Self::failing(message)
        }
    }

    pub fn truncating() -> Self {
        Self {
            drop_last_output: true,
            ..Self::doubling()
        }
    }

    pub fn with_runtime(mut self, runtime: &'static str) -> Self {
        self.runtime = runtime;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_failing_warm_up(mut self) -> Self {
        self.fail_warm_up = true;
        self
    }

    pub fn batches(&self) -> Vec<Vec<Features>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches().iter().map(Vec::len).collect()
    }

    pub fn calls(&self) -> usize {
        self.batches.lock().unwrap().len()
    }

    pub fn warm_ups(&self) -> usize {
        self.warm_ups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Predictor for MockPredictor {
    async fn predict(&self, batch: &[Features]) -> Result<Vec<Output>, PredictorError> {
        let call = {
            let mut batches = self.batches.lock().unwrap();
            batches.push(batch.to_vec());
            batches.len()
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.fail_with {
            if call > self.succeed_first {
                return Err(PredictorError::new(message.clone()));
            }
        }
        let mut outputs: Vec<Output> = batch
            .iter()
            .map(|x| x.iter().map(|v| v * self.factor).collect())
            .collect();
        if self.drop_last_output {
            outputs.pop();
        }
        Ok(outputs)
    }

    fn runtime(&self) -> &str {
        self.runtime
    }

    fn size_estimate(&self) -> Option<u64> {
        self.size
    }

    async fn warm_up(&self) -> Result<(), PredictorError> {
        self.warm_ups.fetch_add(1, Ordering::SeqCst);
        if self.fail_warm_up {
            return Err(PredictorError::new("warm up failed"));
        }
        Ok(())
    }
}
