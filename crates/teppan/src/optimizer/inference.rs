use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::{KeyValueStore, ResultCache};
use crate::communication::BatchedOutput;
use crate::config::OptimizerConfig;
use crate::coordinator::BatchCoordinator;
use crate::core::dispatch::run_predictor;
use crate::error::{ConfigError, OptimizerError, Result};
use crate::metrics::{InferenceMetric, PerformanceTracker};
use crate::model::{ModelHandle, ModelRevision};
use crate::predictor::{Features, Output, Predictor};
use crate::quantization::{QuantizationRegistry, QuantizationStrategy};
use super::options::{PredictOptions, RegisterOptions};
use super::registry::{ModelInfo, ModelRegistry, RegisteredModel};
use super::report::{HealthReport, HealthStatus, OptimizerSummary};

/// Serves predictions for registered models through the cache and the batcher.
///
/// A call to [`predict`](Self::predict) checks the [`ResultCache`] first. On
/// a miss the input is submitted to the [`BatchCoordinator`], which groups it
/// with other requests for the same model. The output is cached and a metric
/// is recorded on every path.
///
/// Must be created inside a Tokio runtime.
///
/// # Example
///
/// ```ignore
/// let optimizer = InferenceOptimizer::new(OptimizerConfig::default(), Arc::new(InMemoryStore::new()))?;
/// optimizer.register_model("m1", predictor, RegisterOptions::default()).await?;
/// let output = optimizer.predict("m1", vec![3.0], PredictOptions::default()).await?;
/// ```
pub struct InferenceOptimizer {
    config: OptimizerConfig,
    models: ModelRegistry,
    quantization: RwLock<QuantizationRegistry>,
    cache: ResultCache,
    coordinator: BatchCoordinator,
    tracker: PerformanceTracker,
}

impl InferenceOptimizer {
    pub fn new(config: OptimizerConfig, store: Arc<dyn KeyValueStore>) -> Result<Self, ConfigError> {
        config.validate()?;
        let coordinator = BatchCoordinator::new(config.batching.clone())?;

        Ok(Self {
            models: ModelRegistry::default(),
            quantization: RwLock::new(QuantizationRegistry::new()),
            cache: ResultCache::new(store, config.cache.clone()),
            coordinator,
            tracker: PerformanceTracker::new(config.tracking.clone()),
            config,
        })
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Makes `strategy` available to predictors whose runtime is `runtime`.
    pub async fn register_quantization_strategy(
        &self,
        runtime: impl Into<String>,
        strategy: Arc<dyn QuantizationStrategy>,
    ) {
        self.quantization.write().await.register(runtime, strategy);
    }

    /// Registers `predictor` under `model_id`, replacing any earlier registration.
    ///
    /// Quantization and preloading are best-effort: when either fails the model
    /// is still registered and [`ModelInfo`] says what happened. Results cached
    /// for a replaced registration are never served for the new one unless
    /// both pin the same revision and serve the model in the same form
    /// (runtime and applied quantization). Requests already queued for the
    /// replaced registration finish on its predictor; later ones use the new one.
    pub async fn register_model(
        &self,
        model_id: impl Into<String>,
        predictor: Arc<dyn Predictor>,
        options: RegisterOptions,
    ) -> Result<ModelInfo> {
        let model_id = model_id.into();
        if model_id.is_empty() {
            return Err(ConfigError::EmptyModelId.into());
        }

        let (predictor, profile) = self
            .quantization
            .read()
            .await
            .quantize(&model_id, predictor, options.quantization)
            .await;

        let preloaded = options.preload && Self::warm_up(&model_id, predictor.as_ref()).await;

        let revision = options
            .revision
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
        let variant = format!("{}/{}", predictor.runtime(), profile.applied);
        let handle = ModelHandle::new(
            ModelRevision::new(model_id.as_str(), revision).with_variant(variant),
            predictor,
        );
        let registered = RegisteredModel {
            handle,
            profile,
            registered_at: Utc::now(),
            preloaded,
        };
        let info = registered.info();

        if let Some(previous) = self.models.insert(registered).await {
            let invalidated = self.cache.invalidate_model(&model_id).await;
            self.coordinator.retire(&previous.handle).await;
            debug!(model = %model_id, previous = %previous.handle.revision(), invalidated, "replaced registration");
        }

        info!(
            model = %model_id,
            revision = %info.revision,
            runtime = %info.runtime,
            quantization = %info.quantization.applied,
            preloaded,
            "model registered"
        );
        Ok(info)
    }

    async fn warm_up(model_id: &str, predictor: &dyn Predictor) -> bool {
        match predictor.warm_up().await {
            Ok(()) => true,
            Err(e) => {
                warn!(model = %model_id, error = %e, "warm-up failed, model will load on first request");
                false
            }
        }
    }

    /// Removes `model_id` and forgets its statistics.
    ///
    /// Requests already queued for it still complete.
    pub async fn unregister_model(&self, model_id: &str) -> Result<ModelInfo> {
        let removed = self
            .models
            .remove(model_id)
            .await
            .ok_or_else(|| OptimizerError::ModelNotRegistered(model_id.to_string()))?;

        self.coordinator.retire(&removed.handle).await;
        self.cache.invalidate_model(model_id).await;
        self.tracker.forget(model_id).await;

        info!(model = %model_id, "model unregistered");
        Ok(removed.info())
    }

    pub async fn model_info(&self, model_id: &str) -> Option<ModelInfo> {
        self.models.get(model_id).await.map(|m| m.info())
    }

    /// Every registration, ordered by model id.
    pub async fn registered_models(&self) -> Vec<ModelInfo> {
        self.models.all().await.iter().map(|m| m.info()).collect()
    }

    async fn lookup(&self, model_id: &str) -> Result<Arc<RegisteredModel>> {
        self.models
            .get(model_id)
            .await
            .ok_or_else(|| OptimizerError::ModelNotRegistered(model_id.to_string()))
    }

    /// Predicts the output for one input.
    ///
    /// Predictor errors are returned as-is and never retried. Cache failures
    /// are never returned; they only cost a predictor call.
    pub async fn predict(&self, model_id: &str, input: Features, options: PredictOptions) -> Result<Output> {
        let started = Instant::now();
        let model = self.lookup(model_id).await?;
        let revision = model.handle.revision();
        let quantized = model.profile.is_quantized();

        if options.use_cache {
            if let Some(output) = self.cache.get(revision, &input).await {
                debug!(model = %revision, "served from cache");
                let metric = InferenceMetric::new(model_id, started.elapsed(), 0, true, quantized);
                self.tracker.record(&metric).await;
                return Ok(output);
            }
        }

        let (request_id, served) = if options.use_batching {
            let handle = self.coordinator.submit(&model.handle, input.clone()).await;
            (handle.request_id(), handle.await)
        } else {
            (Uuid::new_v4(), Self::predict_direct(&model.handle, &input).await)
        };

        match served {
            Ok(BatchedOutput { output, batch_size }) => {
                if options.use_cache {
                    self.cache.set(revision, &input, &output).await;
                }
                let metric = InferenceMetric::new(model_id, started.elapsed(), batch_size, false, quantized)
                    .with_request_id(request_id);
                self.tracker.record(&metric).await;
                Ok(output)
            }
            Err(e) => {
                debug!(model = %revision, %request_id, error = %e, "prediction failed");
                self.tracker.record_failure(model_id).await;
                Err(e)
            }
        }
    }

    async fn predict_direct(model: &ModelHandle, input: &Features) -> Result<BatchedOutput> {
        let outputs = run_predictor(model, std::slice::from_ref(input)).await?;
        let output = outputs
            .into_iter()
            .next()
            .ok_or_else(|| OptimizerError::OutputCountMismatch {
                model: model.id().to_string(),
                expected: 1,
                actual: 0,
            })?;
        Ok(BatchedOutput { output, batch_size: 1 })
    }

    /// Predicts outputs for several inputs of one model, in input order.
    ///
    /// Cached inputs are answered from the cache. The rest already form a
    /// batch, so they go straight to the predictor in chunks of at most
    /// `max_batch_size` without passing through the coordinator. If any chunk
    /// fails the whole call fails; outputs of chunks that completed before it
    /// stay cached and are recorded as successes.
    pub async fn predict_many(
        &self,
        model_id: &str,
        inputs: Vec<Features>,
        options: PredictOptions,
    ) -> Result<Vec<Output>> {
        let started = Instant::now();
        let model = self.lookup(model_id).await?;
        let revision = model.handle.revision();
        let quantized = model.profile.is_quantized();

        let mut outputs: Vec<Option<Output>> = vec![None; inputs.len()];
        let mut missed = vec![];
        for (i, input) in inputs.iter().enumerate() {
            let cached = if options.use_cache {
                self.cache.get(revision, input).await
            } else {
                None
            };
            match cached {
                Some(output) => outputs[i] = Some(output),
                None => missed.push(i),
            }
        }
        let hits = inputs.len() - missed.len();

        let mut chunk_sizes = vec![];
        let mut failure = None;
        for chunk in missed.chunks(self.config.batching.max_batch_size) {
            let batch: Vec<Features> = chunk.iter().map(|&i| inputs[i].clone()).collect();
            let computed = match run_predictor(&model.handle, &batch).await {
                Ok(computed) => computed,
                Err(e) => {
                    debug!(model = %revision, batch_size = chunk.len(), error = %e, "batch prediction failed");
                    failure = Some((chunk.len(), e));
                    break;
                }
            };
            for (&i, output) in chunk.iter().zip(computed) {
                if options.use_cache {
                    self.cache.set(revision, &inputs[i], &output).await;
                }
                outputs[i] = Some(output);
            }
            chunk_sizes.push(chunk.len());
        }

        let latency = started.elapsed();
        for _ in 0..hits {
            self.tracker
                .record(&InferenceMetric::new(model_id, latency, 0, true, quantized))
                .await;
        }
        for size in chunk_sizes {
            for _ in 0..size {
                self.tracker
                    .record(&InferenceMetric::new(model_id, latency, size, false, quantized))
                    .await;
            }
        }
        if let Some((failed, e)) = failure {
            for _ in 0..failed {
                self.tracker.record_failure(model_id).await;
            }
            return Err(e);
        }

        outputs
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| OptimizerError::OutputCountMismatch {
                model: model_id.to_string(),
                expected: inputs.len(),
                actual: inputs.len() - missed.len(),
            })
    }

    pub async fn performance_summary(&self) -> OptimizerSummary {
        let quantization = self
            .models
            .all()
            .await
            .iter()
            .map(|m| (m.handle.id().to_string(), m.profile.clone()))
            .collect();

        OptimizerSummary {
            generated_at: Utc::now(),
            models: self.tracker.summary().await.models,
            quantization,
            cache: self.cache.stats().await,
            batching: self.coordinator.stats().await,
        }
    }

    pub async fn health(&self) -> HealthReport {
        let performance = self.tracker.summary().await;
        let slow_models: Vec<String> = performance
            .models
            .iter()
            .filter(|(_, m)| !m.target_met)
            .map(|(id, _)| id.clone())
            .collect();
        let cache = self.cache.stats().await;

        let status = if !self.coordinator.is_running() {
            HealthStatus::Stopped
        } else if !slow_models.is_empty() || cache.consecutive_store_errors > 0 {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        HealthReport {
            status,
            registered_models: self.models.len().await,
            queue_depth: self.coordinator.queue_depth().await,
            cache_store_errors: cache.store_errors,
            slow_models,
        }
    }

    /// Stops the batch coordinator. Requests still queued resolve to
    /// [`OptimizerError::ShuttingDown`]; unbatched predictions keep working.
    pub async fn shutdown(&mut self) {
        self.coordinator.shutdown().await;
        info!("inference optimizer stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use futures::future::join_all;
    use crate::cache::InMemoryStore;
    use crate::cache::mock::UnavailableStore;
    use crate::config::{BatchConfig, BatchStrategy, CacheConfig};
    use crate::predictor::mock::MockPredictor;
    use crate::quantization::QuantizationKind;
    use crate::quantization::mock::MockStrategy;

    fn optimizer_with(batching: BatchConfig, store: Arc<dyn KeyValueStore>) -> InferenceOptimizer {
        let config = OptimizerConfig {
            batching,
            ..OptimizerConfig::default()
        };
        InferenceOptimizer::new(config, store).unwrap()
    }

    fn optimizer() -> InferenceOptimizer {
        optimizer_with(BatchConfig::default(), Arc::new(InMemoryStore::new()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_round_trip_then_cache_hit() {
        let optimizer = optimizer();
        let predictor = Arc::new(MockPredictor::doubling());
        optimizer
            .register_model("m1", predictor.clone(), RegisterOptions::default())
            .await
            .unwrap();

        let first = optimizer.predict("m1", vec![3.0], PredictOptions::default()).await.unwrap();
        let second = optimizer.predict("m1", vec![3.0], PredictOptions::default()).await.unwrap();

        assert_eq!(first, vec![6.0]);
        assert_eq!(second, vec![6.0]);
        assert_eq!(predictor.calls(), 1);

        let summary = optimizer.performance_summary().await;
        let m1 = summary.model("m1").unwrap();
        assert_eq!(m1.total_predictions, 2);
        assert_eq!(m1.cache_hit_rate, 0.5);
        assert_eq!(m1.mean_batch_size, 1.0);
        assert_eq!(summary.cache.hits, 1);
        assert_eq!(summary.batching.batches_dispatched, 1);
        assert!(summary.to_json().unwrap().contains("\"m1\""));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_share_one_batch() {
        let optimizer = optimizer_with(
            BatchConfig {
                strategy: BatchStrategy::FixedSize,
                max_batch_size: 10,
                max_wait_time_ms: 5_000,
                ..BatchConfig::default()
            },
            Arc::new(InMemoryStore::new()),
        );
        let predictor = Arc::new(MockPredictor::doubling());
        optimizer
            .register_model("m1", predictor.clone(), RegisterOptions::default())
            .await
            .unwrap();

        let results = join_all(
            (0..10).map(|i| optimizer.predict("m1", vec![i as f64], PredictOptions::default())),
        )
        .await;

        for (i, result) in results.into_iter().enumerate() {
            assert_eq!(result.unwrap(), vec![i as f64 * 2.0]);
        }
        assert_eq!(predictor.batch_sizes(), vec![10]);
        let m1 = optimizer.performance_summary().await.models["m1"].clone();
        assert_eq!(m1.mean_batch_size, 10.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_batch_is_cut_when_window_closes() {
        let optimizer = optimizer_with(
            BatchConfig {
                strategy: BatchStrategy::TimeWindow,
                max_batch_size: 10,
                min_batch_size: 5,
                time_window_ms: 50,
                max_wait_time_ms: 1_000,
                ..BatchConfig::default()
            },
            Arc::new(InMemoryStore::new()),
        );
        let predictor = Arc::new(MockPredictor::doubling());
        optimizer
            .register_model("m1", predictor.clone(), RegisterOptions::default())
            .await
            .unwrap();

        let started = Instant::now();
        let (a, b) = tokio::join!(
            optimizer.predict("m1", vec![1.0], PredictOptions::default()),
            optimizer.predict("m1", vec![2.0], PredictOptions::default()),
        );

        assert_eq!(a.unwrap(), vec![2.0]);
        assert_eq!(b.unwrap(), vec![4.0]);
        assert_eq!(predictor.batch_sizes(), vec![2]);
        let waited = started.elapsed();
        assert!(waited >= Duration::from_millis(50));
        assert!(waited < Duration::from_millis(1_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_batch_fails_every_member() {
        let optimizer = optimizer_with(
            BatchConfig {
                strategy: BatchStrategy::FixedSize,
                max_batch_size: 3,
                ..BatchConfig::default()
            },
            Arc::new(InMemoryStore::new()),
        );
        let predictor = Arc::new(MockPredictor::failing("out of memory"));
        optimizer
            .register_model("m1", predictor.clone(), RegisterOptions::default())
            .await
            .unwrap();

        let results = join_all(
            (0..3).map(|i| optimizer.predict("m1", vec![i as f64], PredictOptions::default())),
        )
        .await;

        for result in results {
            assert!(matches!(
                result,
                Err(OptimizerError::Predictor { ref model, ref source }) if model == "m1" && source.message() == "out of memory"
            ));
        }
        assert_eq!(predictor.calls(), 1);
        let summary = optimizer.performance_summary().await;
        assert_eq!(summary.model("m1").unwrap().errors, 3);
        assert_eq!(summary.batching.failed_batches, 1);
        assert_eq!(summary.cache.writes, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_model_fails_fast() {
        let optimizer = optimizer();

        let result = optimizer.predict("nope", vec![1.0], PredictOptions::default()).await;

        assert_eq!(result, Err(OptimizerError::ModelNotRegistered("nope".into())));
        assert_eq!(optimizer.coordinator.stats().await.requests_dispatched, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unavailable_store_still_serves_correct_results() {
        let optimizer = optimizer_with(
            BatchConfig::default(),
            Arc::new(UnavailableStore),
        );
        let predictor = Arc::new(MockPredictor::doubling());
        optimizer
            .register_model("m1", predictor.clone(), RegisterOptions::default())
            .await
            .unwrap();

        for _ in 0..3 {
            let output = optimizer.predict("m1", vec![3.0], PredictOptions::default()).await;
            assert_eq!(output, Ok(vec![6.0]));
        }
        assert_eq!(predictor.calls(), 1);
        assert_eq!(optimizer.health().await.status, HealthStatus::Degraded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unavailable_store_without_fast_path_computes_every_time() {
        let config = OptimizerConfig {
            cache: CacheConfig {
                local_capacity: 0,
                ..CacheConfig::default()
            },
            ..OptimizerConfig::default()
        };
        let optimizer = InferenceOptimizer::new(config, Arc::new(UnavailableStore)).unwrap();
        let predictor = Arc::new(MockPredictor::doubling());
        optimizer
            .register_model("m1", predictor.clone(), RegisterOptions::default())
            .await
            .unwrap();

        for _ in 0..3 {
            let output = optimizer.predict("m1", vec![3.0], PredictOptions::default()).await;
            assert_eq!(output, Ok(vec![6.0]));
        }
        assert_eq!(predictor.calls(), 3);
        assert_eq!(optimizer.performance_summary().await.cache.store_errors, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cached_and_uncached_outputs_match() {
        let optimizer = optimizer();
        optimizer
            .register_model("m1", Arc::new(MockPredictor::scaling(0.1)), RegisterOptions::default())
            .await
            .unwrap();
        let inputs = [vec![1.0 / 3.0, 7.25], vec![-0.0], vec![1e-300, 2.5e300]];

        for input in inputs {
            let fresh = optimizer
                .predict("m1", input.clone(), PredictOptions::default().uncached())
                .await
                .unwrap();
            let filled = optimizer.predict("m1", input.clone(), PredictOptions::default()).await.unwrap();
            let cached = optimizer.predict("m1", input.clone(), PredictOptions::default()).await.unwrap();

            let bits = |v: &Output| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
            assert_eq!(bits(&fresh), bits(&filled));
            assert_eq!(bits(&fresh), bits(&cached));
        }
        assert_eq!(optimizer.performance_summary().await.cache.hits, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbatched_prediction_calls_predictor_directly() {
        let optimizer = optimizer();
        let predictor = Arc::new(MockPredictor::doubling());
        optimizer
            .register_model("m1", predictor.clone(), RegisterOptions::default())
            .await
            .unwrap();

        let output = optimizer
            .predict("m1", vec![4.0], PredictOptions::default().unbatched())
            .await;

        assert_eq!(output, Ok(vec![8.0]));
        assert_eq!(predictor.batch_sizes(), vec![1]);
        assert_eq!(optimizer.coordinator.stats().await.batches_dispatched, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reregistration_invalidates_cached_results() {
        let optimizer = optimizer();
        let first = optimizer
            .register_model("m1", Arc::new(MockPredictor::doubling()), RegisterOptions::default())
            .await
            .unwrap();
        assert_eq!(optimizer.predict("m1", vec![3.0], PredictOptions::default()).await, Ok(vec![6.0]));

        let second = optimizer
            .register_model("m1", Arc::new(MockPredictor::scaling(3.0)), RegisterOptions::default())
            .await
            .unwrap();

        assert_ne!(first.revision, second.revision);
        assert_eq!(optimizer.predict("m1", vec![3.0], PredictOptions::default()).await, Ok(vec![9.0]));
        assert_eq!(optimizer.registered_models().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pinned_revision_reuses_shared_store() {
        let store = Arc::new(InMemoryStore::new());
        let options = RegisterOptions::default().with_revision("v1");

        let before_restart = optimizer_with(BatchConfig::default(), store.clone());
        before_restart
            .register_model("m1", Arc::new(MockPredictor::doubling()), options.clone())
            .await
            .unwrap();
        assert_eq!(before_restart.predict("m1", vec![3.0], PredictOptions::default()).await, Ok(vec![6.0]));

        let after_restart = optimizer_with(BatchConfig::default(), store);
        let predictor = Arc::new(MockPredictor::doubling());
        after_restart
            .register_model("m1", predictor.clone(), options)
            .await
            .unwrap();

        assert_eq!(after_restart.predict("m1", vec![3.0], PredictOptions::default()).await, Ok(vec![6.0]));
        assert_eq!(predictor.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reregistration_under_pinned_revision_serves_new_predictor() {
        let optimizer = optimizer();
        let options = RegisterOptions::default().with_revision("v1");
        let old = Arc::new(MockPredictor::doubling());
        optimizer.register_model("m1", old.clone(), options.clone()).await.unwrap();
        assert_eq!(optimizer.predict("m1", vec![5.0], PredictOptions::default().uncached()).await, Ok(vec![10.0]));

        let new = Arc::new(MockPredictor::scaling(3.0));
        optimizer.register_model("m1", new.clone(), options).await.unwrap();

        assert_eq!(optimizer.predict("m1", vec![5.0], PredictOptions::default().uncached()).await, Ok(vec![15.0]));
        assert_eq!(old.calls(), 1);
        assert_eq!(new.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_requantization_under_pinned_revision_rekeys_cache() {
        let store = Arc::new(InMemoryStore::new());
        let optimizer = optimizer_with(BatchConfig::default(), store);
        optimizer
            .register_quantization_strategy("mock", Arc::new(MockStrategy::new(QuantizationKind::ReducedPrecision)))
            .await;
        let options = RegisterOptions::default().with_revision("v1");
        optimizer
            .register_model("m1", Arc::new(MockPredictor::doubling()), options.clone())
            .await
            .unwrap();
        optimizer.predict("m1", vec![1.0], PredictOptions::default()).await.unwrap();

        let quantized = Arc::new(MockPredictor::doubling());
        optimizer
            .register_model(
                "m1",
                quantized.clone(),
                options.with_quantization(QuantizationKind::ReducedPrecision),
            )
            .await
            .unwrap();

        assert_eq!(optimizer.predict("m1", vec![1.0], PredictOptions::default()).await, Ok(vec![2.0]));
        assert_eq!(quantized.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsupported_quantization_falls_back_to_original() {
        let optimizer = optimizer();
        let predictor = Arc::new(MockPredictor::doubling());

        let info = optimizer
            .register_model(
                "m1",
                predictor.clone(),
                RegisterOptions::default().with_quantization(QuantizationKind::MixedPrecision),
            )
            .await
            .unwrap();

        assert_eq!(info.quantization.requested, QuantizationKind::MixedPrecision);
        assert_eq!(info.quantization.applied, QuantizationKind::None);
        assert!(info.quantization.fallback_reason.is_some());
        assert_eq!(info.runtime, "mock");
        assert_eq!(optimizer.predict("m1", vec![3.0], PredictOptions::default()).await, Ok(vec![6.0]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_supported_quantization_is_applied_and_tracked() {
        let optimizer = optimizer();
        optimizer
            .register_quantization_strategy("mock", Arc::new(MockStrategy::new(QuantizationKind::ReducedPrecision)))
            .await;

        let info = optimizer
            .register_model(
                "m1",
                Arc::new(MockPredictor::doubling()),
                RegisterOptions::default().with_quantization(QuantizationKind::ReducedPrecision),
            )
            .await
            .unwrap();
        assert_eq!(info.runtime, "mock-reduced_precision");
        assert_eq!(info.quantization.compression_ratio(), Some(4.0));

        assert_eq!(optimizer.predict("m1", vec![3.0], PredictOptions::default()).await, Ok(vec![6.0]));
        let summary = optimizer.performance_summary().await;
        assert_eq!(summary.model("m1").unwrap().quantized_share, 1.0);
        assert!(summary.quantization["m1"].is_quantized());
    }

    #[tokio::test(start_paused = true)]
    async fn test_preload_warms_up_predictor() {
        let optimizer = optimizer();
        let predictor = Arc::new(MockPredictor::doubling());

        let info = optimizer
            .register_model("m1", predictor.clone(), RegisterOptions::default().preloaded())
            .await
            .unwrap();

        assert!(info.preloaded);
        assert_eq!(predictor.warm_ups(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_warm_up_still_registers() {
        let optimizer = optimizer();
        let predictor = Arc::new(MockPredictor::doubling().with_failing_warm_up());

        let info = optimizer
            .register_model("m1", predictor, RegisterOptions::default().preloaded())
            .await
            .unwrap();

        assert!(!info.preloaded);
        assert_eq!(optimizer.predict("m1", vec![1.0], PredictOptions::default()).await, Ok(vec![2.0]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_model_id_is_rejected() {
        let optimizer = optimizer();

        let result = optimizer
            .register_model("", Arc::new(MockPredictor::doubling()), RegisterOptions::default())
            .await;

        assert_eq!(result, Err(OptimizerError::Config(ConfigError::EmptyModelId)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unregister_model() {
        let optimizer = optimizer();
        optimizer
            .register_model("m1", Arc::new(MockPredictor::doubling()), RegisterOptions::default())
            .await
            .unwrap();
        optimizer.predict("m1", vec![1.0], PredictOptions::default()).await.unwrap();

        let removed = optimizer.unregister_model("m1").await.unwrap();

        assert_eq!(removed.model_id, "m1");
        assert!(optimizer.model_info("m1").await.is_none());
        assert_eq!(
            optimizer.predict("m1", vec![1.0], PredictOptions::default()).await,
            Err(OptimizerError::ModelNotRegistered("m1".into()))
        );
        assert!(optimizer.performance_summary().await.model("m1").is_none());
        assert!(optimizer.unregister_model("m1").await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_predict_many_mixes_cache_hits_and_chunks() {
        let optimizer = optimizer_with(
            BatchConfig {
                max_batch_size: 2,
                ..BatchConfig::default()
            },
            Arc::new(InMemoryStore::new()),
        );
        let predictor = Arc::new(MockPredictor::doubling());
        optimizer
            .register_model("m1", predictor.clone(), RegisterOptions::default())
            .await
            .unwrap();
        optimizer.predict("m1", vec![3.0], PredictOptions::default()).await.unwrap();

        let inputs: Vec<Features> = (1..=6).map(|i| vec![i as f64]).collect();
        let outputs = optimizer
            .predict_many("m1", inputs, PredictOptions::default())
            .await
            .unwrap();

        assert_eq!(outputs, (1..=6).map(|i| vec![i as f64 * 2.0]).collect::<Vec<_>>());
        assert_eq!(predictor.batches()[1..], [
            vec![vec![1.0], vec![2.0]],
            vec![vec![4.0], vec![5.0]],
            vec![vec![6.0]],
        ]);
        let m1 = optimizer.performance_summary().await.models["m1"].clone();
        assert_eq!(m1.total_predictions, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_predict_many_failure_fails_the_call() {
        let optimizer = optimizer();
        optimizer
            .register_model("m1", Arc::new(MockPredictor::truncating()), RegisterOptions::default())
            .await
            .unwrap();

        let result = optimizer
            .predict_many("m1", vec![vec![1.0], vec![2.0]], PredictOptions::default())
            .await;

        assert!(matches!(result, Err(OptimizerError::OutputCountMismatch { expected: 2, actual: 1, .. })));
        assert_eq!(optimizer.performance_summary().await.model("m1").unwrap().errors, 2);
        assert_eq!(optimizer.predict_many("m1", vec![], PredictOptions::default()).await, Ok(vec![]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_predict_many_counts_only_the_failed_chunk() {
        let optimizer = optimizer_with(
            BatchConfig {
                max_batch_size: 2,
                ..BatchConfig::default()
            },
            Arc::new(InMemoryStore::new()),
        );
        let predictor = Arc::new(MockPredictor::failing_after(1, "model exploded"));
        optimizer
            .register_model("m1", predictor.clone(), RegisterOptions::default())
            .await
            .unwrap();

        let inputs: Vec<Features> = (1..=3).map(|i| vec![i as f64]).collect();
        let result = optimizer.predict_many("m1", inputs, PredictOptions::default()).await;

        assert!(matches!(result, Err(OptimizerError::Predictor { .. })));
        let m1 = optimizer.performance_summary().await.models["m1"].clone();
        assert_eq!(m1.errors, 1);
        assert_eq!(m1.total_predictions, 2);
        // The completed chunk was cached
        assert_eq!(optimizer.predict("m1", vec![2.0], PredictOptions::default()).await, Ok(vec![4.0]));
        assert_eq!(predictor.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_health_and_shutdown() {
        let mut optimizer = optimizer();
        optimizer
            .register_model("m1", Arc::new(MockPredictor::doubling()), RegisterOptions::default())
            .await
            .unwrap();
        optimizer.predict("m1", vec![1.0], PredictOptions::default()).await.unwrap();

        let health = optimizer.health().await;
        assert_eq!(health.status, HealthStatus::Healthy);
        assert_eq!(health.registered_models, 1);
        assert!(health.slow_models.is_empty());

        optimizer.shutdown().await;

        assert_eq!(optimizer.health().await.status, HealthStatus::Stopped);
        assert_eq!(
            optimizer.predict("m1", vec![2.0], PredictOptions::default()).await,
            Err(OptimizerError::ShuttingDown)
        );
        assert_eq!(
            optimizer.predict("m1", vec![2.0], PredictOptions::default().unbatched()).await,
            Ok(vec![4.0])
        );
    }
}
