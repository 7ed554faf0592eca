use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::model::ModelHandle;
use crate::quantization::QuantizationProfile;

/// A model as registered with the optimizer. Immutable once created.
#[derive(Debug)]
pub struct RegisteredModel {
    pub(crate) handle: ModelHandle,
    pub(crate) profile: QuantizationProfile,
    pub(crate) registered_at: DateTime<Utc>,
    pub(crate) preloaded: bool,
}

impl RegisteredModel {
    pub fn handle(&self) -> &ModelHandle {
        &self.handle
    }

    pub fn profile(&self) -> &QuantizationProfile {
        &self.profile
    }

    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            model_id: self.handle.id().to_string(),
            revision: self.handle.revision().revision().to_string(),
            runtime: self.handle.predictor().runtime().to_string(),
            quantization: self.profile.clone(),
            registered_at: self.registered_at,
            preloaded: self.preloaded,
        }
    }
}

/// Read-only view of a registration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub model_id: String,
    pub revision: String,
    pub runtime: String,
    pub quantization: QuantizationProfile,
    pub registered_at: DateTime<Utc>,
    pub preloaded: bool,
}

#[derive(Default)]
pub(crate) struct ModelRegistry {
    models: RwLock<HashMap<String, Arc<RegisteredModel>>>,
}

impl ModelRegistry {
    pub async fn get(&self, model_id: &str) -> Option<Arc<RegisteredModel>> {
        self.models.read().await.get(model_id).cloned()
    }

    /// Stores `model`, returning the registration it replaced.
    pub async fn insert(&self, model: RegisteredModel) -> Option<Arc<RegisteredModel>> {
        let id = model.handle.id().to_string();
        self.models.write().await.insert(id, Arc::new(model))
    }

    pub async fn remove(&self, model_id: &str) -> Option<Arc<RegisteredModel>> {
        self.models.write().await.remove(model_id)
    }

    pub async fn all(&self) -> Vec<Arc<RegisteredModel>> {
        let mut models: Vec<_> = self.models.read().await.values().cloned().collect();
        models.sort_by(|a, b| a.handle.id().cmp(b.handle.id()));
        models
    }

    pub async fn len(&self) -> usize {
        self.models.read().await.len()
    }
}
