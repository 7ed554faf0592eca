//! Identity of a registered model as seen by the batching and caching layers.

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::predictor::Predictor;

/// A model identifier paired with the revision minted when it was registered.
///
/// Two registrations of the same identifier never share a revision unless the
/// caller pins one explicitly, so cache keys built from a `ModelRevision`
/// never mix results across re-registrations. The variant names the serving
/// form of the model (runtime and applied quantization), so a pinned revision
/// served in a different form is still keyed apart.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelRevision {
    id: Arc<str>,
    revision: Arc<str>,
    variant: Arc<str>,
}

impl ModelRevision {
    pub fn new(id: impl Into<Arc<str>>, revision: impl Into<Arc<str>>) -> Self {
        Self {
            id: id.into(),
            revision: revision.into(),
            variant: Arc::from(""),
        }
    }

    pub fn with_variant(mut self, variant: impl Into<Arc<str>>) -> Self {
        self.variant = variant.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn revision(&self) -> &str {
        &self.revision
    }

    pub fn variant(&self) -> &str {
        &self.variant
    }
}

impl fmt::Display for ModelRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.revision)
    }
}

/// Everything the coordinator needs to dispatch work for one model.
///
/// Every handle gets its own registration token. Clones share it, so the
/// coordinator can group requests by registration even when two
/// registrations pin the same revision.
#[derive(Clone)]
pub struct ModelHandle {
    revision: ModelRevision,
    registration: Uuid,
    predictor: Arc<dyn Predictor>,
}

impl ModelHandle {
    pub fn new(revision: ModelRevision, predictor: Arc<dyn Predictor>) -> Self {
        Self {
            revision,
            registration: Uuid::new_v4(),
            predictor,
        }
    }

    pub fn registration(&self) -> Uuid {
        self.registration
    }

    pub fn revision(&self) -> &ModelRevision {
        &self.revision
    }

    pub fn id(&self) -> &str {
        self.revision.id()
    }

    pub fn predictor(&self) -> &Arc<dyn Predictor> {
        &self.predictor
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("revision", &self.revision)
            .field("registration", &self.registration)
            .field("runtime", &self.predictor.runtime())
            .finish()
    }
}
