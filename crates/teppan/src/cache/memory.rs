use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::error::StoreError;
use super::store::KeyValueStore;

/// A process-local [`KeyValueStore`] with TTL expiry.
///
/// Suitable for single-process deployments and tests. Expired entries are
/// hidden from reads immediately and reclaimed by [`purge_expired`](Self::purge_expired)
/// or when overwritten.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, (Vec<u8>, Instant)>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Drops every expired entry and returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, (_, expires_at)| *expires_at > now);
        before - entries.len()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|(_, expires_at)| *expires_at > Instant::now())
            .map(|(value, _)| value.clone()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), StoreError> {
        let expires_at = Instant::now() + ttl;
        self.entries
            .write()
            .await
            .insert(key.to_string(), (value, expires_at));
        Ok(())
    }
}
