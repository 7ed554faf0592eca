use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;

/// The key-value store backing the result cache.
///
/// Implementations enforce TTL expiry. The cache treats every error as
/// best-effort: a failed `get` is a miss and a failed `set` is logged and
/// dropped, so an unavailable store only costs latency.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the bytes stored under `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Stores `value` under `key` for `ttl`, replacing any previous value.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), StoreError>;
}
