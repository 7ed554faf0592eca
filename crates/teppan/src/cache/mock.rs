use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;
use super::KeyValueStore;

// A store that is never reachable
pub(crate) struct UnavailableStore;

#[async_trait]
impl KeyValueStore for UnavailableStore {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}
