use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use tokio::time::Instant;

use crate::predictor::Output;

struct LocalEntry {
    model_id: String,
    output: Output,
    expires_at: Instant,
}

/// In-process fast path holding the most recently written results.
///
/// Bounded by insertion order: once full, the oldest write is evicted. It is
/// consulted before the backing store and keeps serving when the store is down.
pub struct LocalCache {
    capacity: usize,
    entries: HashMap<String, LocalEntry>,
    order: VecDeque<String>,
}

impl LocalCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&mut self, key: &str) -> Option<Output> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => return Some(entry.output.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.remove(key);
        }
        None
    }

    pub fn insert(&mut self, key: String, model_id: &str, output: Output, ttl: Duration) {
        if self.capacity == 0 {
            return;
        }
        let Some(expires_at) = Instant::now().checked_add(ttl) else {
            return;
        };
        if self.entries.contains_key(&key) {
            self.order.retain(|k| k != &key);
        }
        self.order.push_back(key.clone());
        self.entries.insert(
            key,
            LocalEntry {
                model_id: model_id.to_string(),
                output,
                expires_at,
            },
        );

        while self.entries.len() > self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }

    /// Drops every entry written for `model_id`.
    pub fn invalidate_model(&mut self, model_id: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.model_id != model_id);
        let entries = &self.entries;
        self.order.retain(|k| entries.contains_key(k));
        before - self.entries.len()
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
        self.order.retain(|k| k != key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test(start_paused = true)]
    async fn test_oldest_write_is_evicted() {
        let mut cache = LocalCache::new(2);
        cache.insert("a".into(), "m1", vec![1.0], TTL);
        cache.insert("b".into(), "m1", vec![2.0], TTL);
        cache.insert("c".into(), "m1", vec![3.0], TTL);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(vec![2.0]));
        assert_eq!(cache.get("c"), Some(vec![3.0]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rewrite_refreshes_position() {
        let mut cache = LocalCache::new(2);
        cache.insert("a".into(), "m1", vec![1.0], TTL);
        cache.insert("b".into(), "m1", vec![2.0], TTL);
        cache.insert("a".into(), "m1", vec![1.5], TTL);
        cache.insert("c".into(), "m1", vec![3.0], TTL);

        assert_eq!(cache.get("a"), Some(vec![1.5]));
        assert_eq!(cache.get("b"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entries_are_misses() {
        let mut cache = LocalCache::new(4);
        cache.insert("a".into(), "m1", vec![1.0], Duration::from_secs(1));

        tokio::time::advance(Duration::from_secs(1)).await;

        assert_eq!(cache.get("a"), None);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_model() {
        let mut cache = LocalCache::new(4);
        cache.insert("a".into(), "m1", vec![1.0], TTL);
        cache.insert("b".into(), "m2", vec![2.0], TTL);

        assert_eq!(cache.invalidate_model("m1"), 1);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(vec![2.0]));
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let mut cache = LocalCache::new(0);
        cache.insert("a".into(), "m1", vec![1.0], TTL);
        assert!(cache.is_empty());
    }
}
