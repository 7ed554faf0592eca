use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::CacheConfig;
use crate::model::ModelRevision;
use crate::predictor::Output;
use super::codec::{self, CacheEntry};
use super::key::cache_key;
use super::local::LocalCache;
use super::store::KeyValueStore;

#[derive(Debug, Default)]
struct CacheCounters {
    hits: AtomicU64,
    local_hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    skipped_writes: AtomicU64,
    store_errors: AtomicU64,
    consecutive_store_errors: AtomicU64,
    decode_errors: AtomicU64,
    bytes_raw: AtomicU64,
    bytes_stored: AtomicU64,
}

/// Cache statistics for observability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    /// Hits served by the in-process fast path, included in `hits`.
    pub local_hits: u64,
    pub misses: u64,
    pub writes: u64,
    /// Results that could not be cached, e.g. non-finite outputs.
    pub skipped_writes: u64,
    pub store_errors: u64,
    /// Store failures since the last successful store call.
    pub consecutive_store_errors: u64,
    pub decode_errors: u64,
    pub local_entries: usize,
    /// Serialized bytes before and after compression, over all writes.
    pub bytes_raw: u64,
    pub bytes_stored: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

/// Wall-clock time advanced by the Tokio clock.
///
/// Entry timestamps and the store's TTLs then move together, including under
/// a paused test clock.
struct CacheClock {
    origin: DateTime<Utc>,
    started: Instant,
}

impl CacheClock {
    fn new() -> Self {
        Self {
            origin: Utc::now(),
            started: Instant::now(),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        chrono::Duration::from_std(self.started.elapsed())
            .ok()
            .and_then(|elapsed| self.origin.checked_add_signed(elapsed))
            .unwrap_or_else(Utc::now)
    }
}

/// Compressed, TTL-bounded cache of prediction results.
///
/// Caching is an optimization only: every store failure degrades to a miss
/// (on read) or a logged no-op (on write), never to an error for the caller.
pub struct ResultCache {
    store: Arc<dyn KeyValueStore>,
    local: Mutex<LocalCache>,
    config: CacheConfig,
    counters: CacheCounters,
    clock: CacheClock,
}

impl ResultCache {
    pub fn new(store: Arc<dyn KeyValueStore>, config: CacheConfig) -> Self {
        Self {
            store,
            local: Mutex::new(LocalCache::new(config.local_capacity)),
            config,
            counters: CacheCounters::default(),
            clock: CacheClock::new(),
        }
    }

    /// Looks up the result for `input` under `model`.
    ///
    /// Absent, expired, undecodable and unreachable entries are all misses.
    pub async fn get(&self, model: &ModelRevision, input: &[f64]) -> Option<Output> {
        let key = cache_key(model, input);

        if let Some(output) = self.local.lock().await.get(&key) {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            self.counters.local_hits.fetch_add(1, Ordering::Relaxed);
            return Some(output);
        }

        let found = self.store.get(&key).await;
        self.track_store(found.is_ok());
        match found {
            Ok(Some(bytes)) => match codec::decode(&bytes) {
                Ok(entry) if entry.model_id == model.id() => match entry.remaining(self.clock.now()) {
                    Some(left) => {
                        self.counters.hits.fetch_add(1, Ordering::Relaxed);
                        // The local copy must not outlive the stored entry
                        self.local.lock().await.insert(
                            key,
                            model.id(),
                            entry.output.clone(),
                            left.min(self.config.ttl()),
                        );
                        return Some(entry.output);
                    }
                    None => debug!(model = %model, "ignoring expired cache entry"),
                },
                Ok(_) => debug!(model = %model, "ignoring cache entry written for another model"),
                Err(e) => {
                    self.counters.decode_errors.fetch_add(1, Ordering::Relaxed);
                    warn!(model = %model, error = %e, "undecodable cache entry, treating as miss");
                }
            },
            Ok(None) => {}
            Err(e) => {
                warn!(model = %model, error = %e, "cache lookup failed, treating as miss");
            }
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Stores `output` for `input` under `model` with the configured TTL.
    pub async fn set(&self, model: &ModelRevision, input: &[f64], output: &Output) {
        let entry =
            CacheEntry::new(model.id(), output.clone(), self.config.ttl_secs).with_inserted_at(self.clock.now());
        let encoded = match codec::encode(&entry, self.config.compression_threshold_bytes) {
            Ok(encoded) => encoded,
            Err(e) => {
                self.counters.skipped_writes.fetch_add(1, Ordering::Relaxed);
                debug!(model = %model, error = %e, "result not cacheable");
                return;
            }
        };

        let key = cache_key(model, input);
        self.local
            .lock()
            .await
            .insert(key.clone(), model.id(), entry.output, self.config.ttl());

        let raw_len = encoded.raw_len as u64;
        let stored_len = encoded.bytes.len() as u64;
        let written = self.store.set(&key, encoded.bytes, self.config.ttl()).await;
        self.track_store(written.is_ok());
        match written {
            Ok(()) => {
                self.counters.writes.fetch_add(1, Ordering::Relaxed);
                self.counters.bytes_raw.fetch_add(raw_len, Ordering::Relaxed);
                self.counters.bytes_stored.fetch_add(stored_len, Ordering::Relaxed);
            }
            Err(e) => {
                warn!(model = %model, error = %e, "cache write failed, ignoring");
            }
        }
    }

    fn track_store(&self, succeeded: bool) {
        if succeeded {
            self.counters.consecutive_store_errors.store(0, Ordering::Relaxed);
        } else {
            self.counters.store_errors.fetch_add(1, Ordering::Relaxed);
            self.counters.consecutive_store_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Drops fast-path entries for `model_id`.
    ///
    /// Entries in the backing store are not deleted; they become unreachable
    /// once the model is registered under a new revision.
    pub async fn invalidate_model(&self, model_id: &str) -> usize {
        self.local.lock().await.invalidate_model(model_id)
    }

    pub async fn stats(&self) -> CacheStats {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        CacheStats {
            hits: load(&self.counters.hits),
            local_hits: load(&self.counters.local_hits),
            misses: load(&self.counters.misses),
            writes: load(&self.counters.writes),
            skipped_writes: load(&self.counters.skipped_writes),
            store_errors: load(&self.counters.store_errors),
            consecutive_store_errors: load(&self.counters.consecutive_store_errors),
            decode_errors: load(&self.counters.decode_errors),
            local_entries: self.local.lock().await.len(),
            bytes_raw: load(&self.counters.bytes_raw),
            bytes_stored: load(&self.counters.bytes_stored),
        }
    }
}
