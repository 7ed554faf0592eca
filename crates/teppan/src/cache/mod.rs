//! # Result cache
//!
//! Prediction results are cached under a digest of the model revision and the
//! exact input vector. Entries are serialized, gzipped once they pass a size
//! threshold, and written to a [`KeyValueStore`] with a TTL. A small
//! in-process fast path sits in front of the store.
//!
//! The cache never fails a prediction: an unreachable store, a corrupt entry
//! or an unencodable result all degrade to a miss or a skipped write.

mod codec;
mod key;
mod local;
mod memory;
mod result_cache;
mod store;
#[cfg(test)]
pub(crate) mod mock;

pub use codec::{CacheEntry, CodecError};
pub use key::{KEY_PREFIX, cache_key};
pub use memory::InMemoryStore;
pub use result_cache::{CacheStats, ResultCache};
pub use store::KeyValueStore;
