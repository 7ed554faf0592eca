//! Wire format of a cached result.
//!
//! `[tag][payload]`, where the tag says whether the JSON payload is gzipped.

use std::io::{Read, Write};

use chrono::{DateTime, Duration, Utc};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::predictor::Output;

const TAG_RAW: u8 = 0;
const TAG_GZIP: u8 = 1;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("output contains non-finite values")]
    NonFinite,

    #[error("empty payload")]
    Empty,

    #[error("unknown frame tag {0}")]
    UnknownTag(u8),

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("decompression failed: {0}")]
    Decompress(#[from] std::io::Error),
}

/// A stored prediction with the metadata needed to validate it on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub model_id: String,
    pub output: Output,
    pub inserted_at: DateTime<Utc>,
    pub ttl_secs: u64,
}

impl CacheEntry {
    pub fn new(model_id: &str, output: Output, ttl_secs: u64) -> Self {
        Self {
            model_id: model_id.to_string(),
            output,
            inserted_at: Utc::now(),
            ttl_secs,
        }
    }

    pub fn with_inserted_at(mut self, inserted_at: DateTime<Utc>) -> Self {
        self.inserted_at = inserted_at;
        self
    }

    /// Time left before the entry expires, or `None` once it has.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<std::time::Duration> {
        let expires_at = i64::try_from(self.ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|ttl| self.inserted_at.checked_add_signed(ttl));
        match expires_at {
            Some(expires_at) if now >= expires_at => None,
            Some(expires_at) => (expires_at - now).to_std().ok(),
            // Unrepresentable expiry, effectively never
            None => Some(std::time::Duration::from_secs(self.ttl_secs)),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.remaining(now).is_none()
    }
}

/// Encoded bytes plus the size before compression.
#[derive(Debug)]
pub struct Encoded {
    pub bytes: Vec<u8>,
    pub raw_len: usize,
}

impl Encoded {
    pub fn is_compressed(&self) -> bool {
        self.bytes.first() == Some(&TAG_GZIP)
    }
}

/// Serializes `entry`, gzipping payloads of at least `threshold` bytes.
///
/// Compression is only kept when it shrinks the payload, and a compression
/// failure falls back to the raw payload.
pub fn encode(entry: &CacheEntry, threshold: usize) -> Result<Encoded, CodecError> {
    if !entry.output.iter().all(|v| v.is_finite()) {
        return Err(CodecError::NonFinite);
    }
    let json = serde_json::to_vec(entry)?;
    let raw_len = json.len();

    if raw_len >= threshold {
        match gzip(&json) {
            Ok(compressed) if compressed.len() < raw_len => {
                return Ok(Encoded {
                    bytes: framed(TAG_GZIP, &compressed),
                    raw_len,
                });
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "compression failed, storing raw payload"),
        }
    }

    Ok(Encoded {
        bytes: framed(TAG_RAW, &json),
        raw_len,
    })
}

pub fn decode(bytes: &[u8]) -> Result<CacheEntry, CodecError> {
    let (tag, payload) = bytes.split_first().ok_or(CodecError::Empty)?;
    match *tag {
        TAG_RAW => Ok(serde_json::from_slice(payload)?),
        TAG_GZIP => {
            let mut json = vec![];
            GzDecoder::new(payload).read_to_end(&mut json)?;
            Ok(serde_json::from_slice(&json)?)
        }
        other => Err(CodecError::UnknownTag(other)),
    }
}

fn gzip(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), Compression::fast());
    encoder.write_all(data)?;
    encoder.finish()
}

fn framed(tag: u8, payload: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(payload.len() + 1);
    bytes.push(tag);
    bytes.extend_from_slice(payload);
    bytes
}
