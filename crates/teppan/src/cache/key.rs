//! Deterministic cache keys over floating-point inputs.

use sha2::{Digest, Sha256};

use crate::model::ModelRevision;

/// Prefix shared by every result key; bump the version if the encoding changes.
pub const KEY_PREFIX: &str = "teppan:result:v2:";

/// Derives the store key for `input` under `model`.
///
/// The key is a SHA-256 digest over a canonical byte encoding, so it does not
/// depend on process, platform or insertion order:
/// * model id, revision and serving variant, each length-prefixed
/// * the feature count
/// * each feature as little-endian IEEE-754 bits, with `-0.0` folded into
///   `+0.0` and every NaN folded into one NaN
pub fn cache_key(model: &ModelRevision, input: &[f64]) -> String {
    let mut hasher = Sha256::new();
    write_field(&mut hasher, model.id().as_bytes());
    write_field(&mut hasher, model.revision().as_bytes());
    write_field(&mut hasher, model.variant().as_bytes());
    hasher.update((input.len() as u64).to_le_bytes());
    for value in input {
        hasher.update(canonical_bits(*value).to_le_bytes());
    }
    format!("{KEY_PREFIX}{:x}", hasher.finalize())
}

fn write_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

fn canonical_bits(value: f64) -> u64 {
    if value.is_nan() {
        f64::NAN.to_bits()
    } else if value == 0.0 {
        0
    } else {
        value.to_bits()
    }
}
