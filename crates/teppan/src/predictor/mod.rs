//! # Predictor
//!
//! The model itself is opaque to this crate. Anything that can turn a batch of
//! feature vectors into a batch of outputs implements [`Predictor`] and can be
//! registered with the optimizer, whatever numeric runtime backs it.
//!
//! The only contract the batching layer relies on is positional: the output
//! at index `i` belongs to the input at index `i`, and the output count equals
//! the input count. Violations are detected by the dispatcher and fail the
//! whole batch.

mod core_trait;

pub use core_trait::*;

#[cfg(test)]
/// Test doubles.
///
/// Deterministic predictors that record the batches they see.
pub(crate) mod mock;
