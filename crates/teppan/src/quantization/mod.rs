//! # Quantization
//!
//! Bookkeeping around precision-reduced predictors. The numeric transform
//! itself is supplied by the caller as a [`QuantizationStrategy`] and selected
//! through a [`QuantizationRegistry`] keyed by the predictor's runtime name.
//!
//! Quantization is never required for correctness: a model whose runtime has
//! no matching strategy, or whose strategy fails, is registered unmodified and
//! its [`QuantizationProfile`] records why.

mod core_trait;
mod profile;
mod registry;
#[cfg(test)]
pub(crate) mod mock;

pub use core_trait::*;
pub use profile::QuantizationProfile;
pub use registry::QuantizationRegistry;
