//! # Perceptual sketches for corpus deduplication
//!
//! This crate turns document text into a compact, similarity-preserving
//! MinHash signature. Two documents whose word-trigram sets overlap heavily
//! get signatures that agree on a proportionally large number of slots.
//!
//! ## Contract
//!
//! - The API is a pure function of `(text, config)`: no I/O, no clocks, no
//!   global state.
//! - For the same text and the same [`PerceptualConfig`] the signature is
//!   bit-identical, whether or not slots are computed in parallel.
//!
//! ## Pipeline
//!
//! 1.  **Shingling**: text is lower-cased, split on whitespace and turned
//!     into the set of contiguous `k`-word windows ([`extract_shingles`]).
//! 2.  **MinHashing**: each of `num_perm` seeded hash functions contributes
//!     the minimum hash over the set ([`sketch`]). An empty set sketches to
//!     `u64::MAX` in every slot.
//!
//! ## Example Usage
//!
//! ```
//! use perceptual::{extract_shingles, sketch, PerceptualConfig};
//!
//! let cfg = PerceptualConfig::default();
//! let a = sketch(&extract_shingles("the cat sat on the mat today", cfg.k), &cfg);
//! let b = sketch(&extract_shingles("The cat sat on the mat today", cfg.k), &cfg);
//!
//! assert_eq!(a.len(), 128);
//! assert_eq!(a.estimate_similarity(&b), 1.0);
//! ```
pub mod config;
mod minhash;
mod shingles;
mod signature;

pub use crate::config::{
    PerceptualConfig, PerceptualError, DEFAULT_NUM_PERM, DEFAULT_SHINGLE_WORDS,
};
pub use crate::minhash::sketch;
pub use crate::shingles::{extract_shingles, jaccard, ShingleSet};
pub use crate::signature::Signature;

/// Validate `cfg`, then shingle and sketch `text` in one call.
pub fn sketch_text(text: &str, cfg: &PerceptualConfig) -> Result<Signature, PerceptualError> {
    cfg.validate()?;
    Ok(sketch(&extract_shingles(text, cfg.k), cfg))
}
