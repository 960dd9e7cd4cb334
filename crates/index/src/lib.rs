//! # Candidate index
//!
//! A banded locality-sensitive hashing index over MinHash signatures.
//!
//! Each signature of `num_perm` slots is cut into `bands` contiguous bands of
//! `rows_per_band` slots. Every band is hashed into a per-band bucket map, so
//! a lookup touches exactly `bands` buckets regardless of how many entries
//! the index holds. Two signatures are *candidates* when at least one band
//! hashes to the same bucket.
//!
//! Alongside the buckets the index keeps every inserted signature, which lets
//! callers confirm a bucket collision with the full-signature agreement
//! ([`BandedIndex::similar`]) instead of trusting one band.
//!
//! ## Example Usage
//!
//! ```
//! use index::{BandedIndex, LshParams};
//! use perceptual::{extract_shingles, sketch, PerceptualConfig};
//!
//! let cfg = PerceptualConfig::default();
//! let sig = |t: &str| sketch(&extract_shingles(t, cfg.k), &cfg);
//!
//! let mut index = BandedIndex::new(LshParams::default()).unwrap();
//! index.insert("doc-1", sig("the quick brown fox jumps over the lazy dog")).unwrap();
//!
//! assert!(index.query(&sig("the quick brown fox jumps over the lazy dog")));
//! assert!(!index.query(&sig("an entirely unrelated sentence about tax law")));
//! ```

use thiserror::Error;

mod banded;
mod params;

pub use banded::{BandedIndex, SimilarMatch};
pub use params::LshParams;

/// Errors raised for banding parameters that cannot tile a signature.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum IndexError {
    #[error("bands ({bands}) x rows ({rows}) must equal num_perm ({num_perm})")]
    BandingMismatch {
        bands: usize,
        rows: usize,
        num_perm: usize,
    },
    #[error("bands and rows must be >= 1 (got bands={bands}, rows={rows})")]
    EmptyBanding { bands: usize, rows: usize },
    #[error("similarity threshold must lie in (0, 1) (got {threshold})")]
    InvalidThreshold { threshold: f64 },
    #[error("signature has {actual} slots, index expects {expected}")]
    SignatureLength { expected: usize, actual: usize },
}
