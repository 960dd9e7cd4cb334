//! Configuration and error types for shingling and MinHash sketching.
//!
//! The sketch is a pure function of `(text, config)`: two configs that agree
//! on every field produce bit-identical signatures for the same text.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shingle width used by the corpus cleaner (word trigrams).
pub const DEFAULT_SHINGLE_WORDS: usize = 3;

/// Number of MinHash slots in every signature.
pub const DEFAULT_NUM_PERM: usize = 128;

/// Parameters of the shingle extractor and the MinHash sketch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PerceptualConfig {
    /// Configuration schema version.
    ///
    /// Any change that can alter a signature must bump this value so
    /// signatures produced under different versions are never compared.
    pub version: u32,
    /// Number of words per shingle.
    pub k: usize,
    /// Number of hash functions, i.e. the signature length.
    pub num_perm: usize,
    /// Seed of the hash family.
    pub seed: u64,
    /// Compute signature slots on the rayon pool.
    pub use_parallel: bool,
}

impl PerceptualConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shingle width in words.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Set the number of hash functions (signature length).
    pub fn with_num_perm(mut self, num_perm: usize) -> Self {
        self.num_perm = num_perm;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Enable or disable parallel slot computation.
    /// Output is identical either way.
    pub fn with_parallel(mut self, use_parallel: bool) -> Self {
        self.use_parallel = use_parallel;
        self
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), PerceptualError> {
        if self.version < 1 {
            return Err(PerceptualError::InvalidConfigVersion {
                version: self.version,
            });
        }
        if self.k < 1 {
            return Err(PerceptualError::InvalidConfigK { k: self.k });
        }
        if self.num_perm < 1 {
            return Err(PerceptualError::InvalidConfigPermutations {
                num_perm: self.num_perm,
            });
        }
        Ok(())
    }
}

impl Default for PerceptualConfig {
    fn default() -> Self {
        Self {
            version: 1,
            k: DEFAULT_SHINGLE_WORDS,
            num_perm: DEFAULT_NUM_PERM,
            seed: 0xF00D_BAAD_F00D_BAAD,
            use_parallel: false,
        }
    }
}

/// Errors returned for an unusable perceptual configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PerceptualError {
    #[error("invalid config: k must be >= 1 (got {k})")]
    InvalidConfigK { k: usize },

    #[error("invalid config: num_perm must be >= 1 (got {num_perm})")]
    InvalidConfigPermutations { num_perm: usize },

    #[error("invalid config version {version}; expected >= 1")]
    InvalidConfigVersion { version: u32 },
}
