//! Single-pass greedy near-duplicate removal.
//!
//! Documents are judged in the order they are offered. For each one:
//!
//! 1. fewer than `min_words` words: dropped, never indexed;
//! 2. otherwise its word-trigram set is sketched;
//! 3. a candidate-index hit drops it as a near duplicate of the earlier
//!    document (first seen wins);
//! 4. a miss inserts it into the index and keeps it.
//!
//! `threshold` is the similarity at which two documents count as near
//! duplicates. The index banding is derived from it with
//! [`LshParams::for_threshold`] unless `lsh` pins one explicitly, and with
//! `verify_candidates` on a bucket hit only counts when the full signature
//! agreement with some candidate reaches it.
//!
//! Sketching is pure and may run on worker threads ([`Deduplicator::prepare`]);
//! only [`Deduplicator::admit`] touches the index and must see documents in
//! the run's recorded order.

use index::{BandedIndex, IndexError, LshParams};
use perceptual::{extract_shingles, sketch, PerceptualConfig, Signature};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ConfigLoadError;
use crate::PipelineError;

/// Minimum word count for a document to be considered at all.
pub const DEFAULT_MIN_WORDS: usize = 10;

/// Shingle-set similarity at which two documents are near duplicates.
pub const DEFAULT_THRESHOLD: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    pub min_words: usize,
    /// Similarity at or above which a later document is a near duplicate.
    pub threshold: f64,
    /// Confirm bucket hits against the full cached signature.
    pub verify_candidates: bool,
    pub perceptual: PerceptualConfig,
    /// Explicit banding. When absent it is searched for from `threshold`.
    pub lsh: Option<LshParams>,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            min_words: DEFAULT_MIN_WORDS,
            threshold: DEFAULT_THRESHOLD,
            verify_candidates: true,
            perceptual: PerceptualConfig::default(),
            lsh: None,
        }
    }
}

impl DedupConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.perceptual.validate()?;
        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(ConfigLoadError::Validation(format!(
                "dedup.threshold must lie in (0, 1) (got {})",
                self.threshold
            ))
            .into());
        }
        let lsh = self.lsh_params()?;
        lsh.validate()?;
        if lsh.num_perm != self.perceptual.num_perm {
            return Err(ConfigLoadError::Validation(format!(
                "dedup.lsh.num_perm ({}) must equal dedup.perceptual.num_perm ({})",
                lsh.num_perm, self.perceptual.num_perm
            ))
            .into());
        }
        Ok(())
    }

    /// The banding the index will use: `lsh` if set, otherwise the divisor
    /// pair of `num_perm` that best separates pairs around `threshold`.
    pub fn lsh_params(&self) -> Result<LshParams, IndexError> {
        match self.lsh {
            Some(params) => Ok(params),
            None => LshParams::for_threshold(self.threshold, self.perceptual.num_perm),
        }
    }
}

/// The pure, parallelisable half of the dedup decision.
#[derive(Debug, Clone, PartialEq)]
pub struct DedupInput {
    pub words: usize,
    /// `None` when the document is too short to be sketched.
    pub signature: Option<Signature>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DedupOutcome {
    Unique,
    TooShort {
        words: usize,
    },
    NearDuplicate {
        /// Id of the earlier, retained document.
        of: String,
        /// Full-signature agreement, when candidates were verified.
        similarity: Option<f64>,
    },
}

impl DedupOutcome {
    pub fn is_kept(&self) -> bool {
        matches!(self, DedupOutcome::Unique)
    }
}

/// Dedup state for one run. Never shared between runs.
#[derive(Debug, Clone)]
pub struct Deduplicator {
    config: DedupConfig,
    index: BandedIndex<String>,
}

impl Deduplicator {
    pub fn new(config: DedupConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let lsh = config.lsh_params()?;
        debug!(
            threshold = config.threshold,
            bands = lsh.bands,
            rows_per_band = lsh.rows_per_band,
            "dedup_banding"
        );
        let index = BandedIndex::new(lsh)?;
        Ok(Self { config, index })
    }

    pub fn config(&self) -> &DedupConfig {
        &self.config
    }

    /// Number of documents retained so far.
    pub fn retained(&self) -> usize {
        self.index.len()
    }

    /// Count words and, if there are enough, sketch the text.
    pub fn prepare(&self, text: &str) -> DedupInput {
        let words = canonical::word_count(text);
        let signature = (words >= self.config.min_words).then(|| {
            let shingles = extract_shingles(text, self.config.perceptual.k);
            sketch(&shingles, &self.config.perceptual)
        });
        DedupInput { words, signature }
    }

    /// Decide on a prepared document and index it if it is kept.
    ///
    /// Fails only for a signature sketched under a different `num_perm`.
    pub fn admit(&mut self, id: &str, input: DedupInput) -> Result<DedupOutcome, PipelineError> {
        let Some(signature) = input.signature else {
            debug!(id, words = input.words, "dedup_too_short");
            return Ok(DedupOutcome::TooShort { words: input.words });
        };

        let duplicate = if self.config.verify_candidates {
            self.index
                .similar(&signature, self.config.threshold)
                .map(|hit| (hit.key.clone(), Some(hit.similarity)))
        } else {
            self.index
                .first_candidate(&signature)
                .map(|key| (key.clone(), None))
        };

        match duplicate {
            Some((of, similarity)) => {
                debug!(id, of = %of, ?similarity, "dedup_near_duplicate");
                Ok(DedupOutcome::NearDuplicate { of, similarity })
            }
            None => {
                self.index.insert(id.to_string(), signature)?;
                Ok(DedupOutcome::Unique)
            }
        }
    }

    /// [`prepare`](Self::prepare) and [`admit`](Self::admit) in one step.
    pub fn check(&mut self, id: &str, text: &str) -> Result<DedupOutcome, PipelineError> {
        let input = self.prepare(text);
        self.admit(id, input)
    }
}
