//! Word n-gram repetition scoring.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::FilterConfigError;

pub const DEFAULT_NGRAM: usize = 4;
pub const DEFAULT_THRESHOLD: f64 = 0.3;

/// Share of word `n`-grams that repeat an earlier one: `1 - unique / total`.
///
/// Text with fewer than `n` words scores 0. A text made of one word repeated
/// scores `1 - 1/(words - n + 1)`; a text with no repeated `n`-gram scores 0.
///
/// ```rust
/// use filters::repetition_ratio;
///
/// let spam = vec!["run"; 10].join(" ");
/// assert!((repetition_ratio(&spam, 4) - 6.0 / 7.0).abs() < 1e-12);
/// assert_eq!(repetition_ratio("every word here differs from the rest", 4), 0.0);
/// ```
pub fn repetition_ratio(text: &str, n: usize) -> f64 {
    let words: Vec<&str> = text.split_whitespace().collect();
    if n == 0 || words.len() < n {
        return 0.0;
    }
    let total = words.len() - n + 1;
    let unique: HashSet<&[&str]> = words.windows(n).collect();
    1.0 - unique.len() as f64 / total as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepetitionConfig {
    /// n-gram width in words.
    pub ngram: usize,
    /// Documents scoring at or above this ratio are dropped.
    pub threshold: f64,
}

impl Default for RepetitionConfig {
    fn default() -> Self {
        Self {
            ngram: DEFAULT_NGRAM,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl RepetitionConfig {
    pub fn validate(&self) -> Result<(), FilterConfigError> {
        if self.ngram == 0 {
            return Err(FilterConfigError::ZeroNgram);
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(FilterConfigError::ThresholdOutOfRange {
                value: self.threshold,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RepetitionFilter {
    config: RepetitionConfig,
}

impl RepetitionFilter {
    pub fn new(config: RepetitionConfig) -> Self {
        Self { config }
    }

    /// The ratio for `text`, and whether it should be dropped.
    pub fn score(&self, text: &str) -> (f64, bool) {
        let ratio = repetition_ratio(text, self.config.ngram);
        (ratio, ratio >= self.config.threshold)
    }
}
