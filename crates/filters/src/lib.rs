//! # Corpus filters
//!
//! The stateless per-document stages of the cleaner:
//!
//! - [`LanguageFilter`]: keeps documents detected as the target language,
//!   reporting every detection (including failures) for the histogram;
//! - [`PiiRedactor`]: replaces e-mail addresses, phone numbers, government
//!   ids, card numbers and URLs with fixed placeholders;
//! - [`repetition_ratio`] / [`RepetitionFilter`]: flags documents dominated
//!   by repeated word n-grams.
//!
//! Every stage is a pure function of its input and configuration, so the
//! pipeline may run them on any number of worker threads.

use thiserror::Error;

mod language;
mod pii;
mod repetition;

pub use crate::language::{
    LanguageConfig, LanguageDetector, LanguageFilter, LanguageVerdict, WhatlangDetector,
    DEFAULT_SAMPLE_CHARS, UNKNOWN_LANGUAGE,
};
pub use crate::pii::{pii_patterns, PiiCategory, PiiRedactor, Redaction};
pub use crate::repetition::{
    repetition_ratio, RepetitionConfig, RepetitionFilter, DEFAULT_NGRAM, DEFAULT_THRESHOLD,
};

/// Errors for filter settings that cannot be applied.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FilterConfigError {
    #[error("target language must not be empty")]
    EmptyTargetLanguage,
    #[error("language sample must cover at least one character")]
    ZeroSampleChars,
    #[error("min_confidence must lie in [0, 1] (got {value})")]
    ConfidenceOutOfRange { value: f64 },
    #[error("repetition n-gram width must be >= 1")]
    ZeroNgram,
    #[error("repetition threshold must lie in [0, 1] (got {value})")]
    ThresholdOutOfRange { value: f64 },
}
