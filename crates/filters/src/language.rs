//! Language identification and filtering.
//!
//! Detection runs on a bounded prefix of the text. Whatever the detector
//! says, including "could not tell" (reported as [`UNKNOWN_LANGUAGE`]), is
//! returned so callers can keep a histogram of every outcome.

use std::fmt;
use std::sync::Arc;

use canonical::char_prefix;
use serde::{Deserialize, Serialize};
use tracing::trace;
use whatlang::Lang;

use crate::FilterConfigError;

/// Code recorded when no language could be determined.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// Number of leading characters handed to the detector.
pub const DEFAULT_SAMPLE_CHARS: usize = 1000;

/// Identifies the language of a text sample.
///
/// Implementations must be deterministic for a given sample and safe to call
/// from several worker threads at once.
pub trait LanguageDetector: Send + Sync {
    /// An ISO 639-1 style code such as `"en"`, or `None` when the sample
    /// carries too little signal.
    fn detect(&self, sample: &str) -> Option<String>;
}

/// Trigram-based detector backed by the `whatlang` crate.
///
/// `whatlang` reports ISO 639-3 codes; the common ones are mapped to their
/// two-letter ISO 639-1 form and the rest pass through unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WhatlangDetector {
    min_confidence: f64,
}

impl WhatlangDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat detections below `min_confidence` (0.0..=1.0) as failures.
    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }
}

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, sample: &str) -> Option<String> {
        let info = whatlang::detect(sample)?;
        if info.confidence() < self.min_confidence {
            return None;
        }
        Some(iso639_1(info.lang()).to_string())
    }
}

fn iso639_1(lang: Lang) -> &'static str {
    match lang {
        Lang::Eng => "en",
        Lang::Spa => "es",
        Lang::Fra => "fr",
        Lang::Deu => "de",
        Lang::Ita => "it",
        Lang::Por => "pt",
        Lang::Rus => "ru",
        Lang::Cmn => "zh",
        Lang::Jpn => "ja",
        Lang::Kor => "ko",
        Lang::Ara => "ar",
        Lang::Hin => "hi",
        Lang::Nld => "nl",
        Lang::Pol => "pl",
        Lang::Tur => "tr",
        Lang::Swe => "sv",
        Lang::Ukr => "uk",
        other => other.code(),
    }
}

/// Settings of the language stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    /// Language code documents must be detected as to survive.
    pub target: String,
    /// Number of leading characters classified.
    pub sample_chars: usize,
    /// Take the sample from markup-stripped text rather than raw text.
    pub classify_stripped_text: bool,
    /// Accept a language label a collaborator already attached.
    pub trust_source_labels: bool,
    /// Detections below this confidence count as `unknown`.
    pub min_confidence: f64,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            target: "en".to_string(),
            sample_chars: DEFAULT_SAMPLE_CHARS,
            classify_stripped_text: true,
            trust_source_labels: true,
            min_confidence: 0.0,
        }
    }
}

impl LanguageConfig {
    pub fn validate(&self) -> Result<(), FilterConfigError> {
        if self.target.trim().is_empty() {
            return Err(FilterConfigError::EmptyTargetLanguage);
        }
        if self.sample_chars == 0 {
            return Err(FilterConfigError::ZeroSampleChars);
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(FilterConfigError::ConfidenceOutOfRange {
                value: self.min_confidence,
            });
        }
        Ok(())
    }
}

/// Outcome of the language check for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageVerdict {
    /// Detected (or trusted) code; [`UNKNOWN_LANGUAGE`] on failure.
    pub code: String,
    pub accepted: bool,
}

/// Keeps documents whose detected language equals the target.
#[derive(Clone)]
pub struct LanguageFilter {
    config: LanguageConfig,
    detector: Arc<dyn LanguageDetector>,
}

impl fmt::Debug for LanguageFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageFilter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LanguageFilter {
    pub fn new(config: LanguageConfig, detector: Arc<dyn LanguageDetector>) -> Self {
        Self { config, detector }
    }

    /// A filter using [`WhatlangDetector`] with the configured confidence floor.
    pub fn with_whatlang(config: LanguageConfig) -> Self {
        let detector = WhatlangDetector::new().with_min_confidence(config.min_confidence);
        Self::new(config, Arc::new(detector))
    }

    pub fn config(&self) -> &LanguageConfig {
        &self.config
    }

    /// Classify the first `sample_chars` characters of `text`.
    pub fn classify(&self, text: &str) -> String {
        let sample = char_prefix(text, self.config.sample_chars);
        if sample.trim().is_empty() {
            return UNKNOWN_LANGUAGE.to_string();
        }
        match self.detector.detect(sample) {
            Some(code) => code.to_ascii_lowercase(),
            None => {
                trace!(sample_chars = sample.chars().count(), "language_undetermined");
                UNKNOWN_LANGUAGE.to_string()
            }
        }
    }

    /// Decide whether a document survives, honouring an existing label when
    /// `trust_source_labels` is on.
    pub fn check(&self, label: Option<&str>, text: &str) -> LanguageVerdict {
        let code = match label {
            Some(label) if self.config.trust_source_labels && !label.trim().is_empty() => {
                label.trim().to_ascii_lowercase()
            }
            _ => self.classify(text),
        };
        let accepted = code.eq_ignore_ascii_case(&self.config.target);
        LanguageVerdict { code, accepted }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Returns a fixed answer and remembers the samples it was shown.
    struct Recording {
        answer: Option<&'static str>,
        seen: Mutex<Vec<String>>,
    }

    impl Recording {
        fn new(answer: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                answer,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    impl LanguageDetector for Recording {
        fn detect(&self, sample: &str) -> Option<String> {
            self.seen.lock().unwrap().push(sample.to_string());
            self.answer.map(str::to_string)
        }
    }

    const ENGLISH: &str = "The committee published its annual report on Tuesday, \
        outlining how the new funding will be spent on schools, hospitals and \
        public transport over the next five years. Officials said the plan \
        had been shaped by months of consultation with local residents.";

    const SPANISH: &str = "El comité publicó su informe anual el martes, en el que \
        explica cómo se gastará la nueva financiación en escuelas, hospitales y \
        transporte público durante los próximos cinco años. Los responsables \
        dijeron que el plan se elaboró tras meses de consultas con los vecinos.";

    #[test]
    fn only_the_prefix_is_classified() {
        let detector = Recording::new(Some("en"));
        let filter = LanguageFilter::new(
            LanguageConfig {
                sample_chars: 5,
                ..Default::default()
            },
            detector.clone(),
        );
        filter.classify("héllo wörld");
        assert_eq!(detector.seen.lock().unwrap().as_slice(), ["héllo"]);
    }

    #[test]
    fn detector_failure_is_unknown_and_rejected() {
        let filter = LanguageFilter::new(LanguageConfig::default(), Recording::new(None));
        let verdict = filter.check(None, "???");
        assert_eq!(verdict.code, UNKNOWN_LANGUAGE);
        assert!(!verdict.accepted);
    }

    #[test]
    fn empty_text_is_unknown_without_calling_detector() {
        let detector = Recording::new(Some("en"));
        let filter = LanguageFilter::new(LanguageConfig::default(), detector.clone());
        assert_eq!(filter.classify("   "), UNKNOWN_LANGUAGE);
        assert!(detector.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn non_target_language_is_rejected_with_its_code() {
        let filter = LanguageFilter::new(LanguageConfig::default(), Recording::new(Some("es")));
        let verdict = filter.check(None, "hola");
        assert_eq!(verdict.code, "es");
        assert!(!verdict.accepted);
    }

    #[test]
    fn trusted_label_skips_detection() {
        let detector = Recording::new(Some("es"));
        let filter = LanguageFilter::new(LanguageConfig::default(), detector.clone());
        let verdict = filter.check(Some("EN"), "whatever");
        assert_eq!(verdict, LanguageVerdict { code: "en".into(), accepted: true });
        assert!(detector.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn untrusted_label_is_ignored() {
        let filter = LanguageFilter::new(
            LanguageConfig {
                trust_source_labels: false,
                ..Default::default()
            },
            Recording::new(Some("es")),
        );
        assert_eq!(filter.check(Some("en"), "text").code, "es");
    }

    #[test]
    fn whatlang_identifies_english_and_spanish() {
        let filter = LanguageFilter::with_whatlang(LanguageConfig::default());
        assert_eq!(filter.classify(ENGLISH), "en");
        assert_eq!(filter.classify(SPANISH), "es");
        assert!(filter.check(None, ENGLISH).accepted);
        assert!(!filter.check(None, SPANISH).accepted);
    }

    #[test]
    fn whatlang_confidence_floor_turns_weak_guesses_into_unknown() {
        let filter = LanguageFilter::with_whatlang(LanguageConfig {
            min_confidence: 1.0,
            ..Default::default()
        });
        assert_eq!(filter.classify("ok"), UNKNOWN_LANGUAGE);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let cfg: LanguageConfig = serde_json::from_str(r#"{"target": "de"}"#).unwrap();
        assert_eq!(cfg.target, "de");
        assert_eq!(cfg.sample_chars, DEFAULT_SAMPLE_CHARS);
        assert!(cfg.classify_stripped_text);
    }

    #[test]
    fn config_validation() {
        assert!(LanguageConfig::default().validate().is_ok());
        let empty = LanguageConfig {
            target: " ".into(),
            ..Default::default()
        };
        assert_eq!(empty.validate(), Err(FilterConfigError::EmptyTargetLanguage));
        let bad = LanguageConfig {
            min_confidence: 1.5,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
