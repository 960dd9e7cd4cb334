#![allow(dead_code)]

use std::sync::Arc;

use corpusclean::{CleanerConfig, Document, LanguageDetector, Pipeline, Source};

/// Reports `es` for samples containing common Spanish words, `en` for any
/// other non-blank sample, and gives up on blank ones.
pub struct KeywordDetector;

impl LanguageDetector for KeywordDetector {
    fn detect(&self, sample: &str) -> Option<String> {
        let lower = sample.to_lowercase();
        if lower.trim().is_empty() {
            None
        } else if ["hola", " el ", " los ", " es una "]
            .iter()
            .any(|marker| lower.contains(marker))
        {
            Some("es".to_string())
        } else {
            Some("en".to_string())
        }
    }
}

pub fn config() -> CleanerConfig {
    let mut config = CleanerConfig::default();
    config.runtime.use_parallel = false;
    config
}

pub fn pipeline_with(config: CleanerConfig) -> Pipeline {
    Pipeline::new(config)
        .expect("valid configuration")
        .with_detector(Arc::new(KeywordDetector))
}

pub fn pipeline() -> Pipeline {
    pipeline_with(config())
}

/// `n` distinct words sharing `tag`.
pub fn words(tag: &str, n: usize) -> Vec<String> {
    (0..n).map(|i| format!("{tag}w{i}")).collect()
}

pub fn doc(id: &str, text: impl Into<String>) -> Document {
    Document::new(id, text, Source::Ocr)
}
