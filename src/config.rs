//! YAML configuration for the cleaner.
//!
//! Every section is optional; omitted sections and fields take the defaults
//! shown below.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! name: "nightly corpus"
//!
//! inputs:
//!   abstracts: "data/abstracts.json"
//!   ocr_dir: "data/ocr"
//!   transcripts: "data/transcripts.jsonl"
//!
//! output:
//!   dir: "cleaned_data"
//!   corpus_file: "clean_corpus.txt"
//!   report_file: "stats.md"
//!   stats_file: "stats.json"
//!   write_rejected: false
//!   rejected_file: "rejected.jsonl"
//!
//! language:
//!   target: "en"
//!   sample_chars: 1000
//!   classify_stripped_text: true
//!   trust_source_labels: true
//!   min_confidence: 0.0
//!
//! dedup:
//!   min_words: 10
//!   threshold: 0.7
//!   verify_candidates: true
//!   perceptual:
//!     k: 3
//!     num_perm: 128
//!     seed: 17297687000019483309
//!   # Optional; searched for from `threshold` when absent (16 x 8 at 0.7).
//!   lsh:
//!     num_perm: 128
//!     bands: 16
//!     rows_per_band: 8
//!
//! repetition:
//!   ngram: 4
//!   threshold: 0.3
//!
//! runtime:
//!   batch_size: 256
//!   use_parallel: true
//!   order: "arrival"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use filters::{LanguageConfig, RepetitionConfig};
use ingest::FeedConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dedup::DedupConfig;

/// Errors that can occur when loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level configuration of a cleaning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CleanerConfig {
    /// Configuration format version
    #[serde(default = "default_version")]
    pub version: String,

    /// Optional configuration name/description
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub inputs: FeedConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub language: LanguageConfig,

    #[serde(default)]
    pub dedup: DedupConfig,

    #[serde(default)]
    pub repetition: RepetitionConfig,

    #[serde(default)]
    pub runtime: RuntimeConfig,
}

impl CleanerConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: CleanerConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigLoadError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.output.validate()?;
        self.runtime.validate()?;
        self.language
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("language: {e}")))?;
        self.repetition
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("repetition: {e}")))?;
        self.dedup
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("dedup: {e}")))?;

        Ok(())
    }

    pub fn with_inputs(mut self, inputs: FeedConfig) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output.dir = dir.into();
        self
    }
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            name: None,
            inputs: FeedConfig::default(),
            output: OutputConfig::default(),
            language: LanguageConfig::default(),
            dedup: DedupConfig::default(),
            repetition: RepetitionConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

/// Where and what the run writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub corpus_file: String,
    /// Human-readable markdown report.
    pub report_file: String,
    /// Machine-readable statistics.
    pub stats_file: String,
    /// Also write one JSON line per dropped document.
    pub write_rejected: bool,
    pub rejected_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("cleaned_data"),
            corpus_file: "clean_corpus.txt".to_string(),
            report_file: "stats.md".to_string(),
            stats_file: "stats.json".to_string(),
            write_rejected: false,
            rejected_file: "rejected.jsonl".to_string(),
        }
    }
}

impl OutputConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        let names = [
            ("corpus_file", &self.corpus_file),
            ("report_file", &self.report_file),
            ("stats_file", &self.stats_file),
            ("rejected_file", &self.rejected_file),
        ];
        for (field, value) in names {
            if value.trim().is_empty() {
                return Err(ConfigLoadError::Validation(format!(
                    "output.{field} cannot be empty"
                )));
            }
        }
        Ok(())
    }

    pub fn corpus_path(&self) -> PathBuf {
        self.dir.join(&self.corpus_file)
    }

    pub fn report_path(&self) -> PathBuf {
        self.dir.join(&self.report_file)
    }

    pub fn stats_path(&self) -> PathBuf {
        self.dir.join(&self.stats_file)
    }

    pub fn rejected_path(&self) -> PathBuf {
        self.dir.join(&self.rejected_file)
    }
}

/// Order in which documents are offered to the dedup stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKey {
    /// Feed load order: abstracts, OCR (by file name), transcripts (by line).
    #[default]
    Arrival,
    /// Stable sort by document id.
    ById,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Documents per batch; each batch is flushed to the corpus file.
    pub batch_size: usize,
    /// Run the stateless stages on the rayon pool.
    pub use_parallel: bool,
    pub order: OrderKey,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            batch_size: 256,
            use_parallel: true,
            order: OrderKey::Arrival,
        }
    }
}

impl RuntimeConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.batch_size == 0 {
            return Err(ConfigLoadError::Validation(
                "runtime.batch_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_version() -> String {
    "1.0".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use index::LshParams;

    #[test]
    fn test_minimal_yaml_config() {
        let yaml = r#"
version: "1.0"
"#;
        let config = CleanerConfig::from_yaml(yaml).unwrap();
        assert_eq!(config, CleanerConfig::default());
        assert_eq!(config.language.target, "en");
        assert_eq!(config.language.sample_chars, 1000);
        assert_eq!(config.dedup.min_words, 10);
        assert_eq!(config.dedup.perceptual.k, 3);
        assert_eq!(config.dedup.perceptual.num_perm, 128);
        assert_eq!(config.repetition.ngram, 4);
        assert_eq!(config.repetition.threshold, 0.3);
    }

    #[test]
    fn test_full_yaml_config() {
        let yaml = r#"
version: "1.0"
name: "nightly"
inputs:
  abstracts: "in/abs.json"
  ocr_dir: null
output:
  dir: "out"
  write_rejected: true
language:
  target: "de"
  classify_stripped_text: false
dedup:
  min_words: 20
  verify_candidates: false
  perceptual:
    seed: 7
  lsh:
    bands: 8
    rows_per_band: 16
repetition:
  threshold: 0.5
runtime:
  batch_size: 64
  use_parallel: false
  order: "by_id"
"#;
        let config = CleanerConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.name.as_deref(), Some("nightly"));
        assert_eq!(config.inputs.abstracts, Some(PathBuf::from("in/abs.json")));
        assert_eq!(config.inputs.ocr_dir, None);
        assert_eq!(config.output.corpus_path(), PathBuf::from("out/clean_corpus.txt"));
        assert!(config.output.write_rejected);
        assert_eq!(config.language.target, "de");
        assert!(!config.language.classify_stripped_text);
        assert_eq!(config.dedup.min_words, 20);
        assert_eq!(config.dedup.perceptual.seed, 7);
        assert_eq!(config.dedup.lsh, Some(LshParams::new(8, 16)));
        assert_eq!(config.repetition.threshold, 0.5);
        assert_eq!(config.runtime.order, OrderKey::ById);
        assert_eq!(config.runtime.batch_size, 64);
    }

    #[test]
    fn test_threshold_drives_banding() {
        let yaml = "version: \"1.0\"\ndedup:\n  threshold: 0.5\n";
        let config = CleanerConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.dedup.threshold, 0.5);
        assert_eq!(config.dedup.lsh, None);
        assert_eq!(config.dedup.lsh_params().unwrap(), LshParams::new(32, 4));

        let defaults = CleanerConfig::default();
        assert_eq!(defaults.dedup.threshold, 0.7);
        assert_eq!(defaults.dedup.lsh_params().unwrap(), LshParams::new(16, 8));
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let yaml = "version: \"1.0\"\ndedup:\n  threshold: 1.0\n";
        assert!(matches!(
            CleanerConfig::from_yaml(yaml),
            Err(ConfigLoadError::Validation(msg)) if msg.contains("dedup.threshold")
        ));
    }

    #[test]
    fn test_unsupported_version() {
        let result = CleanerConfig::from_yaml("version: \"2.0\"\n");
        assert!(matches!(result, Err(ConfigLoadError::UnsupportedVersion(v)) if v == "2.0"));
    }

    #[test]
    fn test_invalid_banding_rejected() {
        let yaml = r#"
version: "1.0"
dedup:
  lsh:
    bands: 14
    rows_per_band: 9
"#;
        assert!(matches!(
            CleanerConfig::from_yaml(yaml),
            Err(ConfigLoadError::Validation(msg)) if msg.starts_with("dedup:")
        ));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let yaml = "version: \"1.0\"\nruntime:\n  batch_size: 0\n";
        assert!(matches!(
            CleanerConfig::from_yaml(yaml),
            Err(ConfigLoadError::Validation(_))
        ));
    }

    #[test]
    fn test_invalid_repetition_rejected() {
        let yaml = "version: \"1.0\"\nrepetition:\n  threshold: 1.5\n";
        assert!(matches!(
            CleanerConfig::from_yaml(yaml),
            Err(ConfigLoadError::Validation(msg)) if msg.starts_with("repetition:")
        ));
    }

    #[test]
    fn test_yaml_parse_error() {
        assert!(matches!(
            CleanerConfig::from_yaml("version: [unclosed"),
            Err(ConfigLoadError::YamlParse(_))
        ));
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = CleanerConfig::default().with_output_dir("elsewhere");
        let yaml = config.to_yaml().unwrap();
        assert_eq!(CleanerConfig::from_yaml(&yaml).unwrap(), config);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cleaner.yaml");
        fs::write(&path, "version: \"1\"\nlanguage:\n  target: \"fr\"\n").unwrap();
        let config = CleanerConfig::from_file(&path).unwrap();
        assert_eq!(config.language.target, "fr");

        assert!(matches!(
            CleanerConfig::from_file(dir.path().join("missing.yaml")),
            Err(ConfigLoadError::FileRead(_))
        ));
    }
}
