//! Workspace umbrella crate for the corpus cleaner.
//!
//! Loads documents from the collaborator feeds (`ingest`), runs them through
//! language filtering, markup stripping (`canonical`), near-duplicate removal
//! (`perceptual` + `index`), PII redaction and repetition filtering
//! (`filters`), and writes the cleaned corpus with a statistics report.
//!
//! ```no_run
//! use corpusclean::{CleanerConfig, Pipeline};
//!
//! let config = CleanerConfig::from_file("cleaner.yaml")?;
//! let summary = Pipeline::new(config)?.run()?;
//! println!("kept {} documents", summary.stats.kept());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use thiserror::Error;

pub mod config;
pub mod dedup;
pub mod output;
pub mod pipeline;
pub mod report;
pub mod stats;

pub use canonical::{char_count, strip_markup, word_count};
pub use filters::{
    LanguageConfig, LanguageDetector, PiiCategory, PiiRedactor, RepetitionConfig,
    WhatlangDetector, repetition_ratio,
};
pub use index::{BandedIndex, IndexError, LshParams};
pub use ingest::{Document, FeedConfig, IngestError, Source};
pub use perceptual::{PerceptualConfig, PerceptualError, Signature};

pub use crate::config::{CleanerConfig, ConfigLoadError, OrderKey, OutputConfig, RuntimeConfig};
pub use crate::dedup::{DedupConfig, DedupOutcome, Deduplicator};
pub use crate::output::{CorpusSink, CorpusWriter, DOCUMENT_DELIMITER};
pub use crate::pipeline::{
    CleanOutput, DocumentOrder, DropReason, Pipeline, ProcessOutcome, Rejection, RunSummary,
};
pub use crate::stats::{PipelineStats, Stage};

/// Errors that can stop a cleaning run.
///
/// Bad input never does: feed problems are counted in
/// [`PipelineStats::feed_issues`]. Only invalid settings or failing to write
/// the outputs end a run early.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigLoadError),

    #[error("invalid sketch settings: {0}")]
    Perceptual(#[from] PerceptualError),

    #[error("invalid index settings: {0}")]
    Index(#[from] IndexError),

    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize statistics: {0}")]
    Serialize(#[from] serde_json::Error),
}
