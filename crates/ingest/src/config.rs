use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where the three collaborator feeds live.
///
/// A `None` path disables that feed. Paths that do not exist are reported as
/// [`IngestError::SourceUnavailable`](crate::IngestError::SourceUnavailable)
/// and the remaining feeds are still loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// JSON array of scraped abstracts.
    pub abstracts: Option<PathBuf>,
    /// Directory of OCR `.txt` files.
    pub ocr_dir: Option<PathBuf>,
    /// JSON Lines file of talk transcripts.
    pub transcripts: Option<PathBuf>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            abstracts: Some(PathBuf::from("data/abstracts.json")),
            ocr_dir: Some(PathBuf::from("data/ocr")),
            transcripts: Some(PathBuf::from("data/transcripts.jsonl")),
        }
    }
}

impl FeedConfig {
    /// A config with every feed disabled.
    pub fn none() -> Self {
        Self {
            abstracts: None,
            ocr_dir: None,
            transcripts: None,
        }
    }

    pub fn with_abstracts(mut self, path: impl Into<PathBuf>) -> Self {
        self.abstracts = Some(path.into());
        self
    }

    pub fn with_ocr_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.ocr_dir = Some(path.into());
        self
    }

    pub fn with_transcripts(mut self, path: impl Into<PathBuf>) -> Self {
        self.transcripts = Some(path.into());
        self
    }
}
