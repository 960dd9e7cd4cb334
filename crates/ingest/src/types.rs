use std::fmt;

use serde::{Deserialize, Serialize};

/// The upstream collaborator a document came from.
///
/// Ordering follows the load order of the feeds, which is also the order the
/// report lists them in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Scraped paper abstracts (a JSON array of `{id, title, abstract}`).
    Abstracts,
    /// OCR output, one `.txt` file per document.
    Ocr,
    /// Talk transcripts, one JSON object per line.
    Transcript,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::Abstracts, Source::Ocr, Source::Transcript];

    /// Stable machine-readable tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Abstracts => "abstracts",
            Source::Ocr => "ocr",
            Source::Transcript => "transcript",
        }
    }

    /// Human-readable label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Source::Abstracts => "Abstracts (scraped)",
            Source::Ocr => "OCR documents",
            Source::Transcript => "Transcripts",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One document flowing through the cleaner.
///
/// `text` is rewritten in place by the stages that transform it (markup
/// stripping, redaction). `language` is filled in by the language stage, or
/// supplied up front by a collaborator that already knows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    pub source: Source,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>, source: Source) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            source,
            language: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}
