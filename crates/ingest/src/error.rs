//! Error types produced while reading collaborator feeds.
//!
//! None of these abort a run. A feed that cannot be opened contributes no
//! documents; a record that cannot be parsed is skipped; undecodable bytes
//! are replaced. Each case is reported so it can be logged and counted.
//!
//! | Error | Scope | Effect |
//! |-------|-------|--------|
//! | [`SourceUnavailable`](IngestError::SourceUnavailable) | whole feed | feed skipped |
//! | [`RecordParse`](IngestError::RecordParse) | one record | record skipped |
//! | [`Encoding`](IngestError::Encoding) | one record | invalid bytes replaced with U+FFFD |

use std::path::PathBuf;

use thiserror::Error;

use crate::types::Source;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IngestError {
    /// The feed's file or directory is missing or unreadable, or its
    /// top-level structure is not what the feed format requires.
    #[error("{feed} feed unavailable at {}: {reason}", .path.display())]
    SourceUnavailable {
        feed: Source,
        path: PathBuf,
        reason: String,
    },

    /// One record could not be parsed and was skipped.
    #[error("{feed} record at {location} skipped: {message}")]
    RecordParse {
        feed: Source,
        location: String,
        message: String,
    },

    /// One record held invalid UTF-8; offending bytes were replaced.
    #[error("{feed} record at {location} contained invalid UTF-8; bytes were replaced")]
    Encoding { feed: Source, location: String },
}

impl IngestError {
    /// Short stable tag used as a statistics key.
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::SourceUnavailable { .. } => "source_unavailable",
            IngestError::RecordParse { .. } => "record_parse",
            IngestError::Encoding { .. } => "encoding",
        }
    }

    pub fn feed(&self) -> Source {
        match self {
            IngestError::SourceUnavailable { feed, .. }
            | IngestError::RecordParse { feed, .. }
            | IngestError::Encoding { feed, .. } => *feed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_path_and_reason() {
        let err = IngestError::SourceUnavailable {
            feed: Source::Ocr,
            path: PathBuf::from("/data/ocr"),
            reason: "not found".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("ocr feed unavailable"));
        assert!(msg.contains("/data/ocr"));
        assert!(msg.contains("not found"));
    }

    #[test]
    fn kind_and_feed() {
        let err = IngestError::Encoding {
            feed: Source::Transcript,
            location: "line 3".into(),
        };
        assert_eq!(err.kind(), "encoding");
        assert_eq!(err.feed(), Source::Transcript);
        assert!(err.to_string().contains("line 3"));
    }
}
