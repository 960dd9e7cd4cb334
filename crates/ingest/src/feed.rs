//! Loaders for the three collaborator feeds.
//!
//! Each loader returns whatever it could read together with the issues it
//! hit; nothing here fails a run. Text is trimmed, and bytes that are not
//! valid UTF-8 are replaced with U+FFFD and reported.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::FeedConfig;
use crate::error::IngestError;
use crate::types::{Document, Source};

/// Id given to records that do not carry one.
pub const UNKNOWN_ID: &str = "unknown";

/// Documents read from one feed plus the issues encountered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLoad {
    pub source: Source,
    pub documents: Vec<Document>,
    pub issues: Vec<IngestError>,
}

impl SourceLoad {
    fn new(source: Source) -> Self {
        Self {
            source,
            documents: Vec::new(),
            issues: Vec::new(),
        }
    }

    fn unavailable(source: Source, path: &Path, reason: impl Into<String>) -> Self {
        let mut load = Self::new(source);
        load.issues.push(IngestError::SourceUnavailable {
            feed: source,
            path: path.to_path_buf(),
            reason: reason.into(),
        });
        load
    }
}

/// Load every configured feed in the fixed order abstracts, OCR, transcripts.
pub fn load_all(cfg: &FeedConfig) -> Vec<SourceLoad> {
    let mut loads = Vec::with_capacity(3);
    if let Some(path) = &cfg.abstracts {
        loads.push(load_abstracts(path));
    }
    if let Some(path) = &cfg.ocr_dir {
        loads.push(load_ocr_dir(path));
    }
    if let Some(path) = &cfg.transcripts {
        loads.push(load_transcripts(path));
    }
    loads
}

/// Load a JSON array of `{id, title, abstract}` objects.
///
/// Text is `"{title} {abstract}"` trimmed. A missing id becomes
/// [`UNKNOWN_ID`]; numeric ids are rendered as strings.
pub fn load_abstracts(path: &Path) -> SourceLoad {
    let start = Instant::now();
    let source = Source::Abstracts;
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => return finish(SourceLoad::unavailable(source, path, err.to_string()), path, start),
    };

    let mut load = SourceLoad::new(source);
    let content = decode_lossy(&bytes, source, path.display().to_string(), &mut load.issues);
    let entries = match serde_json::from_str::<Value>(&content) {
        Ok(Value::Array(entries)) => entries,
        Ok(_) => {
            return finish(
                SourceLoad::unavailable(source, path, "expected a top-level JSON array"),
                path,
                start,
            )
        }
        Err(err) => {
            return finish(
                SourceLoad::unavailable(source, path, format!("invalid JSON: {err}")),
                path,
                start,
            )
        }
    };

    for (idx, entry) in entries.into_iter().enumerate() {
        let Value::Object(fields) = entry else {
            load.issues.push(IngestError::RecordParse {
                feed: source,
                location: format!("entry {idx}"),
                message: "expected a JSON object".into(),
            });
            continue;
        };
        let title = fields.get("title").and_then(Value::as_str).unwrap_or("");
        let body = fields.get("abstract").and_then(Value::as_str).unwrap_or("");
        let text = format!("{title} {body}").trim().to_string();
        let id = match fields.get("id") {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => UNKNOWN_ID.to_string(),
        };
        load.documents.push(Document::new(id, text, source));
    }

    finish(load, path, start)
}

/// Load every `*.txt` file directly inside `dir`, sorted by file name.
///
/// The id is the file stem. Unreadable files are skipped and reported.
pub fn load_ocr_dir(dir: &Path) -> SourceLoad {
    let start = Instant::now();
    let source = Source::Ocr;
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => return finish(SourceLoad::unavailable(source, dir, err.to_string()), dir, start),
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let mut load = SourceLoad::new(source);
    for file in files {
        let location = file.display().to_string();
        let bytes = match fs::read(&file) {
            Ok(bytes) => bytes,
            Err(err) => {
                load.issues.push(IngestError::RecordParse {
                    feed: source,
                    location,
                    message: err.to_string(),
                });
                continue;
            }
        };
        let text = decode_lossy(&bytes, source, location, &mut load.issues);
        let id = file
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| UNKNOWN_ID.to_string());
        load.documents.push(Document::new(id, text.trim(), source));
    }

    finish(load, dir, start)
}

#[derive(Deserialize)]
struct TranscriptLine {
    #[serde(default)]
    transcript: String,
    #[serde(default)]
    video_id: Option<Value>,
    #[serde(default)]
    id: Option<Value>,
}

/// Load a JSON Lines file of `{video_id, transcript}` objects.
///
/// Blank lines are ignored. Lines that are not JSON objects are skipped and
/// reported. The id is `video_id`, falling back to `id`, then
/// [`UNKNOWN_ID`].
pub fn load_transcripts(path: &Path) -> SourceLoad {
    let start = Instant::now();
    let source = Source::Transcript;
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => return finish(SourceLoad::unavailable(source, path, err.to_string()), path, start),
    };

    let mut load = SourceLoad::new(source);
    for (idx, raw) in bytes.split(|b| *b == b'\n').enumerate() {
        let location = format!("line {}", idx + 1);
        let line = decode_lossy(raw, source, location.clone(), &mut load.issues);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<TranscriptLine>(line) {
            Ok(record) => {
                let id = record
                    .video_id
                    .or(record.id)
                    .and_then(|v| match v {
                        Value::String(s) => Some(s),
                        Value::Number(n) => Some(n.to_string()),
                        _ => None,
                    })
                    .unwrap_or_else(|| UNKNOWN_ID.to_string());
                load.documents
                    .push(Document::new(id, record.transcript.trim(), source));
            }
            Err(err) => load.issues.push(IngestError::RecordParse {
                feed: source,
                location,
                message: err.to_string(),
            }),
        }
    }

    finish(load, path, start)
}

fn decode_lossy(
    bytes: &[u8],
    feed: Source,
    location: String,
    issues: &mut Vec<IngestError>,
) -> String {
    match String::from_utf8_lossy(bytes) {
        Cow::Borrowed(text) => text.to_string(),
        Cow::Owned(text) => {
            issues.push(IngestError::Encoding { feed, location });
            text
        }
    }
}

fn finish(load: SourceLoad, path: &Path, start: Instant) -> SourceLoad {
    let elapsed_micros = start.elapsed().as_micros();
    for issue in &load.issues {
        warn!(feed = %load.source, kind = issue.kind(), error = %issue, "feed_issue");
    }
    info!(
        feed = %load.source,
        path = %path.display(),
        documents = load.documents.len(),
        issues = load.issues.len(),
        elapsed_micros,
        "feed_loaded"
    );
    load
}
