//! # Corpus ingest
//!
//! The document model shared by every stage of the cleaner, and loaders for
//! the three upstream collaborators that feed it:
//!
//! - **abstracts**: a JSON array of scraped `{id, title, abstract}` objects;
//! - **OCR**: a directory of `.txt` files, one per document;
//! - **transcripts**: JSON Lines of `{video_id, transcript}` objects.
//!
//! ## Design Principles
//!
//! - **Never abort on bad input** - unreadable feeds, malformed records and
//!   invalid UTF-8 are collected as [`IngestError`] values next to the
//!   documents that did load.
//! - **Explicit order** - feeds load in a fixed order and OCR files are
//!   sorted by name, so arrival order is reproducible.
//! - **Log everything** - one `feed_loaded` event per feed, one `feed_issue`
//!   warning per problem, via `tracing`.
//!
//! ## Example Usage
//!
//! ```no_run
//! use ingest::{load_all, FeedConfig};
//!
//! let cfg = FeedConfig::none().with_transcripts("data/transcripts.jsonl");
//! for load in load_all(&cfg) {
//!     println!("{}: {} documents, {} issues", load.source, load.documents.len(), load.issues.len());
//! }
//! ```

mod config;
mod error;
mod feed;
mod types;

pub use crate::config::FeedConfig;
pub use crate::error::IngestError;
pub use crate::feed::{
    load_abstracts, load_all, load_ocr_dir, load_transcripts, SourceLoad, UNKNOWN_ID,
};
pub use crate::types::{Document, Source};
