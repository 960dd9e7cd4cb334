//! Corpus sinks.
//!
//! The corpus file is every kept document's text, in processing order,
//! separated by [`DOCUMENT_DELIMITER`]. Sinks are flushed after every batch,
//! so an interrupted run leaves a readable prefix of the final file.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use ingest::Document;

/// Separator between documents: a blank line, 80 `=`, a blank line.
pub const DOCUMENT_DELIMITER: &str = "\n\n================================================================================\n\n";

/// Destination for kept documents.
pub trait CorpusSink {
    fn write_document(&mut self, doc: &Document) -> io::Result<()>;

    /// Called once per batch, after the batch's documents are written.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Collects kept documents in memory.
impl CorpusSink for Vec<Document> {
    fn write_document(&mut self, doc: &Document) -> io::Result<()> {
        self.push(doc.clone());
        Ok(())
    }
}

/// Writes the delimited corpus text to any [`Write`].
#[derive(Debug)]
pub struct CorpusWriter<W: Write> {
    inner: BufWriter<W>,
    written: usize,
}

impl CorpusWriter<File> {
    pub fn create(path: &Path) -> io::Result<Self> {
        Ok(Self::new(File::create(path)?))
    }
}

impl<W: Write> CorpusWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner: BufWriter::new(inner),
            written: 0,
        }
    }

    pub fn documents_written(&self) -> usize {
        self.written
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(self) -> io::Result<W> {
        self.inner.into_inner().map_err(|e| e.into_error())
    }
}

impl<W: Write> CorpusSink for CorpusWriter<W> {
    fn write_document(&mut self, doc: &Document) -> io::Result<()> {
        if self.written > 0 {
            self.inner.write_all(DOCUMENT_DELIMITER.as_bytes())?;
        }
        self.inner.write_all(doc.text.as_bytes())?;
        self.written += 1;
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
