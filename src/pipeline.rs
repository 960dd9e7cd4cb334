//! Batch orchestration of the cleaning stages.
//!
//! Every document walks the same linear chain of [`Stage`]s and either
//! reaches [`Stage::RepetitionChecked`] (kept) or is dropped, with a
//! [`Rejection`] recording where and why. Drops are terminal.
//!
//! Documents are handled in batches of `runtime.batch_size`:
//!
//! 1. language check, markup stripping and sketching run per document,
//!    on the rayon pool when `runtime.use_parallel` is set;
//! 2. the dedup decision runs on one thread, in the run's recorded order;
//! 3. PII redaction and the repetition check run per document again;
//! 4. kept documents are written to the sink, which is then flushed.
//!
//! Each worker counts into its own [`PipelineStats`]; partials are merged
//! after every phase, so the totals match a sequential run exactly.

use std::cmp::Ordering;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use canonical::strip_markup;
use chrono::{DateTime, Utc};
use filters::{LanguageDetector, LanguageFilter, PiiRedactor, RepetitionFilter};
use ingest::{Document, Source};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::config::{CleanerConfig, OrderKey};
use crate::dedup::{DedupInput, DedupOutcome, Deduplicator};
use crate::output::{CorpusSink, CorpusWriter};
use crate::report;
use crate::stats::{PipelineStats, Stage};
use crate::PipelineError;

/// Why a document left the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DropReason {
    /// Detected language differs from the target (`unknown` included).
    Language { detected: String },
    /// Fewer words than the dedup minimum.
    TooShort { words: usize },
    /// Near duplicate of an earlier kept document.
    NearDuplicate {
        of: String,
        similarity: Option<f64>,
    },
    /// Repeated n-gram ratio at or above the threshold.
    Repetitive { ratio: f64 },
}

impl DropReason {
    /// The stage whose check produced this drop.
    pub fn stage(&self) -> Stage {
        match self {
            DropReason::Language { .. } => Stage::LanguageChecked,
            DropReason::TooShort { .. } | DropReason::NearDuplicate { .. } => Stage::DedupChecked,
            DropReason::Repetitive { .. } => Stage::RepetitionChecked,
        }
    }
}

/// One line of `rejected.jsonl`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    pub id: String,
    pub source: Source,
    pub stage: Stage,
    #[serde(flatten)]
    pub reason: DropReason,
}

type CompareFn = dyn Fn(&Document, &Document) -> Ordering + Send + Sync;

/// The total order documents are offered to the dedup stage in.
///
/// Which of two near duplicates survives depends on this order, so a run
/// always records the order it used.
#[derive(Clone, Default)]
pub enum DocumentOrder {
    /// Feed load order.
    #[default]
    Arrival,
    /// Stable sort by document id.
    ById,
    /// Stable sort by a caller-supplied comparator.
    Custom { name: String, compare: Arc<CompareFn> },
}

impl DocumentOrder {
    pub fn custom<F>(name: impl Into<String>, compare: F) -> Self
    where
        F: Fn(&Document, &Document) -> Ordering + Send + Sync + 'static,
    {
        DocumentOrder::Custom {
            name: name.into(),
            compare: Arc::new(compare),
        }
    }

    /// Name recorded in the report and `stats.json`.
    pub fn describe(&self) -> String {
        match self {
            DocumentOrder::Arrival => "arrival".to_string(),
            DocumentOrder::ById => "by_id".to_string(),
            DocumentOrder::Custom { name, .. } => format!("custom:{name}"),
        }
    }

    pub fn arrange(&self, mut docs: Vec<Document>) -> Vec<Document> {
        match self {
            DocumentOrder::Arrival => {}
            DocumentOrder::ById => docs.sort_by(|a, b| a.id.cmp(&b.id)),
            DocumentOrder::Custom { compare, .. } => docs.sort_by(|a, b| compare(a, b)),
        }
        docs
    }
}

impl fmt::Debug for DocumentOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentOrder::Arrival => f.write_str("Arrival"),
            DocumentOrder::ById => f.write_str("ById"),
            DocumentOrder::Custom { name, .. } => {
                f.debug_struct("Custom").field("name", name).finish_non_exhaustive()
            }
        }
    }
}

impl From<OrderKey> for DocumentOrder {
    fn from(key: OrderKey) -> Self {
        match key {
            OrderKey::Arrival => DocumentOrder::Arrival,
            OrderKey::ById => DocumentOrder::ById,
        }
    }
}

/// Result of [`Pipeline::process`].
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub stats: PipelineStats,
    pub rejected: Vec<Rejection>,
    /// [`DocumentOrder::describe`] of the order used.
    pub order: String,
}

/// Result of [`Pipeline::clean`].
#[derive(Debug, Clone)]
pub struct CleanOutput {
    pub documents: Vec<Document>,
    pub stats: PipelineStats,
    pub rejected: Vec<Rejection>,
}

/// Files written by [`Pipeline::run`].
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub corpus_path: PathBuf,
    pub report_path: PathBuf,
    pub stats_path: PathBuf,
    pub rejected_path: Option<PathBuf>,
    pub stats: PipelineStats,
    pub order: String,
}

#[derive(Serialize)]
struct StatsFile<'a> {
    generated_at: DateTime<Utc>,
    order: &'a str,
    stats: &'a PipelineStats,
}

/// A document and the last stage it completed.
struct InFlight {
    doc: Document,
    stage: Stage,
}

impl InFlight {
    fn new(doc: Document) -> Self {
        Self {
            doc,
            stage: Stage::Loaded,
        }
    }

    fn advance(&mut self, to: Stage, stats: &mut PipelineStats) {
        debug_assert_eq!(self.stage.next(), Some(to), "stages must be entered in order");
        self.stage = to;
        stats.record_stage(to);
    }

    fn reject(self, reason: DropReason) -> Rejection {
        debug!(id = %self.doc.id, source = %self.doc.source, after = ?self.stage, ?reason, "document_dropped");
        Rejection {
            id: self.doc.id,
            source: self.doc.source,
            stage: reason.stage(),
            reason,
        }
    }
}

enum Screened {
    Ready(InFlight, DedupInput),
    Dropped(Rejection),
}

enum Finished {
    Kept(Document),
    Dropped(Rejection),
}

#[derive(Default)]
struct PhaseTimes {
    screen: Duration,
    dedup: Duration,
    finish: Duration,
    write: Duration,
}

/// The configured cleaning pipeline. Holds no per-run state, so one value
/// can run any number of times.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: CleanerConfig,
    language: LanguageFilter,
    pii: PiiRedactor,
    repetition: RepetitionFilter,
    order: DocumentOrder,
}

impl Pipeline {
    /// Validate `config` and build the stages, detecting languages with
    /// whatlang.
    pub fn new(config: CleanerConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let language = LanguageFilter::with_whatlang(config.language.clone());
        let repetition = RepetitionFilter::new(config.repetition);
        let order = DocumentOrder::from(config.runtime.order);
        Ok(Self {
            config,
            language,
            pii: PiiRedactor::new(),
            repetition,
            order,
        })
    }

    /// Swap in a different language detector.
    pub fn with_detector(mut self, detector: Arc<dyn LanguageDetector>) -> Self {
        self.language = LanguageFilter::new(self.config.language.clone(), detector);
        self
    }

    /// Override the configured document order.
    pub fn with_order(mut self, order: DocumentOrder) -> Self {
        self.order = order;
        self
    }

    pub fn config(&self) -> &CleanerConfig {
        &self.config
    }

    pub fn order(&self) -> &DocumentOrder {
        &self.order
    }

    /// Clean `docs` in memory.
    pub fn clean(&self, docs: Vec<Document>) -> Result<CleanOutput, PipelineError> {
        let mut documents = Vec::new();
        let outcome = self.process(docs, &mut documents)?;
        Ok(CleanOutput {
            documents,
            stats: outcome.stats,
            rejected: outcome.rejected,
        })
    }

    /// Clean `docs`, writing kept documents to `sink` batch by batch.
    pub fn process<S: CorpusSink>(
        &self,
        docs: Vec<Document>,
        sink: &mut S,
    ) -> Result<ProcessOutcome, PipelineError> {
        let order = self.order.describe();
        let span = info_span!("corpusclean.process", documents = docs.len(), order = %order);
        let _enter = span.enter();

        let started = Instant::now();
        let mut dedup = Deduplicator::new(self.config.dedup.clone())?;
        let mut stats = PipelineStats::default();
        let mut rejected = Vec::new();
        let mut times = PhaseTimes::default();
        let batch_size = self.config.runtime.batch_size.max(1);

        let mut remaining = self.order.arrange(docs).into_iter().peekable();
        let mut batches = 0usize;
        while remaining.peek().is_some() {
            let batch: Vec<Document> = remaining.by_ref().take(batch_size).collect();
            self.process_batch(batch, &mut dedup, sink, &mut stats, &mut rejected, &mut times)?;
            batches += 1;
        }

        info!(
            elapsed_micros = times.screen.as_micros() as u64,
            survivors = stats.survivors_at(Stage::MarkupStripped),
            "language_and_markup_done"
        );
        info!(
            elapsed_micros = times.dedup.as_micros() as u64,
            survivors = stats.survivors_at(Stage::DedupChecked),
            too_short = stats.dedup_too_short,
            near_duplicate = stats.dedup_near_duplicate,
            "dedup_done"
        );
        info!(
            elapsed_micros = times.finish.as_micros() as u64,
            survivors = stats.kept(),
            pii_replaced = stats.pii.values().sum::<usize>(),
            "pii_and_repetition_done"
        );
        info!(
            batches,
            kept = stats.kept(),
            rejected = rejected.len(),
            write_micros = times.write.as_micros() as u64,
            elapsed_micros = started.elapsed().as_micros() as u64,
            "process_done"
        );

        Ok(ProcessOutcome {
            stats,
            rejected,
            order,
        })
    }

    /// Load the configured feeds, clean them and write every output file.
    pub fn run(&self) -> Result<RunSummary, PipelineError> {
        self.run_at(Utc::now())
    }

    /// [`run`](Self::run) with a fixed report timestamp.
    pub fn run_at(&self, generated_at: DateTime<Utc>) -> Result<RunSummary, PipelineError> {
        let output = &self.config.output;
        fs::create_dir_all(&output.dir)?;

        let mut feed_stats = PipelineStats::default();
        let mut docs = Vec::new();
        for load in ingest::load_all(&self.config.inputs) {
            for issue in &load.issues {
                feed_stats.record_issue(issue);
            }
            docs.extend(load.documents);
        }
        if docs.is_empty() {
            warn!(dir = %output.dir.display(), "no documents loaded, writing empty outputs");
        }

        let corpus_path = output.corpus_path();
        let mut writer = CorpusWriter::create(&corpus_path)?;
        let outcome = self.process(docs, &mut writer)?;
        writer.finish()?;

        let mut stats = outcome.stats;
        stats.merge(&feed_stats);

        let report_path = output.report_path();
        let report = report::render_markdown(
            &stats,
            &outcome.order,
            self.config.name.as_deref(),
            generated_at,
        );
        fs::write(&report_path, report)?;

        let stats_path = output.stats_path();
        let stats_file = StatsFile {
            generated_at,
            order: &outcome.order,
            stats: &stats,
        };
        fs::write(&stats_path, serde_json::to_vec_pretty(&stats_file)?)?;

        let rejected_path = if output.write_rejected {
            let path = output.rejected_path();
            write_rejections(&path, &outcome.rejected)?;
            Some(path)
        } else {
            None
        };

        info!(
            corpus = %corpus_path.display(),
            report = %report_path.display(),
            kept = stats.kept(),
            removed_pct = stats.removal_percentage(),
            "run_done"
        );

        Ok(RunSummary {
            corpus_path,
            report_path,
            stats_path,
            rejected_path,
            stats,
            order: outcome.order,
        })
    }

    fn process_batch<S: CorpusSink>(
        &self,
        batch: Vec<Document>,
        dedup: &mut Deduplicator,
        sink: &mut S,
        stats: &mut PipelineStats,
        rejected: &mut Vec<Rejection>,
        times: &mut PhaseTimes,
    ) -> Result<(), PipelineError> {
        let parallel = self.config.runtime.use_parallel;

        let phase = Instant::now();
        let screened = {
            let dedup: &Deduplicator = dedup;
            map_batch(batch, parallel, |doc| self.screen(doc, dedup))
        };
        times.screen += phase.elapsed();

        let phase = Instant::now();
        let mut ready = Vec::with_capacity(screened.len());
        for (outcome, partial) in screened {
            stats.merge(&partial);
            let (mut flight, input) = match outcome {
                Screened::Ready(flight, input) => (flight, input),
                Screened::Dropped(rejection) => {
                    rejected.push(rejection);
                    continue;
                }
            };
            match dedup.admit(&flight.doc.id, input)? {
                DedupOutcome::Unique => {
                    flight.advance(Stage::DedupChecked, stats);
                    ready.push(flight);
                }
                DedupOutcome::TooShort { words } => {
                    stats.dedup_too_short += 1;
                    rejected.push(flight.reject(DropReason::TooShort { words }));
                }
                DedupOutcome::NearDuplicate { of, similarity } => {
                    stats.dedup_near_duplicate += 1;
                    rejected.push(flight.reject(DropReason::NearDuplicate { of, similarity }));
                }
            }
        }
        times.dedup += phase.elapsed();

        let phase = Instant::now();
        let finished = map_batch(ready, parallel, |flight| self.finish(flight));
        times.finish += phase.elapsed();

        let phase = Instant::now();
        for (outcome, partial) in finished {
            stats.merge(&partial);
            match outcome {
                Finished::Kept(doc) => sink.write_document(&doc)?,
                Finished::Dropped(rejection) => rejected.push(rejection),
            }
        }
        sink.flush()?;
        times.write += phase.elapsed();
        Ok(())
    }

    /// Language check, markup stripping and sketching.
    fn screen(&self, doc: Document, dedup: &Deduplicator) -> (Screened, PipelineStats) {
        let mut stats = PipelineStats::default();
        stats.record_input(&doc);
        let mut flight = InFlight::new(doc);

        let stripped = strip_markup(&flight.doc.text);
        let sample = if self.language.config().classify_stripped_text {
            stripped.as_str()
        } else {
            flight.doc.text.as_str()
        };
        let verdict = self.language.check(flight.doc.language.as_deref(), sample);
        stats.record_language(&verdict.code);
        if !verdict.accepted {
            let reason = DropReason::Language {
                detected: verdict.code,
            };
            return (Screened::Dropped(flight.reject(reason)), stats);
        }
        flight.doc.language = Some(verdict.code);
        flight.advance(Stage::LanguageChecked, &mut stats);

        flight.doc.text = stripped;
        flight.advance(Stage::MarkupStripped, &mut stats);

        let input = dedup.prepare(&flight.doc.text);
        (Screened::Ready(flight, input), stats)
    }

    /// PII redaction and the repetition check.
    fn finish(&self, mut flight: InFlight) -> (Finished, PipelineStats) {
        let mut stats = PipelineStats::default();

        let redaction = self.pii.redact(&flight.doc.text);
        stats.record_pii(&redaction.hits);
        flight.doc.text = redaction.text;
        flight.advance(Stage::PiiRedacted, &mut stats);

        let (ratio, repetitive) = self.repetition.score(&flight.doc.text);
        if repetitive {
            let reason = DropReason::Repetitive { ratio };
            return (Finished::Dropped(flight.reject(reason)), stats);
        }
        flight.advance(Stage::RepetitionChecked, &mut stats);
        stats.record_kept(&flight.doc);
        (Finished::Kept(flight.doc), stats)
    }
}

/// Map `f` over `items`, on the rayon pool when `parallel` is set. Output
/// order always matches input order.
fn map_batch<T, R, F>(items: Vec<T>, parallel: bool, f: F) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(T) -> R + Send + Sync,
{
    if parallel {
        items.into_par_iter().map(f).collect()
    } else {
        items.into_iter().map(f).collect()
    }
}

fn write_rejections(path: &Path, rejected: &[Rejection]) -> Result<(), PipelineError> {
    let mut out = BufWriter::new(File::create(path)?);
    for rejection in rejected {
        serde_json::to_writer(&mut out, rejection)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}
