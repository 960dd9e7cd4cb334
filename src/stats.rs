//! Run statistics.
//!
//! Workers each fill a private [`PipelineStats`] and the orchestrator folds
//! them together with [`PipelineStats::merge`]. Every field is a sum, so the
//! merge is associative and commutative and the totals do not depend on how
//! documents were split across workers.

use std::collections::BTreeMap;

use canonical::{char_count, word_count};
use filters::PiiCategory;
use ingest::{Document, IngestError, Source};
use serde::{Deserialize, Serialize};

/// Pipeline stages that have a survivor count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Loaded,
    LanguageChecked,
    MarkupStripped,
    DedupChecked,
    PiiRedacted,
    RepetitionChecked,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Loaded,
        Stage::LanguageChecked,
        Stage::MarkupStripped,
        Stage::DedupChecked,
        Stage::PiiRedacted,
        Stage::RepetitionChecked,
    ];

    /// The stage a document enters after this one.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Loaded => Some(Stage::LanguageChecked),
            Stage::LanguageChecked => Some(Stage::MarkupStripped),
            Stage::MarkupStripped => Some(Stage::DedupChecked),
            Stage::DedupChecked => Some(Stage::PiiRedacted),
            Stage::PiiRedacted => Some(Stage::RepetitionChecked),
            Stage::RepetitionChecked => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Stage::Loaded => "Loaded",
            Stage::LanguageChecked => "After language filter",
            Stage::MarkupStripped => "After markup removal",
            Stage::DedupChecked => "After deduplication",
            Stage::PiiRedacted => "After PII removal",
            Stage::RepetitionChecked => "After repetition filter",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineStats {
    /// Documents entering the pipeline, per source.
    pub documents_in: BTreeMap<Source, usize>,
    pub original_chars: usize,
    pub original_words: usize,
    /// Documents that completed each stage.
    pub survivors: BTreeMap<Stage, usize>,
    /// Dropped by the dedup stage for having fewer than the minimum words.
    pub dedup_too_short: usize,
    /// Dropped by the dedup stage as a near duplicate of a kept document.
    pub dedup_near_duplicate: usize,
    pub final_chars: usize,
    pub final_words: usize,
    /// Every language-stage outcome, `unknown` included.
    pub languages: BTreeMap<String, usize>,
    /// PII matches replaced, per category.
    pub pii: BTreeMap<PiiCategory, usize>,
    /// Feed problems, keyed by [`IngestError::kind`].
    pub feed_issues: BTreeMap<String, usize>,
}

impl PipelineStats {
    pub fn record_input(&mut self, doc: &Document) {
        *self.documents_in.entry(doc.source).or_default() += 1;
        *self.survivors.entry(Stage::Loaded).or_default() += 1;
        self.original_chars += char_count(&doc.text);
        self.original_words += word_count(&doc.text);
    }

    pub fn record_stage(&mut self, stage: Stage) {
        *self.survivors.entry(stage).or_default() += 1;
    }

    pub fn record_language(&mut self, code: &str) {
        *self.languages.entry(code.to_string()).or_default() += 1;
    }

    pub fn record_pii(&mut self, hits: &BTreeMap<PiiCategory, usize>) {
        for (category, count) in hits {
            *self.pii.entry(*category).or_default() += count;
        }
    }

    pub fn record_kept(&mut self, doc: &Document) {
        self.final_chars += char_count(&doc.text);
        self.final_words += word_count(&doc.text);
    }

    pub fn record_issue(&mut self, issue: &IngestError) {
        *self.feed_issues.entry(issue.kind().to_string()).or_default() += 1;
    }

    /// Fold `other` into `self`.
    pub fn merge(&mut self, other: &PipelineStats) {
        merge_counts(&mut self.documents_in, &other.documents_in);
        merge_counts(&mut self.survivors, &other.survivors);
        merge_counts(&mut self.languages, &other.languages);
        merge_counts(&mut self.pii, &other.pii);
        merge_counts(&mut self.feed_issues, &other.feed_issues);
        self.original_chars += other.original_chars;
        self.original_words += other.original_words;
        self.dedup_too_short += other.dedup_too_short;
        self.dedup_near_duplicate += other.dedup_near_duplicate;
        self.final_chars += other.final_chars;
        self.final_words += other.final_words;
    }

    pub fn total_documents(&self) -> usize {
        self.documents_in.values().sum()
    }

    pub fn survivors_at(&self, stage: Stage) -> usize {
        self.survivors.get(&stage).copied().unwrap_or(0)
    }

    /// Documents written to the corpus.
    pub fn kept(&self) -> usize {
        self.survivors_at(Stage::RepetitionChecked)
    }

    /// Percentage of input words that did not make it into the corpus.
    pub fn removal_percentage(&self) -> f64 {
        percentage_removed(self.original_words, self.final_words)
    }

    /// Percentage of input documents that did not make it into the corpus.
    pub fn document_removal_percentage(&self) -> f64 {
        percentage_removed(self.total_documents(), self.kept())
    }

    /// Language histogram sorted by count descending, then code.
    pub fn languages_by_count(&self) -> Vec<(&str, usize)> {
        let mut entries: Vec<(&str, usize)> = self
            .languages
            .iter()
            .map(|(code, count)| (code.as_str(), *count))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        entries
    }
}

fn percentage_removed(before: usize, after: usize) -> f64 {
    if before == 0 {
        return 0.0;
    }
    before.saturating_sub(after) as f64 / before as f64 * 100.0
}

fn merge_counts<K: Ord + Clone>(into: &mut BTreeMap<K, usize>, from: &BTreeMap<K, usize>) {
    for (key, count) in from {
        *into.entry(key.clone()).or_default() += count;
    }
}
