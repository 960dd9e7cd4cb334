//! Markdown rendering of [`PipelineStats`].

use chrono::{DateTime, Utc};
use ingest::Source;

use crate::stats::{PipelineStats, Stage};

/// Render the human-readable `stats.md` report.
pub fn render_markdown(
    stats: &PipelineStats,
    order: &str,
    name: Option<&str>,
    generated_at: DateTime<Utc>,
) -> String {
    let mut lines = vec!["# Data Cleaning Statistics".to_string(), String::new()];
    if let Some(name) = name {
        lines.push(format!("**Run**: {name}"));
    }
    lines.push(format!(
        "**Generated**: {}",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    ));
    lines.push(format!("**Document order**: {order}"));
    lines.push(String::new());

    lines.push("## Input Statistics".to_string());
    lines.push(String::new());
    lines.push(format!(
        "- **Total Documents**: {}",
        thousands(stats.total_documents())
    ));
    for source in Source::ALL {
        let count = stats.documents_in.get(&source).copied().unwrap_or(0);
        lines.push(format!("  - {}: {}", source.label(), thousands(count)));
    }
    lines.push(format!(
        "- **Original Characters**: {}",
        thousands(stats.original_chars)
    ));
    lines.push(format!(
        "- **Original Words**: {}",
        thousands(stats.original_words)
    ));
    lines.push(String::new());

    lines.push("## Cleaning Pipeline Results".to_string());
    lines.push(String::new());
    for (i, stage) in Stage::ALL.iter().enumerate() {
        lines.push(format!(
            "{}. **{}**: {} documents",
            i + 1,
            stage.label(),
            thousands(stats.survivors_at(*stage))
        ));
    }
    lines.push(String::new());
    lines.push(format!(
        "- Dropped as too short: {}",
        thousands(stats.dedup_too_short)
    ));
    lines.push(format!(
        "- Dropped as near duplicates: {}",
        thousands(stats.dedup_near_duplicate)
    ));
    lines.push(String::new());

    lines.push("## Output Statistics".to_string());
    lines.push(String::new());
    lines.push(format!("- **Final Documents**: {}", thousands(stats.kept())));
    lines.push(format!(
        "- **Final Characters**: {}",
        thousands(stats.final_chars)
    ));
    lines.push(format!("- **Final Words**: {}", thousands(stats.final_words)));
    lines.push(format!(
        "- **Data Removed**: {:.2}%",
        stats.removal_percentage()
    ));
    lines.push(format!(
        "- **Documents Removed**: {:.2}%",
        stats.document_removal_percentage()
    ));
    lines.push(String::new());

    lines.push("## Language Detection".to_string());
    lines.push(String::new());
    lines.push("| Language | Count |".to_string());
    lines.push("|----------|-------|".to_string());
    for (code, count) in stats.languages_by_count() {
        lines.push(format!("| {code} | {} |", thousands(count)));
    }
    lines.push(String::new());

    lines.push("## PII Patterns Removed".to_string());
    lines.push(String::new());
    lines.push("| Type | Count |".to_string());
    lines.push("|------|-------|".to_string());
    let mut pii: Vec<(&str, usize)> = stats
        .pii
        .iter()
        .map(|(category, count)| (category.as_str(), *count))
        .collect();
    pii.sort_by(|a, b| a.0.cmp(b.0));
    for (kind, count) in pii {
        lines.push(format!("| {kind} | {} |", thousands(count)));
    }

    if !stats.feed_issues.is_empty() {
        lines.push(String::new());
        lines.push("## Feed Issues".to_string());
        lines.push(String::new());
        lines.push("| Issue | Count |".to_string());
        lines.push("|-------|-------|".to_string());
        for (kind, count) in &stats.feed_issues {
            lines.push(format!("| {kind} | {} |", thousands(*count)));
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// `1234567` -> `"1,234,567"`.
fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
