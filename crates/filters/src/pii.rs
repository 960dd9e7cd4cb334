//! Personally identifiable information redaction.
//!
//! A static, ordered table of `(category, pattern)` pairs. Each pattern is
//! applied in table order over the output of the previous one, and every
//! match is replaced by the category's fixed placeholder. Placeholders
//! contain no digits, `@` or `://`, so no later pattern can match inside an
//! earlier replacement.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PiiCategory {
    Email,
    Phone,
    /// Government identifier (US social security number shape).
    Ssn,
    CreditCard,
    Url,
}

impl PiiCategory {
    /// Categories in the order their patterns are applied.
    pub const ALL: [PiiCategory; 5] = [
        PiiCategory::Email,
        PiiCategory::Phone,
        PiiCategory::Ssn,
        PiiCategory::CreditCard,
        PiiCategory::Url,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PiiCategory::Email => "email",
            PiiCategory::Phone => "phone",
            PiiCategory::Ssn => "ssn",
            PiiCategory::CreditCard => "credit_card",
            PiiCategory::Url => "url",
        }
    }

    pub fn placeholder(&self) -> &'static str {
        match self {
            PiiCategory::Email => "[EMAIL_REMOVED]",
            PiiCategory::Phone => "[PHONE_REMOVED]",
            PiiCategory::Ssn => "[SSN_REMOVED]",
            PiiCategory::CreditCard => "[CREDIT_CARD_REMOVED]",
            PiiCategory::Url => "[URL_REMOVED]",
        }
    }
}

impl fmt::Display for PiiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static PII_PATTERNS: LazyLock<[(PiiCategory, Regex); 5]> = LazyLock::new(|| {
    [
        (
            PiiCategory::Email,
            Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}\b").unwrap(),
        ),
        (
            PiiCategory::Phone,
            Regex::new(r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b").unwrap(),
        ),
        (PiiCategory::Ssn, Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap()),
        (
            PiiCategory::CreditCard,
            Regex::new(r"\b\d{4}[\s-]?\d{4}[\s-]?\d{4}[\s-]?\d{4}\b").unwrap(),
        ),
        (PiiCategory::Url, Regex::new(r"https?://[^\s]+").unwrap()),
    ]
});

/// The pattern table, in application order.
pub fn pii_patterns() -> impl Iterator<Item = (PiiCategory, &'static Regex)> {
    PII_PATTERNS.iter().map(|(category, re)| (*category, re))
}

/// Redacted text plus the number of matches replaced per category.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Redaction {
    pub text: String,
    /// Only categories with at least one match appear.
    pub hits: BTreeMap<PiiCategory, usize>,
}

impl Redaction {
    pub fn total_hits(&self) -> usize {
        self.hits.values().sum()
    }
}

/// Stateless redactor over the static pattern table.
#[derive(Debug, Clone, Copy, Default)]
pub struct PiiRedactor;

impl PiiRedactor {
    pub fn new() -> Self {
        Self
    }

    /// Replace every match of every pattern with its placeholder.
    ///
    /// ```rust
    /// use filters::{PiiCategory, PiiRedactor};
    ///
    /// let out = PiiRedactor::new().redact("Contact me at jane@example.com or 555-123-4567");
    /// assert_eq!(out.text, "Contact me at [EMAIL_REMOVED] or [PHONE_REMOVED]");
    /// assert_eq!(out.hits[&PiiCategory::Email], 1);
    /// assert_eq!(out.hits[&PiiCategory::Phone], 1);
    /// ```
    pub fn redact(&self, text: &str) -> Redaction {
        let mut redacted = text.to_string();
        let mut hits = BTreeMap::new();
        for (category, pattern) in pii_patterns() {
            let mut found = 0;
            let replaced = pattern.replace_all(&redacted, |_: &Captures<'_>| {
                found += 1;
                category.placeholder()
            });
            if found > 0 {
                redacted = replaced.into_owned();
                hits.insert(category, found);
            }
        }
        Redaction {
            text: redacted,
            hits,
        }
    }
}
