//! Word and character counting.
//!
//! Every stage of the cleaner agrees on one notion of "word" (a maximal run
//! of non-whitespace) and one notion of "character" (a Unicode scalar
//! value), so counts taken at different stages are comparable.

/// Iterator over the whitespace-separated words of `text`.
pub fn words(text: &str) -> std::str::SplitWhitespace<'_> {
    text.split_whitespace()
}

pub fn word_count(text: &str) -> usize {
    words(text).count()
}

/// Number of Unicode scalar values, not bytes.
pub fn char_count(text: &str) -> usize {
    text.chars().count()
}

/// The longest prefix of `text` holding at most `max_chars` characters.
///
/// Always ends on a character boundary.
pub fn char_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
