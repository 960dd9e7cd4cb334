//! Whitespace normalization.
//!
//! Whitespace is Unicode whitespace as understood by [`str::split_whitespace`],
//! so tabs, newlines, carriage returns and non-breaking spaces all count.
//!
//! ```rust
//! use canonical::collapse_whitespace;
//!
//! assert_eq!(collapse_whitespace("  hello \t\n world  "), "hello world");
//! ```

/// Collapses every whitespace run to one ASCII space and trims both edges.
///
/// Empty or whitespace-only input yields an empty string. The function is
/// idempotent.
///
/// ```rust
/// use canonical::collapse_whitespace;
///
/// assert_eq!(collapse_whitespace("hello\r\nworld"), "hello world");
/// assert_eq!(collapse_whitespace("hello\u{00A0}world"), "hello world");
/// assert_eq!(collapse_whitespace("   \n\t   "), "");
/// ```
pub fn collapse_whitespace(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    for segment in text.split_whitespace() {
        if !normalized.is_empty() {
            normalized.push(' ');
        }
        normalized.push_str(segment);
    }
    normalized
}
