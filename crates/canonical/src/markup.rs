//! Markup stripping.
//!
//! [`strip_markup`] turns scraped HTML/XML-ish text into plain prose: tags
//! and comments are removed, the bodies of `script`/`style`/`noscript`
//! blocks are dropped, character references are decoded, control characters
//! are removed, and whitespace is collapsed.
//!
//! A `<` only opens a tag when it starts a known HTML element name (or a
//! namespaced `prefix:name`, `<!...>` or `<?...>`) and a closing `>` exists
//! somewhere after it. Prose such as `a < b`, `<3` or an escaped
//! `&lt;y and z&gt;` therefore comes through as text.
//!
//! Escaped real markup (`&lt;b&gt;`) decodes to a tag, and a second call
//! would strip that tag, so single passes are repeated until the text stops
//! changing: `strip_markup(strip_markup(x)) == strip_markup(x)`. Nested
//! references such as `&amp;lt;` are resolved within one pass, which keeps
//! the number of passes small. Each pass is linear in the input.

use crate::whitespace::collapse_whitespace;

/// Elements whose content is never prose.
const OPAQUE_ELEMENTS: [&str; 3] = ["script", "style", "noscript"];

/// Element names that open a tag. Sorted for binary search.
const HTML_ELEMENTS: [&str; 117] = [
    "a", "abbr", "address", "area", "article", "aside", "audio", "b", "base", "bdi", "bdo",
    "blockquote", "body", "br", "button", "canvas", "caption", "center", "cite", "code",
    "col", "colgroup", "data", "datalist", "dd", "del", "details", "dfn", "dialog", "div",
    "dl", "dt", "em", "embed", "fieldset", "figcaption", "figure", "font", "footer",
    "form", "frame", "frameset", "h1", "h2", "h3", "h4", "h5", "h6", "head", "header",
    "hr", "html", "i", "iframe", "img", "input", "ins", "kbd", "label", "legend", "li",
    "link", "main", "map", "mark", "math", "meta", "meter", "nav", "noscript", "object",
    "ol", "optgroup", "option", "output", "p", "param", "picture", "pre", "progress", "q",
    "rp", "rt", "ruby", "s", "samp", "script", "section", "select", "small", "source",
    "span", "strike", "strong", "style", "sub", "summary", "sup", "svg", "table", "tbody",
    "td", "template", "textarea", "tfoot", "th", "thead", "time", "title", "tr", "track",
    "tt", "u", "ul", "var", "video", "wbr",
];

/// Longest entity body (between `&` and `;`) considered for decoding.
const MAX_ENTITY_LEN: usize = 10;

/// Strip markup from `text` until a fixed point is reached.
///
/// ```rust
/// use canonical::strip_markup;
///
/// let html = "<p>Fish &amp; <b>chips</b></p><script>track()</script>";
/// assert_eq!(strip_markup(html), "Fish & chips");
/// assert_eq!(strip_markup("a < b and c > d"), "a < b and c > d");
/// assert_eq!(strip_markup("x &lt;y and z&gt; w"), "x <y and z> w");
/// ```
pub fn strip_markup(text: &str) -> String {
    let mut current = strip_once(text);
    loop {
        let next = strip_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn strip_once(text: &str) -> String {
    let without_tags = remove_tags(text);
    let decoded = decode_entities(&without_tags);
    let printable: String = decoded
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .collect();
    collapse_whitespace(&printable)
}

/// Replace every markup construct with a single space.
fn remove_tags(text: &str) -> String {
    // ASCII lowering keeps byte offsets identical to `text`.
    let lower = text.to_ascii_lowercase();
    let mut scanner = TagScanner::new(&lower);
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    while let Some(offset) = text[cursor..].find('<') {
        let start = cursor + offset;
        out.push_str(&text[cursor..start]);
        match scanner.markup_end(start) {
            Some(end) => {
                out.push(' ');
                cursor = end;
            }
            None => {
                out.push('<');
                cursor = start + 1;
            }
        }
    }
    out.push_str(&text[cursor..]);
    out
}

/// Position of the next occurrence of `needle`, remembered between lookups.
///
/// Lookups must come at non-decreasing positions; each stretch of the text
/// is then searched at most once per pass.
struct NextMatch {
    needle: &'static str,
    found: Option<usize>,
    exhausted: bool,
}

impl NextMatch {
    fn new(needle: &'static str) -> Self {
        Self {
            needle,
            found: None,
            exhausted: false,
        }
    }

    fn at_or_after(&mut self, haystack: &str, pos: usize) -> Option<usize> {
        if self.exhausted {
            return None;
        }
        if let Some(found) = self.found.filter(|&found| found >= pos) {
            return Some(found);
        }
        self.found = haystack[pos..].find(self.needle).map(|p| pos + p);
        self.exhausted = self.found.is_none();
        self.found
    }
}

/// Recognises markup constructs in one lower-cased pass over the text.
struct TagScanner<'a> {
    lower: &'a str,
    tag_close: NextMatch,
    comment_close: NextMatch,
    opaque_close: [NextMatch; 3],
}

impl<'a> TagScanner<'a> {
    fn new(lower: &'a str) -> Self {
        Self {
            lower,
            tag_close: NextMatch::new(">"),
            comment_close: NextMatch::new("-->"),
            opaque_close: [
                NextMatch::new("</script"),
                NextMatch::new("</style"),
                NextMatch::new("</noscript"),
            ],
        }
    }

    /// Byte offset just past the construct opening at `start`, or `None` when
    /// the `<` there is plain text. `start` must increase between calls.
    fn markup_end(&mut self, start: usize) -> Option<usize> {
        let lower = self.lower;
        let rest = &lower[start..];
        if rest.starts_with("<!--") {
            let end = self.comment_close.at_or_after(lower, start);
            return Some(end.map_or(lower.len(), |p| p + 3));
        }

        let name = tag_name(rest)?;
        let close = self.tag_close.at_or_after(lower, start)? + 1;

        let self_closing = lower[..close].ends_with("/>");
        let opaque = OPAQUE_ELEMENTS.iter().position(|&element| element == name);
        if let (Some(i), false) = (opaque, self_closing) {
            if let Some(body_end) = self.opaque_close[i].at_or_after(lower, close) {
                return Some(
                    self.tag_close
                        .at_or_after(lower, body_end)
                        .map_or(lower.len(), |q| q + 1),
                );
            }
        }
        Some(close)
    }
}

/// The element name of a tag opening at the start of `rest` (which begins
/// with `<`), or `None` when it does not open markup. `<!` and `<?`
/// constructs report an empty name.
fn tag_name(rest: &str) -> Option<&str> {
    let after = &rest[1..];
    if after.starts_with(['!', '?']) {
        return Some("");
    }
    let after = after.strip_prefix('/').unwrap_or(after);
    let len = after
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == ':'))
        .unwrap_or(after.len());
    let name = &after[..len];
    let terminated = after[len..]
        .chars()
        .next()
        .is_some_and(|c| c.is_whitespace() || c == '>' || c == '/');
    let known = name.contains(':') || HTML_ELEMENTS.binary_search(&name).is_ok();
    (terminated && known && name.starts_with(|c: char| c.is_ascii_alphabetic())).then_some(name)
}

fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    while let Some(offset) = text[cursor..].find('&') {
        let start = cursor + offset;
        out.push_str(&text[cursor..start]);
        // A decoded `&` may open the reference that follows it.
        let mut after = start + 1;
        cursor = loop {
            match decode_reference(&text[after..]) {
                Some(('&', consumed)) => after += consumed,
                Some((decoded, consumed)) => {
                    out.push(decoded);
                    break after + consumed;
                }
                None => {
                    out.push('&');
                    break after;
                }
            }
        };
    }
    out.push_str(&text[cursor..]);
    out
}

/// Decode the `;`-terminated reference body at the start of `s` (the text
/// right after an `&`). Returns the character and the bytes consumed,
/// including the `;`.
fn decode_reference(s: &str) -> Option<(char, usize)> {
    let body_len = s
        .char_indices()
        .take(MAX_ENTITY_LEN + 1)
        .find(|&(_, c)| c == ';')?
        .0;
    let body = &s[..body_len];
    if body.is_empty() || !body.chars().all(|c| c.is_ascii_alphanumeric() || c == '#') {
        return None;
    }

    let decoded = match body.strip_prefix('#') {
        Some(numeric) => {
            let code = match numeric.strip_prefix(|c| c == 'x' || c == 'X') {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => numeric.parse::<u32>().ok()?,
            };
            char::from_u32(code)?
        }
        None => named_entity(body)?,
    };
    Some((decoded, body_len + 1))
}

fn named_entity(name: &str) -> Option<char> {
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "hellip" => '\u{2026}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201c}',
        "rdquo" => '\u{201d}',
        "laquo" => '\u{ab}',
        "raquo" => '\u{bb}',
        "copy" => '\u{a9}',
        "reg" => '\u{ae}',
        "trade" => '\u{2122}',
        "deg" => '\u{b0}',
        "middot" => '\u{b7}',
        "times" => '\u{d7}',
        _ => return None,
    };
    Some(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_tags_and_collapses_whitespace() {
        let html = "<div>\n  <h1>Title</h1>\n  <p>First   paragraph.</p>\n</div>";
        assert_eq!(strip_markup(html), "Title First paragraph.");
    }

    #[test]
    fn tags_separate_adjacent_words() {
        assert_eq!(strip_markup("one<br>two"), "one two");
    }

    #[test]
    fn drops_script_and_style_bodies() {
        let html = "before<script type=\"text/javascript\">var x = '<p>';</script>\
                    <STYLE>p { color: red }</STYLE>after";
        assert_eq!(strip_markup(html), "before after");
    }

    #[test]
    fn self_closing_script_keeps_following_text() {
        assert_eq!(strip_markup("a<script src=\"x.js\"/>b"), "a b");
    }

    #[test]
    fn unclosed_script_drops_only_the_tag() {
        assert_eq!(strip_markup("a <script> b"), "a b");
    }

    #[test]
    fn removes_comments() {
        assert_eq!(strip_markup("keep <!-- <b>hidden</b> --> this"), "keep this");
        assert_eq!(strip_markup("keep <!-- never closed"), "keep");
    }

    #[test]
    fn leaves_prose_comparisons_alone() {
        assert_eq!(strip_markup("if a < b then 3 > 2"), "if a < b then 3 > 2");
        assert_eq!(strip_markup("x <3 y"), "x <3 y");
    }

    #[test]
    fn decodes_named_and_numeric_entities() {
        assert_eq!(strip_markup("Fish &amp; chips"), "Fish & chips");
        assert_eq!(strip_markup("caf&#233; &#x263A;"), "café ☺");
        assert_eq!(strip_markup("&ldquo;quoted&rdquo;"), "\u{201c}quoted\u{201d}");
    }

    #[test]
    fn nbsp_becomes_plain_space() {
        assert_eq!(strip_markup("a&nbsp;&nbsp;b"), "a b");
    }

    #[test]
    fn unknown_or_unterminated_entities_are_kept() {
        assert_eq!(strip_markup("AT&T rocks"), "AT&T rocks");
        assert_eq!(strip_markup("&bogus; stays"), "&bogus; stays");
        assert_eq!(strip_markup("& alone"), "& alone");
        assert_eq!(strip_markup("&#xZZ;"), "&#xZZ;");
    }

    #[test]
    fn escaped_markup_is_stripped_on_a_later_pass() {
        assert_eq!(strip_markup("&lt;b&gt;bold&lt;/b&gt; text"), "bold text");
    }

    #[test]
    fn escaped_prose_brackets_are_kept() {
        assert_eq!(strip_markup("x &lt;y and z&gt; w"), "x <y and z> w");
        assert_eq!(strip_markup("a &lt; b &gt; c"), "a < b > c");
        assert_eq!(
            strip_markup("mail &lt;jane@example.com&gt; today"),
            "mail <jane@example.com> today"
        );
        for text in ["x <y and z> w", "a < b > c", "mail <jane@example.com> today"] {
            assert_eq!(strip_markup(text), text);
        }
    }

    #[test]
    fn only_element_names_open_tags() {
        assert_eq!(strip_markup("<y and z>"), "<y and z>");
        assert_eq!(strip_markup("<bold claim>"), "<bold claim>");
        assert_eq!(strip_markup("<b class=\"x\">bold</b>"), "bold");
        assert_eq!(strip_markup("<jats:p>Abstract</jats:p>"), "Abstract");
        assert_eq!(strip_markup("<?xml version=\"1.0\"?><!DOCTYPE html>text"), "text");
    }

    #[test]
    fn nested_references_resolve_in_one_pass() {
        assert_eq!(decode_entities("&amp;amp;lt;"), "<");
        assert_eq!(decode_entities("&amp;&amp;"), "&&");
        assert_eq!(decode_entities("&amp;"), "&");
        let deep = format!("&{}lt;", "amp;".repeat(50_000));
        assert_eq!(strip_once(&deep), "<");
    }

    #[test]
    fn next_match_only_searches_forward() {
        let text = "a>b>c";
        let mut gt = NextMatch::new(">");
        assert_eq!(gt.at_or_after(text, 0), Some(1));
        assert_eq!(gt.at_or_after(text, 1), Some(1));
        assert_eq!(gt.at_or_after(text, 2), Some(3));
        assert_eq!(gt.at_or_after(text, 4), None);
        assert!(gt.exhausted);
        assert_eq!(gt.at_or_after(text, 4), None);
    }

    #[test]
    fn unclosed_brackets_on_large_input() {
        let text = "<a ".repeat(200_000);
        assert_eq!(strip_markup(&text), text.trim_end());

        let scripts = "<script>x ".repeat(50_000);
        assert_eq!(strip_markup(&scripts), "x ".repeat(50_000).trim_end());

        let comments = format!("keep {}", "<!-- open ".repeat(50_000));
        assert_eq!(strip_markup(&comments), "keep");
    }

    #[test]
    fn control_characters_are_removed() {
        assert_eq!(strip_markup("a\u{0}b&#7;c"), "abc");
    }

    #[test]
    fn handles_multibyte_text_around_tags() {
        assert_eq!(strip_markup("<p>日本語</p><i>テキスト</i>"), "日本語 テキスト");
    }

    #[test]
    fn idempotent_on_awkward_inputs() {
        let inputs = [
            "<p>Hello <b>world</b></p>",
            "&amp;lt;p&amp;gt;double escaped",
            "<<b>>weird<</b>>",
            "a < b > c",
            "<script>unterminated",
            "&lt;!-- comment --&gt; after",
            "tail <",
            "<a href='x'>link</a>&nbsp;&#160;&#xA0;",
            "x &lt;y and z&gt; w",
            "&amp;amp;lt;b&amp;amp;gt;deep",
            "<a <a <a",
            "  \t plain text\n",
            "",
        ];
        for input in inputs {
            let once = strip_markup(input);
            assert_eq!(strip_markup(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn plain_text_is_unchanged_apart_from_whitespace() {
        assert_eq!(
            strip_markup("The quick brown fox.\n\nNew paragraph."),
            "The quick brown fox. New paragraph."
        );
    }
}
