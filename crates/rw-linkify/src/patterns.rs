//! Pattern predicates shared by the extractor and the rewriter.
//!
//! Every function here is total: arbitrary input (including the empty string)
//! produces a result, never a panic.

use std::sync::LazyLock;

use regex::Regex;

/// `[label](target)` with a greedy target, mirroring how chat clients detect
/// hand-written markdown links.
static MARKDOWN_LINK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\[]+)\]\((.*)\)").expect("invalid markdown link regex"));

/// Fenced blocks (with optional language tag) or inline backtick spans.
static CODE_SPAN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```[a-z]*\n[\s\S]*?\n```|`[a-z]*[\s\S]*?`").expect("invalid code span regex")
});

/// A `[label](target)` span already present in the message text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MarkdownLinkSpan<'a> {
    /// Text between the brackets.
    pub label: &'a str,
    /// Text between the parentheses.
    pub target: &'a str,
}

impl<'a> MarkdownLinkSpan<'a> {
    /// Label and target, in that order.
    #[must_use]
    pub fn parts(&self) -> [&'a str; 2] {
        [self.label, self.target]
    }
}

/// Check whether a string starts with a web scheme (`http://`, `https://`) or `www.`.
///
/// # Examples
///
/// ```
/// use rw_linkify::is_http_like;
///
/// assert!(is_http_like("https://example.com"));
/// assert!(is_http_like("WWW.example.com"));
/// assert!(!is_http_like("example.com"));
/// ```
#[must_use]
pub fn is_http_like(s: &str) -> bool {
    ["http://", "https://", "www."].iter().any(|prefix| {
        s.get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    })
}

/// Strip a leading `http://`/`https://` and then a leading `www.`.
///
/// Used for display labels and for comparing links, never for detection.
///
/// # Examples
///
/// ```
/// use rw_linkify::strip_http_prefix;
///
/// assert_eq!(strip_http_prefix("https://www.example.com/a"), "example.com/a");
/// assert_eq!(strip_http_prefix("example.com"), "example.com");
/// ```
#[must_use]
pub fn strip_http_prefix(s: &str) -> &str {
    let rest = s
        .strip_prefix("https://")
        .or_else(|| s.strip_prefix("http://"))
        .unwrap_or(s);
    rest.strip_prefix("www.").unwrap_or(rest)
}

/// Escape every regex metacharacter so `s` matches only itself.
#[must_use]
pub fn escape_for_regex(s: &str) -> String {
    regex::escape(s)
}

/// Find every `[label](target)` span in `text`.
#[must_use]
pub fn find_markdown_link_spans(text: &str) -> Vec<MarkdownLinkSpan<'_>> {
    MARKDOWN_LINK_PATTERN
        .captures_iter(text)
        .filter_map(|caps| {
            Some(MarkdownLinkSpan {
                label: caps.get(1)?.as_str(),
                target: caps.get(2)?.as_str(),
            })
        })
        .collect()
}

/// Find every fenced (```` ``` ````) or inline (`` ` ``) code span, delimiters included.
#[must_use]
pub fn find_code_spans(text: &str) -> Vec<&str> {
    CODE_SPAN_PATTERN
        .find_iter(text)
        .map(|m| m.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_http_like() {
        assert!(is_http_like("http://a.io"));
        assert!(is_http_like("HTTPS://a.io"));
        assert!(is_http_like("www.a.io"));
        assert!(!is_http_like("ftp://a.io"));
        assert!(!is_http_like(""));
        assert!(!is_http_like("ht"));
    }

    #[test]
    fn test_is_http_like_multibyte_prefix() {
        assert!(!is_http_like("héllo://"));
    }

    #[test]
    fn test_strip_http_prefix_variants() {
        assert_eq!(strip_http_prefix("http://example.com"), "example.com");
        assert_eq!(strip_http_prefix("https://example.com"), "example.com");
        assert_eq!(strip_http_prefix("www.example.com"), "example.com");
        assert_eq!(strip_http_prefix("mailto:a@b.io"), "mailto:a@b.io");
        assert_eq!(strip_http_prefix(""), "");
    }

    #[test]
    fn test_escape_for_regex() {
        let escaped = escape_for_regex("a.b*c(d)[e]+?");
        let re = Regex::new(&escaped).unwrap();
        assert!(re.is_match("a.b*c(d)[e]+?"));
        assert!(!re.is_match("aXb*c(d)[e]+?"));
    }

    #[test]
    fn test_find_markdown_link_spans() {
        let spans = find_markdown_link_spans("see [docs](https://example.com/docs) now");
        assert_eq!(
            spans,
            vec![MarkdownLinkSpan {
                label: "docs",
                target: "https://example.com/docs",
            }]
        );
        assert_eq!(spans[0].parts(), ["docs", "https://example.com/docs"]);
    }

    #[test]
    fn test_find_markdown_link_spans_one_per_line() {
        let spans = find_markdown_link_spans("[a](x.io)\n[b](y.io)");
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1].label, "b");
        assert_eq!(spans[1].target, "y.io");
    }

    #[test]
    fn test_find_markdown_link_spans_none() {
        assert!(find_markdown_link_spans("").is_empty());
        assert!(find_markdown_link_spans("[]() and [x]").is_empty());
    }

    #[test]
    fn test_find_code_spans_inline() {
        assert_eq!(
            find_code_spans("run `cargo doc` then `open`"),
            vec!["`cargo doc`", "`open`"]
        );
    }

    #[test]
    fn test_find_code_spans_fenced() {
        let text = "before\n```rust\nlet a = 1;\n```\nafter";
        assert_eq!(find_code_spans(text), vec!["```rust\nlet a = 1;\n```"]);
    }

    #[test]
    fn test_find_code_spans_empty() {
        assert!(find_code_spans("").is_empty());
        assert!(find_code_spans("no code here").is_empty());
    }
}
