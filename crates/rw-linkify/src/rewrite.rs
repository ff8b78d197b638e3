//! Rewriting detected links into explicit markdown link syntax.
//!
//! Each distinct literal value becomes one rewrite rule, applied to every
//! occurrence of that value in a single pass. Rules run longest value first
//! against the text as left by earlier rules; occurrences inside a link that
//! an earlier rule inserted, or inside a mention kept verbatim, are left
//! alone, so `www.example.com` and `example.com` in the same message never
//! corrupt each other.

use std::cmp::Reverse;
use std::ops::Range;

use regex::{Regex, RegexBuilder};

use crate::extract::{LinkKind, LinkMatch, find_links};
use crate::mention::{MentionedUser, is_mention_occurrence, names_mentioned_user};
use crate::patterns::{
    MarkdownLinkSpan, escape_for_regex, find_code_spans, find_markdown_link_spans,
    strip_http_prefix,
};
use crate::uri::{format_url_for_display, normalize_href};

/// Detect links and emails in `text` and rewrite them as `[label](href)`.
///
/// This is the full pre-processing step run on a chat message before it is
/// handed to the markdown parser.
///
/// # Examples
///
/// ```
/// use rw_linkify::linkify_markdown;
///
/// assert_eq!(
///     linkify_markdown("docs at www.example.com", &[]),
///     "docs at [example.com](http://www.example.com)"
/// );
/// assert_eq!(linkify_markdown("`www.example.com`", &[]), "`www.example.com`");
/// ```
#[must_use]
pub fn linkify_markdown(text: &str, mentioned_users: &[MentionedUser]) -> String {
    let code_spans = find_code_spans(text);
    let markdown_links = find_markdown_link_spans(text);
    let links = find_links(text);
    rewrite_links(text, &links, &code_spans, &markdown_links, mentioned_users)
}

/// Rewrite every qualifying occurrence of `links` in `text` as markdown links.
///
/// A link is skipped entirely when its value appears inside any code span, or
/// when its scheme-stripped href and the scheme-stripped label or target of an
/// existing markdown link contain one another. For an email naming a
/// mentioned user, occurrences directly after `@` stay verbatim.
#[must_use]
pub fn rewrite_links(
    text: &str,
    links: &[LinkMatch],
    code_spans: &[&str],
    markdown_links: &[MarkdownLinkSpan<'_>],
    mentioned_users: &[MentionedUser],
) -> String {
    let mut ordered: Vec<&LinkMatch> = links.iter().filter(|l| !l.value.is_empty()).collect();
    ordered.sort_by_key(|link| Reverse(link.value.len()));

    let mut state = RewriteState::new(text);
    for link in ordered {
        if code_spans.iter().any(|span| span.contains(link.value.as_str())) {
            tracing::debug!(value = %link.value, "Skipping link found in code span");
            continue;
        }
        if is_already_markdown(link, markdown_links) {
            tracing::debug!(value = %link.value, "Skipping link already written as markdown");
            continue;
        }

        let pattern = match literal_pattern(&link.value) {
            Ok(pattern) => pattern,
            Err(e) => {
                tracing::warn!(value = %link.value, error = %e, "Skipping link with unusable pattern");
                continue;
            }
        };

        let label = match link.kind {
            LinkKind::Email => link.value.clone(),
            LinkKind::Url => format_url_for_display(&link.href),
        };
        let replacement = format!("[{label}]({})", normalize_href(&link.href));
        let keep_mentions =
            link.kind == LinkKind::Email && names_mentioned_user(&link.value, mentioned_users);

        state.replace_all(&pattern, &replacement, keep_mentions);
    }
    state.text
}

/// Upper bound on the compiled size of one rewrite pattern.
const LITERAL_PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// Regex matching `value` literally.
fn literal_pattern(value: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&escape_for_regex(value))
        .size_limit(LITERAL_PATTERN_SIZE_LIMIT)
        .build()
}

/// Bidirectional substring heuristic against links the author already wrote.
fn is_already_markdown(link: &LinkMatch, markdown_links: &[MarkdownLinkSpan<'_>]) -> bool {
    let stripped_href = strip_http_prefix(&link.href);
    if stripped_href.is_empty() {
        return false;
    }
    markdown_links
        .iter()
        .flat_map(MarkdownLinkSpan::parts)
        .map(strip_http_prefix)
        .any(|stripped| {
            !stripped.is_empty()
                && (stripped_href.contains(stripped) || stripped.contains(stripped_href))
        })
}

/// Text being rewritten plus the byte ranges no later rule may touch.
struct RewriteState {
    text: String,
    /// Inserted links and verbatim mentions. Sorted, non-overlapping.
    protected: Vec<Range<usize>>,
}

impl RewriteState {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_owned(),
            protected: Vec::new(),
        }
    }

    fn replace_all(&mut self, pattern: &Regex, replacement: &str, keep_mentions: bool) {
        let mut targets = Vec::new();
        let mut protected = std::mem::take(&mut self.protected);
        for range in pattern.find_iter(&self.text).map(|m| m.range()) {
            if protected.iter().any(|done| overlaps(done, &range)) {
                continue;
            }
            if keep_mentions && is_mention_occurrence(&self.text, range.start) {
                protected.push(range);
            } else {
                targets.push(range);
            }
        }
        protected.sort_by_key(|range| range.start);
        if targets.is_empty() {
            self.protected = protected;
            return;
        }

        let mut out = String::with_capacity(self.text.len() + targets.len() * replacement.len());
        let mut shifted = Vec::with_capacity(protected.len() + targets.len());
        let mut previous = protected.iter().peekable();
        let mut cursor = 0;

        for target in targets {
            while let Some(done) = previous.next_if(|done| done.start < target.start) {
                let start = out.len() + (done.start - cursor);
                shifted.push(start..start + (done.end - done.start));
            }
            out.push_str(&self.text[cursor..target.start]);
            let start = out.len();
            out.push_str(replacement);
            shifted.push(start..out.len());
            cursor = target.end;
        }
        for done in previous {
            let start = out.len() + (done.start - cursor);
            shifted.push(start..start + (done.end - done.start));
        }
        out.push_str(&self.text[cursor..]);

        self.text = out;
        self.protected = shifted;
    }
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn alice() -> Vec<MentionedUser> {
        vec![MentionedUser::new("alice", "alice@example.com")]
    }

    #[test]
    fn test_bare_url() {
        assert_eq!(
            linkify_markdown("visit example.com today", &[]),
            "visit [example.com](http://example.com) today"
        );
    }

    #[test]
    fn test_scheme_url_label_is_decoded_and_stripped() {
        assert_eq!(
            linkify_markdown("see https://www.example.com/a%20b", &[]),
            "see [example.com/a b](https://www.example.com/a%20b)"
        );
    }

    #[test]
    fn test_email() {
        assert_eq!(
            linkify_markdown("mail bob@example.com", &[]),
            "mail [bob@example.com](mailto:bob@example.com)"
        );
    }

    #[test]
    fn test_every_occurrence_rewritten() {
        assert_eq!(
            linkify_markdown("a.io a.io", &[]),
            "[a.io](http://a.io) [a.io](http://a.io)"
        );
    }

    #[test]
    fn test_value_in_code_span_skipped_everywhere() {
        let text = "`bob@example.com` and bob@example.com";
        assert_eq!(linkify_markdown(text, &[]), text);
    }

    #[test]
    fn test_fenced_code_skipped() {
        let text = "```\ncurl https://example.com/api\n```";
        assert_eq!(linkify_markdown(text, &[]), text);
    }

    #[test]
    fn test_existing_markdown_link_untouched() {
        let text = "read [the docs](https://example.com/docs)";
        assert_eq!(linkify_markdown(text, &[]), text);
    }

    #[test]
    fn test_idempotent() {
        let once = linkify_markdown("visit example.com or mail bob@example.com", &[]);
        assert_eq!(linkify_markdown(&once, &[]), once);
    }

    #[test]
    fn test_mention_occurrence_left_verbatim() {
        assert_eq!(
            linkify_markdown(
                "ping @alice@example.com now and email alice@example.com please",
                &alice()
            ),
            "ping @alice@example.com now and email \
             [alice@example.com](mailto:alice@example.com) please"
        );
    }

    #[test]
    fn test_at_prefixed_email_linked_without_mentioned_user() {
        assert_eq!(
            linkify_markdown("ping @alice@example.com", &[]),
            "ping @[alice@example.com](mailto:alice@example.com)"
        );
    }

    #[test]
    fn test_nested_values_do_not_corrupt() {
        assert_eq!(
            linkify_markdown("www.example.com and example.com", &[]),
            "[example.com](http://www.example.com) and [example.com](http://example.com)"
        );
    }

    #[test]
    fn test_verbatim_mention_protects_domain() {
        assert_eq!(
            linkify_markdown("hi @alice@example.com, see example.com", &alice()),
            "hi @alice@example.com, see [example.com](http://example.com)"
        );
    }

    #[test]
    fn test_dollar_in_url_is_literal() {
        assert_eq!(
            linkify_markdown("https://x.io/$1", &[]),
            "[x.io/$1](https://x.io/$1)"
        );
    }

    #[test]
    fn test_undecodable_url_falls_back_to_raw() {
        assert_eq!(
            linkify_markdown("https://x.io/100%", &[]),
            "[https://x.io/100%](https://x.io/100%)"
        );
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(linkify_markdown("", &[]), "");
    }

    #[test]
    fn test_rewrite_links_with_explicit_inputs() {
        let links = vec![LinkMatch {
            value: "example.com".to_owned(),
            href: "http://example.com".to_owned(),
            kind: LinkKind::Url,
        }];
        let spans = [MarkdownLinkSpan {
            label: "x",
            target: "https://example.com",
        }];
        assert_eq!(
            rewrite_links("example.com", &links, &[], &spans, &[]),
            "example.com"
        );
        assert_eq!(
            rewrite_links("example.com", &links, &["`example.com`"], &[], &[]),
            "example.com"
        );
        assert_eq!(
            rewrite_links("example.com", &links, &[], &[], &[]),
            "[example.com](http://example.com)"
        );
    }

    #[test]
    fn test_literal_pattern_escapes() {
        let pattern = literal_pattern("a.io/$1?x=(y)").unwrap();
        assert!(pattern.is_match("see a.io/$1?x=(y)"));
        assert!(!pattern.is_match("abio/$1?x=(y)"));
    }

    #[test]
    fn test_oversized_link_left_literal() {
        let long = format!("https://x.io/{}", "a".repeat(LITERAL_PATTERN_SIZE_LIMIT));
        assert!(literal_pattern(&long).is_err());

        let text = format!("{long} and example.com");
        assert_eq!(
            linkify_markdown(&text, &[]),
            format!("{long} and [example.com](http://example.com)")
        );
    }

    #[test]
    fn test_inserted_ranges_track_shifts() {
        let mut state = RewriteState::new("ab ab");
        state.replace_all(&Regex::new("ab").unwrap(), "[ab](x)", false);
        assert_eq!(state.text, "[ab](x) [ab](x)");
        assert_eq!(state.protected, vec![0..7, 8..15]);

        state.replace_all(&Regex::new("x").unwrap(), "y", false);
        assert_eq!(state.text, "[ab](x) [ab](x)");
    }
}
