//! URL and email detection.
//!
//! Finds scheme-qualified URLs, bare domains and email addresses in raw text.
//! Detection is purely syntactic: no network access, no validation beyond the
//! shape of the string and the ICANN top-level-domain list for bare domains
//! and emails.

use std::collections::HashSet;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

static SCHEME_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:https?|ftp)://[^\s<>"'`\[\]]+"#).expect("invalid scheme url regex")
});

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)[a-z0-9_%+-](?:[a-z0-9._%+-]*[a-z0-9_%+-])?@(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+([a-z]{2,})\b",
    )
    .expect("invalid email regex")
});

static BARE_DOMAIN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)\b(?:www\.)?(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+([a-z]{2,})\b(?::\d{2,5})?(?:[/?#][^\s<>"'`\[\]]*)?"#,
    )
    .expect("invalid bare domain regex")
});

/// Top-level domains accepted for bare (scheme-less) links and emails.
static TOP_LEVEL_DOMAINS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    include_str!("tlds.txt")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect()
});

/// Characters that, directly before a bare domain, mean it is part of a larger token.
const BARE_DOMAIN_BLOCKERS: &[char] = &['@', '.', '-', '/', '_'];

/// Kind of a detected link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum LinkKind {
    /// Email address, linked with `mailto:`.
    Email,
    /// Web URL, scheme-qualified or bare domain.
    Url,
}

/// A link candidate found in message text.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinkMatch {
    /// Literal substring found in the text.
    pub value: String,
    /// Normalized target (`mailto:` for emails, `http://` added to bare domains).
    pub href: String,
    /// Whether this is an email or a URL.
    pub kind: LinkKind,
}

impl LinkMatch {
    fn email(value: &str) -> Self {
        Self {
            value: value.to_owned(),
            href: format!("mailto:{value}"),
            kind: LinkKind::Email,
        }
    }

    fn url(value: &str) -> Self {
        let href = if value.contains("://") {
            value.to_owned()
        } else {
            format!("http://{value}")
        };
        Self {
            value: value.to_owned(),
            href,
            kind: LinkKind::Url,
        }
    }
}

/// Find all links and emails in `text`, deduplicated by literal value.
///
/// Emails come first, then URLs; within each kind, order of first occurrence.
/// A URL that contains an `@` (`https://user@host/`) is never reported as an
/// email, and the domain part of an email is never reported as a bare URL.
///
/// # Examples
///
/// ```
/// use rw_linkify::{LinkKind, find_links};
///
/// let links = find_links("mail bob@example.com or see www.example.com");
/// assert_eq!(links[0].kind, LinkKind::Email);
/// assert_eq!(links[0].href, "mailto:bob@example.com");
/// assert_eq!(links[1].href, "http://www.example.com");
/// ```
#[must_use]
pub fn find_links(text: &str) -> Vec<LinkMatch> {
    let Candidates { emails, urls } = Candidates::scan(text);

    let mut seen = HashSet::new();
    let mut links = Vec::with_capacity(emails.len() + urls.len());
    for (_, value) in &emails {
        if seen.insert(*value) {
            links.push(LinkMatch::email(value));
        }
    }
    for (_, value) in &urls {
        if seen.insert(*value) {
            links.push(LinkMatch::url(value));
        }
    }

    tracing::trace!(
        emails = emails.len(),
        urls = urls.len(),
        unique = links.len(),
        "Extracted link candidates"
    );
    links
}

/// One occurrence of a link candidate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocatedLink {
    /// Byte range of the occurrence in the scanned text.
    pub range: Range<usize>,
    pub link: LinkMatch,
}

/// Find every occurrence of a link or email in `text`, in text order.
///
/// Unlike [`find_links`] nothing is deduplicated, so the result can be used to
/// split the text around each occurrence.
#[must_use]
pub fn locate_links(text: &str) -> Vec<LocatedLink> {
    let Candidates { emails, urls } = Candidates::scan(text);
    let mut located: Vec<LocatedLink> = emails
        .into_iter()
        .map(|(range, value)| LocatedLink {
            range,
            link: LinkMatch::email(value),
        })
        .chain(urls.into_iter().map(|(range, value)| LocatedLink {
            range,
            link: LinkMatch::url(value),
        }))
        .collect();
    located.sort_by_key(|located| located.range.start);
    located
}

/// Non-overlapping email and URL occurrences, URLs sorted by position.
struct Candidates<'a> {
    emails: Vec<(Range<usize>, &'a str)>,
    urls: Vec<(Range<usize>, &'a str)>,
}

impl<'a> Candidates<'a> {
    fn scan(text: &'a str) -> Self {
        let scheme_urls = find_scheme_urls(text);
        let emails = find_emails(text, &scheme_urls);

        let mut taken: Vec<Range<usize>> =
            scheme_urls.iter().map(|(range, _)| range.clone()).collect();
        taken.extend(emails.iter().map(|(range, _)| range.clone()));
        let bare_urls = find_bare_urls(text, &taken);

        let mut urls: Vec<(Range<usize>, &str)> = scheme_urls.into_iter().chain(bare_urls).collect();
        urls.sort_by_key(|(range, _)| range.start);
        Self { emails, urls }
    }
}

fn find_scheme_urls(text: &str) -> Vec<(Range<usize>, &str)> {
    SCHEME_URL_PATTERN
        .find_iter(text)
        .filter_map(|m| {
            let value = trim_url_end(m.as_str());
            let (_, rest) = value.split_once("://")?;
            if rest.is_empty() {
                return None;
            }
            Some((m.start()..m.start() + value.len(), value))
        })
        .collect()
}

fn find_emails<'a>(
    text: &'a str,
    scheme_urls: &[(Range<usize>, &str)],
) -> Vec<(Range<usize>, &'a str)> {
    EMAIL_PATTERN
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let tld = caps.get(1)?.as_str();
            let range = whole.range();
            let inside_url = scheme_urls.iter().any(|(url, _)| overlaps(url, &range));
            (!inside_url && is_known_tld(tld)).then(|| (range, whole.as_str()))
        })
        .collect()
}

fn find_bare_urls<'a>(text: &'a str, taken: &[Range<usize>]) -> Vec<(Range<usize>, &'a str)> {
    BARE_DOMAIN_PATTERN
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let tld = caps.get(1)?.as_str();
            if !is_known_tld(tld) {
                return None;
            }
            let blocked = text[..whole.start()]
                .chars()
                .next_back()
                .is_some_and(|c| BARE_DOMAIN_BLOCKERS.contains(&c));
            if blocked {
                return None;
            }
            let value = trim_url_end(whole.as_str());
            let range = whole.start()..whole.start() + value.len();
            if taken.iter().any(|other| overlaps(other, &range)) {
                return None;
            }
            Some((range, value))
        })
        .collect()
}

/// Drop trailing punctuation that belongs to the sentence, not the URL.
///
/// A closing parenthesis is kept only while it balances an opening one inside
/// the URL, so `(see https://a.io/x)` yields `https://a.io/x` while
/// `https://en.wikipedia.org/wiki/Rust_(language)` stays intact.
fn trim_url_end(candidate: &str) -> &str {
    let mut current = candidate;
    while let Some(last) = current.chars().next_back() {
        let trim = match last {
            '.' | ',' | ':' | ';' | '!' | '?' | '*' | '_' | '~' => true,
            ')' => current.matches('(').count() < current.matches(')').count(),
            _ => false,
        };
        if !trim {
            break;
        }
        current = &current[..current.len() - last.len_utf8()];
    }
    current
}

fn is_known_tld(tld: &str) -> bool {
    TOP_LEVEL_DOMAINS.contains(tld.to_ascii_lowercase().as_str())
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}
