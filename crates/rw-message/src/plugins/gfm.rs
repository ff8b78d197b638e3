//! GitHub Flavored Markdown extensions.

use std::ops::Range;

use pulldown_cmark::{CowStr, Event, LinkType, Options, Tag, TagEnd};
use rw_linkify::{LinkKind, LocatedLink, is_http_like, locate_links};

use crate::error::PluginError;
use crate::plugin::{SourceEvents, SourcePlugin};

/// Tables, task lists, `~~strikethrough~~` and autolink literals.
///
/// Strikethrough needs two tildes: a single `~` stays literal text.
pub struct GfmPlugin;

impl SourcePlugin for GfmPlugin {
    fn name(&self) -> &str {
        "gfm"
    }

    fn parser_options(&self) -> Options {
        Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
    }

    fn transform<'a>(
        &self,
        source: &'a str,
        events: SourceEvents<'a>,
    ) -> Result<SourceEvents<'a>, PluginError> {
        let events = revert_single_tilde(source, events);
        let events = merge_text(events);
        Ok(autolink_literals(events))
    }
}

fn revert_single_tilde<'a>(source: &str, events: SourceEvents<'a>) -> SourceEvents<'a> {
    let mut literal = Vec::new();
    events
        .into_iter()
        .map(|(event, range)| match event {
            Event::Start(Tag::Strikethrough) => {
                let single = !source
                    .get(range.start..)
                    .is_some_and(|rest| rest.starts_with("~~"));
                literal.push(single);
                if single {
                    (Event::Text(CowStr::Borrowed("~")), range)
                } else {
                    (Event::Start(Tag::Strikethrough), range)
                }
            }
            Event::End(TagEnd::Strikethrough) => {
                if literal.pop().unwrap_or(false) {
                    (Event::Text(CowStr::Borrowed("~")), range)
                } else {
                    (Event::End(TagEnd::Strikethrough), range)
                }
            }
            other => (other, range),
        })
        .collect()
}

/// Join consecutive text events so literals split by the parser are seen whole.
fn merge_text(events: SourceEvents<'_>) -> SourceEvents<'_> {
    let mut merged: SourceEvents<'_> = Vec::with_capacity(events.len());
    for (event, range) in events {
        if let Event::Text(text) = &event
            && let Some((Event::Text(previous), previous_range)) = merged.last_mut()
        {
            let mut joined = previous.to_string();
            joined.push_str(text);
            *previous = CowStr::from(joined);
            previous_range.end = range.end;
            continue;
        }
        merged.push((event, range));
    }
    merged
}

/// Link `www.`, `http(s)://` and email literals in text outside links, images and code.
fn autolink_literals(events: SourceEvents<'_>) -> SourceEvents<'_> {
    let mut out = Vec::with_capacity(events.len());
    let mut depth = 0usize;
    for (event, range) in events {
        match &event {
            Event::Start(Tag::Link { .. } | Tag::Image { .. } | Tag::CodeBlock(_)) => depth += 1,
            Event::End(TagEnd::Link | TagEnd::Image | TagEnd::CodeBlock) => {
                depth = depth.saturating_sub(1);
            }
            Event::Text(text) if depth == 0 => {
                let literals: Vec<LocatedLink> = locate_links(text)
                    .into_iter()
                    .filter(|l| l.link.kind == LinkKind::Email || is_http_like(&l.link.value))
                    .collect();
                if !literals.is_empty() {
                    tracing::trace!(count = literals.len(), "Autolinking literals");
                    push_autolinked(&mut out, text, literals, &range);
                    continue;
                }
            }
            _ => {}
        }
        out.push((event, range));
    }
    out
}

fn push_autolinked(
    out: &mut SourceEvents<'_>,
    text: &str,
    literals: Vec<LocatedLink>,
    range: &Range<usize>,
) {
    let mut cursor = 0;
    for LocatedLink { range: found, link } in literals {
        if found.start > cursor {
            let before = text[cursor..found.start].to_owned();
            out.push((Event::Text(CowStr::from(before)), range.clone()));
        }
        let link_type = match link.kind {
            LinkKind::Email => LinkType::Email,
            LinkKind::Url => LinkType::Autolink,
        };
        out.push((
            Event::Start(Tag::Link {
                link_type,
                dest_url: CowStr::from(link.href),
                title: CowStr::Borrowed(""),
                id: CowStr::Borrowed(""),
            }),
            range.clone(),
        ));
        out.push((Event::Text(CowStr::from(link.value)), range.clone()));
        out.push((Event::End(TagEnd::Link), range.clone()));
        cursor = found.end;
    }
    if cursor < text.len() {
        let after = text[cursor..].to_owned();
        out.push((Event::Text(CowStr::from(after)), range.clone()));
    }
}
