//! Link, email and mention rewriting for chat message markdown.
//!
//! Chat messages are written as loose text: bare URLs, email addresses and
//! `@mentions` appear next to occasional hand-written markdown. This crate
//! turns such text into markdown the parser can render safely:
//!
//! - [`find_links`] detects URLs and emails, deduplicated by literal value
//! - [`rewrite_links`] replaces them with `[label](href)` syntax, skipping
//!   code spans and links the author already wrote as markdown
//! - [`names_mentioned_user`] and [`is_mention_occurrence`] keep `@name`
//!   mentions intact when a user's name looks like an email address
//!
//! # Example
//!
//! ```
//! use rw_linkify::{MentionedUser, linkify_markdown};
//!
//! let users = [MentionedUser::new("u1", "alice@example.com")];
//! let markdown = linkify_markdown("hi @alice@example.com, see example.com", &users);
//! assert_eq!(
//!     markdown,
//!     "hi @alice@example.com, see [example.com](http://example.com)"
//! );
//! ```

mod extract;
mod mention;
mod patterns;
mod rewrite;
mod uri;

pub use extract::{LinkKind, LinkMatch, LocatedLink, find_links, locate_links};
pub use mention::{MentionedUser, is_mention_occurrence, names_mentioned_user};
pub use patterns::{
    MarkdownLinkSpan, escape_for_regex, find_code_spans, find_markdown_link_spans, is_http_like,
    strip_http_prefix,
};
pub use rewrite::{linkify_markdown, rewrite_links};
pub use uri::{UriError, decode_uri_component, encode_uri, format_url_for_display, normalize_href};
