//! Tag renderers and HTML output.
//!
//! The output tree is turned into HTML by walking it bottom-up: children are
//! rendered first, then the element's renderer wraps them. Elements without a
//! registered renderer are written as plain HTML with escaped attributes.

use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;

use rw_linkify::MentionedUser;

use crate::tree::{Element, Node, Root};

/// Elements written without a closing tag.
const VOID_TAGS: &[&str] = &["br", "hr", "img", "input"];

/// What a [`TagRenderer`] sees for one element.
#[derive(Clone, Copy, Debug)]
pub struct TagContext<'a> {
    pub element: &'a Element,
    /// Already rendered HTML of the element's children.
    pub children: &'a str,
    /// Mentioned user of a `mention` element.
    ///
    /// Only filled in for renderers registered for `mention` through
    /// [`TagRenderers::insert`]; new renderers should read
    /// [`Element::mentioned_user`] instead.
    pub mentioned_user: Option<&'a MentionedUser>,
}

/// Renders one element kind to HTML.
///
/// Renderers must not assume anything about the element beyond its tag: a
/// custom plugin chain may produce elements in any shape.
///
/// Closures with the signature `Fn(&TagContext<'_>, &mut String)` implement
/// this trait.
pub trait TagRenderer: Send + Sync {
    fn render(&self, ctx: &TagContext<'_>, out: &mut String);
}

impl<F> TagRenderer for F
where
    F: Fn(&TagContext<'_>, &mut String) + Send + Sync,
{
    fn render(&self, ctx: &TagContext<'_>, out: &mut String) {
        self(ctx, out);
    }
}

/// Default `a` renderer.
///
/// Web and `mailto:` links open in a new tab; any other target (including a
/// neutralized one) renders the label only.
pub struct Anchor;

impl TagRenderer for Anchor {
    fn render(&self, ctx: &TagContext<'_>, out: &mut String) {
        let href = ctx.element.attr("href").unwrap_or_default();
        let is_url = href.starts_with("http");
        if !is_url && !href.starts_with("mailto:") {
            out.push_str(ctx.children);
            return;
        }
        out.push_str("<a");
        if is_url {
            out.push_str(r#" class="str-chat__message-url-link""#);
        }
        write!(
            out,
            r#" href="{}" rel="nofollow noreferrer noopener" target="_blank">{}</a>"#,
            escape_html(href),
            ctx.children
        )
        .unwrap();
    }
}

/// Default `emoji` renderer.
pub struct Emoji;

impl TagRenderer for Emoji {
    fn render(&self, ctx: &TagContext<'_>, out: &mut String) {
        write!(
            out,
            r#"<span class="inline-text-emoji" data-testid="emoji">{}</span>"#,
            ctx.children
        )
        .unwrap();
    }
}

/// Default `mention` renderer.
pub struct Mention;

impl TagRenderer for Mention {
    fn render(&self, ctx: &TagContext<'_>, out: &mut String) {
        out.push_str(r#"<span class="str-chat__message-mention""#);
        if let Some(user) = &ctx.element.mentioned_user {
            write!(out, r#" data-user-id="{}""#, escape_html(&user.id)).unwrap();
        }
        write!(out, ">{}</span>", ctx.children).unwrap();
    }
}

/// Supplies [`TagContext::mentioned_user`] to a caller's mention renderer.
struct LegacyMention(Arc<dyn TagRenderer>);

impl TagRenderer for LegacyMention {
    fn render(&self, ctx: &TagContext<'_>, out: &mut String) {
        let ctx = TagContext {
            mentioned_user: ctx.element.mentioned_user.as_ref(),
            ..*ctx
        };
        self.0.render(&ctx, out);
    }
}

/// Renderers by tag name.
#[derive(Clone)]
pub struct TagRenderers {
    renderers: HashMap<String, Arc<dyn TagRenderer>>,
}

impl Default for TagRenderers {
    /// The built-in `a`, `emoji` and `mention` renderers.
    fn default() -> Self {
        let mut renderers = Self::empty();
        renderers.insert("a", Arc::new(Anchor));
        renderers.insert("emoji", Arc::new(Emoji));
        // Reads the element's user itself, so it skips the legacy wrapper.
        renderers.renderers.insert("mention".to_owned(), Arc::new(Mention));
        renderers
    }
}

impl TagRenderers {
    /// No renderers at all: every element is written as plain HTML.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            renderers: HashMap::new(),
        }
    }

    /// Register `renderer` for `tag`, replacing any previous one.
    ///
    /// A renderer registered for `mention` also receives
    /// [`TagContext::mentioned_user`].
    pub fn insert(&mut self, tag: impl Into<String>, renderer: Arc<dyn TagRenderer>) {
        let tag = tag.into();
        let renderer: Arc<dyn TagRenderer> = if tag == "mention" {
            Arc::new(LegacyMention(renderer))
        } else {
            renderer
        };
        self.renderers.insert(tag, renderer);
    }

    #[must_use]
    pub fn get(&self, tag: &str) -> Option<&Arc<dyn TagRenderer>> {
        self.renderers.get(tag)
    }

    /// Render a whole tree.
    #[must_use]
    pub fn render(&self, root: &Root) -> String {
        let mut out = String::new();
        for node in &root.children {
            self.render_node(node, &mut out);
        }
        out
    }

    fn render_node(&self, node: &Node, out: &mut String) {
        match node {
            Node::Text(text) => out.push_str(&escape_html(text)),
            Node::Element(element) => {
                let mut children = String::new();
                for child in &element.children {
                    self.render_node(child, &mut children);
                }
                let ctx = TagContext {
                    element,
                    children: &children,
                    mentioned_user: None,
                };
                match self.get(&element.tag) {
                    Some(renderer) => renderer.render(&ctx, out),
                    None => write_element(&ctx, out),
                }
            }
        }
    }
}

impl std::fmt::Debug for TagRenderers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut tags: Vec<&String> = self.renderers.keys().collect();
        tags.sort();
        f.debug_struct("TagRenderers").field("tags", &tags).finish()
    }
}

/// Write an element as plain HTML.
pub fn write_element(ctx: &TagContext<'_>, out: &mut String) {
    let element = ctx.element;
    write!(out, "<{}", element.tag).unwrap();
    for (name, value) in &element.attrs {
        if value.is_empty() {
            write!(out, " {name}").unwrap();
        } else {
            write!(out, r#" {name}="{}""#, escape_html(value)).unwrap();
        }
    }
    out.push('>');
    if VOID_TAGS.contains(&element.tag.as_str()) {
        return;
    }
    write!(out, "{}</{}>", ctx.children, element.tag).unwrap();
}

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(element: Element) -> String {
        TagRenderers::default().render(&Root::new(vec![element.into()]))
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#x27;");
    }

    #[test]
    fn test_generic_element() {
        assert_eq!(
            render(Element::new("p").with_text("a < b")),
            "<p>a &lt; b</p>"
        );
        assert_eq!(
            render(
                Element::new("input")
                    .with_attr("type", "checkbox")
                    .with_attr("disabled", "")
            ),
            r#"<input disabled type="checkbox">"#
        );
    }

    #[test]
    fn test_anchor_url() {
        assert_eq!(
            render(
                Element::new("a")
                    .with_attr("href", "https://a.io/?x=1&y=2")
                    .with_text("a.io")
            ),
            r#"<a class="str-chat__message-url-link" href="https://a.io/?x=1&amp;y=2" rel="nofollow noreferrer noopener" target="_blank">a.io</a>"#
        );
    }

    #[test]
    fn test_anchor_mailto_has_no_url_class() {
        assert_eq!(
            render(
                Element::new("a")
                    .with_attr("href", "mailto:bob@a.io")
                    .with_text("bob@a.io")
            ),
            r#"<a href="mailto:bob@a.io" rel="nofollow noreferrer noopener" target="_blank">bob@a.io</a>"#
        );
    }

    #[test]
    fn test_anchor_other_target_renders_label() {
        assert_eq!(
            render(
                Element::new("a")
                    .with_attr("href", "javascript:void(0)")
                    .with_text("x")
            ),
            "x"
        );
    }

    #[test]
    fn test_emoji_and_mention() {
        assert_eq!(
            render(Element::new("emoji").with_text("\u{1F525}")),
            "<span class=\"inline-text-emoji\" data-testid=\"emoji\">\u{1F525}</span>"
        );
        assert_eq!(
            render(
                Element::new("mention")
                    .with_text("@bob")
                    .with_mentioned_user(MentionedUser::new("u1", "bob"))
            ),
            r#"<span class="str-chat__message-mention" data-user-id="u1">@bob</span>"#
        );
    }

    #[test]
    fn test_custom_renderer_overrides_default() {
        let mut renderers = TagRenderers::default();
        renderers.insert(
            "emoji",
            Arc::new(|ctx: &TagContext<'_>, out: &mut String| {
                write!(out, "<i>{}</i>", ctx.children).unwrap();
            }),
        );
        let html = renderers.render(&Root::new(vec![
            Element::new("emoji").with_text("x").into(),
        ]));
        assert_eq!(html, "<i>x</i>");
    }

    #[test]
    fn test_legacy_mention_field_supplied() {
        let mut renderers = TagRenderers::default();
        renderers.insert(
            "mention",
            Arc::new(|ctx: &TagContext<'_>, out: &mut String| {
                let name = ctx.mentioned_user.and_then(|u| u.name.as_deref());
                out.push_str(name.unwrap_or("nobody"));
            }),
        );
        let html = renderers.render(&Root::new(vec![
            Element::new("mention")
                .with_text("@bob")
                .with_mentioned_user(MentionedUser::new("u1", "bob"))
                .into(),
        ]));
        assert_eq!(html, "bob");
    }

    #[test]
    fn test_lookup_by_tag() {
        let defaults = TagRenderers::default();
        for tag in ["a", "emoji", "mention"] {
            assert!(defaults.get(tag).is_some(), "{tag}");
        }
        assert!(defaults.get("p").is_none());
        assert!(TagRenderers::empty().get("a").is_none());
    }

    #[test]
    fn test_empty_renderers_write_plain_html() {
        let html = TagRenderers::empty().render(&Root::new(vec![
            Element::new("emoji").with_text("x").into(),
        ]));
        assert_eq!(html, "<emoji>x</emoji>");
    }
}
