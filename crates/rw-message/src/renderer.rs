//! Message text renderer.
//!
//! # Pipeline
//!
//! 1. Links and emails in the raw text are rewritten as markdown links
//! 2. The markdown is parsed and passed through the source plugin chain
//! 3. The event stream is built into a tree and passed through the tree chain
//! 4. Elements outside the allow-list are unwrapped, link targets sanitized
//! 5. The tree is rendered to HTML with the tag renderers

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use pulldown_cmark::{Options, Parser};
use rayon::prelude::*;
use rw_linkify::{MentionedUser, linkify_markdown};

use crate::builder::build_tree;
use crate::config::MessageConfig;
use crate::error::RenderError;
use crate::filter::{DEFAULT_ALLOWED_TAG_NAMES, unwrap_disallowed};
use crate::plugin::{
    SourceEvents, SourcePluginConfigurator, SourcePluginList, TreePluginConfigurator,
    TreePluginList, default_source_plugins, default_tree_plugins, identity_source_configurator,
    identity_tree_configurator,
};
use crate::sanitize::sanitize_links;
use crate::tags::{TagRenderer, TagRenderers};
use crate::tree::{Node, Root};

static DEFAULT_RENDERER: LazyLock<TextRenderer> = LazyLock::new(TextRenderer::new);

/// Result of rendering one message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedText {
    /// Filtered and sanitized output tree.
    pub tree: Root,
    /// HTML produced from `tree` by the tag renderers.
    pub html: String,
}

impl RenderedText {
    fn plain(text: &str) -> Self {
        let tree = Root::new(vec![Node::text(text)]);
        let html = crate::tags::escape_html(text);
        Self { tree, html }
    }
}

/// One message of a batch passed to [`TextRenderer::render_all`].
#[derive(Clone, Copy, Debug, Default)]
pub struct MessageText<'a> {
    pub text: Option<&'a str>,
    pub mentioned_users: &'a [MentionedUser],
}

impl<'a> MessageText<'a> {
    #[must_use]
    pub fn new(text: &'a str) -> Self {
        Self {
            text: Some(text),
            mentioned_users: &[],
        }
    }

    #[must_use]
    pub fn with_mentioned_users(mut self, users: &'a [MentionedUser]) -> Self {
        self.mentioned_users = users;
        self
    }
}

/// Renders chat message text into a restricted tree.
///
/// A renderer holds only configuration and can be shared between threads;
/// every [`render`](Self::render) call is independent.
///
/// # Example
///
/// ```
/// use rw_message::{MentionedUser, TextRenderer};
///
/// let renderer = TextRenderer::new();
/// let users = [MentionedUser::new("u1", "bob")];
/// let rendered = renderer
///     .render(Some("hey @bob, see www.example.com"), Some(&users[..]))
///     .unwrap()
///     .unwrap();
///
/// assert_eq!(rendered.tree.find_all("mention").len(), 1);
/// assert_eq!(rendered.tree.find_all("a")[0].attr("href"), Some("http://www.example.com"));
/// ```
#[derive(Clone)]
pub struct TextRenderer {
    allowed_tag_names: Vec<String>,
    tag_renderers: TagRenderers,
    source_plugins: SourcePluginConfigurator,
    tree_plugins: TreePluginConfigurator,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRenderer")
            .field("allowed_tag_names", &self.allowed_tag_names)
            .field("tag_renderers", &self.tag_renderers)
            .finish_non_exhaustive()
    }
}

impl TextRenderer {
    /// Create a renderer with the default allow-list, renderers and plugins.
    #[must_use]
    pub fn new() -> Self {
        Self {
            allowed_tag_names: DEFAULT_ALLOWED_TAG_NAMES
                .iter()
                .map(|&tag| tag.to_owned())
                .collect(),
            tag_renderers: TagRenderers::default(),
            source_plugins: identity_source_configurator(),
            tree_plugins: identity_tree_configurator(),
        }
    }

    /// Create a renderer whose allow-list comes from `config`.
    #[must_use]
    pub fn from_config(config: &MessageConfig) -> Self {
        Self::new().with_allowed_tag_names(config.allowed_tag_names())
    }

    /// Replace the allow-list of tag names.
    #[must_use]
    pub fn with_allowed_tag_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_tag_names.clear();
        for name in names {
            let name = name.into();
            if !self.allowed_tag_names.contains(&name) {
                self.allowed_tag_names.push(name);
            }
        }
        self
    }

    /// Render elements with tag `tag` using `renderer`.
    ///
    /// Overrides the built-in renderer for the same tag, if any.
    #[must_use]
    pub fn with_tag_renderer<R>(mut self, tag: impl Into<String>, renderer: R) -> Self
    where
        R: TagRenderer + 'static,
    {
        self.tag_renderers.insert(tag, Arc::new(renderer));
        self
    }

    /// Configure the source plugin chain.
    ///
    /// `configure` receives the default chain and returns the chain to run.
    #[must_use]
    pub fn with_source_plugins<F>(mut self, configure: F) -> Self
    where
        F: Fn(SourcePluginList) -> SourcePluginList + Send + Sync + 'static,
    {
        self.source_plugins = Arc::new(configure);
        self
    }

    /// Configure the tree plugin chain.
    ///
    /// `configure` receives the default chain (which depends on whether the
    /// message mentions anyone) and returns the chain to run.
    #[must_use]
    pub fn with_tree_plugins<F>(mut self, configure: F) -> Self
    where
        F: Fn(TreePluginList) -> TreePluginList + Send + Sync + 'static,
    {
        self.tree_plugins = Arc::new(configure);
        self
    }

    #[must_use]
    pub fn allowed_tag_names(&self) -> &[String] {
        &self.allowed_tag_names
    }

    #[must_use]
    pub fn tag_renderers(&self) -> &TagRenderers {
        &self.tag_renderers
    }

    /// Render one message.
    ///
    /// Returns `Ok(None)` for missing or empty text. Text that is at most one
    /// UTF-16 code unit once trimmed is returned as a single text node without
    /// any markdown processing.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Plugin`] when a plugin fails and
    /// [`RenderError::DuplicatePlugin`] when a configured chain names the same
    /// plugin twice.
    pub fn render(
        &self,
        text: Option<&str>,
        mentioned_users: Option<&[MentionedUser]>,
    ) -> Result<Option<RenderedText>, RenderError> {
        let Some(text) = text.filter(|text| !text.is_empty()) else {
            return Ok(None);
        };
        // Measured in UTF-16 units: a lone astral emoji still goes through the pipeline.
        if text.trim().encode_utf16().count() <= 1 {
            return Ok(Some(RenderedText::plain(text)));
        }
        let mentioned_users = mentioned_users.unwrap_or_default();

        let source_plugins = (self.source_plugins)(default_source_plugins());
        ensure_unique_names(source_plugins.iter().map(|plugin| plugin.name()))?;
        let tree_plugins = (self.tree_plugins)(default_tree_plugins(mentioned_users));
        ensure_unique_names(tree_plugins.iter().map(|plugin| plugin.name()))?;
        tracing::trace!(
            source_plugins = source_plugins.len(),
            tree_plugins = tree_plugins.len(),
            "Rendering message"
        );

        let markdown = linkify_markdown(text, mentioned_users);

        let options = source_plugins
            .iter()
            .fold(Options::empty(), |options, plugin| options | plugin.parser_options());
        let mut events: SourceEvents<'_> =
            Parser::new_ext(&markdown, options).into_offset_iter().collect();
        for plugin in &source_plugins {
            events = plugin.transform(&markdown, events)?;
        }

        let mut tree = build_tree(events.into_iter().map(|(event, _)| event));
        for plugin in &tree_plugins {
            plugin.transform(&mut tree)?;
        }

        let allowed: HashSet<&str> = self.allowed_tag_names.iter().map(String::as_str).collect();
        unwrap_disallowed(&mut tree.children, &allowed);
        sanitize_links(&mut tree.children);

        let html = self.tag_renderers.render(&tree);
        Ok(Some(RenderedText { tree, html }))
    }

    /// Render many messages in parallel.
    ///
    /// Results are in the same order as `messages`.
    pub fn render_all(
        &self,
        messages: &[MessageText<'_>],
    ) -> Vec<Result<Option<RenderedText>, RenderError>> {
        let results: Vec<_> = messages
            .par_iter()
            .map(|message| self.render(message.text, Some(message.mentioned_users)))
            .collect();
        tracing::trace!(count = results.len(), "Rendered message batch");
        results
    }
}

/// Render one message with the default renderer.
///
/// # Errors
///
/// See [`TextRenderer::render`]. The default plugin chains never fail.
pub fn render_text(
    text: Option<&str>,
    mentioned_users: Option<&[MentionedUser]>,
) -> Result<Option<RenderedText>, RenderError> {
    DEFAULT_RENDERER.render(text, mentioned_users)
}

fn ensure_unique_names<'a>(names: impl Iterator<Item = &'a str>) -> Result<(), RenderError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(RenderError::DuplicatePlugin(name.to_owned()));
        }
    }
    Ok(())
}
