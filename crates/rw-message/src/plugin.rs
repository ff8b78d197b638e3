//! Plugin traits and plugin chains.
//!
//! Rendering runs two chains: source plugins rewrite the markdown event
//! stream before the tree is built, tree plugins rewrite the finished tree.
//! Each chain starts from the built-in defaults and is passed through a
//! caller-supplied configurator that returns the final chain.

use std::ops::Range;
use std::sync::Arc;

use pulldown_cmark::{Event, Options};
use rw_linkify::MentionedUser;

use crate::error::PluginError;
use crate::plugins::{EmojiPlugin, GfmPlugin, MentionPlugin};
use crate::tree::Root;

/// Parser events paired with their byte range in the markdown source.
pub type SourceEvents<'a> = Vec<(Event<'a>, Range<usize>)>;

/// Plugin operating on the markdown event stream.
///
/// # Example
///
/// ```
/// use pulldown_cmark::{CowStr, Event};
/// use rw_message::{PluginError, SourceEvents, SourcePlugin};
///
/// struct Shout;
///
/// impl SourcePlugin for Shout {
///     fn name(&self) -> &str { "shout" }
///
///     fn transform<'a>(
///         &self,
///         _source: &'a str,
///         events: SourceEvents<'a>,
///     ) -> Result<SourceEvents<'a>, PluginError> {
///         Ok(events
///             .into_iter()
///             .map(|(event, range)| match event {
///                 Event::Text(text) => (Event::Text(CowStr::from(text.to_uppercase())), range),
///                 other => (other, range),
///             })
///             .collect())
///     }
/// }
/// ```
pub trait SourcePlugin: Send + Sync {
    /// Unique name within a chain.
    fn name(&self) -> &str;

    /// Parser extensions this plugin relies on.
    ///
    /// Options of all plugins in the chain are combined before parsing.
    fn parser_options(&self) -> Options {
        Options::empty()
    }

    /// Rewrite the event stream parsed from `source`.
    fn transform<'a>(
        &self,
        source: &'a str,
        events: SourceEvents<'a>,
    ) -> Result<SourceEvents<'a>, PluginError>;
}

/// Plugin operating on the output tree.
pub trait TreePlugin: Send + Sync {
    /// Unique name within a chain.
    fn name(&self) -> &str;

    fn transform(&self, tree: &mut Root) -> Result<(), PluginError>;
}

pub type SourcePluginList = Vec<Arc<dyn SourcePlugin>>;
pub type TreePluginList = Vec<Arc<dyn TreePlugin>>;

/// Receives the default source chain and returns the chain to run.
pub type SourcePluginConfigurator = Arc<dyn Fn(SourcePluginList) -> SourcePluginList + Send + Sync>;

/// Receives the default tree chain and returns the chain to run.
pub type TreePluginConfigurator = Arc<dyn Fn(TreePluginList) -> TreePluginList + Send + Sync>;

/// Built-in source chain: GFM extensions.
#[must_use]
pub fn default_source_plugins() -> SourcePluginList {
    vec![Arc::new(GfmPlugin)]
}

/// Built-in tree chain: emoji, plus mentions when `mentioned_users` is not empty.
#[must_use]
pub fn default_tree_plugins(mentioned_users: &[MentionedUser]) -> TreePluginList {
    let mut plugins: TreePluginList = vec![Arc::new(EmojiPlugin)];
    if !mentioned_users.is_empty() {
        plugins.push(Arc::new(MentionPlugin::new(mentioned_users)));
    }
    plugins
}

pub(crate) fn identity_source_configurator() -> SourcePluginConfigurator {
    Arc::new(|plugins: SourcePluginList| plugins)
}

pub(crate) fn identity_tree_configurator() -> TreePluginConfigurator {
    Arc::new(|plugins: TreePluginList| plugins)
}
