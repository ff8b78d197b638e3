//! Chat message text rendering.
//!
//! Turns raw message text into a restricted output tree and HTML:
//!
//! - Bare links and emails become markdown links (see [`rw_linkify`])
//! - Markdown is parsed with GFM tables, strikethrough and autolinks
//! - Emoji and `@mentions` become `emoji` and `mention` elements
//! - Elements outside the allow-list are unwrapped, keeping their content
//! - Link targets are sanitized; raw HTML is never rendered
//!
//! Both plugin chains and the tag renderers can be customized through
//! [`TextRenderer`].
//!
//! # Example
//!
//! ```
//! use rw_message::render_text;
//!
//! let rendered = render_text(Some("**hi** :wave: see example.com"), None)
//!     .unwrap()
//!     .unwrap();
//! assert!(rendered.html.starts_with("<p><strong>hi</strong> <span"));
//! assert_eq!(rendered.tree.find_all("a")[0].attr("href"), Some("http://example.com"));
//! ```

mod builder;
mod config;
mod error;
mod filter;
mod plugin;
mod plugins;
mod renderer;
mod sanitize;
mod tags;
mod tree;

pub use config::MessageConfig;
pub use error::{ConfigError, PluginError, RenderError};
pub use filter::DEFAULT_ALLOWED_TAG_NAMES;
pub use plugin::{
    SourceEvents, SourcePlugin, SourcePluginConfigurator, SourcePluginList, TreePlugin,
    TreePluginConfigurator, TreePluginList, default_source_plugins, default_tree_plugins,
};
pub use plugins::{EmojiPlugin, GfmPlugin, MentionPlugin, shortcode_glyph};
pub use renderer::{MessageText, RenderedText, TextRenderer, render_text};
pub use rw_linkify::MentionedUser;
pub use sanitize::{NEUTRALIZED_URI, transform_link_uri};
pub use tags::{
    Anchor, Emoji, Mention, TagContext, TagRenderer, TagRenderers, escape_html, write_element,
};
pub use tree::{Element, Node, Root};
