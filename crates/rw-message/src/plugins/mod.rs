//! Built-in plugins.

mod emoji;
mod gfm;
mod mention;

pub use emoji::{EmojiPlugin, shortcode_glyph};
pub use gfm::GfmPlugin;
pub use mention::MentionPlugin;
