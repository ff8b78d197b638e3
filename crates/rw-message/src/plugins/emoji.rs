//! Emoji detection.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::PluginError;
use crate::plugin::TreePlugin;
use crate::tree::{Element, Node, Root, replace_text};

static SHORTCODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:([a-z0-9_+-]+):").expect("invalid shortcode regex"));

const ZERO_WIDTH_JOINER: char = '\u{200D}';

/// Shortcodes recognised in message text.
const SHORTCODES: &[(&str, &str)] = &[
    ("+1", "\u{1F44D}"),
    ("-1", "\u{1F44E}"),
    ("100", "\u{1F4AF}"),
    ("angry", "\u{1F620}"),
    ("blush", "\u{1F60A}"),
    ("broken_heart", "\u{1F494}"),
    ("clap", "\u{1F44F}"),
    ("confused", "\u{1F615}"),
    ("cry", "\u{1F622}"),
    ("eyes", "\u{1F440}"),
    ("fire", "\u{1F525}"),
    ("grin", "\u{1F601}"),
    ("grinning", "\u{1F600}"),
    ("heart", "\u{2764}\u{FE0F}"),
    ("heart_eyes", "\u{1F60D}"),
    ("joy", "\u{1F602}"),
    ("kissing_heart", "\u{1F618}"),
    ("laughing", "\u{1F606}"),
    ("muscle", "\u{1F4AA}"),
    ("ok_hand", "\u{1F44C}"),
    ("party_popper", "\u{1F389}"),
    ("pray", "\u{1F64F}"),
    ("raised_hands", "\u{1F64C}"),
    ("relaxed", "\u{263A}\u{FE0F}"),
    ("rocket", "\u{1F680}"),
    ("scream", "\u{1F631}"),
    ("see_no_evil", "\u{1F648}"),
    ("slightly_smiling_face", "\u{1F642}"),
    ("smile", "\u{1F604}"),
    ("smiley", "\u{1F603}"),
    ("sob", "\u{1F62D}"),
    ("sparkles", "\u{2728}"),
    ("star", "\u{2B50}"),
    ("sunglasses", "\u{1F60E}"),
    ("sweat_smile", "\u{1F605}"),
    ("tada", "\u{1F389}"),
    ("thinking", "\u{1F914}"),
    ("thumbsdown", "\u{1F44E}"),
    ("thumbsup", "\u{1F44D}"),
    ("warning", "\u{26A0}\u{FE0F}"),
    ("wave", "\u{1F44B}"),
    ("white_check_mark", "\u{2705}"),
    ("wink", "\u{1F609}"),
    ("x", "\u{274C}"),
];

/// Glyph for a shortcode name (without the surrounding colons).
///
/// ```
/// assert_eq!(rw_message::shortcode_glyph("fire"), Some("\u{1F525}"));
/// assert_eq!(rw_message::shortcode_glyph("nope"), None);
/// ```
#[must_use]
pub fn shortcode_glyph(name: &str) -> Option<&'static str> {
    SHORTCODES
        .iter()
        .find(|(code, _)| *code == name)
        .map(|(_, glyph)| *glyph)
}

/// Wraps emoji in text outside `code` and `pre` in `emoji` elements.
///
/// Known `:shortcode:` tokens are replaced by their glyph and keep the code in
/// a `data-shortcode` attribute.
pub struct EmojiPlugin;

impl TreePlugin for EmojiPlugin {
    fn name(&self) -> &str {
        "emoji"
    }

    fn transform(&self, tree: &mut Root) -> Result<(), PluginError> {
        replace_text(&mut tree.children, &["code", "pre"], &mut split_emoji);
        Ok(())
    }
}

fn split_emoji(text: &str) -> Option<Vec<Node>> {
    let mut nodes = Vec::new();
    let mut plain_start = 0;
    let mut pos = 0;
    while let Some(c) = text[pos..].chars().next() {
        match emoji_at(&text[pos..]) {
            Some((len, emoji)) => {
                if plain_start < pos {
                    nodes.push(Node::text(&text[plain_start..pos]));
                }
                nodes.push(emoji.into());
                pos += len;
                plain_start = pos;
            }
            None => pos += c.len_utf8(),
        }
    }
    if nodes.is_empty() {
        return None;
    }
    if plain_start < text.len() {
        nodes.push(Node::text(&text[plain_start..]));
    }
    Some(nodes)
}

/// Emoji element starting at the beginning of `rest`, with its byte length.
fn emoji_at(rest: &str) -> Option<(usize, Element)> {
    if rest.starts_with(':') {
        let caps = SHORTCODE_PATTERN.captures(rest)?;
        let code = caps.get(1)?.as_str();
        let glyph = shortcode_glyph(code)?;
        let len = caps.get(0)?.len();
        let emoji = Element::new("emoji")
            .with_attr("data-shortcode", code)
            .with_text(glyph);
        return Some((len, emoji));
    }
    let len = sequence_len(rest)?;
    Some((len, Element::new("emoji").with_text(&rest[..len])))
}

/// Length of the emoji sequence at the start of `rest`.
///
/// Covers skin tones, variation selectors, keycap marks, tag sequences, flag
/// pairs and zero-width-joiner chains.
fn sequence_len(rest: &str) -> Option<usize> {
    let mut chars = rest.chars();
    let first = chars.next()?;
    if !is_emoji_start(first) {
        return None;
    }
    let mut len = first.len_utf8();
    let mut complete = len;
    let mut flag_open = is_regional_indicator(first);
    let mut after_joiner = false;
    for c in chars {
        let extends = if after_joiner {
            is_emoji_start(c)
        } else if flag_open && is_regional_indicator(c) {
            true
        } else {
            c == ZERO_WIDTH_JOINER || is_emoji_modifier(c)
        };
        if !extends {
            break;
        }
        flag_open = false;
        after_joiner = c == ZERO_WIDTH_JOINER;
        len += c.len_utf8();
        if !after_joiner {
            complete = len;
        }
    }
    Some(complete)
}

fn is_emoji_start(c: char) -> bool {
    matches!(
        u32::from(c),
        0x1F000..=0x1FAFF
            | 0x2600..=0x27BF
            | 0x231A..=0x231B
            | 0x23E9..=0x23FA
            | 0x2B05..=0x2B07
            | 0x2B1B..=0x2B1C
            | 0x2B50
            | 0x2B55
            | 0x3030
            | 0x303D
            | 0x3297
            | 0x3299
    )
}

fn is_emoji_modifier(c: char) -> bool {
    matches!(
        u32::from(c),
        0xFE0E..=0xFE0F | 0x20E3 | 0x1F3FB..=0x1F3FF | 0xE0020..=0xE007F
    )
}

fn is_regional_indicator(c: char) -> bool {
    matches!(u32::from(c), 0x1F1E6..=0x1F1FF)
}
