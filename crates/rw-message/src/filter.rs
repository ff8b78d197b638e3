//! Allow-list filtering of the output tree.

use std::collections::HashSet;

use crate::tree::{Node, push_merged};

/// Tags a message may render when no allow-list is configured.
pub const DEFAULT_ALLOWED_TAG_NAMES: &[&str] = &[
    "html", "text", "br", "p", "em", "strong", "a", "ol", "ul", "li", "code", "pre", "blockquote",
    "del", "emoji", "mention",
];

/// Remove elements whose tag is not in `allowed`, keeping their children.
///
/// Children of a removed element take its place in the parent, so no text is
/// ever lost. Adjacent text nodes are merged afterwards.
pub(crate) fn unwrap_disallowed(nodes: &mut Vec<Node>, allowed: &HashSet<&str>) {
    let mut kept = Vec::with_capacity(nodes.len());
    for node in nodes.drain(..) {
        match node {
            Node::Text(_) => push_merged(&mut kept, node),
            Node::Element(mut element) => {
                unwrap_disallowed(&mut element.children, allowed);
                if allowed.contains(element.tag.as_str()) {
                    kept.push(Node::Element(element));
                } else {
                    tracing::trace!(tag = %element.tag, "Unwrapping disallowed element");
                    for child in element.children {
                        push_merged(&mut kept, child);
                    }
                }
            }
        }
    }
    *nodes = kept;
}
