//! Output tree produced by rendering a message.
//!
//! A deliberately small model: elements with a tag name, string attributes
//! and children, plus text leaves. `mention` elements additionally carry the
//! user they refer to.

use std::collections::BTreeMap;

use rw_linkify::MentionedUser;
use serde::{Deserialize, Serialize};

/// Root of a rendered message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Root {
    pub children: Vec<Node>,
}

/// A node in the output tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An element node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Tag kind, e.g. `p`, `a`, `emoji`, `mention`.
    pub tag: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
    /// User referenced by a `mention` element.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mentioned_user: Option<MentionedUser>,
}

impl Root {
    #[must_use]
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }

    /// Concatenated text of the whole tree.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    /// All elements with the given tag, in document order.
    #[must_use]
    pub fn find_all<'a>(&'a self, tag: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        collect_elements(&self.children, tag, &mut found);
        found
    }
}

impl Node {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    #[must_use]
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            Self::Text(_) => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Element(_) => None,
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: BTreeMap::new(),
            children: Vec::new(),
            mentioned_user: None,
        }
    }

    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        push_merged(&mut self.children, child.into());
        self
    }

    #[must_use]
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_child(Node::Text(text.into()))
    }

    #[must_use]
    pub fn with_mentioned_user(mut self, user: MentionedUser) -> Self {
        self.mentioned_user = Some(user);
        self
    }

    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

/// Append `node`, merging it into a preceding text node when both are text.
pub(crate) fn push_merged(nodes: &mut Vec<Node>, node: Node) {
    if let Node::Text(text) = &node {
        if text.is_empty() {
            return;
        }
        if let Some(Node::Text(last)) = nodes.last_mut() {
            last.push_str(text);
            return;
        }
    }
    nodes.push(node);
}

/// Replace text nodes with the nodes returned by `split`.
///
/// Descends into every element except those whose tag is in `skip`. Returning
/// `None` from `split` keeps the text node as is.
pub(crate) fn replace_text<F>(nodes: &mut Vec<Node>, skip: &[&str], split: &mut F)
where
    F: FnMut(&str) -> Option<Vec<Node>>,
{
    let mut index = 0;
    while index < nodes.len() {
        let replacement = match &mut nodes[index] {
            Node::Element(element) => {
                if !skip.contains(&element.tag.as_str()) {
                    replace_text(&mut element.children, skip, split);
                }
                None
            }
            Node::Text(text) => split(text),
        };
        match replacement {
            Some(replacement) => {
                let inserted = replacement.len();
                nodes.splice(index..=index, replacement);
                index += inserted;
            }
            None => index += 1,
        }
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) => collect_text(&element.children, out),
        }
    }
}

fn collect_elements<'a>(nodes: &'a [Node], tag: &str, found: &mut Vec<&'a Element>) {
    for node in nodes {
        if let Node::Element(element) = node {
            if element.tag == tag {
                found.push(element);
            }
            collect_elements(&element.children, tag, found);
        }
    }
}
