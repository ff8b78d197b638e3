//! Mention detection.

use regex::Regex;
use rw_linkify::MentionedUser;

use crate::error::PluginError;
use crate::plugin::TreePlugin;
use crate::tree::{Element, Node, Root, replace_text};

/// Elements whose text never contains mentions.
const SKIPPED_TAGS: &[&str] = &["code", "pre", "a", "mention"];

/// Turns `@handle` text for each mentioned user into `mention` elements.
///
/// A user's handle is their name, or their id when unnamed. Mention elements
/// carry the user in [`Element::mentioned_user`].
pub struct MentionPlugin {
    users: Vec<MentionedUser>,
    pattern: Option<Regex>,
}

impl MentionPlugin {
    #[must_use]
    pub fn new(mentioned_users: &[MentionedUser]) -> Self {
        let mut handles: Vec<&str> = mentioned_users
            .iter()
            .map(MentionedUser::handle)
            .filter(|handle| !handle.is_empty())
            .collect();
        handles.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        handles.dedup();

        let pattern = if handles.is_empty() {
            None
        } else {
            let alternation = handles
                .iter()
                .map(|handle| format!("@{}", regex::escape(handle)))
                .collect::<Vec<_>>()
                .join("|");
            match Regex::new(&alternation) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    tracing::warn!(error = %e, "Mention pattern could not be built");
                    None
                }
            }
        };

        Self {
            users: mentioned_users.to_vec(),
            pattern,
        }
    }

    fn user_for(&self, handle: &str) -> Option<&MentionedUser> {
        self.users
            .iter()
            .find(|user| user.handle() == handle)
            .or_else(|| self.users.iter().find(|user| user.id == handle))
    }

    fn split_mentions(&self, pattern: &Regex, text: &str) -> Option<Vec<Node>> {
        let mut nodes = Vec::new();
        let mut cursor = 0;
        for found in pattern.find_iter(text) {
            let Some(user) = self.user_for(&found.as_str()[1..]) else {
                continue;
            };
            if found.start() > cursor {
                nodes.push(Node::text(&text[cursor..found.start()]));
            }
            nodes.push(mention(found.as_str(), user.clone()).into());
            cursor = found.end();
        }
        if nodes.is_empty() {
            return None;
        }
        if cursor < text.len() {
            nodes.push(Node::text(&text[cursor..]));
        }
        Some(nodes)
    }

    /// Replace `@` + mailto link pairs naming a mentioned user with a mention.
    ///
    /// Users whose name is an email address are autolinked as emails by the
    /// markdown stage; the `@` before the link marks the mention.
    fn promote_email_mentions(&self, nodes: &mut Vec<Node>) {
        for index in 0..nodes.len() {
            if let Node::Element(element) = &mut nodes[index]
                && element.tag != "a"
            {
                if !SKIPPED_TAGS.contains(&element.tag.as_str()) {
                    self.promote_email_mentions(&mut element.children);
                }
                continue;
            }
            let Some((user, label)) = nodes[index]
                .as_element()
                .and_then(|link| self.emailed_user(link))
            else {
                continue;
            };
            let Some(Node::Text(before)) = index.checked_sub(1).and_then(|i| nodes.get_mut(i))
            else {
                continue;
            };
            if !before.ends_with('@') {
                continue;
            }
            before.pop();
            nodes[index] = mention(&format!("@{label}"), user.clone()).into();
        }
        nodes.retain(|node| node.as_text() != Some(""));
    }

    fn emailed_user(&self, link: &Element) -> Option<(&MentionedUser, String)> {
        if !link.attr("href")?.starts_with("mailto:") {
            return None;
        }
        let label = link.text_content();
        let user = self
            .users
            .iter()
            .find(|user| user.name.as_deref() == Some(label.as_str()))?;
        Some((user, label))
    }
}

impl TreePlugin for MentionPlugin {
    fn name(&self) -> &str {
        "mention"
    }

    fn transform(&self, tree: &mut Root) -> Result<(), PluginError> {
        self.promote_email_mentions(&mut tree.children);
        if let Some(pattern) = &self.pattern {
            replace_text(&mut tree.children, SKIPPED_TAGS, &mut |text: &str| {
                self.split_mentions(pattern, text)
            });
        }
        Ok(())
    }
}

fn mention(text: &str, user: MentionedUser) -> Element {
    Element::new("mention")
        .with_text(text)
        .with_mentioned_user(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn paragraph(children: Vec<Node>) -> Root {
        let mut p = Element::new("p");
        p.children = children;
        Root::new(vec![p.into()])
    }

    fn run(users: &[MentionedUser], mut root: Root) -> Root {
        MentionPlugin::new(users).transform(&mut root).unwrap();
        root
    }

    #[test]
    fn test_named_mention() {
        let bob = MentionedUser::new("u1", "Bob");
        let root = run(&[bob.clone()], paragraph(vec![Node::text("hi @Bob!")]));
        assert_eq!(
            root,
            paragraph(vec![
                Node::text("hi "),
                mention("@Bob", bob).into(),
                Node::text("!"),
            ])
        );
    }

    #[test]
    fn test_longest_handle_wins() {
        let users = [MentionedUser::new("u1", "al"), MentionedUser::new("u2", "alice")];
        let root = run(&users, paragraph(vec![Node::text("@alice and @al")]));
        let mentions = root.find_all("mention");
        assert_eq!(mentions.len(), 2);
        assert_eq!(mentions[0].text_content(), "@alice");
        assert_eq!(mentions[0].mentioned_user.as_ref().map(|u| u.id.as_str()), Some("u2"));
        assert_eq!(mentions[1].mentioned_user.as_ref().map(|u| u.id.as_str()), Some("u1"));
    }

    #[test]
    fn test_unnamed_user_by_id() {
        let root = run(
            &[MentionedUser::with_id("u7")],
            paragraph(vec![Node::text("cc @u7")]),
        );
        assert_eq!(root.find_all("mention")[0].text_content(), "@u7");
    }

    #[test]
    fn test_code_and_links_skipped() {
        let users = [MentionedUser::new("u1", "Bob")];
        let original = paragraph(vec![
            Element::new("code").with_text("@Bob").into(),
            Element::new("a")
                .with_attr("href", "https://x.io")
                .with_text("@Bob")
                .into(),
        ]);
        assert_eq!(run(&users, original.clone()), original);
    }

    #[test]
    fn test_email_named_user_promoted() {
        let alice = MentionedUser::new("u1", "alice@example.com");
        let link = || -> Node {
            Element::new("a")
                .with_attr("href", "mailto:alice@example.com")
                .with_text("alice@example.com")
                .into()
        };
        let root = run(
            &[alice.clone()],
            paragraph(vec![
                Node::text("ping @"),
                link(),
                Node::text(" and "),
                link(),
            ]),
        );
        assert_eq!(
            root,
            paragraph(vec![
                Node::text("ping "),
                mention("@alice@example.com", alice).into(),
                Node::text(" and "),
                link(),
            ])
        );
    }

    #[test]
    fn test_lone_at_link_becomes_mention_only() {
        let alice = MentionedUser::new("u1", "a@b.io");
        let root = run(
            &[alice],
            paragraph(vec![
                Node::text("@"),
                Element::new("a")
                    .with_attr("href", "mailto:a@b.io")
                    .with_text("a@b.io")
                    .into(),
            ]),
        );
        let Node::Element(p) = &root.children[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(p.children.len(), 1);
        assert_eq!(root.text_content(), "@a@b.io");
    }
}
