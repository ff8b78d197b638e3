//! Builds the output tree from markdown parser events.
//!
//! Raw HTML events never make it into the tree. Elements are opened on
//! `Start` events and attached to their parent on the matching `End`.

use pulldown_cmark::{Alignment, CodeBlockKind, Event, HeadingLevel, Tag, TagEnd};

use crate::tree::{Element, Node, Root, push_merged};

/// Build a tree from a stream of parser events.
pub(crate) fn build_tree<'a, I>(events: I) -> Root
where
    I: IntoIterator<Item = Event<'a>>,
{
    let mut builder = TreeBuilder::default();
    for event in events {
        builder.process_event(event);
    }
    builder.finish()
}

#[derive(Default)]
struct TreeBuilder {
    /// Top-level nodes.
    root: Vec<Node>,
    /// Elements opened but not yet closed.
    stack: Vec<Element>,
    alignments: Vec<Alignment>,
    cell_index: usize,
    in_table_head: bool,
    in_metadata: bool,
}

impl TreeBuilder {
    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => {
                if !self.in_metadata {
                    self.push(Node::text(text.into_string()));
                }
            }
            Event::Code(code) => {
                self.push(Element::new("code").with_text(code.into_string()).into());
            }
            Event::InlineMath(math) | Event::DisplayMath(math) => {
                self.push(Node::text(math.into_string()));
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                tracing::trace!(len = html.len(), "Dropping raw HTML");
            }
            Event::SoftBreak => self.push(Node::text("\n")),
            Event::HardBreak => self.push(Element::new("br").into()),
            Event::Rule => self.push(Element::new("hr").into()),
            Event::TaskListMarker(checked) => {
                let mut input = Element::new("input")
                    .with_attr("type", "checkbox")
                    .with_attr("disabled", "");
                if checked {
                    input = input.with_attr("checked", "");
                }
                self.push(input.into());
            }
            Event::FootnoteReference(label) => {
                self.push(Node::text(format!("[^{label}]")));
            }
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.open("p"),
            Tag::Heading { level, .. } => self.open(format!("h{}", heading_level_to_num(level))),
            Tag::BlockQuote(_) => self.open("blockquote"),
            Tag::CodeBlock(kind) => {
                self.open("pre");
                let mut code = Element::new("code");
                if let CodeBlockKind::Fenced(info) = kind
                    && let Some(lang) = info.split_whitespace().next()
                {
                    code = code.with_attr("class", format!("language-{lang}"));
                }
                self.stack.push(code);
            }
            Tag::List(Some(start)) => {
                let mut list = Element::new("ol");
                if start != 1 {
                    list = list.with_attr("start", start.to_string());
                }
                self.stack.push(list);
            }
            Tag::List(None) => self.open("ul"),
            Tag::Item => self.open("li"),
            Tag::FootnoteDefinition(_) | Tag::HtmlBlock => {}
            Tag::MetadataBlock(_) => self.in_metadata = true,
            Tag::DefinitionList => self.open("dl"),
            Tag::DefinitionListTitle => self.open("dt"),
            Tag::DefinitionListDefinition => self.open("dd"),
            Tag::Table(alignments) => {
                self.alignments = alignments;
                self.open("table");
            }
            Tag::TableHead => {
                self.in_table_head = true;
                self.cell_index = 0;
                self.open("thead");
                self.open("tr");
            }
            Tag::TableRow => {
                self.cell_index = 0;
                self.open("tr");
            }
            Tag::TableCell => {
                let mut cell = Element::new(if self.in_table_head { "th" } else { "td" });
                if let Some(align) = self.alignments.get(self.cell_index).and_then(alignment_name) {
                    cell = cell.with_attr("align", align);
                }
                self.stack.push(cell);
            }
            Tag::Emphasis => self.open("em"),
            Tag::Strong => self.open("strong"),
            Tag::Strikethrough => self.open("del"),
            Tag::Superscript => self.open("sup"),
            Tag::Subscript => self.open("sub"),
            Tag::Link {
                dest_url, title, ..
            } => {
                let mut link = Element::new("a").with_attr("href", dest_url.into_string());
                if !title.is_empty() {
                    link = link.with_attr("title", title.into_string());
                }
                self.stack.push(link);
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                let mut image = Element::new("img").with_attr("src", dest_url.into_string());
                if !title.is_empty() {
                    image = image.with_attr("title", title.into_string());
                }
                self.stack.push(image);
            }
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::FootnoteDefinition | TagEnd::HtmlBlock => {}
            TagEnd::MetadataBlock(_) => self.in_metadata = false,
            TagEnd::CodeBlock => {
                self.close();
                self.close();
            }
            TagEnd::TableHead => {
                self.close();
                self.close();
                self.in_table_head = false;
                self.open("tbody");
            }
            TagEnd::TableCell => {
                self.close();
                self.cell_index += 1;
            }
            TagEnd::Table => {
                if self.stack.last().is_some_and(|el| el.tag == "tbody") {
                    self.close();
                }
                self.close();
                self.alignments.clear();
            }
            TagEnd::Image => {
                if let Some(mut image) = self.stack.pop() {
                    let alt = image.text_content();
                    image.children.clear();
                    image = image.with_attr("alt", alt);
                    self.push(image.into());
                }
            }
            TagEnd::Paragraph
            | TagEnd::Heading(_)
            | TagEnd::BlockQuote(_)
            | TagEnd::List(_)
            | TagEnd::Item
            | TagEnd::DefinitionList
            | TagEnd::DefinitionListTitle
            | TagEnd::DefinitionListDefinition
            | TagEnd::TableRow
            | TagEnd::Emphasis
            | TagEnd::Strong
            | TagEnd::Strikethrough
            | TagEnd::Superscript
            | TagEnd::Subscript
            | TagEnd::Link => self.close(),
        }
    }

    fn open(&mut self, tag: impl Into<String>) {
        self.stack.push(Element::new(tag));
    }

    fn close(&mut self) {
        if let Some(element) = self.stack.pop() {
            self.push(element.into());
        }
    }

    fn push(&mut self, node: Node) {
        let siblings = match self.stack.last_mut() {
            Some(parent) => &mut parent.children,
            None => &mut self.root,
        };
        push_merged(siblings, node);
    }

    fn finish(mut self) -> Root {
        while !self.stack.is_empty() {
            self.close();
        }
        Root::new(self.root)
    }
}

fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn alignment_name(alignment: &Alignment) -> Option<&'static str> {
    match alignment {
        Alignment::None => None,
        Alignment::Left => Some("left"),
        Alignment::Center => Some("center"),
        Alignment::Right => Some("right"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use pulldown_cmark::{Options, Parser};

    fn build(markdown: &str) -> Root {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS;
        build_tree(Parser::new_ext(markdown, options))
    }

    #[test]
    fn test_paragraph_with_inline_markup() {
        let root = build("Hello **bold** and `code`");
        assert_eq!(
            root,
            Root::new(vec![
                Element::new("p")
                    .with_text("Hello ")
                    .with_child(Element::new("strong").with_text("bold"))
                    .with_text(" and ")
                    .with_child(Element::new("code").with_text("code"))
                    .into()
            ])
        );
    }

    #[test]
    fn test_fenced_code_block() {
        let root = build("```rust\nfn main() {}\n```");
        assert_eq!(
            root,
            Root::new(vec![
                Element::new("pre")
                    .with_child(
                        Element::new("code")
                            .with_attr("class", "language-rust")
                            .with_text("fn main() {}\n")
                    )
                    .into()
            ])
        );
    }

    #[test]
    fn test_ordered_list_start() {
        let root = build("3. three\n4. four");
        let list = root.find_all("ol");
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].attr("start"), Some("3"));
        assert_eq!(root.find_all("li").len(), 2);
    }

    #[test]
    fn test_table_structure() {
        let root = build("| a | b |\n|:--|--:|\n| 1 | 2 |");
        let table = root.find_all("table");
        assert_eq!(table.len(), 1);
        let tags: Vec<&str> = table[0]
            .children
            .iter()
            .filter_map(Node::as_element)
            .map(|el| el.tag.as_str())
            .collect();
        assert_eq!(tags, vec!["thead", "tbody"]);
        let headers = root.find_all("th");
        assert_eq!(headers[0].attr("align"), Some("left"));
        assert_eq!(headers[1].attr("align"), Some("right"));
        assert_eq!(root.find_all("td")[1].text_content(), "2");
    }

    #[test]
    fn test_image_alt_from_children() {
        let root = build("![a *cat*](cat.png \"Cat\")");
        let image = root.find_all("img")[0];
        assert_eq!(image.attr("src"), Some("cat.png"));
        assert_eq!(image.attr("alt"), Some("a cat"));
        assert_eq!(image.attr("title"), Some("Cat"));
        assert!(image.children.is_empty());
    }

    #[test]
    fn test_raw_html_dropped() {
        let root = build("hello <b>world</b>");
        assert_eq!(
            root,
            Root::new(vec![Element::new("p").with_text("hello world").into()])
        );
        assert_eq!(build("<script>alert(1)</script>"), Root::default());
    }

    #[test]
    fn test_task_list_marker() {
        let root = build("- [x] done");
        let input = root.find_all("input")[0];
        assert_eq!(input.attr("checked"), Some(""));
        assert_eq!(input.attr("type"), Some("checkbox"));
    }

    #[test]
    fn test_breaks() {
        let root = build("a\nb  \nc");
        assert_eq!(
            root,
            Root::new(vec![
                Element::new("p")
                    .with_text("a\nb")
                    .with_child(Element::new("br"))
                    .with_text("c")
                    .into()
            ])
        );
    }

    #[test]
    fn test_heading_level() {
        assert_eq!(build("### Title").find_all("h3").len(), 1);
    }
}
