//! Markdown parsing into the owned [`Node`] tree.
//!
//! Parsing happens in three steps:
//! 1. optional relaxed-table source rewrite ([`relaxed`]),
//! 2. `pulldown-cmark` events folded into a tree by [`TreeBuilder`],
//! 3. attribute-list ([`ial`]) and table-span ([`spans`]) processing, which
//!    attach attribute fragments to nodes.
//!
//! After this point the tree is never modified again.

mod ial;
mod relaxed;
mod spans;

use std::borrow::Cow;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::ast::{Node, NodeKind};
use crate::options::ConvertOptions;
use crate::util::heading_level_to_num;

pub use ial::parse_attribute_list;

/// Parser options derived from conversion options.
#[must_use]
pub fn parser_options(options: &ConvertOptions) -> Options {
    let mut opts = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    if options.smart_punctuation {
        opts |= Options::ENABLE_SMART_PUNCTUATION;
    }
    opts
}

/// Parse markdown into a tree with attribute fragments attached.
#[must_use]
pub fn parse_document(markdown: &str, options: &ConvertOptions) -> Node {
    let source: Cow<'_, str> = if options.relaxed_tables {
        relaxed::mark_relaxed_tables(markdown)
    } else {
        Cow::Borrowed(markdown)
    };

    let parser = Parser::new_ext(&source, parser_options(options));
    let mut document = TreeBuilder::new().build(parser);
    ial::apply(&mut document);
    spans::apply(&mut document);
    document
}

/// Folds a flat event stream into a [`Node`] tree.
struct TreeBuilder {
    stack: Vec<Node>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            stack: vec![Node::new(NodeKind::Document)],
        }
    }

    fn build<'a, I>(mut self, events: I) -> Node
    where
        I: Iterator<Item = Event<'a>>,
    {
        for event in events {
            self.process_event(event);
        }
        while self.stack.len() > 1 {
            self.close();
        }
        self.stack
            .pop()
            .unwrap_or_else(|| Node::new(NodeKind::Document))
    }

    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.leaf(NodeKind::Code(code.into_string())),
            Event::Html(html) => self.leaf(NodeKind::Html(html.into_string())),
            Event::InlineHtml(html) => self.leaf(NodeKind::InlineHtml(html.into_string())),
            Event::SoftBreak => self.leaf(NodeKind::SoftBreak),
            Event::HardBreak => self.leaf(NodeKind::HardBreak),
            Event::Rule => self.leaf(NodeKind::ThematicBreak),
            Event::TaskListMarker(checked) => self.leaf(NodeKind::TaskListMarker(checked)),
            Event::FootnoteReference(_) | Event::InlineMath(_) | Event::DisplayMath(_) => {
                // Not supported
            }
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        let kind = match tag {
            Tag::Paragraph => NodeKind::Paragraph,
            Tag::Heading { level, .. } => NodeKind::Heading {
                level: heading_level_to_num(level),
            },
            Tag::BlockQuote(_) => NodeKind::BlockQuote,
            Tag::CodeBlock(kind) => NodeKind::CodeBlock {
                info: match kind {
                    CodeBlockKind::Fenced(info) => Some(info.into_string()),
                    CodeBlockKind::Indented => None,
                },
                literal: String::new(),
            },
            Tag::HtmlBlock => NodeKind::HtmlBlock,
            Tag::List(start) => NodeKind::List { start },
            Tag::Item => NodeKind::Item,
            Tag::Table(alignments) => NodeKind::Table { alignments },
            Tag::TableHead => NodeKind::TableRow { header: true },
            Tag::TableRow => NodeKind::TableRow { header: false },
            Tag::TableCell => NodeKind::TableCell,
            Tag::Emphasis => NodeKind::Emphasis,
            Tag::Strong => NodeKind::Strong,
            Tag::Strikethrough => NodeKind::Strikethrough,
            Tag::Superscript => NodeKind::Superscript,
            Tag::Subscript => NodeKind::Subscript,
            Tag::Link {
                link_type,
                dest_url,
                title,
                ..
            } => NodeKind::Link {
                link_type,
                url: dest_url.into_string(),
                title: title.into_string(),
            },
            Tag::Image {
                link_type,
                dest_url,
                title,
                ..
            } => NodeKind::Image {
                link_type,
                url: dest_url.into_string(),
                title: title.into_string(),
            },
            Tag::FootnoteDefinition(_)
            | Tag::MetadataBlock(_)
            | Tag::DefinitionList
            | Tag::DefinitionListTitle
            | Tag::DefinitionListDefinition => return,
        };
        self.stack.push(Node::new(kind));
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::FootnoteDefinition
            | TagEnd::MetadataBlock(_)
            | TagEnd::DefinitionList
            | TagEnd::DefinitionListTitle
            | TagEnd::DefinitionListDefinition => {}
            _ => self.close(),
        }
    }

    fn close(&mut self) {
        if self.stack.len() < 2 {
            return;
        }
        if let Some(node) = self.stack.pop()
            && let Some(parent) = self.stack.last_mut()
        {
            parent.children.push(node);
        }
    }

    fn top(&mut self) -> &mut Node {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn leaf(&mut self, kind: NodeKind) {
        self.top().children.push(Node::new(kind));
    }

    /// Append text, merging with a preceding text node.
    fn text(&mut self, text: &str) {
        let top = self.top();
        if let NodeKind::CodeBlock { literal, .. } = &mut top.kind {
            literal.push_str(text);
            return;
        }
        if let Some(Node {
            kind: NodeKind::Text(prev),
            ..
        }) = top.children.last_mut()
        {
            prev.push_str(text);
            return;
        }
        top.children.push(Node::text(text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(markdown: &str) -> Node {
        parse_document(markdown, &ConvertOptions::default())
    }

    #[test]
    fn test_paragraph_text_is_merged() {
        let doc = parse("Hello \\*world\\*");
        let para = &doc.children[0];
        assert_eq!(para.kind, NodeKind::Paragraph);
        assert_eq!(para.children.len(), 1);
        assert_eq!(para.plain_text(), "Hello *world*");
    }

    #[test]
    fn test_heading_level() {
        let doc = parse("### Title");
        assert_eq!(doc.children[0].kind, NodeKind::Heading { level: 3 });
    }

    #[test]
    fn test_code_block_literal() {
        let doc = parse("```rust\nfn main() {}\n```");
        match &doc.children[0].kind {
            NodeKind::CodeBlock { info, literal } => {
                assert_eq!(info.as_deref(), Some("rust"));
                assert_eq!(literal, "fn main() {}\n");
            }
            other => panic!("unexpected node {other:?}"),
        }
    }

    #[test]
    fn test_table_shape() {
        let doc = parse("| A | B |\n|---|---|\n| 1 | 2 |");
        let table = &doc.children[0];
        assert!(matches!(table.kind, NodeKind::Table { .. }));
        assert_eq!(table.children.len(), 2);
        assert_eq!(table.children[0].kind, NodeKind::TableRow { header: true });
        assert_eq!(table.children[1].kind, NodeKind::TableRow { header: false });
        assert_eq!(table.children[1].children.len(), 2);
    }

    #[test]
    fn test_tight_list_has_no_paragraphs() {
        let doc = parse("- one\n- two");
        let list = &doc.children[0];
        assert_eq!(list.kind, NodeKind::List { start: None });
        assert!(
            list.children
                .iter()
                .all(|item| item.children.iter().all(|c| c.kind != NodeKind::Paragraph))
        );
    }

    #[test]
    fn test_smart_punctuation_toggle() {
        let smart = parse("\"quoted\"");
        assert_eq!(smart.children[0].plain_text(), "\u{201c}quoted\u{201d}");

        let options = ConvertOptions {
            smart_punctuation: false,
            ..ConvertOptions::default()
        };
        let plain = parse_document("\"quoted\"", &options);
        assert_eq!(plain.children[0].plain_text(), "\"quoted\"");
    }
}
