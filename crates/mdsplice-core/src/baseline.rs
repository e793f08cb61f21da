//! Baseline HTML from the stock `pulldown-cmark` renderer.
//!
//! The tree is serialized back into an event stream without any attribute
//! fragments and handed to [`pulldown_cmark::html::push_html`] unchanged.
//! Everything the renderer cannot express is added afterwards by the
//! postprocessing stages.

use pulldown_cmark::{CodeBlockKind, CowStr, Event, Tag};

use crate::ast::{Node, NodeKind};
use crate::util::num_to_heading_level;

/// Render the tree with the unmodified renderer.
#[must_use]
pub fn render(document: &Node) -> String {
    let mut events = Vec::new();
    push_events(document, &mut events);
    let mut html = String::with_capacity(events.len() * 16);
    pulldown_cmark::html::push_html(&mut html, events.into_iter());
    html
}

fn push_events<'a>(node: &'a Node, events: &mut Vec<Event<'a>>) {
    let leaf = match &node.kind {
        NodeKind::Text(text) => Some(Event::Text(text.as_str().into())),
        NodeKind::Code(code) => Some(Event::Code(code.as_str().into())),
        NodeKind::Html(html) => Some(Event::Html(html.as_str().into())),
        NodeKind::InlineHtml(html) => Some(Event::InlineHtml(html.as_str().into())),
        NodeKind::SoftBreak => Some(Event::SoftBreak),
        NodeKind::HardBreak => Some(Event::HardBreak),
        NodeKind::ThematicBreak => Some(Event::Rule),
        NodeKind::TaskListMarker(checked) => Some(Event::TaskListMarker(*checked)),
        _ => None,
    };
    if let Some(event) = leaf {
        events.push(event);
        return;
    }

    let Some(tag) = start_tag(&node.kind) else {
        for child in &node.children {
            push_events(child, events);
        }
        return;
    };
    let end = tag.to_end();
    events.push(Event::Start(tag));
    if let NodeKind::CodeBlock { literal, .. } = &node.kind {
        if !literal.is_empty() {
            events.push(Event::Text(literal.as_str().into()));
        }
    } else {
        for child in &node.children {
            push_events(child, events);
        }
    }
    events.push(Event::End(end));
}

fn start_tag(kind: &NodeKind) -> Option<Tag<'_>> {
    let tag = match kind {
        NodeKind::Paragraph => Tag::Paragraph,
        NodeKind::Heading { level } => Tag::Heading {
            level: num_to_heading_level(*level),
            id: None,
            classes: Vec::new(),
            attrs: Vec::new(),
        },
        NodeKind::BlockQuote => Tag::BlockQuote(None),
        NodeKind::List { start } => Tag::List(*start),
        NodeKind::Item => Tag::Item,
        NodeKind::CodeBlock { info, .. } => Tag::CodeBlock(match info {
            Some(info) => CodeBlockKind::Fenced(info.as_str().into()),
            None => CodeBlockKind::Indented,
        }),
        NodeKind::HtmlBlock => Tag::HtmlBlock,
        NodeKind::Table { alignments } => Tag::Table(alignments.clone()),
        NodeKind::TableRow { header: true } => Tag::TableHead,
        NodeKind::TableRow { header: false } => Tag::TableRow,
        NodeKind::TableCell => Tag::TableCell,
        NodeKind::Emphasis => Tag::Emphasis,
        NodeKind::Strong => Tag::Strong,
        NodeKind::Strikethrough => Tag::Strikethrough,
        NodeKind::Superscript => Tag::Superscript,
        NodeKind::Subscript => Tag::Subscript,
        NodeKind::Link {
            link_type,
            url,
            title,
        } => Tag::Link {
            link_type: *link_type,
            dest_url: url.as_str().into(),
            title: title.as_str().into(),
            id: CowStr::Borrowed(""),
        },
        NodeKind::Image {
            link_type,
            url,
            title,
        } => Tag::Image {
            link_type: *link_type,
            dest_url: url.as_str().into(),
            title: title.as_str().into(),
            id: CowStr::Borrowed(""),
        },
        _ => return None,
    };
    Some(tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ConvertOptions;
    use crate::parse::parse_document;
    use pretty_assertions::assert_eq;

    fn baseline(markdown: &str) -> String {
        render(&parse_document(markdown, &ConvertOptions::default()))
    }

    #[test]
    fn test_blocks() {
        assert_eq!(
            baseline("# Title\n\nSome *text*.\n\n---\n"),
            "<h1>Title</h1>\n<p>Some <em>text</em>.</p>\n<hr />\n"
        );
    }

    #[test]
    fn test_attribute_lists_are_not_rendered() {
        assert_eq!(baseline("Lead {: .lead}"), "<p>Lead</p>\n");
    }

    #[test]
    fn test_table() {
        assert_eq!(
            baseline("| A | B |\n|---|---|\n| 1 | 2 |"),
            "<table><thead><tr><th>A</th><th>B</th></tr></thead><tbody>\n\
             <tr><td>1</td><td>2</td></tr>\n\
             </tbody></table>\n"
        );
    }

    #[test]
    fn test_code_block() {
        assert_eq!(
            baseline("```rust\nlet x = 1 < 2;\n```"),
            "<pre><code class=\"language-rust\">let x = 1 &lt; 2;\n</code></pre>\n"
        );
    }

    #[test]
    fn test_link_and_image() {
        assert_eq!(
            baseline("[a](https://x.org \"t\") ![i](p.png)"),
            "<p><a href=\"https://x.org\" title=\"t\">a</a> <img src=\"p.png\" alt=\"i\" /></p>\n"
        );
    }

    #[test]
    fn test_lists() {
        assert_eq!(
            baseline("- one\n- two\n\n3. three"),
            "<ul>\n<li>one</li>\n<li>two</li>\n</ul>\n<ol start=\"3\">\n<li>three</li>\n</ol>\n"
        );
    }
}
