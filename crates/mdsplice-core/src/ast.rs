//! Owned markdown syntax tree shared by every pipeline stage.
//!
//! The tree is produced once per conversion by [`crate::parse`] and is never
//! mutated afterwards. Upstream attribute-list processing stores its result as
//! an opaque *attribute fragment* on each node: literal HTML attribute text
//! (for example `" class=\"lead\""`) that later stages splice into tags.

use percent_encoding::percent_decode_str;
use pulldown_cmark::{Alignment, LinkType};

/// Maximum length (in characters) of a fingerprint.
pub const FINGERPRINT_LEN: usize = 50;

/// A node of the document tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub children: Vec<Node>,
    /// Attribute fragment attached by upstream attribute-list processing.
    pub attrs: Option<String>,
}

/// Block and inline node kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Document,
    Paragraph,
    Heading { level: u8 },
    BlockQuote,
    List { start: Option<u64> },
    Item,
    /// Fenced (`info` is `Some`) or indented code block.
    CodeBlock { info: Option<String>, literal: String },
    HtmlBlock,
    ThematicBreak,
    Table { alignments: Vec<Alignment> },
    /// Table row; the header row renders inside `<thead>`.
    TableRow { header: bool },
    TableCell,
    Text(String),
    Code(String),
    Html(String),
    InlineHtml(String),
    Emphasis,
    Strong,
    Strikethrough,
    Superscript,
    Subscript,
    Link { link_type: LinkType, url: String, title: String },
    Image { link_type: LinkType, url: String, title: String },
    SoftBreak,
    HardBreak,
    TaskListMarker(bool),
}

impl Node {
    #[must_use]
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
            attrs: None,
        }
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    #[must_use]
    pub fn with_attrs(mut self, attrs: impl Into<String>) -> Self {
        self.attrs = Some(attrs.into());
        self
    }

    /// Shorthand for a text leaf.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(NodeKind::Text(text.into()))
    }

    /// Attribute fragment, if present and non-blank.
    #[must_use]
    pub fn fragment(&self) -> Option<&str> {
        self.attrs.as_deref().filter(|a| !a.trim().is_empty())
    }

    /// Plain text content with line breaks folded into spaces.
    ///
    /// Used for heading slugs and the table of contents.
    #[must_use]
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out, " ");
        out
    }

    /// Plain text content with soft and hard breaks kept as `\n`.
    #[must_use]
    pub fn text_lines(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out, "\n");
        out
    }

    fn collect_text(&self, out: &mut String, line_break: &str) {
        match &self.kind {
            NodeKind::Text(t) | NodeKind::Code(t) => out.push_str(t),
            NodeKind::CodeBlock { literal, .. } => out.push_str(literal),
            NodeKind::SoftBreak | NodeKind::HardBreak => out.push_str(line_break),
            _ => {
                for child in &self.children {
                    child.collect_text(out, line_break);
                }
            }
        }
    }

    /// First non-blank literal text run in pre-order, cut at the first newline.
    ///
    /// Image subtrees are skipped: their text ends up inside the `alt`
    /// attribute of the rendered HTML, never as element content.
    #[must_use]
    pub fn first_text_run(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text(t) | NodeKind::Code(t) => first_line(t),
            NodeKind::CodeBlock { literal, .. } => first_line(literal),
            NodeKind::Image { .. } => None,
            _ => self.children.iter().find_map(Node::first_text_run),
        }
    }

    /// Drift-tolerant correlation key: the URL for links and images, the first
    /// text run for everything else.
    #[must_use]
    pub fn fingerprint(&self) -> Option<String> {
        match &self.kind {
            NodeKind::Link { url, .. } | NodeKind::Image { url, .. } => url_fingerprint(url),
            _ => self.first_text_run().and_then(make_fingerprint),
        }
    }
}

fn first_line(text: &str) -> Option<&str> {
    let line = text.trim_start().lines().next()?.trim();
    (!line.is_empty()).then_some(line)
}

/// Normalize a snippet into a fingerprint: first line, trimmed, truncated.
///
/// Shared by the AST side and the HTML side so both produce identical keys.
#[must_use]
pub fn make_fingerprint(text: &str) -> Option<String> {
    let line = first_line(text)?;
    Some(line.chars().take(FINGERPRINT_LEN).collect())
}

/// Fingerprint of a link or image target.
///
/// The renderer percent-encodes URLs and prefixes email autolinks with
/// `mailto:`, so both are undone before the key is built.
#[must_use]
pub fn url_fingerprint(url: &str) -> Option<String> {
    let url = url.trim();
    let url = match url.get(..7) {
        Some(scheme) if scheme.eq_ignore_ascii_case("mailto:") => &url[7..],
        _ => url,
    };
    make_fingerprint(&percent_decode_str(url).decode_utf8_lossy())
}
