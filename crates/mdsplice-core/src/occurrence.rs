//! Occurrence counting shared by the AST walks and the HTML scans.
//!
//! Correlating the tree with the rendered HTML rests on one invariant: a
//! pre-order walk of the tree and a left-to-right scan of the HTML's opening
//! tags assign the same `(class, index)` pair to the same element. Both sides
//! go through [`CountableClass`] and [`OccurrenceCounter`] so the mapping is
//! defined in exactly one place.

use crate::ast::{Node, NodeKind};
use crate::fragment;

/// Correlation unit for occurrence counting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CountableClass {
    /// Paragraphs together with inline links and images.
    Paragraph,
    /// Headings of every level.
    Heading,
    Table,
    BlockQuote,
    List,
    Item,
    CodeBlock,
}

impl CountableClass {
    const COUNT: usize = 7;

    fn slot(self) -> usize {
        match self {
            Self::Paragraph => 0,
            Self::Heading => 1,
            Self::Table => 2,
            Self::BlockQuote => 3,
            Self::List => 4,
            Self::Item => 5,
            Self::CodeBlock => 6,
        }
    }

    /// Class of a tree node, `None` for nodes that are not counted.
    #[must_use]
    pub fn of_node(kind: &NodeKind) -> Option<Self> {
        match kind {
            NodeKind::Paragraph | NodeKind::Link { .. } | NodeKind::Image { .. } => {
                Some(Self::Paragraph)
            }
            NodeKind::Heading { .. } => Some(Self::Heading),
            NodeKind::Table { .. } => Some(Self::Table),
            NodeKind::BlockQuote => Some(Self::BlockQuote),
            NodeKind::List { .. } => Some(Self::List),
            NodeKind::Item => Some(Self::Item),
            NodeKind::CodeBlock { .. } => Some(Self::CodeBlock),
            _ => None,
        }
    }

    /// Class of an HTML tag name (lowercase), `None` for uncounted tags.
    #[must_use]
    pub fn of_tag(name: &str) -> Option<Self> {
        match name {
            "p" | "a" | "img" => Some(Self::Paragraph),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Some(Self::Heading),
            "table" => Some(Self::Table),
            "blockquote" => Some(Self::BlockQuote),
            "ul" | "ol" => Some(Self::List),
            "li" => Some(Self::Item),
            "pre" => Some(Self::CodeBlock),
            _ => None,
        }
    }

    /// Whether attributes go right after the tag name (block elements) or
    /// before the closing `>` (inline elements).
    #[must_use]
    pub fn is_inline_tag(name: &str) -> bool {
        matches!(name, "a" | "img")
    }
}

/// Per-class running counters.
#[derive(Clone, Debug, Default)]
pub struct OccurrenceCounter {
    counts: [usize; CountableClass::COUNT],
}

impl OccurrenceCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the next occurrence index of `class`.
    pub fn next(&mut self, class: CountableClass) -> usize {
        let slot = &mut self.counts[class.slot()];
        let index = *slot;
        *slot += 1;
        index
    }

    /// Index the next element of `class` will receive.
    #[must_use]
    pub fn peek(&self, class: CountableClass) -> usize {
        self.counts[class.slot()]
    }

    /// Count a tree node, returning its class and index when it is countable.
    pub fn visit(&mut self, node: &Node) -> Option<(CountableClass, usize)> {
        let class = CountableClass::of_node(&node.kind)?;
        Some((class, self.next(class)))
    }
}

/// Whether a tree walk should descend into `node`'s children.
///
/// Countable elements flagged for removal are dropped whole by the
/// reconciler, so neither side counts anything inside them. Rows and cells
/// are removed later by the table rewriter and stay transparent here.
#[must_use]
pub fn descends_into(node: &Node) -> bool {
    let removed = CountableClass::of_node(&node.kind).is_some()
        && node.fragment().is_some_and(fragment::is_removal);
    !removed
}
