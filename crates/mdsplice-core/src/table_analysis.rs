//! Table-scoped side tables derived from the tree.
//!
//! The table rewriter works with its own coordinates, `(table, row, col)`,
//! counted over surviving tables only. The header row is row 0.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::ast::{Node, NodeKind};
use crate::fragment;
use crate::occurrence::{CountableClass, OccurrenceCounter, descends_into};

/// A paragraph line of the form `[Caption text]`.
static CAPTION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[([^\]]+)\]\s*$").unwrap());

/// Position of a cell within the surviving tables of a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TableCoordinate {
    pub table: usize,
    pub row: usize,
    pub col: usize,
}

/// Where a caption was found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptionSource {
    /// `data-caption` on the table itself.
    Explicit,
    /// A `[Caption]` paragraph right before the table.
    Preceding,
    /// A `[Caption]` paragraph right after the table.
    Following,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableCaption {
    pub text: String,
    pub source: CaptionSource,
}

/// A caption paragraph that must not be rendered as a paragraph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParaToRemove {
    /// Occurrence index in the paragraph class.
    pub index: usize,
    pub fingerprint: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct RowInfo {
    cells: usize,
    removed: usize,
}

/// Everything the table rewriter needs to know about the tables.
#[derive(Clone, Debug, Default)]
pub struct TableLayout {
    cells: HashMap<TableCoordinate, String>,
    rows: HashMap<(usize, usize), RowInfo>,
    tfoot_rows: HashSet<(usize, usize)>,
    captions: HashMap<usize, TableCaption>,
    paras_to_remove: Vec<ParaToRemove>,
    tables: usize,
}

impl TableLayout {
    /// Number of surviving tables.
    #[must_use]
    pub fn table_count(&self) -> usize {
        self.tables
    }

    /// Attribute fragment of a cell.
    #[must_use]
    pub fn cell_fragment(&self, at: TableCoordinate) -> Option<&str> {
        self.cells.get(&at).map(String::as_str)
    }

    #[must_use]
    pub fn is_cell_removed(&self, at: TableCoordinate) -> bool {
        self.cell_fragment(at).is_some_and(fragment::is_removal)
    }

    /// Whether every cell of a row is removal-marked.
    #[must_use]
    pub fn is_row_removed(&self, table: usize, row: usize) -> bool {
        self.rows
            .get(&(table, row))
            .is_some_and(|info| info.cells > 0 && info.removed == info.cells)
    }

    #[must_use]
    pub fn is_tfoot_row(&self, table: usize, row: usize) -> bool {
        self.tfoot_rows.contains(&(table, row))
    }

    #[must_use]
    pub fn caption(&self, table: usize) -> Option<&TableCaption> {
        self.captions.get(&table)
    }

    pub fn captions(&self) -> impl Iterator<Item = &TableCaption> {
        self.captions.values()
    }

    #[must_use]
    pub fn paras_to_remove(&self) -> &[ParaToRemove] {
        &self.paras_to_remove
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables == 0
    }
}

/// The text between the brackets when `text` is exactly `[…]`.
pub(crate) fn bracketed(text: &str) -> Option<&str> {
    CAPTION_LINE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|c| !c.is_empty())
}

/// Text of a `[Caption]` line in a paragraph, if it has one.
#[must_use]
pub fn caption_line(text: &str) -> Option<String> {
    text.lines()
        .find_map(|line| bracketed(line.trim_start()))
        .map(str::to_owned)
}

/// A sibling paragraph holding a caption line, with its caption text.
fn caption_paragraph(candidate: Option<(usize, &Node)>) -> Option<(usize, &Node, String)> {
    let (index, paragraph) = candidate?;
    if paragraph.kind != NodeKind::Paragraph || !descends_into(paragraph) {
        return None;
    }
    caption_line(&paragraph.text_lines()).map(|caption| (index, paragraph, caption))
}

/// `(row, col)` of the cells hidden under another cell's explicit
/// `colspan` or `rowspan`. Header cells only span columns.
fn covered_cells(table: &Node) -> HashSet<(usize, usize)> {
    let mut covered = HashSet::new();
    for (r, row) in table.children.iter().enumerate() {
        let header = row.kind == NodeKind::TableRow { header: true };
        for (c, cell) in row.children.iter().enumerate() {
            let Some(fragment) = cell.fragment() else {
                continue;
            };
            if fragment::is_removal(fragment) || covered.contains(&(r, c)) {
                continue;
            }
            let cols = fragment::span(fragment, "colspan");
            let rows = if header { 1 } else { fragment::span(fragment, "rowspan") };
            for dr in 0..rows {
                for dc in 0..cols {
                    if (dr, dc) != (0, 0) {
                        covered.insert((r + dr, c + dc));
                    }
                }
            }
        }
    }
    covered
}

/// Tree walk producing a [`TableLayout`].
#[derive(Debug, Default)]
pub struct TableStructureAnalyzer {
    layout: TableLayout,
    counter: OccurrenceCounter,
}

impl TableStructureAnalyzer {
    #[must_use]
    pub fn analyze(document: &Node) -> TableLayout {
        let mut analyzer = Self::default();
        analyzer.walk(document);
        analyzer.layout
    }

    fn walk(&mut self, node: &Node) {
        self.counter.visit(node);
        // Removed subtrees never reach the table rewriter.
        if !descends_into(node) {
            return;
        }

        let mut preceding: Option<(usize, &Node)> = None;
        for (i, child) in node.children.iter().enumerate() {
            let para_index = self.counter.peek(CountableClass::Paragraph);
            if matches!(child.kind, NodeKind::Table { .. }) && descends_into(child) {
                let following = node.children.get(i + 1);
                self.table(child, preceding, following);
            } else {
                self.walk(child);
            }
            preceding = (child.kind == NodeKind::Paragraph && descends_into(child))
                .then_some((para_index, child));
        }
    }

    fn table(&mut self, table: &Node, preceding: Option<(usize, &Node)>, following: Option<&Node>) {
        let table_index = self.layout.tables;
        self.layout.tables += 1;

        // Cells may contain links and images, which count as paragraphs.
        self.walk(table);
        let following_index = self.counter.peek(CountableClass::Paragraph);
        let covered = covered_cells(table);

        for (r, row) in table.children.iter().enumerate() {
            if row.fragment().is_some_and(fragment::is_tfoot) {
                self.layout.tfoot_rows.insert((table_index, r));
            }
            let mut info = RowInfo::default();
            for (col, cell) in row.children.iter().enumerate() {
                info.cells += 1;
                let fragment = match cell.fragment() {
                    Some(f) if covered.contains(&(r, col)) && !fragment::is_removal(f) => {
                        Some(fragment::merge(Some(f), " data-remove"))
                    }
                    Some(f) => Some(f.to_owned()),
                    None if covered.contains(&(r, col)) => Some(" data-remove".to_owned()),
                    None => None,
                };
                let Some(fragment) = fragment else {
                    continue;
                };
                if fragment::is_removal(&fragment) {
                    info.removed += 1;
                }
                self.layout.cells.insert(
                    TableCoordinate {
                        table: table_index,
                        row: r,
                        col,
                    },
                    fragment,
                );
            }
            self.layout.rows.insert((table_index, r), info);
        }

        self.find_caption(table_index, table, preceding, following.map(|p| (following_index, p)));
    }

    fn find_caption(
        &mut self,
        table_index: usize,
        table: &Node,
        preceding: Option<(usize, &Node)>,
        following: Option<(usize, &Node)>,
    ) {
        let neighbours = [
            (CaptionSource::Preceding, caption_paragraph(preceding)),
            (CaptionSource::Following, caption_paragraph(following)),
        ];

        let explicit = table.fragment().and_then(fragment::caption);
        let caption = if let Some(text) = explicit {
            // A bracketed paragraph repeating the explicit caption goes too.
            for (_, found) in &neighbours {
                if let Some((index, p, c)) = found
                    && *c == text
                {
                    self.remove_paragraph(*index, p);
                }
            }
            TableCaption {
                text,
                source: CaptionSource::Explicit,
            }
        } else {
            let Some((source, (index, p, text))) = neighbours
                .into_iter()
                .find_map(|(source, found)| found.map(|f| (source, f)))
            else {
                return;
            };
            self.remove_paragraph(index, p);
            TableCaption { text, source }
        };
        tracing::debug!(table = table_index, caption = %caption.text, source = ?caption.source, "Table caption");
        self.layout.captions.insert(table_index, caption);
    }

    fn remove_paragraph(&mut self, index: usize, paragraph: &Node) {
        self.layout.paras_to_remove.push(ParaToRemove {
            index,
            fingerprint: paragraph.fingerprint(),
        });
    }
}
