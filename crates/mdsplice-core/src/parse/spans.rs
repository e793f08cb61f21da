//! Table cell spans and footer rows.
//!
//! Cell markers written in the markdown source:
//! - `<<` merges the cell into the nearest surviving cell on its left;
//! - `^^` merges the cell into the nearest surviving body cell above;
//! - a body row of `=` runs separates the footer: it is removed and every
//!   row after it moves into `<tfoot>`.
//!
//! Merged cells are kept in the tree with a `data-remove` marker; the table
//! rewriter drops them from the HTML once the spans have been applied.

use crate::ast::{Node, NodeKind};
use crate::fragment;

const COLSPAN_MARKER: &str = "<<";
const ROWSPAN_MARKER: &str = "^^";

pub(super) fn apply(node: &mut Node) {
    if matches!(node.kind, NodeKind::Table { .. }) {
        apply_table(node);
        return;
    }
    for child in &mut node.children {
        apply(child);
    }
}

fn is_footer_separator(row: &Node) -> bool {
    !row.children.is_empty()
        && row.children.iter().all(|cell| {
            let text = cell.plain_text();
            let text = text.trim();
            !text.is_empty() && text.chars().all(|c| c == '=')
        })
}

fn apply_table(table: &mut Node) {
    let texts: Vec<Vec<String>> = table
        .children
        .iter()
        .map(|row| {
            row.children
                .iter()
                .map(|cell| cell.plain_text().trim().to_owned())
                .collect()
        })
        .collect();
    let is_body: Vec<bool> = table
        .children
        .iter()
        .map(|row| row.kind == NodeKind::TableRow { header: false })
        .collect();

    let footer_start = table
        .children
        .iter()
        .enumerate()
        .find(|(r, row)| is_body[*r] && is_footer_separator(row))
        .map(|(r, _)| r);

    let mut removed: Vec<Vec<bool>> = texts.iter().map(|row| vec![false; row.len()]).collect();
    let mut colspan: Vec<Vec<usize>> = texts.iter().map(|row| vec![1; row.len()]).collect();
    let mut rowspan = colspan.clone();

    for (r, row) in texts.iter().enumerate() {
        if Some(r) == footer_start {
            removed[r].fill(true);
            continue;
        }
        for (c, text) in row.iter().enumerate() {
            if text == COLSPAN_MARKER {
                if let Some(left) = (0..c).rev().find(|&k| !removed[r][k]) {
                    colspan[r][left] += 1;
                    removed[r][c] = true;
                }
            } else if text == ROWSPAN_MARKER && is_body[r] {
                let above = (0..r)
                    .rev()
                    .take_while(|&k| is_body[k] && Some(k) != footer_start)
                    .find(|&k| removed[k].get(c).is_some_and(|gone| !gone));
                if let Some(above) = above {
                    rowspan[above][c] += 1;
                    removed[r][c] = true;
                }
            }
        }
    }

    for (r, row) in table.children.iter_mut().enumerate() {
        if footer_start.is_some_and(|start| r > start) {
            row.attrs = Some(fragment::merge(row.attrs.as_deref(), " data-tfoot"));
        }
        for (c, cell) in row.children.iter_mut().enumerate() {
            let mut extra = String::new();
            if removed[r][c] {
                extra.push_str(" data-remove");
            }
            if colspan[r][c] > 1 {
                extra.push_str(&format!(r#" colspan="{}""#, colspan[r][c]));
            }
            if rowspan[r][c] > 1 {
                extra.push_str(&format!(r#" rowspan="{}""#, rowspan[r][c]));
            }
            if !extra.is_empty() {
                cell.attrs = Some(fragment::merge(cell.attrs.as_deref(), &extra));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::Node;
    use crate::options::ConvertOptions;
    use crate::parse::parse_document;

    fn table(markdown: &str) -> Node {
        let mut doc = parse_document(markdown, &ConvertOptions::default());
        doc.children.remove(0)
    }

    fn cell_attrs(table: &Node, row: usize, col: usize) -> Option<&str> {
        table.children[row].children[col].attrs.as_deref()
    }

    #[test]
    fn test_colspan_marker() {
        let t = table("| A | B | C |\n|---|---|---|\n| 1 | << | << |");
        assert_eq!(cell_attrs(&t, 1, 0), Some(r#" colspan="3""#));
        assert_eq!(cell_attrs(&t, 1, 1), Some(" data-remove"));
        assert_eq!(cell_attrs(&t, 1, 2), Some(" data-remove"));
    }

    #[test]
    fn test_rowspan_marker() {
        let t = table("| A | B |\n|---|---|\n| 1 | 2 |\n| ^^ | 3 |\n| ^^ | 4 |");
        assert_eq!(cell_attrs(&t, 1, 0), Some(r#" rowspan="3""#));
        assert_eq!(cell_attrs(&t, 2, 0), Some(" data-remove"));
        assert_eq!(cell_attrs(&t, 3, 0), Some(" data-remove"));
        assert_eq!(cell_attrs(&t, 2, 1), None);
    }

    #[test]
    fn test_rowspan_does_not_reach_header() {
        let t = table("| A | B |\n|---|---|\n| ^^ | 2 |");
        assert_eq!(cell_attrs(&t, 0, 0), None);
        assert_eq!(cell_attrs(&t, 1, 0), None);
    }

    #[test]
    fn test_footer_separator() {
        let t = table("| A | B |\n|---|---|\n| 1 | 2 |\n| === | === |\n| Sum | 3 |");
        assert_eq!(cell_attrs(&t, 2, 0), Some(" data-remove"));
        assert_eq!(cell_attrs(&t, 2, 1), Some(" data-remove"));
        assert_eq!(t.children[3].attrs.as_deref(), Some(" data-tfoot"));
        assert!(t.children[1].attrs.is_none());
    }

    #[test]
    fn test_combined_with_attribute_list() {
        let t = table("| A | B |\n|---|---|\n| 1 {: .x} | << |");
        assert_eq!(cell_attrs(&t, 1, 0), Some(r#" class="x" colspan="2""#));
    }
}
