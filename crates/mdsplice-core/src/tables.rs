//! Structural table rewriting.
//!
//! Runs after the reconciler, so removed tables are already gone and the
//! table index of the scan lines up with [`TableLayout`]. Handles:
//! - captions (`<figure>` wrapping) and the suppression of caption paragraphs;
//! - removal of merged cells and of fully removed rows;
//! - `rowspan`/`colspan` and other cell attributes;
//! - moving footer rows from `<tbody>` into `<tfoot>`.

use crate::buffer::OutputBuffer;
use crate::error::BufferError;
use crate::fragment;
use crate::scan::{self, TagSpan};
use crate::table_analysis::{TableCoordinate, TableLayout, bracketed};
use crate::util::escape_html;

/// Entity spellings of `[` the renderer or an author may produce.
const OPEN_BRACKETS: &[&str] = &["[", "&#91;", "&lbrack;"];

#[derive(Debug, Default)]
struct TableState {
    index: usize,
    /// Current row; `None` before the first `<tr>`.
    row: Option<usize>,
    col: usize,
    in_tbody: bool,
    in_tfoot: bool,
    captioned: bool,
}

/// Applies a [`TableLayout`] to reconciled HTML.
pub struct TableRewriter<'l> {
    layout: &'l TableLayout,
    limit: Option<usize>,
}

impl<'l> TableRewriter<'l> {
    #[must_use]
    pub fn new(layout: &'l TableLayout) -> Self {
        Self {
            layout,
            limit: None,
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Rewrite the tables of `html`.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError`] when the output cannot grow.
    pub fn rewrite(&self, html: &str) -> Result<String, BufferError> {
        if self.layout.is_empty() {
            return Ok(html.to_owned());
        }

        let caption_bytes: usize = self.layout.captions().map(|c| c.text.len() * 2 + 64).sum();
        let mut out = OutputBuffer::for_input(html.len() + caption_bytes, self.limit)?;
        let mut tables_seen = 0;
        let mut table: Option<TableState> = None;
        let mut copied = 0;
        let mut cursor = 0;

        while let Some(tag) = scan::next_tag(html, cursor) {
            cursor = tag.end;
            let name = tag.lower_name();

            match (name.as_str(), tag.closing, table.as_mut()) {
                ("p", false, None) => {
                    if let Some(end) = self.caption_paragraph_end(html, &tag) {
                        out.push_str(&html[copied..tag.start])?;
                        copied = scan::skip_newline(html, end);
                        cursor = copied;
                    }
                }
                ("table", false, _) => {
                    let state = TableState {
                        index: tables_seen,
                        captioned: self.layout.caption(tables_seen).is_some(),
                        ..TableState::default()
                    };
                    tables_seen += 1;
                    if let Some(caption) = self.layout.caption(state.index) {
                        out.push_str(&html[copied..tag.start])?;
                        copied = tag.start;
                        let text = escape_html(&caption.text);
                        out.push_all(&[
                            r#"<figure class="table-figure"><figcaption>"#,
                            &text,
                            "</figcaption>",
                        ])?;
                    }
                    table = Some(state);
                }
                ("tbody", false, Some(state)) => state.in_tbody = true,
                ("tbody", true, Some(state)) => {
                    if state.in_tfoot {
                        // Closed together with the table.
                        out.push_str(&html[copied..tag.start])?;
                        copied = tag.end;
                    }
                    state.in_tbody = false;
                }
                ("tr", false, Some(state)) => {
                    let row = state.row.map_or(0, |r| r + 1);
                    state.row = Some(row);
                    state.col = 0;
                    if self.layout.is_row_removed(state.index, row)
                        && let Some(end) = scan::element_end(html, &tag)
                    {
                        out.push_str(&html[copied..tag.start])?;
                        copied = scan::skip_newline(html, end);
                        cursor = copied;
                        tracing::debug!(table = state.index, row, "Removed row");
                    } else if state.in_tbody
                        && !state.in_tfoot
                        && self.layout.is_tfoot_row(state.index, row)
                    {
                        out.push_all(&[&html[copied..tag.start], "</tbody>\n<tfoot>\n"])?;
                        copied = tag.start;
                        state.in_tbody = false;
                        state.in_tfoot = true;
                    }
                }
                ("td" | "th", false, Some(state)) => {
                    let Some(row) = state.row else { continue };
                    let at = TableCoordinate {
                        table: state.index,
                        row,
                        col: state.col,
                    };
                    state.col += 1;
                    if self.layout.is_cell_removed(at)
                        && let Some(end) = scan::element_end(html, &tag)
                    {
                        out.push_str(&html[copied..tag.start])?;
                        copied = end;
                        cursor = end;
                    } else if let Some(fragment) = self.layout.cell_fragment(at) {
                        let attrs = fragment::cell_attributes(fragment);
                        let attrs = attrs.trim_start();
                        if !attrs.is_empty() {
                            let offset = tag.close_offset();
                            out.push_all(&[&html[copied..offset], " ", attrs])?;
                            copied = offset;
                        }
                    }
                }
                ("table", true, Some(state)) => {
                    out.push_str(&html[copied..tag.start])?;
                    if state.in_tfoot {
                        out.push_str("</tfoot>")?;
                    } else if state.in_tbody {
                        out.push_str("</tbody>")?;
                    }
                    out.push_str(tag.raw)?;
                    if state.captioned {
                        out.push_str("</figure>")?;
                    }
                    copied = tag.end;
                    table = None;
                }
                _ => {}
            }
        }

        out.push_str(&html[copied..])?;
        Ok(out.into_string())
    }

    /// End of a `<p>` that only repeats a table caption.
    fn caption_paragraph_end(&self, html: &str, open: &TagSpan<'_>) -> Option<usize> {
        let rest = &html[open.end..];
        if !OPEN_BRACKETS.iter().any(|b| rest.starts_with(b)) {
            return None;
        }
        let content_end = scan::content_end(html, open)?;
        let text = scan::strip_tags(&html[open.end..content_end]);
        let inner = bracketed(text.trim())?;

        let is_caption = self.layout.captions().any(|c| c.text == inner)
            || self.layout.paras_to_remove().iter().any(|p| {
                p.fingerprint
                    .as_deref()
                    .is_some_and(|fp| fp.contains(inner))
            });
        if !is_caption {
            return None;
        }
        tracing::debug!(caption = inner, "Dropped caption paragraph");
        scan::element_end(html, open)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baseline;
    use crate::collect::AttributeCollector;
    use crate::options::ConvertOptions;
    use crate::parse::parse_document;
    use crate::reconcile::HtmlReconciler;
    use crate::table_analysis::TableStructureAnalyzer;
    use pretty_assertions::assert_eq;

    fn rewrite(markdown: &str) -> String {
        let doc = parse_document(markdown, &ConvertOptions::default());
        let mut records = AttributeCollector::collect(&doc);
        let layout = TableStructureAnalyzer::analyze(&doc);
        let html = HtmlReconciler::new(&mut records)
            .reconcile(&baseline::render(&doc))
            .unwrap();
        TableRewriter::new(&layout).rewrite(&html).unwrap()
    }

    #[test]
    fn test_explicit_colspan_drops_covered_cell() {
        let html = rewrite("| A | B |\n|---|---|\n| 1 {: colspan=2} | 2 |");
        assert_eq!(
            html,
            "<table><thead><tr><th>A</th><th>B</th></tr></thead><tbody>\n\
             <tr><td colspan=\"2\">1</td></tr>\n\
             </tbody></table>\n"
        );
    }

    #[test]
    fn test_colspan_with_marked_cell_counts_once() {
        let html = rewrite("| A | B | C |\n|---|---|---|\n| 1 {: colspan=2} | 2 {: remove} | 3 |");
        assert!(html.contains("<tr><td colspan=\"2\">1</td><td>3</td></tr>"));
    }

    #[test]
    fn test_fully_removed_row() {
        let input = "| A | B |\n|---|---|\n| 1 | 2 |\n| x {: remove} | y {: remove} |\n| 3 | 4 |";
        let html = rewrite(input);
        assert_eq!(html.matches("<tr>").count(), 3);
        assert!(!html.contains(">x<"));
        assert!(!html.contains(">y<"));
    }

    #[test]
    fn test_caption_from_attribute_and_paragraph() {
        let html = rewrite("[Revenue Q4]\n\n| A |\n|---|\n| 1 |\n\n{: caption=\"Revenue Q4\"}");
        assert_eq!(html.matches("<figcaption>Revenue Q4</figcaption>").count(), 1);
        assert!(!html.contains("<p>[Revenue Q4]</p>"));
        assert!(html.starts_with("<figure class=\"table-figure\"><figcaption>"));
        assert!(html.trim_end().ends_with("</table></figure>"));
    }

    #[test]
    fn test_caption_from_following_paragraph() {
        let html = rewrite("| A |\n|---|\n| 1 |\n\n[Totals & more]\n\nafter");
        assert_eq!(
            html,
            "<figure class=\"table-figure\"><figcaption>Totals &amp; more</figcaption>\
             <table><thead><tr><th>A</th></tr></thead><tbody>\n\
             <tr><td>1</td></tr>\n\
             </tbody></table></figure>\n\
             <p>after</p>\n"
        );
    }

    #[test]
    fn test_unrelated_bracket_paragraph_is_kept() {
        let html = rewrite("[Note]\n\ntext\n\n| A |\n|---|\n| 1 |");
        assert!(html.contains("<p>[Note]</p>"));
        assert!(!html.contains("<figure"));
    }

    #[test]
    fn test_tfoot() {
        let html = rewrite("| Item | Qty |\n|---|---|\n| a | 1 |\n| === | === |\n| Sum | 1 |");
        assert_eq!(
            html,
            "<table><thead><tr><th>Item</th><th>Qty</th></tr></thead><tbody>\n\
             <tr><td>a</td><td>1</td></tr>\n\
             </tbody>\n<tfoot>\n\
             <tr><td>Sum</td><td>1</td></tr>\n\
             </tfoot></table>\n"
        );
    }

    #[test]
    fn test_rowspan() {
        let html = rewrite("| A | B |\n|---|---|\n| x | 1 |\n| ^^ | 2 |");
        assert!(html.contains("<tr><td rowspan=\"2\">x</td><td>1</td></tr>"));
        assert!(html.contains("<tr><td>2</td></tr>"));
    }

    #[test]
    fn test_aligned_cell_keeps_style() {
        let html = rewrite("| A | B |\n|:--|---|\n| 1 | << |");
        assert!(html.contains("<tr><td style=\"text-align: left\" colspan=\"2\">1</td></tr>"));
    }

    #[test]
    fn test_no_tables_is_identity() {
        let layout = TableLayout::default();
        let html = "<p>[x]</p>\n";
        assert_eq!(TableRewriter::new(&layout).rewrite(html).unwrap(), html);
    }
}
