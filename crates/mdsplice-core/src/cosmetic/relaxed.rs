//! Relaxed-table header demotion and separator row cleanup.
//!
//! A relaxed table reaches the renderer with a synthetic delimiter row, so
//! its first line comes out as `<thead>`. Unless the body contains a visual
//! separator row (the author's own header marker), that header row is moved
//! back into `<tbody>`.

use crate::buffer::OutputBuffer;
use crate::error::BufferError;
use crate::fragment;
use crate::scan::{self, TagSpan};

/// Marker attribute the parser attaches to relaxed tables.
const RELAXED: &str = "data-relaxed";

/// Characters of a separator cell, as typed or after smart punctuation.
fn is_separator_char(c: char) -> bool {
    matches!(c, '-' | ':' | '\u{2014}' | '\u{2013}') || c.is_whitespace()
}

fn is_separator_cell(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty()
        && text.chars().all(is_separator_char)
        && text.contains(['-', '\u{2014}', '\u{2013}'])
}

/// `(start, end)` of each `<tr>` element opening in `html[from..until]`.
fn rows(html: &str, from: usize, until: usize) -> Vec<(usize, usize)> {
    let mut found = Vec::new();
    let mut cursor = from;
    while let Some(tag) = scan::next_tag(html, cursor) {
        if tag.start >= until {
            break;
        }
        cursor = tag.end;
        if tag.is_opening("tr")
            && let Some(end) = scan::element_end(html, &tag)
        {
            found.push((tag.start, end));
            cursor = end;
        }
    }
    found
}

/// Visible text of every `<td>`/`<th>` in a row.
fn cell_texts(row: &str) -> Vec<String> {
    scan::tags(row, 0)
        .filter(|t| t.is_opening("td") || t.is_opening("th"))
        .filter_map(|t| {
            let end = scan::content_end(row, &t)?;
            Some(scan::strip_tags(&row[t.end..end]).trim().to_owned())
        })
        .collect()
}

/// A data row whose cells are all dash separators.
fn is_separator_row(row: &str) -> bool {
    if scan::tags(row, 0).any(|t| t.is_opening("th")) {
        return false;
    }
    let cells = cell_texts(row);
    !cells.is_empty() && cells.iter().all(|c| is_separator_cell(c))
}

/// Write a header row with its `<th>` cells turned into `<td>` cells.
fn push_demoted_cells(row: &str, out: &mut OutputBuffer) -> Result<(), BufferError> {
    let mut copied = 0;
    for tag in scan::tags(row, 0) {
        if tag.is("th") {
            let name_start = tag.start + 1 + usize::from(tag.closing);
            out.push_all(&[&row[copied..name_start], "td"])?;
            copied = name_start + tag.name.len();
        }
    }
    out.push_str(&row[copied..])
}

fn push_table_open_without_marker(tag: &TagSpan<'_>, out: &mut OutputBuffer) -> Result<(), BufferError> {
    out.push_all(&["<", tag.name])?;
    for attr in fragment::attributes(tag.attribute_text())
        .filter(|a| !a.name.eq_ignore_ascii_case(RELAXED))
    {
        out.push_str(attr.raw)?;
    }
    out.push('>')
}

/// Write one relaxed table with its header demoted. `inner` runs from just
/// after `<table …>` through `</table>`.
fn push_demoted_table(inner: &str, out: &mut OutputBuffer) -> Result<(), BufferError> {
    let Some(thead) = scan::tags(inner, 0).find(|t| t.is_opening("thead")) else {
        return out.push_str(inner);
    };
    let (Some(thead_end), Some(thead_content_end)) = (
        scan::element_end(inner, &thead),
        scan::content_end(inner, &thead),
    ) else {
        return out.push_str(inner);
    };
    let tbody = scan::tags(inner, thead_end).find(|t| t.is_opening("tbody"));

    if let Some(tbody) = &tbody {
        let body_end = scan::content_end(inner, tbody).unwrap_or(inner.len());
        let has_separator = rows(inner, tbody.end, body_end)
            .into_iter()
            .any(|(start, end)| is_separator_row(&inner[start..end]));
        if has_separator {
            return out.push_str(inner);
        }
    }

    let header = &inner[thead.end..thead_content_end];
    out.push_str(&inner[..thead.start])?;
    if cell_texts(header).iter().all(String::is_empty) {
        return out.push_str(&inner[thead_end..]);
    }

    let row = header.trim();
    match tbody {
        Some(tbody) => {
            let insert_at = scan::skip_newline(inner, tbody.end);
            out.push_str(&inner[thead_end..insert_at])?;
            if insert_at == tbody.end {
                out.push('\n')?;
            }
            push_demoted_cells(row, out)?;
            out.push('\n')?;
            out.push_str(&inner[insert_at..])
        }
        None => {
            out.push_str("<tbody>\n")?;
            push_demoted_cells(row, out)?;
            out.push_str("\n</tbody>")?;
            out.push_str(&inner[thead_end..])
        }
    }
}

/// Move the header row of relaxed tables into the body and drop the
/// `data-relaxed` marker.
pub fn demote_relaxed_headers(html: &str, limit: Option<usize>) -> Result<String, BufferError> {
    let mut out = OutputBuffer::for_input(html.len(), limit)?;
    let mut copied = 0;
    let mut cursor = 0;

    while let Some(tag) = scan::next_tag(html, cursor) {
        cursor = tag.end;
        if !tag.is_opening("table") || !tag.has_attr(RELAXED) {
            continue;
        }
        let Some(end) = scan::element_end(html, &tag) else {
            continue;
        };
        out.push_str(&html[copied..tag.start])?;
        push_table_open_without_marker(&tag, &mut out)?;
        push_demoted_table(&html[tag.end..end], &mut out)?;
        copied = end;
        cursor = end;
    }

    out.push_str(&html[copied..])?;
    Ok(out.into_string())
}

/// Copy `text` without its blank lines. A whitespace-only tail left by a
/// dropped row counts as blank.
fn push_non_blank_lines(text: &str, out: &mut OutputBuffer) -> Result<(), BufferError> {
    for line in text.split_inclusive('\n') {
        if !line.trim().is_empty() {
            out.push_str(line)?;
        }
    }
    Ok(())
}

/// Remove blank lines and dash separator rows inside tables.
pub fn drop_separator_rows(html: &str, limit: Option<usize>) -> Result<String, BufferError> {
    let mut out = OutputBuffer::for_input(html.len(), limit)?;
    let mut copied = 0;
    let mut cursor = 0;

    while let Some(tag) = scan::next_tag(html, cursor) {
        cursor = tag.end;
        if !tag.is_opening("table") {
            continue;
        }
        let Some(end) = scan::element_end(html, &tag) else {
            continue;
        };
        out.push_str(&html[copied..tag.start])?;

        let mut kept = tag.start;
        for (start, row_end) in rows(html, tag.end, end) {
            if is_separator_row(&html[start..row_end]) {
                push_non_blank_lines(&html[kept..start], &mut out)?;
                kept = scan::skip_newline(html, row_end);
            }
        }
        push_non_blank_lines(&html[kept..end], &mut out)?;
        copied = end;
        cursor = end;
    }

    out.push_str(&html[copied..])?;
    Ok(out.into_string())
}
