//! Relaxed tables: pipe tables written without a delimiter row.
//!
//! The parser only recognises a table when its second line is a delimiter
//! row. For relaxed tables a synthetic delimiter is inserted after the first
//! line and the table is tagged with a `data-relaxed` attribute list, so the
//! cosmetic pass can later move the (synthetic) header row back into the
//! body.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

static DELIMITER_CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*:?-+:?\s*$").unwrap());

/// Attribute list appended after every relaxed table.
const RELAXED_MARKER: &str = "{: data-relaxed}";

fn is_pipe_row(line: &str) -> bool {
    let indent = line.len() - line.trim_start_matches(' ').len();
    indent < 4 && line.trim_start().starts_with('|')
}

fn split_cells(line: &str) -> Vec<&str> {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    let mut cells = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, c) in inner.char_indices() {
        match c {
            '\\' if !escaped => escaped = true,
            '|' if !escaped => {
                cells.push(&inner[start..i]);
                start = i + 1;
            }
            _ => escaped = false,
        }
    }
    cells.push(&inner[start..]);
    cells
}

fn is_delimiter_row(line: &str) -> bool {
    line.contains('-') && split_cells(line).iter().all(|c| DELIMITER_CELL.is_match(c))
}

/// Fence opener of a fenced code block (` ``` ` or `~~~`), if `line` is one.
fn fence(line: &str) -> Option<(char, usize)> {
    let trimmed = line.trim_start();
    let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = trimmed.chars().take_while(|c| *c == marker).count();
    (len >= 3).then_some((marker, len))
}

/// Insert delimiter rows into relaxed tables.
pub(super) fn mark_relaxed_tables(markdown: &str) -> Cow<'_, str> {
    let lines: Vec<&str> = markdown.lines().collect();
    let mut out: Vec<Cow<'_, str>> = Vec::with_capacity(lines.len());
    let mut changed = false;
    let mut open_fence: Option<(char, usize)> = None;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        if let Some((marker, len)) = open_fence {
            if fence(line).is_some_and(|(m, l)| m == marker && l >= len) {
                open_fence = None;
            }
            out.push(Cow::Borrowed(line));
            i += 1;
            continue;
        }
        if let Some(opener) = fence(line) {
            open_fence = Some(opener);
            out.push(Cow::Borrowed(line));
            i += 1;
            continue;
        }

        let starts_block = i == 0 || lines[i - 1].trim().is_empty();
        if !(starts_block && is_pipe_row(line)) {
            out.push(Cow::Borrowed(line));
            i += 1;
            continue;
        }

        let end = (i..lines.len())
            .find(|&k| !is_pipe_row(lines[k]))
            .unwrap_or(lines.len());
        let block = &lines[i..end];
        if block.len() < 2 || is_delimiter_row(block[1]) {
            out.extend(block.iter().map(|l| Cow::Borrowed(*l)));
            i = end;
            continue;
        }

        let columns = split_cells(block[0]).len();
        let delimiter = format!("|{}", "---|".repeat(columns));
        out.push(Cow::Borrowed(block[0]));
        out.push(Cow::Owned(delimiter));
        out.extend(block[1..].iter().map(|l| Cow::Borrowed(*l)));
        out.push(Cow::Borrowed(""));
        out.push(Cow::Borrowed(RELAXED_MARKER));
        out.push(Cow::Borrowed(""));
        changed = true;
        i = end;
    }

    if !changed {
        return Cow::Borrowed(markdown);
    }
    let mut joined = out.join("\n");
    joined.push('\n');
    Cow::Owned(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_inserts_delimiter() {
        let input = "| a | b |\n| c | d |\n";
        assert_eq!(
            mark_relaxed_tables(input),
            "| a | b |\n|---|---|\n| c | d |\n\n{: data-relaxed}\n\n"
        );
    }

    #[test]
    fn test_regular_table_untouched() {
        let input = "| a | b |\n|:--|--:|\n| c | d |\n";
        assert!(matches!(mark_relaxed_tables(input), Cow::Borrowed(_)));
    }

    #[test]
    fn test_single_row_untouched() {
        let input = "| lonely |\n\ntext\n";
        assert!(matches!(mark_relaxed_tables(input), Cow::Borrowed(_)));
    }

    #[test]
    fn test_fenced_code_untouched() {
        let input = "```\n| a | b |\n| c | d |\n```\n";
        assert!(matches!(mark_relaxed_tables(input), Cow::Borrowed(_)));
    }

    #[test]
    fn test_escaped_pipe_in_cell() {
        assert_eq!(split_cells(r"| a \| b | c |"), vec![r" a \| b ", " c "]);
    }

    #[test]
    fn test_paragraph_continuation_untouched() {
        let input = "text\n| a | b |\n| c | d |\n";
        assert!(matches!(mark_relaxed_tables(input), Cow::Borrowed(_)));
    }
}
