//! Whitespace cleanup in and between tags.

use crate::buffer::OutputBuffer;
use crate::error::BufferError;
use crate::scan;

/// Collapse whitespace inside tags and drop whitespace before `>`.
///
/// Quoted attribute values are left alone. Applying the pass twice gives the
/// same result as applying it once.
pub fn collapse_tag_whitespace(html: &str, limit: Option<usize>) -> Result<String, BufferError> {
    let mut out = OutputBuffer::for_input(html.len(), limit)?;
    let mut copied = 0;
    let mut cursor = 0;

    while let Some(tag) = scan::next_tag(html, cursor) {
        cursor = tag.end;
        if !is_normalized(tag.raw) {
            out.push_str(&html[copied..tag.start])?;
            normalize_tag(tag.raw, |c| out.push(c))?;
            copied = tag.end;
        }
        if !tag.closing
            && scan::is_raw_text(tag.name)
            && let Some(end) = scan::content_end(html, &tag)
        {
            cursor = end;
        }
    }

    out.push_str(&html[copied..])?;
    Ok(out.into_string())
}

/// Feed the normalized text of one tag to `emit`, a character at a time.
fn normalize_tag<E>(raw: &str, mut emit: impl FnMut(char) -> Result<(), E>) -> Result<(), E> {
    let mut quote = None;
    let mut pending_space = false;
    for c in raw.chars() {
        if let Some(q) = quote {
            emit(c)?;
            if c == q {
                quote = None;
            }
            continue;
        }
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && c != '>' {
            emit(' ')?;
        }
        pending_space = false;
        if c == '"' || c == '\'' {
            quote = Some(c);
        }
        emit(c)?;
    }
    Ok(())
}

/// Whether normalizing `raw` would leave it unchanged.
fn is_normalized(raw: &str) -> bool {
    let mut expected = raw.chars();
    normalize_tag(raw, |c| if expected.next() == Some(c) { Ok(()) } else { Err(()) }).is_ok()
        && expected.next().is_none()
}

/// Collapse whitespace runs between `>` and `<` that contain a newline.
///
/// A run with one newline becomes `\n`; a run with several becomes a single
/// blank line. Content of `<pre>` is left untouched.
pub fn collapse_between_tags(html: &str, limit: Option<usize>) -> Result<String, BufferError> {
    let mut out = OutputBuffer::for_input(html.len(), limit)?;
    let mut copied = 0;
    let mut previous_end: Option<usize> = None;
    let mut pre_depth = 0usize;

    for tag in scan::tags(html, 0) {
        if let Some(gap_start) = previous_end
            && pre_depth == 0
        {
            let gap = &html[gap_start..tag.start];
            if !gap.is_empty() && gap.trim().is_empty() && gap.contains('\n') {
                let replacement = if gap.matches('\n').count() > 1 { "\n\n" } else { "\n" };
                if gap != replacement {
                    out.push_all(&[&html[copied..gap_start], replacement])?;
                    copied = tag.start;
                }
            }
        }
        if tag.is("pre") && !tag.self_closing {
            if tag.closing {
                pre_depth = pre_depth.saturating_sub(1);
            } else {
                pre_depth += 1;
            }
        }
        previous_end = Some(tag.end);
    }

    out.push_str(&html[copied..])?;
    Ok(out.into_string())
}
