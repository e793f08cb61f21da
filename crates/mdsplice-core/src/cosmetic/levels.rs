//! Constant heading level shift.

use crate::buffer::OutputBuffer;
use crate::error::BufferError;
use crate::scan;

/// Level of an `h1`…`h6` tag name.
fn heading_level(name: &str) -> Option<u8> {
    match name.as_bytes() {
        [h, d @ b'1'..=b'6'] if h.eq_ignore_ascii_case(&b'h') => Some(d - b'0'),
        _ => None,
    }
}

/// Shift a heading level, clamping the result to 1-6.
#[must_use]
pub fn shifted_level(level: u8, shift: i8) -> u8 {
    let shifted = (i16::from(level) + i16::from(shift)).clamp(1, 6);
    u8::try_from(shifted).unwrap_or(1)
}

/// Rename every `<hN>`/`</hN>` by `shift` levels.
pub fn shift_headings(html: &str, shift: i8, limit: Option<usize>) -> Result<String, BufferError> {
    let mut out = OutputBuffer::for_input(html.len(), limit)?;
    let mut copied = 0;

    for tag in scan::tags(html, 0) {
        let Some(level) = heading_level(tag.name) else {
            continue;
        };
        let new_level = shifted_level(level, shift);
        if new_level == level {
            continue;
        }
        let digit = tag.start + 1 + usize::from(tag.closing) + 1;
        let mut buf = [0u8; 4];
        let replacement = char::from(b'0' + new_level).encode_utf8(&mut buf);
        out.push_all(&[&html[copied..digit], replacement])?;
        copied = digit + 1;
    }

    out.push_str(&html[copied..])?;
    Ok(out.into_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shifted_level_clamps() {
        assert_eq!(shifted_level(1, 1), 2);
        assert_eq!(shifted_level(6, 2), 6);
        assert_eq!(shifted_level(2, -5), 1);
        assert_eq!(shifted_level(3, 0), 3);
    }

    #[test]
    fn test_shift_down() {
        let html = "<h1 id=\"a\">A</h1>\n<h2>B</h2>\n<p>h1</p>";
        assert_eq!(
            shift_headings(html, 1, None).unwrap(),
            "<h2 id=\"a\">A</h2>\n<h3>B</h3>\n<p>h1</p>"
        );
    }

    #[test]
    fn test_shift_up_clamped() {
        let html = "<h1>A</h1><h3>C</h3>";
        assert_eq!(shift_headings(html, -2, None).unwrap(), "<h1>A</h1><h1>C</h1>");
    }
}
