//! Lexical HTML tag scanning.
//!
//! The pipeline works on the renderer's text output rather than on a DOM, so
//! every stage walks the string tag by tag with these helpers. The scanner
//! understands quoted attribute values and comments; it does not build a tree.

use crate::ast::make_fingerprint;
use crate::fragment::{self, Attribute};

/// Elements that never have a closing tag.
const VOID_ELEMENTS: &[&str] = &["img", "br", "hr", "input", "meta", "link", "wbr"];

/// Elements whose content is raw text rather than markup.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Upper bound on how far a fingerprint text search looks ahead.
const TEXT_RUN_WINDOW: usize = 8 * 1024;

/// A tag located in an HTML string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct TagSpan<'a> {
    /// Byte offset of `<`.
    pub start: usize,
    /// Byte offset just past `>`.
    pub end: usize,
    /// Tag name as written.
    pub name: &'a str,
    pub closing: bool,
    pub self_closing: bool,
    /// Full tag text, `<` through `>`.
    pub raw: &'a str,
}

impl<'a> TagSpan<'a> {
    /// Case-insensitive name comparison.
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Lowercased tag name.
    pub fn lower_name(&self) -> String {
        self.name.to_ascii_lowercase()
    }

    pub fn is_opening(&self, name: &str) -> bool {
        !self.closing && self.is(name)
    }

    pub fn is_closing(&self, name: &str) -> bool {
        self.closing && self.is(name)
    }

    pub fn is_void(&self) -> bool {
        self.self_closing || VOID_ELEMENTS.iter().any(|v| self.is(v))
    }

    /// Text between the tag name and the closing `>` (or `/>`).
    pub fn attribute_text(&self) -> &'a str {
        let offset = if self.closing { 2 } else { 1 } + self.name.len();
        let inner = &self.raw[offset..self.raw.len() - 1];
        inner.strip_suffix('/').unwrap_or(inner)
    }

    /// Offset right after the tag name, where block attributes are spliced.
    pub fn name_end(&self) -> usize {
        self.start + 1 + self.name.len()
    }

    /// Offset of the closing `>` or of the `/` in `/>`.
    pub fn close_offset(&self) -> usize {
        if self.self_closing {
            self.end - 2
        } else {
            self.end - 1
        }
    }

    pub fn attributes(&self) -> impl Iterator<Item = Attribute<'a>> {
        fragment::attributes(self.attribute_text())
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.attributes()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .and_then(|a| a.value)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes().any(|a| a.name.eq_ignore_ascii_case(name))
    }
}

/// Find the next tag at or after `from`.
///
/// Comments, doctypes and processing instructions are skipped. A `<` that
/// does not start a tag name is treated as text.
pub(crate) fn next_tag(html: &str, from: usize) -> Option<TagSpan<'_>> {
    let bytes = html.as_bytes();
    let mut pos = from;
    while pos < html.len() {
        let start = pos + html[pos..].find('<')?;
        let rest = &html[start + 1..];
        if rest.starts_with("!--") {
            pos = start + html[start..].find("-->")? + 3;
            continue;
        }
        if rest.starts_with('!') || rest.starts_with('?') {
            pos = start + html[start..].find('>')? + 1;
            continue;
        }

        let closing = rest.starts_with('/');
        let name_start = start + 1 + usize::from(closing);
        let name_len = html[name_start..]
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'-')
            .count();
        if name_len == 0 || !bytes[name_start].is_ascii_alphabetic() {
            pos = start + 1;
            continue;
        }
        let name_end = name_start + name_len;

        let mut quote = None;
        let mut end = None;
        for (offset, &b) in bytes[name_end..].iter().enumerate() {
            match quote {
                Some(q) if b == q => quote = None,
                Some(_) => {}
                None if b == b'"' || b == b'\'' => quote = Some(b),
                None if b == b'>' => {
                    end = Some(name_end + offset + 1);
                    break;
                }
                None => {}
            }
        }
        let end = end?;
        let raw = &html[start..end];
        return Some(TagSpan {
            start,
            end,
            name: &html[name_start..name_end],
            closing,
            self_closing: raw.ends_with("/>"),
            raw,
        });
    }
    None
}

/// Whether the element's content must not be scanned for tags.
pub(crate) fn is_raw_text(name: &str) -> bool {
    RAW_TEXT_ELEMENTS.iter().any(|n| name.eq_ignore_ascii_case(n))
}

/// Iterate over all tags from `from` onwards.
pub(crate) fn tags(html: &str, from: usize) -> impl Iterator<Item = TagSpan<'_>> {
    let mut pos = from;
    std::iter::from_fn(move || {
        let tag = next_tag(html, pos)?;
        pos = tag.end;
        Some(tag)
    })
}

/// Offset just past the element opened by `open`, tracking same-name nesting.
///
/// Returns `None` when the closing tag is missing.
pub(crate) fn element_end(html: &str, open: &TagSpan<'_>) -> Option<usize> {
    if open.is_void() {
        return Some(open.end);
    }
    let mut depth = 1usize;
    for tag in tags(html, open.end) {
        if !tag.is(open.name) {
            continue;
        }
        if tag.closing {
            depth -= 1;
            if depth == 0 {
                return Some(tag.end);
            }
        } else if !tag.self_closing {
            depth += 1;
        }
    }
    None
}

/// Offset of the closing tag of the element opened by `open` (the `<` of
/// `</name>`), or `None` when missing.
pub(crate) fn content_end(html: &str, open: &TagSpan<'_>) -> Option<usize> {
    let end = element_end(html, open)?;
    if open.is_void() {
        return Some(end);
    }
    Some(end - (open.name.len() + 3))
}

/// Fingerprint of the first non-blank text run in `html[from..until]`,
/// skipping over tags.
pub(crate) fn text_fingerprint(html: &str, from: usize, until: usize) -> Option<String> {
    let mut limit = until.min(html.len()).min(from.saturating_add(TEXT_RUN_WINDOW));
    while !html.is_char_boundary(limit) {
        limit -= 1;
    }
    let mut pos = from;
    while pos < limit {
        let next = html[pos..limit].find('<').map_or(limit, |o| pos + o);
        let segment = &html[pos..next];
        if !segment.trim().is_empty() {
            let decoded = html_escape::decode_html_entities(segment);
            if let Some(fp) = make_fingerprint(&decoded) {
                return Some(fp);
            }
        }
        if next >= limit {
            break;
        }
        pos = next + html[next..limit].find('>')? + 1;
    }
    None
}

/// Visible text of an HTML snippet: tags stripped, entities decoded.
pub(crate) fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut pos = 0;
    for tag in tags(html, 0) {
        out.push_str(&html[pos..tag.start]);
        pos = tag.end;
    }
    out.push_str(&html[pos..]);
    html_escape::decode_html_entities(&out).into_owned()
}

/// Skip a single newline at `pos`, if present.
pub(crate) fn skip_newline(html: &str, pos: usize) -> usize {
    if html[pos..].starts_with('\n') {
        pos + 1
    } else {
        pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_tag_basic() {
        let html = r#"text <p class="a">x</p>"#;
        let tag = next_tag(html, 0).unwrap();
        assert_eq!(tag.name, "p");
        assert_eq!(tag.start, 5);
        assert_eq!(tag.raw, r#"<p class="a">"#);
        assert!(!tag.closing);
        assert_eq!(tag.attr("class"), Some("a"));
    }

    #[test]
    fn test_next_tag_quoted_gt() {
        let html = r#"<a title="a > b" href="x">"#;
        let tag = next_tag(html, 0).unwrap();
        assert_eq!(tag.end, html.len());
        assert_eq!(tag.attr("href"), Some("x"));
    }

    #[test]
    fn test_next_tag_skips_comments_and_text_lt() {
        let html = "a < b <!-- <p> --> <em>";
        let tag = next_tag(html, 0).unwrap();
        assert_eq!(tag.name, "em");
    }

    #[test]
    fn test_self_closing() {
        let html = r#"<img src="a.png" alt="x" />"#;
        let tag = next_tag(html, 0).unwrap();
        assert!(tag.self_closing);
        assert!(tag.is_void());
        assert_eq!(&html[tag.close_offset()..], "/>");
        assert_eq!(tag.attr("src"), Some("a.png"));
    }

    #[test]
    fn test_element_end_nested() {
        let html = "<li>a<ul><li>b</li></ul></li><li>c</li>";
        let open = next_tag(html, 0).unwrap();
        let end = element_end(html, &open).unwrap();
        assert_eq!(&html[..end], "<li>a<ul><li>b</li></ul></li>");
        assert_eq!(content_end(html, &open), Some(end - 5));
    }

    #[test]
    fn test_element_end_missing() {
        let html = "<p>unterminated";
        let open = next_tag(html, 0).unwrap();
        assert_eq!(element_end(html, &open), None);
    }

    #[test]
    fn test_text_fingerprint_skips_tags() {
        let html = "<p><em>Hello &amp; bye</em>\nmore</p>";
        assert_eq!(
            text_fingerprint(html, 3, html.len()).as_deref(),
            Some("Hello & bye")
        );
    }

    #[test]
    fn test_text_fingerprint_respects_bound() {
        let html = "<p></p><p>later</p>";
        assert_eq!(text_fingerprint(html, 3, 3), None);
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<td><em>a</em> &amp; b</td>"), "a & b");
    }
}
