//! ARIA roles, labels and caption references.

use crate::buffer::OutputBuffer;
use crate::error::BufferError;
use crate::scan;
use crate::util::escape_html;

const TOC_LABEL: &str = "Table of contents";

/// Id of the nearest `<figcaption>` in `written`, looking back at most
/// `lookbehind` bytes and never across a closed figure or table.
fn preceding_caption_id(written: &str, lookbehind: usize) -> Option<String> {
    let mut start = written.len().saturating_sub(lookbehind);
    while !written.is_char_boundary(start) {
        start += 1;
    }
    let window = &written[start..];
    let caption = scan::tags(window, 0)
        .filter(|t| {
            t.is_opening("figcaption") || t.is_closing("figure") || t.is_closing("table")
        })
        .last()?;
    if !caption.is_opening("figcaption") {
        return None;
    }
    caption.attr("id").map(str::to_owned)
}

fn has_class(tag: &scan::TagSpan<'_>, class: &str) -> bool {
    tag.attr("class")
        .is_some_and(|value| value.split_whitespace().any(|c| c == class))
}

/// Add ARIA attributes to navigation, figures and captioned tables.
///
/// - `<nav>` gets `role="navigation"`, plus an `aria-label` when it is a
///   table of contents (`class="toc"`);
/// - `<figure>` gets `role="figure"`;
/// - `<figcaption>` without an id gets `figcaption-N`;
/// - `<table>` preceded by a figcaption gets `aria-describedby`.
pub fn add_aria(html: &str, lookbehind: usize, limit: Option<usize>) -> Result<String, BufferError> {
    let mut out = OutputBuffer::for_input(html.len() + html.len() / 16, limit)?;
    let mut captions = 0usize;
    let mut copied = 0;

    for tag in scan::tags(html, 0) {
        if tag.closing {
            continue;
        }
        let mut extra = String::new();
        match tag.lower_name().as_str() {
            "nav" => {
                if !tag.has_attr("role") {
                    extra.push_str(r#" role="navigation""#);
                }
                if has_class(&tag, "toc") && !tag.has_attr("aria-label") {
                    extra.push_str(&format!(r#" aria-label="{TOC_LABEL}""#));
                }
            }
            "figure" => {
                if !tag.has_attr("role") {
                    extra.push_str(r#" role="figure""#);
                }
            }
            "figcaption" => {
                if !tag.has_attr("id") {
                    captions += 1;
                    extra.push_str(&format!(r#" id="figcaption-{captions}""#));
                }
            }
            "table" => {
                if !tag.has_attr("aria-describedby") {
                    out.push_str(&html[copied..tag.start])?;
                    copied = tag.start;
                    if let Some(id) = preceding_caption_id(out.as_str(), lookbehind) {
                        extra.push_str(&format!(r#" aria-describedby="{}""#, escape_html(&id)));
                    }
                }
            }
            _ => {}
        }
        if !extra.is_empty() {
            let at = tag.name_end();
            out.push_all(&[&html[copied..at], &extra])?;
            copied = at;
        }
    }

    out.push_str(&html[copied..])?;
    Ok(out.into_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::DEFAULT_CAPTION_LOOKBEHIND;
    use pretty_assertions::assert_eq;

    fn aria(html: &str) -> String {
        add_aria(html, DEFAULT_CAPTION_LOOKBEHIND, None).unwrap()
    }

    #[test]
    fn test_nav() {
        assert_eq!(
            aria("<nav class=\"toc main\"><ul></ul></nav>"),
            "<nav role=\"navigation\" aria-label=\"Table of contents\" class=\"toc main\"><ul></ul></nav>"
        );
        assert_eq!(aria("<nav role=\"menu\">"), "<nav role=\"menu\">");
    }

    #[test]
    fn test_captioned_table() {
        let html = "<figure class=\"table-figure\"><figcaption>Sum</figcaption><table><tbody></tbody></table></figure>";
        assert_eq!(
            aria(html),
            "<figure role=\"figure\" class=\"table-figure\"><figcaption id=\"figcaption-1\">Sum</figcaption>\
             <table aria-describedby=\"figcaption-1\"><tbody></tbody></table></figure>"
        );
    }

    #[test]
    fn test_existing_caption_id_is_used() {
        let html = "<figure><figcaption id=\"cap\">x</figcaption><table></table></figure>";
        assert!(aria(html).contains("<table aria-describedby=\"cap\">"));
    }

    #[test]
    fn test_caption_of_closed_figure_is_ignored() {
        let html = "<figure><figcaption>a</figcaption><img src=\"x\" /></figure>\n<table></table>";
        assert!(aria(html).contains("\n<table></table>"));
    }

    #[test]
    fn test_lookbehind_bound() {
        let filler = "x".repeat(64);
        let html = format!("<figure><figcaption>a</figcaption><p>{filler}</p><table></table></figure>");
        let out = add_aria(&html, 32, None).unwrap();
        assert!(out.contains("<table></table>"));
        let out = add_aria(&html, 1024, None).unwrap();
        assert!(out.contains("<table aria-describedby=\"figcaption-1\">"));
    }
}
