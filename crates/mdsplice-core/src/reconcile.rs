//! Attribute injection and element removal on the baseline HTML.
//!
//! The reconciler scans the renderer output for the opening tags of countable
//! elements, re-derives their `(class, index)` and consults the collected
//! records: removal first, then injection.

use crate::ast::url_fingerprint;
use crate::buffer::OutputBuffer;
use crate::collect::AttributeRecords;
use crate::error::BufferError;
use crate::occurrence::{CountableClass, OccurrenceCounter};
use crate::scan::{self, TagSpan};

/// Non-table half of the postprocessing: consumes attribute records.
pub struct HtmlReconciler<'r> {
    records: &'r mut AttributeRecords,
    limit: Option<usize>,
}

impl<'r> HtmlReconciler<'r> {
    #[must_use]
    pub fn new(records: &'r mut AttributeRecords) -> Self {
        Self {
            records,
            limit: None,
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Rewrite `html`, marking every consumed record as used.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError`] when the output cannot grow.
    pub fn reconcile(&mut self, html: &str) -> Result<String, BufferError> {
        let mut out =
            OutputBuffer::for_input(html.len() + self.records.fragment_bytes(), self.limit)?;
        let mut counter = OccurrenceCounter::new();
        let mut copied = 0;
        let mut cursor = 0;

        while let Some(tag) = scan::next_tag(html, cursor) {
            cursor = tag.end;
            if tag.closing {
                continue;
            }
            let name = tag.lower_name();
            let Some(class) = CountableClass::of_tag(&name) else {
                continue;
            };
            let index = counter.next(class);
            let inline = CountableClass::is_inline_tag(&name);

            if self.records.has_removal(class, index)
                && let Some(end) = scan::element_end(html, &tag)
            {
                self.records.take_removal(class, index);
                out.push_str(&html[copied..tag.start])?;
                copied = if inline { end } else { scan::skip_newline(html, end) };
                cursor = copied;
                tracing::debug!(tag = %name, index, "Removed element");
                continue;
            }

            if !self.records.has_pending(class) {
                continue;
            }
            let fingerprint = element_fingerprint(html, &tag, &name);
            let rest = &html[tag.end..];
            let Some(fragment) = self.records.take_injection(
                class,
                index,
                fingerprint.as_deref(),
                |own| rest.contains(&*html_escape::encode_double_quoted_attribute(own)),
            ) else {
                continue;
            };
            let fragment = fragment.trim_start();

            if inline {
                // `<a href="…">` or `<img … />`: splice before the end.
                let at = tag.close_offset();
                let sep = if html[..at].ends_with(char::is_whitespace) { "" } else { " " };
                let tail = if tag.self_closing { " " } else { "" };
                out.push_all(&[&html[copied..at], sep, fragment, tail])?;
                copied = at;
            } else {
                let at = tag.name_end();
                out.push_all(&[&html[copied..at], " ", fragment])?;
                copied = at;
            }
        }

        out.push_str(&html[copied..])?;
        Ok(out.into_string())
    }
}

/// Fingerprint of an element as rendered: the decoded `href`/`src` for links
/// and images, the first text run of the content otherwise.
fn element_fingerprint(html: &str, tag: &TagSpan<'_>, name: &str) -> Option<String> {
    match name {
        "a" => tag
            .attr("href")
            .and_then(|v| url_fingerprint(&html_escape::decode_html_entities(v))),
        "img" => tag
            .attr("src")
            .and_then(|v| url_fingerprint(&html_escape::decode_html_entities(v))),
        _ => {
            let close = format!("</{name}");
            let until = html[tag.end..]
                .find(&close)
                .map_or(html.len(), |offset| tag.end + offset);
            scan::text_fingerprint(html, tag.end, until)
        }
    }
}
