//! Header ids, anchors and the table of contents.

use crate::ast::{Node, NodeKind};
use crate::buffer::OutputBuffer;
use crate::error::BufferError;
use crate::fragment;
use crate::occurrence::descends_into;
use crate::options::{AnchorMode, IdFormat};
use crate::scan;
use crate::slug::SlugGenerator;
use crate::util::escape_html;

/// Table of contents entry.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TocEntry {
    /// Heading level (1-6), after any level shift.
    pub level: u8,
    /// Heading text.
    pub title: String,
    /// Anchor id, if the heading has one.
    pub id: Option<String>,
}

/// A heading that needs a generated id, in document order.
#[derive(Clone, Debug, PartialEq, Eq)]
struct PendingId {
    text: String,
    id: String,
}

/// Assigns ids to headings that lack one.
#[derive(Debug)]
pub struct HeaderIdInjector {
    pending: Vec<PendingId>,
    toc: Vec<TocEntry>,
    mode: AnchorMode,
    generate: bool,
    limit: Option<usize>,
}

impl HeaderIdInjector {
    /// Walk the tree and plan the ids of its surviving headings.
    ///
    /// Manual ids (`{#id}`) are reserved first so generated ids never collide
    /// with them.
    #[must_use]
    pub fn plan(document: &Node, format: IdFormat, mode: AnchorMode, generate: bool) -> Self {
        let mut headings = Vec::new();
        surviving_headings(document, &mut headings);

        let mut slugs = SlugGenerator::new(format);
        let manual: Vec<Option<String>> = headings
            .iter()
            .map(|h| h.fragment().and_then(manual_id))
            .collect();
        for id in manual.iter().flatten() {
            slugs.reserve(id);
        }

        let mut pending = Vec::new();
        let mut toc = Vec::with_capacity(headings.len());
        for (heading, manual) in headings.iter().zip(manual) {
            let NodeKind::Heading { level } = heading.kind else {
                continue;
            };
            let title = heading.plain_text().trim().to_owned();
            let id = match manual {
                Some(id) => Some(id),
                None if generate => {
                    let id = slugs.generate(&title);
                    pending.push(PendingId {
                        text: title.clone(),
                        id: id.clone(),
                    });
                    Some(id)
                }
                None => None,
            };
            toc.push(TocEntry { level, title, id });
        }

        Self {
            pending,
            toc,
            mode,
            generate,
            limit: None,
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Generated ids in document order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.pending.iter().map(|p| p.id.as_str())
    }

    /// Table of contents of the surviving headings.
    #[must_use]
    pub fn toc(&self) -> &[TocEntry] {
        &self.toc
    }

    #[must_use]
    pub fn into_toc(self) -> Vec<TocEntry> {
        self.toc
    }

    /// Add ids or anchors to the headings of `html` that lack an `id`.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError`] when the output cannot grow.
    pub fn inject(&self, html: &str) -> Result<String, BufferError> {
        if !self.generate || self.pending.is_empty() {
            return Ok(html.to_owned());
        }

        let extra: usize = self.pending.iter().map(|p| p.id.len() * 2 + 64).sum();
        let mut out = OutputBuffer::for_input(html.len() + extra, self.limit)?;
        let mut next = self.pending.iter();
        let mut copied = 0;

        for tag in scan::tags(html, 0) {
            if tag.closing || !is_heading_tag(tag.name) || tag.has_attr("id") {
                continue;
            }
            let Some(pending) = next.next() else {
                break;
            };
            let id = escape_html(&pending.id);
            match self.mode {
                AnchorMode::Attribute => {
                    let at = tag.name_end();
                    out.push_all(&[&html[copied..at], r#" id=""#, &id, "\""])?;
                    copied = at;
                }
                AnchorMode::Anchor => {
                    out.push_all(&[
                        &html[copied..tag.end],
                        r##"<a href="#"##,
                        &id,
                        r#"" aria-hidden="true" class="anchor" id=""#,
                        &id,
                        r#""></a>"#,
                    ])?;
                    copied = tag.end;
                }
            }
            tracing::trace!(id = %pending.id, heading = %pending.text, "Header id");
        }
        if next.len() > 0 {
            tracing::debug!(left = next.len(), "More planned ids than headings in the output");
        }

        out.push_str(&html[copied..])?;
        Ok(out.into_string())
    }
}

fn is_heading_tag(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() == 2 && bytes[0].eq_ignore_ascii_case(&b'h') && (b'1'..=b'6').contains(&bytes[1])
}

fn manual_id(fragment: &str) -> Option<String> {
    fragment::attributes(fragment)
        .find(|a| a.name.eq_ignore_ascii_case("id"))
        .and_then(|a| a.value)
        .map(|v| html_escape::decode_html_entities(v).into_owned())
}

fn surviving_headings<'a>(node: &'a Node, out: &mut Vec<&'a Node>) {
    if !descends_into(node) {
        return;
    }
    if matches!(node.kind, NodeKind::Heading { .. }) {
        out.push(node);
    }
    for child in &node.children {
        surviving_headings(child, out);
    }
}
