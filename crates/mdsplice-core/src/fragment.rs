//! Inspection of attribute fragments.
//!
//! Fragments are opaque attribute text, but a handful of attributes act as
//! markers for the pipeline rather than as output:
//!
//! | Marker | Meaning | Consumer |
//! |---|---|---|
//! | `data-remove` | drop the element | reconciler / table rewriter |
//! | `data-caption="…"` | table caption | table rewriter |
//! | `data-tfoot` | row belongs to `<tfoot>` | table rewriter |
//! | `rowspan` / `colspan` | cell spans | table rewriter |
//! | `data-relaxed` | table had no delimiter row | cosmetic normalizer |

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// A single `name` or `name="value"` attribute inside a fragment.
static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\s*([A-Za-z_:][-A-Za-z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#)
        .unwrap()
});

const REMOVE: &str = "data-remove";
const CAPTION: &str = "data-caption";
const TFOOT: &str = "data-tfoot";

/// Attribute names that only steer the table rewriter.
const TABLE_MARKERS: &[&str] = &[CAPTION, TFOOT, "rowspan", "colspan"];

/// A parsed attribute borrowed from a fragment.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Attribute<'a> {
    pub name: &'a str,
    pub value: Option<&'a str>,
    /// Raw source text of the attribute, including its leading whitespace.
    pub raw: &'a str,
}

/// Iterate over the attributes of a fragment.
pub(crate) fn attributes(fragment: &str) -> impl Iterator<Item = Attribute<'_>> {
    ATTRIBUTE.captures_iter(fragment).filter_map(|caps| {
        let raw = caps.get(0)?.as_str();
        let name = caps.get(1)?.as_str();
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| m.as_str());
        Some(Attribute { name, value, raw })
    })
}

fn has_attribute(fragment: &str, name: &str) -> bool {
    attributes(fragment).any(|a| a.name.eq_ignore_ascii_case(name))
}

/// Whether the fragment asks for its element to be removed.
#[must_use]
pub fn is_removal(fragment: &str) -> bool {
    has_attribute(fragment, REMOVE)
}

/// Whether the fragment marks a table row as footer row.
#[must_use]
pub fn is_tfoot(fragment: &str) -> bool {
    has_attribute(fragment, TFOOT)
}

/// Value of a `rowspan`/`colspan` attribute, 1 when absent or invalid.
#[must_use]
pub fn span(fragment: &str, name: &str) -> usize {
    attributes(fragment)
        .find(|a| a.name.eq_ignore_ascii_case(name))
        .and_then(|a| a.value)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(1)
}

/// The unescaped value of `data-caption`, if present and non-empty.
#[must_use]
pub fn caption(fragment: &str) -> Option<String> {
    attributes(fragment)
        .find(|a| a.name.eq_ignore_ascii_case(CAPTION))
        .and_then(|a| a.value)
        .map(|v| html_escape::decode_html_entities(v).trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// The fragment without table markers and removal flags.
///
/// Returns an empty string when nothing but markers was present.
#[must_use]
pub fn without_markers(fragment: &str) -> Cow<'_, str> {
    let is_marker = |a: &Attribute<'_>| {
        a.name.eq_ignore_ascii_case(REMOVE)
            || TABLE_MARKERS.iter().any(|m| a.name.eq_ignore_ascii_case(m))
    };
    if !attributes(fragment).any(|a| is_marker(&a)) {
        return Cow::Borrowed(fragment);
    }
    Cow::Owned(
        attributes(fragment)
            .filter(|a| !is_marker(a))
            .map(|a| a.raw)
            .collect(),
    )
}

/// Only the `rowspan`/`colspan` attributes plus any non-marker attributes,
/// i.e. what a table cell should receive.
#[must_use]
pub fn cell_attributes(fragment: &str) -> String {
    attributes(fragment)
        .filter(|a| {
            !a.name.eq_ignore_ascii_case(REMOVE)
                && !a.name.eq_ignore_ascii_case(CAPTION)
                && !a.name.eq_ignore_ascii_case(TFOOT)
        })
        .map(|a| a.raw)
        .collect()
}

/// Append `extra` to an existing fragment.
#[must_use]
pub fn merge(existing: Option<&str>, extra: &str) -> String {
    let mut merged = existing.unwrap_or_default().to_owned();
    if !extra.is_empty() && !extra.starts_with(char::is_whitespace) {
        merged.push(' ');
    }
    merged.push_str(extra);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_parse_forms() {
        let attrs: Vec<_> = attributes(r#" id="x" hidden colspan=2 title='a b'"#).collect();
        assert_eq!(attrs.len(), 4);
        assert_eq!(attrs[0].name, "id");
        assert_eq!(attrs[0].value, Some("x"));
        assert_eq!(attrs[1].name, "hidden");
        assert_eq!(attrs[1].value, None);
        assert_eq!(attrs[2].value, Some("2"));
        assert_eq!(attrs[3].value, Some("a b"));
    }

    #[test]
    fn test_is_removal() {
        assert!(is_removal(" data-remove"));
        assert!(is_removal(r#" class="x" data-remove"#));
        assert!(!is_removal(r#" data-removed="1""#));
    }

    #[test]
    fn test_span() {
        assert_eq!(span(r#" colspan="3" class="x""#, "colspan"), 3);
        assert_eq!(span(" rowspan=2", "rowspan"), 2);
        assert_eq!(span(r#" colspan="0""#, "colspan"), 1);
        assert_eq!(span(r#" class="x""#, "colspan"), 1);
    }

    #[test]
    fn test_caption_decodes_entities() {
        assert_eq!(
            caption(r#" data-caption="Q4 &amp; Q1""#).as_deref(),
            Some("Q4 & Q1")
        );
        assert_eq!(caption(r#" data-caption="""#), None);
    }

    #[test]
    fn test_without_markers() {
        assert_eq!(
            without_markers(r#" class="wide" data-caption="Revenue""#),
            r#" class="wide""#
        );
        assert_eq!(without_markers(" data-remove"), "");
        assert!(matches!(
            without_markers(r#" class="lead""#),
            Cow::Borrowed(_)
        ));
    }

    #[test]
    fn test_cell_attributes_keep_spans() {
        assert_eq!(
            cell_attributes(r#" colspan="2" data-remove"#),
            r#" colspan="2""#
        );
    }

    #[test]
    fn test_merge() {
        assert_eq!(merge(None, r#" colspan="2""#), r#" colspan="2""#);
        assert_eq!(merge(Some(" hidden"), "data-tfoot"), " hidden data-tfoot");
    }
}
