//! Attribute records collected from the tree.
//!
//! [`AttributeCollector`] walks the tree once, in pre-order, and emits an
//! [`AttributeRecord`] for every countable node that carries an attribute
//! fragment. The reconciler later consumes each record at most once.

use std::borrow::Cow;

use crate::ast::Node;
use crate::fragment;
use crate::occurrence::{CountableClass, OccurrenceCounter, descends_into};

/// Key used to look up a record from the HTML side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchKey<'a> {
    /// Content fingerprint computed from the HTML element.
    Fingerprint(&'a str),
    /// Occurrence index within the element's class.
    Index(usize),
}

/// Attributes of one tree node, keyed for correlation with the HTML.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeRecord {
    pub class: CountableClass,
    pub index: usize,
    pub fingerprint: Option<String>,
    pub fragment: String,
    used: bool,
}

impl AttributeRecord {
    #[must_use]
    pub fn is_used(&self) -> bool {
        self.used
    }

    #[must_use]
    pub fn is_removal(&self) -> bool {
        fragment::is_removal(&self.fragment)
    }

    /// The part of the fragment the reconciler injects.
    #[must_use]
    pub fn injectable(&self) -> Cow<'_, str> {
        fragment::without_markers(&self.fragment)
    }

    fn has_injectable(&self) -> bool {
        !self.injectable().trim().is_empty()
    }

    fn matches(&self, key: MatchKey<'_>) -> bool {
        match key {
            MatchKey::Fingerprint(fp) => self.fingerprint.as_deref() == Some(fp),
            MatchKey::Index(index) => self.index == index,
        }
    }
}

/// All records of one document.
#[derive(Clone, Debug, Default)]
pub struct AttributeRecords {
    records: Vec<AttributeRecord>,
}

impl AttributeRecords {
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeRecord> {
        self.records.iter()
    }

    /// Total fragment length, used to size output buffers.
    #[must_use]
    pub fn fragment_bytes(&self) -> usize {
        self.records.iter().map(|r| r.fragment.len()).sum()
    }

    /// Whether any unused record of `class` is still waiting.
    #[must_use]
    pub fn has_pending(&self, class: CountableClass) -> bool {
        self.records.iter().any(|r| !r.used && r.class == class)
    }

    /// Whether an unused removal record exists at `(class, index)`.
    #[must_use]
    pub fn has_removal(&self, class: CountableClass, index: usize) -> bool {
        self.find_removal(class, index).is_some()
    }

    fn find_removal(&self, class: CountableClass, index: usize) -> Option<usize> {
        self.records
            .iter()
            .position(|r| !r.used && r.class == class && r.index == index && r.is_removal())
    }

    /// Consume the removal record at `(class, index)`.
    pub fn take_removal(&mut self, class: CountableClass, index: usize) -> bool {
        match self.find_removal(class, index) {
            Some(i) => {
                self.records[i].used = true;
                true
            }
            None => false,
        }
    }

    /// Consume the best injection record for an element and return the
    /// fragment to splice in.
    ///
    /// HTML-side indices only drift upward (raw HTML adds elements, removed
    /// elements are still counted), so a record never matches an element
    /// with a smaller index. Among fingerprint matches the record closest in
    /// index wins. Otherwise the record at the same index is taken, unless
    /// `ahead` reports that its own fingerprint still occurs later in the
    /// document.
    pub fn take_injection(
        &mut self,
        class: CountableClass,
        index: usize,
        fingerprint: Option<&str>,
        ahead: impl Fn(&str) -> bool,
    ) -> Option<String> {
        let candidates = || {
            self.records.iter().enumerate().filter(move |(_, r)| {
                !r.used && r.class == class && !r.is_removal() && r.has_injectable()
            })
        };

        let by_fingerprint = fingerprint.and_then(|fp| {
            candidates()
                .filter(|(_, r)| r.index <= index && r.matches(MatchKey::Fingerprint(fp)))
                .max_by_key(|(_, r)| r.index)
                .map(|(i, _)| i)
        });
        let chosen = by_fingerprint.or_else(|| {
            candidates()
                .find(|(_, r)| {
                    r.matches(MatchKey::Index(index))
                        && r.fingerprint.as_deref().is_none_or(|own| !ahead(own))
                })
                .map(|(i, _)| i)
        })?;

        let record = &mut self.records[chosen];
        record.used = true;
        Some(record.injectable().into_owned())
    }

    /// Records the reconciler had a use for but never matched.
    pub fn unmatched(&self) -> impl Iterator<Item = &AttributeRecord> {
        self.records
            .iter()
            .filter(|r| !r.used && (r.is_removal() || r.has_injectable()))
    }
}

/// Pre-order walk producing [`AttributeRecords`].
#[derive(Debug, Default)]
pub struct AttributeCollector {
    counter: OccurrenceCounter,
    records: Vec<AttributeRecord>,
}

impl AttributeCollector {
    /// Collect the records of a document.
    #[must_use]
    pub fn collect(document: &Node) -> AttributeRecords {
        let mut collector = Self::default();
        collector.walk(document);
        AttributeRecords {
            records: collector.records,
        }
    }

    fn walk(&mut self, node: &Node) {
        if let Some((class, index)) = self.counter.visit(node)
            && let Some(fragment) = node.fragment()
        {
            self.records.push(AttributeRecord {
                class,
                index,
                fingerprint: node.fingerprint(),
                fragment: fragment.to_owned(),
                used: false,
            });
        }
        if descends_into(node) {
            for child in &node.children {
                self.walk(child);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ConvertOptions;
    use crate::parse::parse_document;

    fn collect(markdown: &str) -> AttributeRecords {
        AttributeCollector::collect(&parse_document(markdown, &ConvertOptions::default()))
    }

    #[test]
    fn test_records_carry_class_index_and_fingerprint() {
        let records = collect("First\n\nSecond {: .b}\n\n## Head {#h}");
        let all: Vec<_> = records.iter().collect();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].class, CountableClass::Paragraph);
        assert_eq!(all[0].index, 1);
        assert_eq!(all[0].fingerprint.as_deref(), Some("Second"));
        assert_eq!(all[0].fragment, r#" class="b""#);
        assert_eq!(all[1].class, CountableClass::Heading);
        assert_eq!(all[1].index, 0);
    }

    #[test]
    fn test_links_share_paragraph_class() {
        let records = collect("Go [there](https://x.org){: .btn}");
        let record = records.iter().next().unwrap();
        assert_eq!(record.class, CountableClass::Paragraph);
        assert_eq!(record.index, 1);
        assert_eq!(record.fingerprint.as_deref(), Some("https://x.org"));
    }

    #[test]
    fn test_removed_subtree_is_not_descended() {
        let records = collect("> quote {: .inner}\n\n{: remove}\n\nafter {: .after}");
        let all: Vec<_> = records.iter().collect();
        assert_eq!(all.len(), 2);
        assert!(all[0].is_removal());
        // The paragraph inside the quote is still counted on neither side,
        // so "after" is paragraph #0.
        assert_eq!(all[1].index, 0);
    }

    #[test]
    fn test_take_injection_follows_drift() {
        let mut records = collect("one {: .a}\n\ntwo {: .b}");
        let fragment = records.take_injection(CountableClass::Paragraph, 1, Some("one"), |_| true);
        assert_eq!(fragment.as_deref(), Some(r#" class="a""#));
        let fragment = records.take_injection(CountableClass::Paragraph, 2, Some("two"), |_| true);
        assert_eq!(fragment.as_deref(), Some(r#" class="b""#));
        assert_eq!(records.unmatched().count(), 0);
    }

    #[test]
    fn test_fingerprint_match_never_reaches_ahead() {
        let mut records = collect("Intro\n\nIntro {: .x}");
        assert_eq!(
            records.take_injection(CountableClass::Paragraph, 0, Some("Intro"), |_| true),
            None
        );
        assert_eq!(
            records
                .take_injection(CountableClass::Paragraph, 1, Some("Intro"), |_| false)
                .as_deref(),
            Some(r#" class="x""#)
        );
    }

    #[test]
    fn test_index_fallback_when_fingerprint_is_gone() {
        let mut records = collect("one {: .a}");
        assert_eq!(
            records.take_injection(CountableClass::Paragraph, 0, Some("other"), |fp| fp == "one"),
            None
        );
        assert_eq!(
            records
                .take_injection(CountableClass::Paragraph, 0, Some("other"), |_| false)
                .as_deref(),
            Some(r#" class="a""#)
        );
    }

    #[test]
    fn test_marker_only_records_are_not_injected() {
        let mut records =
            collect("| A |\n|---|\n| 1 |\n\n{: caption=\"Totals\"}");
        assert_eq!(
            records.take_injection(CountableClass::Table, 0, Some("A"), |_| false),
            None
        );
        assert_eq!(records.unmatched().count(), 0);
    }

    #[test]
    fn test_take_removal_once() {
        let mut records = collect("gone {: remove}");
        assert!(records.has_removal(CountableClass::Paragraph, 0));
        assert!(records.take_removal(CountableClass::Paragraph, 0));
        assert!(!records.take_removal(CountableClass::Paragraph, 0));
    }
}
