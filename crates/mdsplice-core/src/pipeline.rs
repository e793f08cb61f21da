//! Conversion pipeline.
//!
//! ```text
//! markdown ─► parse ─► Node ─► baseline HTML
//!                       │            │
//!                       ├─ AttributeCollector ──► HtmlReconciler
//!                       ├─ TableStructureAnalyzer ─► TableRewriter
//!                       └─ HeaderIdInjector (plan) ─► inject
//!                                                    │
//!                                            CosmeticNormalizer ─► HTML
//! ```
//!
//! The tree is read-only once parsed. Every HTML stage consumes its
//! predecessor's string and produces a new one; a stage that runs out of
//! buffer is skipped and its input passed on unchanged.

use crate::ast::Node;
use crate::baseline;
use crate::collect::AttributeCollector;
use crate::cosmetic::{CosmeticNormalizer, shifted_level};
use crate::error::BufferError;
use crate::headers::{HeaderIdInjector, TocEntry};
use crate::options::{AnchorMode, ConvertOptions, IdFormat, QuotesLanguage};
use crate::parse::parse_document;
use crate::reconcile::HtmlReconciler;
use crate::table_analysis::TableStructureAnalyzer;
use crate::tables::TableRewriter;

/// Run one HTML stage, falling back to its input on failure.
pub(crate) fn run_stage<F>(
    stage: &'static str,
    input: String,
    warnings: &mut Vec<String>,
    f: F,
) -> String
where
    F: FnOnce(&str) -> Result<String, BufferError>,
{
    match f(&input) {
        Ok(output) => {
            tracing::debug!(stage, before = input.len(), after = output.len(), "Stage finished");
            output
        }
        Err(e) => {
            tracing::warn!(stage, error = %e, "Stage failed, keeping its input");
            warnings.push(format!("{stage}: {e}"));
            input
        }
    }
}

/// Result of converting one document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConvertResult {
    /// Final HTML fragment.
    pub html: String,
    /// Surviving headings, after the level shift.
    pub toc: Vec<TocEntry>,
    /// Unmatched attribute records and skipped stages.
    pub warnings: Vec<String>,
}

/// Markdown to HTML converter with attribute, table and header postprocessing.
///
/// # Example
///
/// ```
/// use mdsplice_core::{AnchorMode, Converter};
///
/// let result = Converter::new()
///     .with_anchor_mode(AnchorMode::Attribute)
///     .convert("# Totals {: .big}");
/// assert_eq!(result.html, "<h1 id=\"totals\" class=\"big\">Totals</h1>\n");
/// ```
#[derive(Clone, Debug, Default)]
pub struct Converter {
    options: ConvertOptions,
}

impl Converter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_options(options: ConvertOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    #[must_use]
    pub fn with_id_format(mut self, format: IdFormat) -> Self {
        self.options.id_format = format;
        self
    }

    #[must_use]
    pub fn with_anchor_mode(mut self, mode: AnchorMode) -> Self {
        self.options.anchor_mode = mode;
        self
    }

    #[must_use]
    pub fn with_quotes_language(mut self, language: QuotesLanguage) -> Self {
        self.options.quotes_language = language;
        self
    }

    #[must_use]
    pub fn with_relaxed_tables(mut self, enabled: bool) -> Self {
        self.options.relaxed_tables = enabled;
        self
    }

    #[must_use]
    pub fn with_header_ids(mut self, enabled: bool) -> Self {
        self.options.generate_header_ids = enabled;
        self
    }

    #[must_use]
    pub fn with_header_level_shift(mut self, shift: i8) -> Self {
        self.options.header_level_shift = shift;
        self
    }

    #[must_use]
    pub fn with_aria(mut self, enabled: bool) -> Self {
        self.options.aria = enabled;
        self
    }

    #[must_use]
    pub fn with_caption_lookbehind(mut self, bytes: usize) -> Self {
        self.options.caption_lookbehind = bytes;
        self
    }

    /// Limit the size of every stage's output buffer.
    #[must_use]
    pub fn with_output_limit(mut self, limit: Option<usize>) -> Self {
        self.options.max_output_bytes = limit;
        self
    }

    /// Parse markdown into a tree.
    #[must_use]
    pub fn parse(&self, markdown: &str) -> Node {
        parse_document(markdown, &self.options)
    }

    /// Render markdown with the plain renderer, ignoring every attribute.
    #[must_use]
    pub fn baseline(&self, markdown: &str) -> String {
        baseline::render(&self.parse(markdown))
    }

    /// Convert markdown to postprocessed HTML.
    #[must_use]
    pub fn convert(&self, markdown: &str) -> ConvertResult {
        let document = self.parse(markdown);
        let html = baseline::render(&document);
        self.postprocess(&document, html)
    }

    /// Postprocess the renderer output of `document`.
    #[must_use]
    pub fn postprocess(&self, document: &Node, html: String) -> ConvertResult {
        let options = &self.options;
        let limit = options.max_output_bytes;
        let mut warnings = Vec::new();

        let mut records = AttributeCollector::collect(document);
        let layout = TableStructureAnalyzer::analyze(document);
        let headers = HeaderIdInjector::plan(
            document,
            options.id_format,
            options.anchor_mode,
            options.generate_header_ids,
        )
        .with_limit(limit);
        tracing::debug!(
            records = records.len(),
            tables = layout.table_count(),
            headings = headers.toc().len(),
            "Collected document structure"
        );

        let mut html = run_stage("reconcile", html, &mut warnings, |h| {
            HtmlReconciler::new(&mut records).with_limit(limit).reconcile(h)
        });
        for record in records.unmatched() {
            tracing::warn!(
                class = ?record.class,
                index = record.index,
                fragment = %record.fragment.trim(),
                "Unmatched attribute record"
            );
            warnings.push(format!(
                "unmatched attributes `{}` on {:?} #{}",
                record.fragment.trim(),
                record.class,
                record.index
            ));
        }

        html = run_stage("tables", html, &mut warnings, |h| {
            TableRewriter::new(&layout).with_limit(limit).rewrite(h)
        });
        html = run_stage("header-ids", html, &mut warnings, |h| headers.inject(h));
        html = CosmeticNormalizer::new(options).normalize(html, &mut warnings);

        let shift = options.header_level_shift;
        let toc = headers
            .into_toc()
            .into_iter()
            .map(|entry| TocEntry {
                level: shifted_level(entry.level, shift),
                ..entry
            })
            .collect();

        ConvertResult {
            html,
            toc,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scenario_colspan() {
        let result = Converter::new().convert("| A | B |\n|---|---|\n| 1 {: colspan=2} | 2 |");
        assert!(result.html.contains("<tr><td colspan=\"2\">1</td></tr>"));
        assert!(!result.html.contains("<td>2</td>"));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_explicit_rowspan_drops_covered_cell() {
        let result = Converter::new()
            .convert("| A | B |\n|---|---|\n| 1 {: rowspan=2} | 2 |\n| 3 | 4 |");
        assert!(result.html.contains("<tr><td rowspan=\"2\">1</td><td>2</td></tr>"));
        assert!(result.html.contains("<tr><td>4</td></tr>"));
        assert!(!result.html.contains(">3<"));
    }

    #[test]
    fn test_empty_heading_gets_fallback_id() {
        let result = Converter::new().convert("#\n\ntext");
        assert!(result.html.starts_with("<h1 id=\"section\"></h1>"));
        assert!(!result.html.contains("id=\"\""));
    }

    #[test]
    fn test_scenario_relaxed_table() {
        let result = Converter::new()
            .with_relaxed_tables(true)
            .convert("| a | b |\n| c | d |\n");
        assert!(!result.html.contains("<thead>"));
        assert!(!result.html.contains("<th>"));
        assert!(!result.html.contains("data-relaxed"));
        assert!(result.html.contains("<tr><td>a</td><td>b</td></tr>"));
        assert!(result.html.contains("<tr><td>c</td><td>d</td></tr>"));
    }

    #[test]
    fn test_scenario_attribute_ids() {
        let result = Converter::new().convert("# Totals");
        assert_eq!(result.html.trim_end(), "<h1 id=\"totals\">Totals</h1>");
    }

    #[test]
    fn test_scenario_anchor_ids() {
        let result = Converter::new()
            .with_anchor_mode(AnchorMode::Anchor)
            .convert("# Totals");
        assert_eq!(
            result.html.trim_end(),
            "<h1><a href=\"#totals\" aria-hidden=\"true\" class=\"anchor\" id=\"totals\"></a>Totals</h1>"
        );
    }

    #[test]
    fn test_scenario_french_quotes() {
        let converter = Converter::new().with_quotes_language(QuotesLanguage::French);
        let document = converter.parse("x");
        let result = converter.postprocess(&document, "<p>&ldquo;hello&rdquo;</p>".to_owned());
        assert_eq!(result.html, "<p>&laquo;&nbsp;hello&nbsp;&raquo;</p>");
    }

    #[test]
    fn test_removed_row_drops_row_count() {
        let markdown = "| A | B |\n|---|---|\n| 1 | 2 |\n| 3 | 4 |";
        let kept = Converter::new().convert(markdown);
        let removed = Converter::new()
            .convert("| A | B |\n|---|---|\n| 1 | 2 |\n| 3 {: remove} | 4 {: remove} |");
        assert_eq!(
            removed.html.matches("<tr>").count() + 1,
            kept.html.matches("<tr>").count()
        );
        assert!(!removed.html.contains(">3<"));
    }

    #[test]
    fn test_explicit_and_paragraph_caption_once() {
        let result = Converter::new()
            .convert("[Revenue Q4]\n\n| A |\n|---|\n| 1 |\n\n{: caption=\"Revenue Q4\"}");
        assert_eq!(
            result.html.matches("<figcaption>Revenue Q4</figcaption>").count(),
            1
        );
        assert!(!result.html.contains("<p>[Revenue Q4]</p>"));
    }

    #[test]
    fn test_header_id_bijection() {
        let result = Converter::new().convert("# A\n\n## A\n\n## B {#manual}\n\n### A\n\ntext");
        let ids: Vec<_> = result.toc.iter().filter_map(|e| e.id.as_deref()).collect();
        assert_eq!(ids, vec!["a", "a-1", "manual", "a-2"]);
        for id in ids {
            assert_eq!(result.html.matches(&format!("id=\"{id}\"")).count(), 1);
        }
    }

    #[test]
    fn test_level_shift_applies_to_toc() {
        let result = Converter::new().with_header_level_shift(1).convert("# One\n\n###### Six");
        assert!(result.html.contains("<h2 id=\"one\">One</h2>"));
        assert!(result.html.contains("<h6 id=\"six\">Six</h6>"));
        let levels: Vec<_> = result.toc.iter().map(|e| e.level).collect();
        assert_eq!(levels, vec![2, 6]);
    }

    #[test]
    fn test_unmatched_record_is_a_warning() {
        let converter = Converter::new();
        let document = converter.parse("Text {: .t}");
        let result = converter.postprocess(&document, "<div>other</div>".to_owned());
        assert_eq!(result.html, "<div>other</div>");
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("class=\"t\""));
    }

    #[test]
    fn test_output_limit_keeps_baseline() {
        let markdown = "# Title {: .x}\n\nbody";
        let converter = Converter::new().with_output_limit(Some(8));
        let baseline = converter.baseline(markdown);
        let result = converter.convert(markdown);
        assert_eq!(result.html, baseline);
        assert!(!result.warnings.is_empty());
    }

    #[test]
    fn test_baseline_ignores_attributes() {
        let html = Converter::new().baseline("Lead {: .lead}");
        assert_eq!(html, "<p>Lead</p>\n");
    }

    #[test]
    fn test_aria_on_captioned_table() {
        let result = Converter::new()
            .with_aria(true)
            .convert("| A |\n|---|\n| 1 |\n\n{: caption=\"Sum\"}");
        assert!(result.html.contains("<figure role=\"figure\" class=\"table-figure\">"));
        assert!(result.html.contains("<figcaption id=\"figcaption-1\">Sum</figcaption>"));
        assert!(result.html.contains("<table aria-describedby=\"figcaption-1\">"));
    }
}
