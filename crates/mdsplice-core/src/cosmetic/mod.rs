//! Cosmetic normalization.
//!
//! Independent passes, run in this order over the full output of the
//! previous pass:
//!
//! | Pass | Effect |
//! |---|---|
//! | tag spacing | whitespace inside tags collapsed, none before `>` |
//! | inter-tag newlines | whitespace between tags with newlines → one line break or one blank line |
//! | relaxed tables | synthetic header rows moved back into the body |
//! | separator rows | blank lines and dash-only rows removed from tables |
//! | level shift | `<hN>` renumbered, clamped to 1-6 |
//! | quotes | English curly quotes replaced by the configured language's |
//! | ARIA | roles, labels and `aria-describedby` |
//!
//! Each pass falls back to its input if its output buffer cannot grow.

mod aria;
mod levels;
mod quotes;
mod relaxed;
mod spacing;

pub use aria::add_aria;
pub use levels::{shift_headings, shifted_level};
pub use quotes::{QuoteSet, localize_quotes, quote_set};
pub use relaxed::{demote_relaxed_headers, drop_separator_rows};
pub use spacing::{collapse_between_tags, collapse_tag_whitespace};

use crate::options::{ConvertOptions, QuotesLanguage};
use crate::pipeline::run_stage;

/// Runs the cosmetic passes selected by the options.
#[derive(Clone, Debug)]
pub struct CosmeticNormalizer {
    level_shift: i8,
    quotes: QuotesLanguage,
    aria: bool,
    caption_lookbehind: usize,
    limit: Option<usize>,
}

impl CosmeticNormalizer {
    #[must_use]
    pub fn new(options: &ConvertOptions) -> Self {
        Self {
            level_shift: options.header_level_shift,
            quotes: options.quotes_language,
            aria: options.aria,
            caption_lookbehind: options.caption_lookbehind,
            limit: options.max_output_bytes,
        }
    }

    /// Apply every enabled pass to `html`.
    ///
    /// Failed passes are reported in `warnings`.
    pub fn normalize(&self, html: String, warnings: &mut Vec<String>) -> String {
        let limit = self.limit;
        let mut html = run_stage("tag-spacing", html, warnings, |h| {
            collapse_tag_whitespace(h, limit)
        });
        html = run_stage("inter-tag-newlines", html, warnings, |h| {
            collapse_between_tags(h, limit)
        });
        if html.contains("data-relaxed") {
            html = run_stage("relaxed-tables", html, warnings, |h| {
                demote_relaxed_headers(h, limit)
            });
        }
        if html.contains("<table") {
            html = run_stage("separator-rows", html, warnings, |h| {
                drop_separator_rows(h, limit)
            });
        }
        if self.level_shift != 0 {
            html = run_stage("level-shift", html, warnings, |h| {
                shift_headings(h, self.level_shift, limit)
            });
        }
        if self.quotes != QuotesLanguage::English {
            html = run_stage("quotes", html, warnings, |h| {
                localize_quotes(h, self.quotes, limit)
            });
        }
        if self.aria {
            html = run_stage("aria", html, warnings, |h| {
                add_aria(h, self.caption_lookbehind, limit)
            });
        }
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_passes() {
        let options = ConvertOptions::default();
        let mut warnings = Vec::new();
        let html = CosmeticNormalizer::new(&options)
            .normalize("<p >a</p>\n\n\n<h1>b</h1>".to_owned(), &mut warnings);
        assert_eq!(html, "<p>a</p>\n\n<h1>b</h1>");
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_optional_passes() {
        let options = ConvertOptions {
            header_level_shift: 1,
            quotes_language: QuotesLanguage::French,
            aria: true,
            ..ConvertOptions::default()
        };
        let mut warnings = Vec::new();
        let html = CosmeticNormalizer::new(&options).normalize(
            "<h1>\u{201c}T\u{201d}</h1><figure><figcaption>c</figcaption></figure>".to_owned(),
            &mut warnings,
        );
        assert_eq!(
            html,
            "<h2>&laquo;&nbsp;T&nbsp;&raquo;</h2>\
             <figure role=\"figure\"><figcaption id=\"figcaption-1\">c</figcaption></figure>"
        );
    }

    #[test]
    fn test_failed_pass_keeps_input() {
        let options = ConvertOptions {
            max_output_bytes: Some(4),
            ..ConvertOptions::default()
        };
        let mut warnings = Vec::new();
        let input = "<p >abc</p>";
        let html = CosmeticNormalizer::new(&options).normalize(input.to_owned(), &mut warnings);
        assert_eq!(html, input);
        assert!(!warnings.is_empty());
    }
}
