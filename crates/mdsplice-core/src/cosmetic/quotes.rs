//! Quote localization.
//!
//! The renderer (with smart punctuation) produces English curly quotes,
//! either as characters or as entities when they come from raw HTML. Other
//! languages get their own quote marks, written as named entities.

use crate::buffer::OutputBuffer;
use crate::error::BufferError;
use crate::options::QuotesLanguage;
use crate::scan;

/// Elements whose text is never localized.
const VERBATIM: &[&str] = &["pre", "code", "kbd", "script", "style"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Quote {
    OpenDouble,
    CloseDouble,
    OpenSingle,
    CloseSingle,
}

/// Quote marks of one language.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuoteSet {
    pub open_double: &'static str,
    pub close_double: &'static str,
    pub open_single: &'static str,
    pub close_single: &'static str,
}

impl QuoteSet {
    fn get(&self, quote: Quote) -> &'static str {
        match quote {
            Quote::OpenDouble => self.open_double,
            Quote::CloseDouble => self.close_double,
            Quote::OpenSingle => self.open_single,
            Quote::CloseSingle => self.close_single,
        }
    }
}

/// Quote marks for `language`; `None` for English, which needs no change.
#[must_use]
pub fn quote_set(language: QuotesLanguage) -> Option<QuoteSet> {
    let (open_double, close_double, open_single, close_single) = match language {
        QuotesLanguage::English => return None,
        QuotesLanguage::Dutch => ("&bdquo;", "&rdquo;", "&sbquo;", "&rsquo;"),
        QuotesLanguage::French => (
            "&laquo;&nbsp;",
            "&nbsp;&raquo;",
            "&lsaquo;&nbsp;",
            "&nbsp;&rsaquo;",
        ),
        QuotesLanguage::German => ("&bdquo;", "&ldquo;", "&sbquo;", "&lsquo;"),
        QuotesLanguage::GermanGuillemets => ("&raquo;", "&laquo;", "&rsaquo;", "&lsaquo;"),
        QuotesLanguage::Swedish => ("&rdquo;", "&rdquo;", "&rsquo;", "&rsquo;"),
        QuotesLanguage::Spanish => ("&laquo;", "&raquo;", "&ldquo;", "&rdquo;"),
        QuotesLanguage::Swiss => ("&laquo;", "&raquo;", "&lsaquo;", "&rsaquo;"),
    };
    Some(QuoteSet {
        open_double,
        close_double,
        open_single,
        close_single,
    })
}

/// Spellings of the English quotes recognised in the text.
const SPELLINGS: &[(&str, Quote)] = &[
    ("\u{201c}", Quote::OpenDouble),
    ("&ldquo;", Quote::OpenDouble),
    ("&#8220;", Quote::OpenDouble),
    ("&#x201c;", Quote::OpenDouble),
    ("&#x201C;", Quote::OpenDouble),
    ("\u{201d}", Quote::CloseDouble),
    ("&rdquo;", Quote::CloseDouble),
    ("&#8221;", Quote::CloseDouble),
    ("&#x201d;", Quote::CloseDouble),
    ("&#x201D;", Quote::CloseDouble),
    ("\u{2018}", Quote::OpenSingle),
    ("&lsquo;", Quote::OpenSingle),
    ("&#8216;", Quote::OpenSingle),
    ("&#x2018;", Quote::OpenSingle),
    ("\u{2019}", Quote::CloseSingle),
    ("&rsquo;", Quote::CloseSingle),
    ("&#8217;", Quote::CloseSingle),
    ("&#x2019;", Quote::CloseSingle),
];

fn quote_at(text: &str) -> Option<(Quote, usize)> {
    SPELLINGS
        .iter()
        .find(|(spelling, _)| text.starts_with(spelling))
        .map(|(spelling, quote)| (*quote, spelling.len()))
}

/// Localize the quotes of one text run.
fn localize_text(text: &str, quotes: &QuoteSet, out: &mut OutputBuffer) -> Result<(), BufferError> {
    let mut copied = 0;
    let mut pos = 0;
    while pos < text.len() {
        let rest = &text[pos..];
        let Some((quote, len)) = quote_at(rest) else {
            pos += rest.chars().next().map_or(1, char::len_utf8);
            continue;
        };
        // `don’t`: a closing single quote between letters is an apostrophe.
        let is_apostrophe = quote == Quote::CloseSingle
            && text[..pos].chars().next_back().is_some_and(char::is_alphanumeric)
            && text[pos + len..].chars().next().is_some_and(char::is_alphanumeric);
        if !is_apostrophe {
            out.push_all(&[&text[copied..pos], quotes.get(quote)])?;
            copied = pos + len;
        }
        pos += len;
    }
    out.push_str(&text[copied..])
}

/// Replace English quotes in text content with those of `language`.
///
/// Tag internals and the content of code-like elements are not touched.
pub fn localize_quotes(
    html: &str,
    language: QuotesLanguage,
    limit: Option<usize>,
) -> Result<String, BufferError> {
    let Some(quotes) = quote_set(language) else {
        return Ok(html.to_owned());
    };
    let mut out = OutputBuffer::for_input(html.len() + html.len() / 8, limit)?;
    let mut verbatim_depth = 0usize;
    let mut copied = 0;
    let mut cursor = 0;

    while let Some(tag) = scan::next_tag(html, cursor) {
        cursor = tag.end;
        let text = &html[copied..tag.start];
        if verbatim_depth == 0 {
            localize_text(text, &quotes, &mut out)?;
        } else {
            out.push_str(text)?;
        }
        out.push_str(tag.raw)?;
        copied = tag.end;

        if VERBATIM.iter().any(|v| tag.is(v)) && !tag.self_closing {
            if tag.closing {
                verbatim_depth = verbatim_depth.saturating_sub(1);
            } else {
                verbatim_depth += 1;
                if scan::is_raw_text(tag.name)
                    && let Some(end) = scan::content_end(html, &tag)
                {
                    out.push_str(&html[tag.end..end])?;
                    copied = end;
                    cursor = end;
                }
            }
        }
    }

    let text = &html[copied..];
    if verbatim_depth == 0 {
        localize_text(text, &quotes, &mut out)?;
    } else {
        out.push_str(text)?;
    }
    Ok(out.into_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_french_entities() {
        assert_eq!(
            localize_quotes("&ldquo;hello&rdquo;", QuotesLanguage::French, None).unwrap(),
            "&laquo;&nbsp;hello&nbsp;&raquo;"
        );
    }

    #[test]
    fn test_german_unicode() {
        assert_eq!(
            localize_quotes(
                "<p>\u{201c}Hallo\u{201d} und \u{2018}so\u{2019}</p>",
                QuotesLanguage::German,
                None
            )
            .unwrap(),
            "<p>&bdquo;Hallo&ldquo; und &sbquo;so&lsquo;</p>"
        );
    }

    #[test]
    fn test_english_is_noop() {
        let html = "<p>\u{201c}x\u{201d}</p>";
        assert_eq!(localize_quotes(html, QuotesLanguage::English, None).unwrap(), html);
    }

    #[test]
    fn test_apostrophe_kept() {
        assert_eq!(
            localize_quotes("<p>don\u{2019}t \u{2018}x\u{2019}</p>", QuotesLanguage::Swiss, None)
                .unwrap(),
            "<p>don\u{2019}t &lsaquo;x&rsaquo;</p>"
        );
    }

    #[test]
    fn test_code_and_attributes_untouched() {
        let html = "<p title=\"\u{201c}t\u{201d}\"><code>\u{201c}c\u{201d}</code> \u{201c}p\u{201d}</p>";
        assert_eq!(
            localize_quotes(html, QuotesLanguage::Spanish, None).unwrap(),
            "<p title=\"\u{201c}t\u{201d}\"><code>\u{201c}c\u{201d}</code> &laquo;p&raquo;</p>"
        );
    }
}
