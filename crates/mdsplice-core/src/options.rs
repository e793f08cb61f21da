//! Conversion options.

use std::fmt;
use std::str::FromStr;

use crate::error::ParseOptionError;

/// Default bound, in bytes, of the backward figcaption search.
pub const DEFAULT_CAPTION_LOOKBEHIND: usize = 1024;

/// Slug rules for generated header ids.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum IdFormat {
    /// GitHub style: lowercase, spaces to `-`, punctuation dropped.
    #[default]
    Gfm,
    /// MultiMarkdown style: lowercase, spaces removed.
    Mmd,
    /// Kramdown style: like GFM, leading non-letters removed.
    Kramdown,
}

/// How header ids are exposed in the HTML.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AnchorMode {
    /// `id="…"` on the heading tag.
    #[default]
    Attribute,
    /// An empty `<a class="anchor">` inside the heading.
    Anchor,
}

/// Target language for quote localization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum QuotesLanguage {
    #[default]
    English,
    Dutch,
    French,
    German,
    GermanGuillemets,
    Swedish,
    Spanish,
    Swiss,
}

const ID_FORMATS: &str = "gfm, mmd, kramdown";
const ANCHOR_MODES: &str = "attribute, anchor";
const QUOTES_LANGUAGES: &str =
    "english, dutch, french, german, germanguillemets, swedish, spanish, swiss";

impl FromStr for IdFormat {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gfm" | "github" => Ok(Self::Gfm),
            "mmd" | "multimarkdown" => Ok(Self::Mmd),
            "kramdown" => Ok(Self::Kramdown),
            _ => Err(ParseOptionError {
                kind: "id format",
                value: s.to_owned(),
                expected: ID_FORMATS,
            }),
        }
    }
}

impl FromStr for AnchorMode {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "attribute" => Ok(Self::Attribute),
            "anchor" => Ok(Self::Anchor),
            _ => Err(ParseOptionError {
                kind: "anchor mode",
                value: s.to_owned(),
                expected: ANCHOR_MODES,
            }),
        }
    }
}

impl FromStr for QuotesLanguage {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "english" | "en" => Ok(Self::English),
            "dutch" | "nl" => Ok(Self::Dutch),
            "french" | "fr" => Ok(Self::French),
            "german" | "de" => Ok(Self::German),
            "germanguillemets" => Ok(Self::GermanGuillemets),
            "swedish" | "sv" => Ok(Self::Swedish),
            "spanish" | "es" => Ok(Self::Spanish),
            "swiss" => Ok(Self::Swiss),
            _ => Err(ParseOptionError {
                kind: "quotes language",
                value: s.to_owned(),
                expected: QUOTES_LANGUAGES,
            }),
        }
    }
}

impl fmt::Display for IdFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Gfm => "gfm",
            Self::Mmd => "mmd",
            Self::Kramdown => "kramdown",
        })
    }
}

/// Options for one conversion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConvertOptions {
    pub id_format: IdFormat,
    pub anchor_mode: AnchorMode,
    /// Generate ids for headings without a manual id.
    pub generate_header_ids: bool,
    /// Added to every heading level; the result is clamped to 1-6.
    pub header_level_shift: i8,
    pub quotes_language: QuotesLanguage,
    /// Accept pipe tables without a delimiter row.
    pub relaxed_tables: bool,
    pub smart_punctuation: bool,
    /// Add ARIA roles and labels.
    pub aria: bool,
    /// Bound of the backward figcaption search for `aria-describedby`.
    pub caption_lookbehind: usize,
    /// Upper bound on any stage's output. `None` means unbounded.
    pub max_output_bytes: Option<usize>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            id_format: IdFormat::default(),
            anchor_mode: AnchorMode::default(),
            generate_header_ids: true,
            header_level_shift: 0,
            quotes_language: QuotesLanguage::default(),
            relaxed_tables: false,
            smart_punctuation: true,
            aria: false,
            caption_lookbehind: DEFAULT_CAPTION_LOOKBEHIND,
            max_output_bytes: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_format_from_str() {
        assert_eq!("GFM".parse::<IdFormat>(), Ok(IdFormat::Gfm));
        assert_eq!("mmd".parse::<IdFormat>(), Ok(IdFormat::Mmd));
        let err = "slug".parse::<IdFormat>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid id format 'slug' (expected one of: gfm, mmd, kramdown)"
        );
    }

    #[test]
    fn test_quotes_language_from_str() {
        assert_eq!("fr".parse::<QuotesLanguage>(), Ok(QuotesLanguage::French));
        assert_eq!(
            "GermanGuillemets".parse::<QuotesLanguage>(),
            Ok(QuotesLanguage::GermanGuillemets)
        );
        assert!("klingon".parse::<QuotesLanguage>().is_err());
    }

    #[test]
    fn test_defaults() {
        let options = ConvertOptions::default();
        assert!(options.generate_header_ids);
        assert!(options.smart_punctuation);
        assert!(!options.aria);
        assert_eq!(options.caption_lookbehind, DEFAULT_CAPTION_LOOKBEHIND);
    }
}
