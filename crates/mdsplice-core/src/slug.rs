//! Heading slug generation.

use std::collections::HashSet;

use crate::options::IdFormat;

/// Slug used when a heading yields no id characters at all.
const FALLBACK_SLUG: &str = "section";

/// Generates unique slugs within one document.
#[derive(Debug, Default)]
pub struct SlugGenerator {
    format: IdFormat,
    used: HashSet<String>,
}

impl SlugGenerator {
    #[must_use]
    pub fn new(format: IdFormat) -> Self {
        Self {
            format,
            used: HashSet::new(),
        }
    }

    /// Mark an id as taken, e.g. a manual `{#id}`.
    pub fn reserve(&mut self, id: &str) {
        self.used.insert(id.to_owned());
    }

    /// Slug for `text`, suffixed with `-1`, `-2`, … when already taken.
    ///
    /// Headings without id characters get [`FALLBACK_SLUG`].
    pub fn generate(&mut self, text: &str) -> String {
        let mut base = slugify(text, self.format);
        if base.is_empty() {
            base = FALLBACK_SLUG.to_owned();
        }
        let mut candidate = base.clone();
        let mut n = 1;
        while self.used.contains(&candidate) {
            candidate = format!("{base}-{n}");
            n += 1;
        }
        self.used.insert(candidate.clone());
        candidate
    }
}

/// Slug for `text` in the given format, without de-duplication.
#[must_use]
pub fn slugify(text: &str, format: IdFormat) -> String {
    let lower = text.trim().to_lowercase();
    match format {
        IdFormat::Gfm => lower
            .chars()
            .filter_map(|c| match c {
                ' ' => Some('-'),
                c if c.is_alphanumeric() || c == '-' || c == '_' => Some(c),
                _ => None,
            })
            .collect(),
        IdFormat::Mmd => lower
            .chars()
            .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
            .collect(),
        IdFormat::Kramdown => {
            let slug: String = lower
                .trim_start_matches(|c: char| !c.is_alphabetic())
                .chars()
                .filter_map(|c| match c {
                    ' ' => Some('-'),
                    c if c.is_alphanumeric() || c == '-' || c == '_' => Some(c),
                    _ => None,
                })
                .collect();
            if slug.is_empty() {
                FALLBACK_SLUG.to_owned()
            } else {
                slug
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gfm() {
        assert_eq!(slugify("Hello, World!", IdFormat::Gfm), "hello-world");
        assert_eq!(slugify("API_v2 notes", IdFormat::Gfm), "api_v2-notes");
        assert_eq!(slugify("Ünïcode Text", IdFormat::Gfm), "ünïcode-text");
    }

    #[test]
    fn test_mmd() {
        assert_eq!(slugify("Hello, World!", IdFormat::Mmd), "helloworld");
        assert_eq!(slugify("Part 1.2: Intro", IdFormat::Mmd), "part1.2:intro");
    }

    #[test]
    fn test_kramdown() {
        assert_eq!(slugify("1. Getting started", IdFormat::Kramdown), "getting-started");
        assert_eq!(slugify("42", IdFormat::Kramdown), "section");
    }

    #[test]
    fn test_deduplication() {
        let mut slugs = SlugGenerator::new(IdFormat::Gfm);
        assert_eq!(slugs.generate("Intro"), "intro");
        assert_eq!(slugs.generate("Intro"), "intro-1");
        assert_eq!(slugs.generate("Intro"), "intro-2");
    }

    #[test]
    fn test_empty_slug_falls_back() {
        let mut slugs = SlugGenerator::new(IdFormat::Gfm);
        assert_eq!(slugify("", IdFormat::Gfm), "");
        assert_eq!(slugs.generate(""), "section");
        assert_eq!(slugs.generate("?!"), "section-1");
        let mut slugs = SlugGenerator::new(IdFormat::Mmd);
        assert_eq!(slugs.generate("  "), "section");
    }

    #[test]
    fn test_reserved_ids_are_skipped() {
        let mut slugs = SlugGenerator::new(IdFormat::Gfm);
        slugs.reserve("totals");
        assert_eq!(slugs.generate("Totals"), "totals-1");
    }
}
