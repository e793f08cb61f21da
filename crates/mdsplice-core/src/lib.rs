//! Markdown to HTML conversion with attribute lists, table extensions and
//! generated header ids.
//!
//! Markdown is parsed once into an owned [`Node`] tree carrying attribute
//! fragments, and rendered by the unmodified `pulldown-cmark` HTML writer.
//! Everything the renderer does not know about is then spliced into its
//! output:
//!
//! - [`AttributeCollector`] and [`HtmlReconciler`] correlate tree nodes with
//!   HTML elements by occurrence index and content fingerprint, inject
//!   attributes and remove marked elements;
//! - [`TableStructureAnalyzer`] and [`TableRewriter`] apply cell spans,
//!   removed cells and rows, footers and captions;
//! - [`HeaderIdInjector`] adds ids or anchors to headings;
//! - [`CosmeticNormalizer`] cleans whitespace and applies the optional
//!   typography and accessibility passes.
//!
//! Stages never fail the conversion: one that cannot grow its output buffer
//! is skipped and reported in [`ConvertResult::warnings`].
//!
//! # Example
//!
//! ```
//! use mdsplice_core::{Converter, QuotesLanguage};
//!
//! let result = Converter::new()
//!     .with_quotes_language(QuotesLanguage::German)
//!     .convert("## Intro\n\nSome \"quoted\" text {: .lead}");
//!
//! assert!(result.html.contains("<h2 id=\"intro\">Intro</h2>"));
//! assert!(result.html.contains("<p class=\"lead\">Some &bdquo;quoted&ldquo; text</p>"));
//! assert_eq!(result.toc[0].title, "Intro");
//! ```

mod ast;
mod baseline;
mod buffer;
mod collect;
pub mod cosmetic;
mod error;
mod fragment;
mod headers;
mod occurrence;
mod options;
pub mod parse;
mod pipeline;
mod reconcile;
mod scan;
mod slug;
mod table_analysis;
mod tables;
mod util;

pub use ast::{Node, NodeKind, make_fingerprint, url_fingerprint};
pub use baseline::render as render_baseline;
pub use buffer::OutputBuffer;
pub use collect::{AttributeCollector, AttributeRecord, AttributeRecords, MatchKey};
pub use cosmetic::CosmeticNormalizer;
pub use error::{BufferError, ParseOptionError};
pub use headers::{HeaderIdInjector, TocEntry};
pub use occurrence::{CountableClass, OccurrenceCounter};
pub use options::{
    AnchorMode, ConvertOptions, DEFAULT_CAPTION_LOOKBEHIND, IdFormat, QuotesLanguage,
};
pub use pipeline::{ConvertResult, Converter};
pub use reconcile::HtmlReconciler;
pub use slug::{SlugGenerator, slugify};
pub use table_analysis::{
    CaptionSource, ParaToRemove, TableCaption, TableCoordinate, TableLayout,
    TableStructureAnalyzer, caption_line,
};
pub use tables::TableRewriter;
pub use util::escape_html;
