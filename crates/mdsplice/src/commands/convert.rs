//! `mdsplice convert` command implementation.

use std::path::PathBuf;

use clap::Args;
use mdsplice_config::{CliSettings, Config};
use mdsplice_core::{AnchorMode, Converter, IdFormat, QuotesLanguage};

use super::{as_file, read_input, write_output};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the convert command.
#[derive(Args)]
pub(crate) struct ConvertArgs {
    /// Markdown file to convert (default: stdin).
    input: Option<PathBuf>,

    /// Output file (default: stdout).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover mdsplice.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Slug rules for generated header ids: gfm, mmd or kramdown (overrides config).
    #[arg(long)]
    id_format: Option<IdFormat>,

    /// Insert anchor links into headings instead of id attributes.
    #[arg(long)]
    anchors: bool,

    /// Quote style: english, dutch, french, german, germanguillemets,
    /// swedish, spanish or swiss (overrides config).
    #[arg(long)]
    quotes: Option<QuotesLanguage>,

    /// Detect pipe tables without a delimiter row.
    #[arg(long)]
    relaxed_tables: bool,

    /// Do not generate header ids.
    #[arg(long)]
    no_header_ids: bool,

    /// Shift heading levels by N (overrides config).
    #[arg(long, value_name = "N", allow_hyphen_values = true)]
    shift: Option<i8>,

    /// Add ARIA roles and references.
    #[arg(long)]
    aria: bool,

    /// Write the table of contents as JSON to this file.
    #[arg(long, value_name = "FILE")]
    toc: Option<PathBuf>,
}

impl ConvertArgs {
    /// Build CLI settings from flags. Unset flags leave config values alone.
    fn cli_settings(&self) -> CliSettings {
        CliSettings {
            id_format: self.id_format,
            anchor_mode: self.anchors.then_some(AnchorMode::Anchor),
            generate_ids: self.no_header_ids.then_some(false),
            level_shift: self.shift,
            relaxed_tables: self.relaxed_tables.then_some(true),
            quotes: self.quotes,
            aria: self.aria.then_some(true),
        }
    }

    /// Execute the convert command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration, reading or writing fails.
    pub(crate) fn execute(self, verbose: bool) -> Result<(), CliError> {
        let output = Output::new();

        let config = Config::load(self.config.as_deref(), Some(&self.cli_settings()))?;
        if verbose && let Some(path) = &config.config_path {
            output.info(&format!("Using configuration: {}", path.display()));
        }

        let markdown = read_input(self.input.as_deref())?;
        let result = Converter::with_options(config.convert_options()).convert(&markdown);
        tracing::info!(
            bytes = result.html.len(),
            headings = result.toc.len(),
            warnings = result.warnings.len(),
            "Converted document"
        );

        for warning in &result.warnings {
            output.warning(&format!("Warning: {warning}"));
        }

        write_output(self.output.as_deref(), &result.html)?;
        if let Some(toc_path) = self.toc.as_deref() {
            let json = serde_json::to_string_pretty(&result.toc)?;
            write_output(Some(toc_path), &json)?;
        }

        if let Some(path) = as_file(self.output.as_deref()) {
            output.success(&format!("Wrote {}", path.display()));
        }

        Ok(())
    }
}
