//! `mdsplice baseline` command implementation.

use std::path::PathBuf;

use clap::Args;
use mdsplice_config::{CliSettings, Config};
use mdsplice_core::Converter;

use super::{read_input, write_output};
use crate::error::CliError;

/// Arguments for the baseline command.
#[derive(Args)]
pub(crate) struct BaselineArgs {
    /// Markdown file to render (default: stdin).
    input: Option<PathBuf>,

    /// Output file (default: stdout).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover mdsplice.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Detect pipe tables without a delimiter row.
    #[arg(long)]
    relaxed_tables: bool,
}

impl BaselineArgs {
    /// Execute the baseline command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration, reading or writing fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let cli_settings = CliSettings {
            relaxed_tables: self.relaxed_tables.then_some(true),
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let markdown = read_input(self.input.as_deref())?;
        let html = Converter::with_options(config.convert_options()).baseline(&markdown);

        write_output(self.output.as_deref(), &html)
    }
}
