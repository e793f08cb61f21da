//! Configuration management for mdsplice.
//!
//! Parses `mdsplice.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ```toml
//! [headers]
//! generate_ids = true
//! id_format = "gfm"          # gfm | mmd | kramdown
//! anchor_mode = "attribute"  # attribute | anchor
//! level_shift = 0
//!
//! [tables]
//! relaxed = false
//!
//! [typography]
//! quotes = "english"
//! smart_punctuation = true
//!
//! [accessibility]
//! aria = false
//! caption_lookbehind = 1024
//!
//! [output]
//! max_bytes = 10485760
//! ```

use std::path::{Path, PathBuf};

use mdsplice_core::{
    AnchorMode, ConvertOptions, DEFAULT_CAPTION_LOOKBEHIND, IdFormat, QuotesLanguage,
};
use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override slug rules for generated ids.
    pub id_format: Option<IdFormat>,
    /// Override header anchor mode.
    pub anchor_mode: Option<AnchorMode>,
    /// Override header id generation.
    pub generate_ids: Option<bool>,
    /// Override heading level shift.
    pub level_shift: Option<i8>,
    /// Override relaxed table detection.
    pub relaxed_tables: Option<bool>,
    /// Override quote language.
    pub quotes: Option<QuotesLanguage>,
    /// Override ARIA pass.
    pub aria: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "mdsplice.toml";

const MAX_LEVEL_SHIFT: i8 = 5;
const MAX_CAPTION_LOOKBEHIND: usize = 65536;

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub headers: HeadersConfig,
    pub tables: TablesConfig,
    pub typography: TypographyConfig,
    pub accessibility: AccessibilityConfig,
    pub output: OutputConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Header id configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HeadersConfig {
    /// Whether headings without a manual id get one.
    pub generate_ids: bool,
    pub id_format: IdFormat,
    pub anchor_mode: AnchorMode,
    /// Added to every heading level; results are clamped to 1-6.
    pub level_shift: i8,
}

impl Default for HeadersConfig {
    fn default() -> Self {
        Self {
            generate_ids: true,
            id_format: IdFormat::default(),
            anchor_mode: AnchorMode::default(),
            level_shift: 0,
        }
    }
}

/// Table configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TablesConfig {
    /// Detect pipe tables without a delimiter row.
    pub relaxed: bool,
}

/// Typography configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TypographyConfig {
    pub quotes: QuotesLanguage,
    pub smart_punctuation: bool,
}

impl Default for TypographyConfig {
    fn default() -> Self {
        Self {
            quotes: QuotesLanguage::default(),
            smart_punctuation: true,
        }
    }
}

/// Accessibility configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AccessibilityConfig {
    /// Whether ARIA roles and references are added.
    pub aria: bool,
    /// How far back, in bytes, a table looks for its figcaption.
    pub caption_lookbehind: usize,
}

impl Default for AccessibilityConfig {
    fn default() -> Self {
        Self {
            aria: false,
            caption_lookbehind: DEFAULT_CAPTION_LOOKBEHIND,
        }
    }
}

/// Output configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Upper bound for every stage's output buffer.
    pub max_bytes: Option<usize>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `mdsplice.toml` in current directory and parents,
    /// falling back to defaults.
    ///
    /// CLI settings are applied after loading and take precedence over
    /// config file values. The result is validated.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails
    /// or a value is out of range.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let discovered = match config_path {
            Some(path) if !path.exists() => {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Some(path) => Some(path.to_path_buf()),
            None => std::env::current_dir()
                .ok()
                .and_then(|cwd| Self::discover_from(&cwd)),
        };

        let mut config = match discovered {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::default(),
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(id_format) = settings.id_format {
            self.headers.id_format = id_format;
        }
        if let Some(anchor_mode) = settings.anchor_mode {
            self.headers.anchor_mode = anchor_mode;
        }
        if let Some(generate_ids) = settings.generate_ids {
            self.headers.generate_ids = generate_ids;
        }
        if let Some(level_shift) = settings.level_shift {
            self.headers.level_shift = level_shift;
        }
        if let Some(relaxed) = settings.relaxed_tables {
            self.tables.relaxed = relaxed;
        }
        if let Some(quotes) = settings.quotes {
            self.typography.quotes = quotes;
        }
        if let Some(aria) = settings.aria {
            self.accessibility.aria = aria;
        }
    }

    /// Search for a config file in `start` and its parents.
    #[must_use]
    pub fn discover_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any value is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let shift = self.headers.level_shift;
        if !(-MAX_LEVEL_SHIFT..=MAX_LEVEL_SHIFT).contains(&shift) {
            return Err(ConfigError::Validation(format!(
                "headers.level_shift must be between -{MAX_LEVEL_SHIFT} and {MAX_LEVEL_SHIFT}, got {shift}"
            )));
        }

        let lookbehind = self.accessibility.caption_lookbehind;
        if !(1..=MAX_CAPTION_LOOKBEHIND).contains(&lookbehind) {
            return Err(ConfigError::Validation(format!(
                "accessibility.caption_lookbehind must be between 1 and {MAX_CAPTION_LOOKBEHIND}, got {lookbehind}"
            )));
        }

        if self.output.max_bytes == Some(0) {
            return Err(ConfigError::Validation(
                "output.max_bytes must be greater than 0".to_owned(),
            ));
        }

        Ok(())
    }

    /// Conversion options described by this configuration.
    #[must_use]
    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            id_format: self.headers.id_format,
            anchor_mode: self.headers.anchor_mode,
            generate_header_ids: self.headers.generate_ids,
            header_level_shift: self.headers.level_shift,
            quotes_language: self.typography.quotes,
            relaxed_tables: self.tables.relaxed,
            smart_punctuation: self.typography.smart_punctuation,
            aria: self.accessibility.aria,
            caption_lookbehind: self.accessibility.caption_lookbehind,
            max_output_bytes: self.output.max_bytes,
        }
    }
}
