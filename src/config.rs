//! # Configuration Module
//!
//! This module provides configuration support for addheader.
//!
//! Every command-line option except the root directory can also come from a
//! `.addheader.toml` file in the root directory, or from the file named by the
//! `ADDHEADER_CONFIG` environment variable or `--config`. Command-line values
//! win over file values, which win over the built-in defaults.
//!
//! ```toml
//! text = "header.txt"
//! patterns = ["*.py", "~__init__.py"]
//! comment = "#"
//! sep = "#"
//! sep-len = 78
//! final-linesep = true
//! jupyter = ".ipynb"
//! notebook-tag = "remove-input"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::file_filter::DEFAULT_PATTERNS;
use crate::header::notebook::DEFAULT_NOTEBOOK_SUFFIX;
use crate::header::{DEFAULT_COMMENT, DEFAULT_SEP_CHAR, DEFAULT_SEP_LEN, HeaderOptions};
use crate::verbose_log;

/// The default config file name.
pub const DEFAULT_CONFIG_FILENAME: &str = ".addheader.toml";

/// Environment variable for specifying config file path.
pub const CONFIG_ENV_VAR: &str = "ADDHEADER_CONFIG";

/// Notebook support: `true`/`false`, or the notebook file suffix (which
/// implies `true`).
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum JupyterSetting {
  Enabled(bool),
  Suffix(String),
}

impl JupyterSetting {
  /// The notebook suffix, or `None` if notebooks are disabled.
  pub fn suffix(&self) -> Option<&str> {
    match self {
      Self::Enabled(true) => Some(DEFAULT_NOTEBOOK_SUFFIX),
      Self::Enabled(false) => None,
      Self::Suffix(suffix) => Some(suffix.as_str()),
    }
  }
}

/// One layer of configuration. Unset fields fall through to the next layer.
///
/// The same struct holds the values parsed from a config file and the values
/// given on the command line, see [`Config::layered_over`].
#[derive(Debug, Default, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
  /// File holding the header text
  pub text: Option<PathBuf>,
  /// Selection patterns, `~` marks an exclusion
  pub patterns: Option<Vec<String>>,
  /// Comment prefix for header lines
  pub comment: Option<String>,
  /// Separator character
  pub sep: Option<String>,
  /// Separator width
  pub sep_len: Option<usize>,
  /// Trailing newline after the header block
  pub final_linesep: Option<bool>,
  /// Notebook support
  pub jupyter: Option<JupyterSetting>,
  /// Extra tag for notebook header cells
  pub notebook_tag: Option<String>,
}

/// Error type for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  /// The config file could not be read.
  #[error("Failed to read config file '{path}': {source}")]
  ReadError { path: PathBuf, source: std::io::Error },

  /// The config file contains invalid TOML.
  #[error("Failed to parse config file '{path}': {source}")]
  ParseError { path: PathBuf, source: toml::de::Error },

  /// A configuration value is out of range.
  #[error("Invalid value for '{key}': {message}")]
  InvalidValue { key: &'static str, message: String },
}

impl ConfigError {
  fn invalid(key: &'static str, message: impl Into<String>) -> Self {
    Self::InvalidValue {
      key,
      message: message.into(),
    }
  }
}

/// Fully resolved settings for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
  pub text: Option<PathBuf>,
  pub patterns: Vec<String>,
  /// Header formatting for text files
  pub options: HeaderOptions,
  /// Trailing newline policy for notebook header cells
  pub notebook_final_linesep: bool,
  /// Notebook suffix, `None` when notebook support is off
  pub notebook_suffix: Option<String>,
  pub notebook_tag: Option<String>,
}

impl Config {
  /// Load configuration from a file.
  ///
  /// A relative `text` path is resolved against the directory holding the
  /// config file.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    verbose_log!("Loading config from: {}", path.display());

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
      path: path.to_path_buf(),
      source: e,
    })?;

    let mut config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
      path: path.to_path_buf(),
      source: e,
    })?;

    config.validate()?;

    if let Some(text) = config.text.as_mut()
      && text.is_relative()
      && let Some(dir) = path.parent()
    {
      *text = dir.join(&*text);
    }

    Ok(config)
  }

  /// Validate the configuration.
  ///
  /// Checks that:
  /// - `comment` is non-empty
  /// - `sep` is exactly one non-whitespace character
  /// - `sep-len` is greater than zero
  /// - `patterns` are file names, not paths
  pub fn validate(&self) -> Result<(), ConfigError> {
    if let Some(comment) = &self.comment
      && comment.is_empty()
    {
      return Err(ConfigError::invalid("comment", "cannot be empty"));
    }

    if let Some(sep) = &self.sep {
      parse_sep_char(sep)?;
    }

    if self.sep_len == Some(0) {
      return Err(ConfigError::invalid("sep-len", "must be greater than 0"));
    }

    if let Some(patterns) = &self.patterns
      && let Some(bad) = patterns.iter().find(|p| p.contains('/'))
    {
      return Err(ConfigError::invalid(
        "patterns",
        format!("'{bad}' must be a filename, not a path"),
      ));
    }

    if let Some(JupyterSetting::Suffix(suffix)) = &self.jupyter
      && suffix.is_empty()
    {
      return Err(ConfigError::invalid("jupyter", "suffix cannot be empty"));
    }

    Ok(())
  }

  /// Combines two layers; values set in `self` win over values in `base`.
  #[must_use]
  pub fn layered_over(self, base: Self) -> Self {
    Self {
      text: self.text.or(base.text),
      patterns: self.patterns.or(base.patterns),
      comment: self.comment.or(base.comment),
      sep: self.sep.or(base.sep),
      sep_len: self.sep_len.or(base.sep_len),
      final_linesep: self.final_linesep.or(base.final_linesep),
      jupyter: self.jupyter.or(base.jupyter),
      notebook_tag: self.notebook_tag.or(base.notebook_tag),
    }
  }

  /// Fills in defaults for every unset value.
  pub fn into_settings(self) -> Result<Settings, ConfigError> {
    self.validate()?;

    let sep_char = match &self.sep {
      Some(sep) => parse_sep_char(sep)?,
      None => DEFAULT_SEP_CHAR,
    };

    let notebook_suffix = self.jupyter.as_ref().and_then(JupyterSetting::suffix).map(str::to_string);

    Ok(Settings {
      text: self.text,
      patterns: self
        .patterns
        .unwrap_or_else(|| DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect()),
      options: HeaderOptions {
        comment: self.comment.unwrap_or_else(|| DEFAULT_COMMENT.to_string()),
        sep_char,
        sep_len: self.sep_len.unwrap_or(DEFAULT_SEP_LEN),
        final_linesep: self.final_linesep.unwrap_or(true),
      },
      notebook_final_linesep: self.final_linesep.unwrap_or(false),
      notebook_suffix,
      notebook_tag: self.notebook_tag,
    })
  }
}

fn parse_sep_char(sep: &str) -> Result<char, ConfigError> {
  let mut chars = sep.chars();
  match (chars.next(), chars.next()) {
    (Some(c), None) if !c.is_whitespace() => Ok(c),
    _ => Err(ConfigError::invalid(
      "sep",
      format!("'{sep}' must be a single non-whitespace character"),
    )),
  }
}

/// Discover the configuration file path.
///
/// The configuration file is discovered in the following order:
/// 1. Path specified via `--config` flag (passed as `explicit_path`)
/// 2. Path specified via `ADDHEADER_CONFIG` environment variable
/// 3. `.addheader.toml` in the root directory
///
/// An explicit path is returned even if it does not exist, so that loading
/// it reports the problem instead of silently running without it.
pub fn discover_config_path(explicit_path: Option<&Path>, root: &Path) -> Option<PathBuf> {
  if let Some(path) = explicit_path {
    verbose_log!("Using explicit config path: {}", path.display());
    return Some(path.to_path_buf());
  }

  if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
    let path = PathBuf::from(&env_path);
    if path.exists() {
      verbose_log!("Using config from {}: {}", CONFIG_ENV_VAR, path.display());
      return Some(path);
    }
    verbose_log!("{} path does not exist: {}", CONFIG_ENV_VAR, env_path);
  }

  let root_config = root.join(DEFAULT_CONFIG_FILENAME);
  if root_config.exists() {
    verbose_log!("Using root config: {}", root_config.display());
    return Some(root_config);
  }

  verbose_log!("No config file found");
  None
}

/// Load configuration from the discovered path, or return an empty layer.
///
/// # Arguments
///
/// * `explicit_path` - Optional explicit path from CLI flag
/// * `root` - The root directory being processed
/// * `no_config` - If true, skip config file discovery
pub fn load_config(explicit_path: Option<&Path>, root: &Path, no_config: bool) -> Result<Config> {
  if no_config {
    verbose_log!("Config file discovery disabled (--no-config)");
    return Ok(Config::default());
  }

  match discover_config_path(explicit_path, root) {
    Some(path) => Config::load(&path).with_context(|| format!("Failed to load config from {}", path.display())),
    None => Ok(Config::default()),
  }
}
