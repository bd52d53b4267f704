//! # Header Module
//!
//! This module defines what a header block looks like and how it is located
//! and rewritten inside a file.
//!
//! The module is organized into:
//! - [`HeaderSpec`] - the immutable description of a header (comment prefix,
//!   separator, body text, trailing newline policy) plus the line formatting and
//!   parsing shared by both engines
//! - [`text`] - [`TextHeaderEngine`] for plain-text source files
//! - [`notebook`] - [`NotebookHeaderEngine`] for Jupyter notebooks, where the
//!   header lives in a tagged cell
//!
//! ## Example
//!
//! ```rust
//! use addheader::header::{HeaderOptions, HeaderSpec, SourceDocument, TextHeaderEngine};
//!
//! # fn main() -> Result<(), addheader::header::HeaderError> {
//! let spec = HeaderSpec::new(vec!["Copyright (c) ACME".to_string()], HeaderOptions::default())?;
//! let engine = TextHeaderEngine::new(&spec);
//!
//! let updated = engine.update(&SourceDocument::parse("#!/usr/bin/env python\nprint(1)\n"))?;
//! assert!(updated.starts_with("#!/usr/bin/env python\n####"));
//! assert!(updated.ends_with("print(1)\n"));
//! # Ok(())
//! # }
//! ```

pub mod notebook;
pub mod text;

pub use notebook::{Cell, CellType, Notebook, NotebookHeaderEngine};
pub use text::{SourceDocument, TextHeaderEngine};

/// Default comment prefix for header lines.
pub const DEFAULT_COMMENT: &str = "#";

/// Default character repeated to build separator lines.
pub const DEFAULT_SEP_CHAR: char = '#';

/// Default width of generated separator lines.
pub const DEFAULT_SEP_LEN: usize = 78;

/// Minimum number of repeated characters for a line to be recognized as a
/// separator. Independent of the configured generation width.
pub const MIN_SEPARATOR_RUN: usize = 10;

/// Minimum number of lines scanned after a top separator when looking for the
/// closing one.
pub const MIN_SCAN_LINES: usize = 32;

/// Errors raised while building a header spec or transforming a document.
#[derive(Debug, thiserror::Error)]
pub enum HeaderError {
  /// The header configuration is unusable.
  #[error("Invalid header configuration: {0}")]
  InvalidSpec(String),

  /// More than one notebook cell claims to be the header.
  #[error("Found {count} cells tagged '{tag}', expected at most one")]
  AmbiguousNotebookHeader { count: usize, tag: &'static str },

  /// A separator opens a header block but the file ends before it is closed.
  #[error("Header separator on line {line} is never closed")]
  UnterminatedHeader { line: usize },

  /// The notebook JSON is missing required structure.
  #[error("Malformed notebook: {0}")]
  MalformedNotebook(#[from] serde_json::Error),

  /// The file content is not valid UTF-8.
  #[error("Content is not valid UTF-8: {0}")]
  Encoding(#[from] std::string::FromUtf8Error),
}

impl HeaderError {
  /// Whether the error comes from a header that could not be located
  /// unambiguously (as opposed to a malformed document).
  pub const fn is_ambiguity(&self) -> bool {
    matches!(
      self,
      Self::AmbiguousNotebookHeader { .. } | Self::UnterminatedHeader { .. }
    )
  }
}

/// Formatting options for a header, everything except the body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderOptions {
  /// Prefix prepended to every header line.
  pub comment: String,
  /// Character repeated to form the separator lines.
  pub sep_char: char,
  /// Number of separator characters in generated separator lines.
  pub sep_len: usize,
  /// Whether the closing separator is terminated by a newline when nothing
  /// follows it.
  pub final_linesep: bool,
}

impl Default for HeaderOptions {
  fn default() -> Self {
    Self {
      comment: DEFAULT_COMMENT.to_string(),
      sep_char: DEFAULT_SEP_CHAR,
      sep_len: DEFAULT_SEP_LEN,
      final_linesep: true,
    }
  }
}

/// Immutable description of the header block to maintain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderSpec {
  comment: String,
  sep_char: char,
  sep_len: usize,
  text: Vec<String>,
  final_linesep: bool,
}

impl HeaderSpec {
  /// Builds a spec from the header body lines and formatting options.
  ///
  /// # Errors
  ///
  /// Returns [`HeaderError::InvalidSpec`] if the comment prefix is empty, the
  /// separator width is zero, the separator character is whitespace, or a body
  /// line contains a line break.
  pub fn new(text: Vec<String>, options: HeaderOptions) -> Result<Self, HeaderError> {
    if options.comment.is_empty() {
      return Err(HeaderError::InvalidSpec("comment prefix cannot be empty".to_string()));
    }
    if options.sep_len == 0 {
      return Err(HeaderError::InvalidSpec("separator length must be greater than 0".to_string()));
    }
    if options.sep_char.is_whitespace() {
      return Err(HeaderError::InvalidSpec("separator cannot be whitespace".to_string()));
    }
    if text.iter().any(|line| line.contains(['\n', '\r'])) {
      return Err(HeaderError::InvalidSpec("header lines cannot contain line breaks".to_string()));
    }

    Ok(Self {
      comment: options.comment,
      sep_char: options.sep_char,
      sep_len: options.sep_len,
      text,
      final_linesep: options.final_linesep,
    })
  }

  /// Splits raw header text into body lines. A trailing newline does not
  /// produce an extra empty line.
  pub fn lines_from_text(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
  }

  /// Returns a copy of this spec with a different trailing newline policy.
  #[must_use]
  pub fn with_final_linesep(mut self, final_linesep: bool) -> Self {
    self.final_linesep = final_linesep;
    self
  }

  pub fn comment(&self) -> &str {
    &self.comment
  }

  pub const fn sep_char(&self) -> char {
    self.sep_char
  }

  pub const fn sep_len(&self) -> usize {
    self.sep_len
  }

  pub fn text(&self) -> &[String] {
    &self.text
  }

  pub const fn final_linesep(&self) -> bool {
    self.final_linesep
  }

  /// The generated separator line.
  ///
  /// When the comment prefix is made only of the separator character (the
  /// default `#`/`#` pair) the prefix is absorbed, so the line is exactly
  /// `sep_len` characters wide.
  pub fn separator_line(&self) -> String {
    let run = self.sep_char.to_string().repeat(self.sep_len);
    if self.comment.chars().all(|c| c == self.sep_char) {
      run
    } else {
      format!("{}{}", self.comment, run)
    }
  }

  /// Formats one body line with the comment prefix. Empty lines become the
  /// bare prefix so no trailing whitespace is generated.
  pub fn body_line(&self, line: &str) -> String {
    if line.is_empty() {
      self.comment.clone()
    } else {
      format!("{} {}", self.comment, line)
    }
  }

  /// The complete header block, one entry per line, without terminators:
  /// separator, commented body lines, separator.
  pub fn header_lines(&self) -> Vec<String> {
    let separator = self.separator_line();
    let mut lines = Vec::with_capacity(self.text.len() + 2);
    lines.push(separator.clone());
    lines.extend(self.text.iter().map(|line| self.body_line(line)));
    lines.push(separator);
    lines
  }

  /// Inverse of [`body_line`](Self::body_line): strips the comment prefix and
  /// the single space that follows it. Lines without the prefix are returned
  /// untouched.
  pub fn parse_body_line<'a>(&self, line: &'a str) -> &'a str {
    let line = line.trim_end_matches(['\n', '\r']);
    match line.strip_prefix(self.comment.as_str()) {
      Some(rest) => rest.strip_prefix(' ').unwrap_or(rest),
      None => line,
    }
  }

  /// Whether a line is a header delimiter under this spec's comment prefix.
  pub fn is_separator(&self, line: &str) -> bool {
    is_separator_line(line, &self.comment)
  }

  /// Whether a line carries this spec's comment prefix, ignoring indentation.
  pub fn is_commented(&self, line: &str) -> bool {
    line.trim_start().starts_with(self.comment.as_str())
  }

  /// Maximum number of uncommented lines allowed between a top separator and
  /// the closing one. Commented lines do not count against it, so headers of
  /// any length written with this prefix are still found. Always large enough
  /// to cover a header generated from this spec.
  pub fn scan_budget(&self) -> usize {
    MIN_SCAN_LINES.max(self.text.len() + 2)
  }
}

/// Checks whether a line consists solely of one repeated non-whitespace
/// character occurring at least [`MIN_SEPARATOR_RUN`] times, either on its own
/// or right after the comment prefix.
pub fn is_separator_line(line: &str, comment: &str) -> bool {
  let trimmed = line.trim();
  if is_repeated_run(trimmed) {
    return true;
  }

  match trimmed.strip_prefix(comment) {
    Some(rest) if !comment.is_empty() => is_repeated_run(rest.trim_start()),
    _ => false,
  }
}

fn is_repeated_run(s: &str) -> bool {
  let mut chars = s.chars();
  let Some(first) = chars.next() else {
    return false;
  };
  if first.is_whitespace() {
    return false;
  }

  let mut count = 1;
  for c in chars {
    if c != first {
      return false;
    }
    count += 1;
  }
  count >= MIN_SEPARATOR_RUN
}

/// Location of an existing header block: line indices of the top and bottom
/// separators, both inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectedHeader {
  pub start: usize,
  pub end: usize,
}

impl DetectedHeader {
  /// Number of lines in the block, separators included.
  pub const fn line_count(&self) -> usize {
    self.end - self.start + 1
  }

  /// Range of the body lines, between the two separators.
  pub const fn body_range(&self) -> std::ops::Range<usize> {
    (self.start + 1)..self.end
  }
}
