//! # File Filter Module
//!
//! This module decides which files are subject to the header transformation.
//!
//! Patterns are shell globs (`*`, `?`, `[...]`) matched against the file name
//! only, so `~__init__.py` excludes every `__init__.py` regardless of its depth
//! in the tree. A leading `~` turns a pattern into an exclusion. A file is
//! selected when it matches at least one inclusion and no exclusion; a list
//! without inclusions includes everything.

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern as Glob};
use thiserror::Error;

/// Patterns used when none are configured.
pub const DEFAULT_PATTERNS: [&str; 2] = ["*.py", "~__init__.py"];

/// Prefix marking an exclusion pattern.
pub const EXCLUDE_PREFIX: char = '~';

/// Errors raised while selecting files. Any of these aborts a run before a
/// single file is touched.
#[derive(Debug, Error)]
pub enum SelectionError {
  #[error("Root directory not found: {}", .0.display())]
  RootNotFound(PathBuf),

  #[error("Root is not a directory: {}", .0.display())]
  NotADirectory(PathBuf),

  #[error("Failed to walk directory tree: {0}")]
  Walk(#[from] walkdir::Error),

  #[error("Invalid pattern '{pattern}': {reason}")]
  InvalidPattern { pattern: String, reason: String },
}

/// Result of a file filtering operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterResult {
  /// Whether the file should be processed
  pub should_process: bool,
  /// Reason why the file should not be processed (if any)
  pub reason: Option<String>,
}

impl FilterResult {
  /// Creates a new FilterResult indicating the file should be processed.
  pub const fn process() -> Self {
    Self {
      should_process: true,
      reason: None,
    }
  }

  /// Creates a new FilterResult indicating the file should be skipped.
  pub fn skip(reason: impl Into<String>) -> Self {
    Self {
      should_process: false,
      reason: Some(reason.into()),
    }
  }
}

/// Trait for components that filter files based on certain criteria.
pub trait FileFilter: Send + Sync {
  /// Determines whether a file should be processed.
  ///
  /// # Parameters
  ///
  /// * `path` - The path to the file to check
  ///
  /// # Returns
  ///
  /// A `FilterResult` indicating whether the file should be processed and why
  /// not if applicable.
  fn should_process(&self, path: &Path) -> FilterResult;
}

/// One parsed selection pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
  Include(Glob),
  Exclude(Glob),
}

impl Pattern {
  /// Parses a pattern string, honoring the `~` exclusion prefix.
  ///
  /// # Errors
  ///
  /// Returns [`SelectionError::InvalidPattern`] for empty patterns, patterns
  /// containing a path separator and malformed globs.
  pub fn parse(raw: &str) -> Result<Self, SelectionError> {
    let invalid = |reason: &str| SelectionError::InvalidPattern {
      pattern: raw.to_string(),
      reason: reason.to_string(),
    };

    let (exclude, body) = match raw.strip_prefix(EXCLUDE_PREFIX) {
      Some(rest) => (true, rest),
      None => (false, raw),
    };
    if body.is_empty() {
      return Err(invalid("pattern is empty"));
    }
    if body.contains('/') || body.contains(std::path::MAIN_SEPARATOR) {
      return Err(invalid("must be a filename, not a path"));
    }

    let glob = Glob::new(body).map_err(|e| invalid(e.msg))?;
    Ok(if exclude {
      Self::Exclude(glob)
    } else {
      Self::Include(glob)
    })
  }

  fn glob(&self) -> &Glob {
    match self {
      Self::Include(glob) | Self::Exclude(glob) => glob,
    }
  }
}

impl std::fmt::Display for Pattern {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Include(glob) => write!(f, "{glob}"),
      Self::Exclude(glob) => write!(f, "{EXCLUDE_PREFIX}{glob}"),
    }
  }
}

/// Include/exclude glob matcher over file names.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
  patterns: Vec<Pattern>,
}

impl PatternMatcher {
  /// Builds a matcher from pattern strings.
  ///
  /// # Errors
  ///
  /// Fails on the first invalid pattern.
  pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, SelectionError> {
    let patterns = patterns
      .iter()
      .map(|p| Pattern::parse(p.as_ref()))
      .collect::<Result<Vec<_>, _>>()?;
    Ok(Self { patterns })
  }

  /// Matcher for [`DEFAULT_PATTERNS`].
  pub fn with_defaults() -> Result<Self, SelectionError> {
    Self::new(&DEFAULT_PATTERNS)
  }

  /// Adds the inclusion pattern `*{suffix}` used to pick up notebooks.
  /// Existing exclusions keep applying to notebooks. A matcher without any
  /// inclusion already selects notebooks and is left as is.
  pub fn with_notebooks(mut self, suffix: &str) -> Result<Self, SelectionError> {
    if self.patterns.iter().any(|p| matches!(p, Pattern::Include(_))) {
      self.patterns.push(Pattern::parse(&format!("*{}", Glob::escape(suffix)))?);
    }
    Ok(self)
  }

  pub fn patterns(&self) -> &[Pattern] {
    &self.patterns
  }

  /// Whether a file name is selected.
  pub fn is_match(&self, file_name: &str) -> bool {
    let options = MatchOptions::new();
    let mut includes = self
      .patterns
      .iter()
      .filter(|p| matches!(p, Pattern::Include(_)))
      .peekable();

    let included = includes.peek().is_none() || includes.any(|p| p.glob().matches_with(file_name, options));
    included
      && !self
        .patterns
        .iter()
        .any(|p| matches!(p, Pattern::Exclude(glob) if glob.matches_with(file_name, options)))
  }

  /// The patterns joined with `|`, for messages.
  pub fn describe(&self) -> String {
    self
      .patterns
      .iter()
      .map(ToString::to_string)
      .collect::<Vec<_>>()
      .join("|")
  }
}

impl FileFilter for PatternMatcher {
  fn should_process(&self, path: &Path) -> FilterResult {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
      return FilterResult::skip("File name is not valid UTF-8");
    };

    if self.is_match(name) {
      FilterResult::process()
    } else {
      FilterResult::skip(format!("Does not match {}", self.describe()))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_patterns() {
    let matcher = PatternMatcher::with_defaults().unwrap();
    assert!(matcher.is_match("foo.py"));
    assert!(!matcher.is_match("__init__.py"));
    assert!(!matcher.is_match("foo.txt"));
    assert!(matcher.should_process(Path::new("a/b/foo.py")).should_process);
    assert!(!matcher.should_process(Path::new("a/b/__init__.py")).should_process);
  }

  #[test]
  fn test_only_exclusions_match_everything_else() {
    let matcher = PatternMatcher::new(&["~*.md"]).unwrap();
    assert!(matcher.is_match("main.rs"));
    assert!(matcher.is_match("Makefile"));
    assert!(!matcher.is_match("README.md"));

    let empty = PatternMatcher::new::<&str>(&[]).unwrap();
    assert!(empty.is_match("anything"));
  }

  #[test]
  fn test_glob_syntax() {
    let matcher = PatternMatcher::new(&["test_?.py", "[ab]*.rs"]).unwrap();
    assert!(matcher.is_match("test_1.py"));
    assert!(!matcher.is_match("test_10.py"));
    assert!(matcher.is_match("alpha.rs"));
    assert!(!matcher.is_match("gamma.rs"));
  }

  #[test]
  fn test_matching_is_case_sensitive() {
    let matcher = PatternMatcher::new(&["*.py"]).unwrap();
    assert!(!matcher.is_match("FOO.PY"));
  }

  #[test]
  fn test_notebook_pattern_keeps_exclusions() {
    let matcher = PatternMatcher::new(&["*.py", "~scratch*"])
      .unwrap()
      .with_notebooks(".ipynb")
      .unwrap();
    assert!(matcher.is_match("analysis.ipynb"));
    assert!(!matcher.is_match("scratch.ipynb"));
    assert_eq!(matcher.describe(), "*.py|~scratch*|*.ipynb");
  }

  #[test]
  fn test_notebooks_with_only_exclusions_keep_everything_else() {
    let matcher = PatternMatcher::new(&["~*.md"]).unwrap().with_notebooks(".ipynb").unwrap();
    assert!(matcher.is_match("README.txt"));
    assert!(matcher.is_match("main.py"));
    assert!(matcher.is_match("analysis.ipynb"));
    assert!(!matcher.is_match("notes.md"));
    assert_eq!(matcher.describe(), "~*.md");
  }

  #[test]
  fn test_rejects_paths_and_empty_patterns() {
    for bad in ["src/*.py", "~tests/conftest.py", "", "~", "[unclosed"] {
      assert!(
        matches!(PatternMatcher::new(&[bad]), Err(SelectionError::InvalidPattern { .. })),
        "pattern {bad:?} should be rejected"
      );
    }
  }

  #[test]
  fn test_custom_filter() {
    struct MockFilter;
    impl FileFilter for MockFilter {
      fn should_process(&self, path: &Path) -> FilterResult {
        if path.to_string_lossy().contains("pass") {
          FilterResult::process()
        } else {
          FilterResult::skip("Not a pass file")
        }
      }
    }

    let filters: Vec<Box<dyn FileFilter>> = vec![
      Box::new(MockFilter),
      Box::new(PatternMatcher::new(&["*.rs"]).unwrap()),
    ];
    let selected = |path: &str| filters.iter().all(|f| f.should_process(Path::new(path)).should_process);

    assert!(selected("src/pass_test.rs"));
    assert!(!selected("src/fail_test.rs"));
    assert!(!selected("src/pass_test.py"));
  }
}
