//! # Diff Module
//!
//! This module contains functionality for creating and rendering diffs between original and modified content.
//! It's used to show what a run changes, or would change in a dry run, in each file.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};
use similar::{ChangeTag, TextDiff};

use crate::report::FileReport;

/// Manages diff creation and rendering for header changes.
///
/// This struct handles:
/// - Generating diffs between original and modified content
/// - Displaying diffs to stderr with colorization
/// - Saving diffs to a file
#[derive(Debug, Clone, Default)]
pub struct DiffManager {
  /// Whether to print diffs to stderr
  pub show_diff: bool,

  /// Path to save the diffs to
  pub save_diff_path: Option<PathBuf>,
}

impl DiffManager {
  /// Creates a new DiffManager with the specified configuration.
  ///
  /// # Parameters
  ///
  /// * `show_diff` - Whether to print diffs to stderr
  /// * `save_diff_path` - Path to save the diffs to
  pub const fn new(show_diff: bool, save_diff_path: Option<PathBuf>) -> Self {
    Self {
      show_diff,
      save_diff_path,
    }
  }

  /// Whether diffs need to be rendered at all.
  pub const fn is_enabled(&self) -> bool {
    self.show_diff || self.save_diff_path.is_some()
  }

  /// Renders a line diff between the original and new content of a file.
  ///
  /// The result starts with a `Diff for <path>:` line, followed by every line
  /// of the file prefixed with `-`, `+` or a space.
  pub fn render(path: &Path, original: &str, new: &str) -> String {
    let diff = TextDiff::from_lines(original, new);
    let mut rendered = format!("Diff for {}:\n", path.display());

    for change in diff.iter_all_changes() {
      let sign = match change.tag() {
        ChangeTag::Delete => "-",
        ChangeTag::Insert => "+",
        ChangeTag::Equal => " ",
      };
      let _ = write!(rendered, "{}{}", sign, change);
      if change.missing_newline() {
        rendered.push('\n');
      }
    }

    rendered.push('\n');
    rendered
  }

  /// Prints and/or saves the diffs attached to the reports, in report order.
  ///
  /// Diffs are written to the save path in one go, replacing any previous
  /// content.
  pub fn emit(&self, reports: &[FileReport]) -> Result<()> {
    let diffs: Vec<&str> = reports.iter().filter_map(|r| r.diff.as_deref()).collect();

    if self.show_diff {
      for diff in &diffs {
        for line in diff.lines() {
          if line.starts_with('+') {
            eprintln!("{}", line.if_supports_color(Stream::Stderr, |l| l.green()));
          } else if line.starts_with('-') {
            eprintln!("{}", line.if_supports_color(Stream::Stderr, |l| l.red()));
          } else {
            eprintln!("{}", line);
          }
        }
      }
    }

    if let Some(ref diff_path) = self.save_diff_path {
      std::fs::write(diff_path, diffs.concat())
        .with_context(|| format!("Failed to write diff file: {}", diff_path.display()))?;
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::processor::Target;
  use crate::report::FileAction;

  #[test]
  fn test_render_marks_inserted_lines() {
    let rendered = DiffManager::render(Path::new("foo.py"), "print(1)\n", "# header\nprint(1)\n");
    assert_eq!(rendered, "Diff for foo.py:\n+# header\n print(1)\n\n");
  }

  #[test]
  fn test_render_without_trailing_newline() {
    let rendered = DiffManager::render(Path::new("foo.py"), "x", "# h\nx");
    assert!(rendered.contains("+# h\n x\n"));
  }

  #[test]
  fn test_emit_saves_diffs_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let save_path = dir.path().join("changes.diff");
    let manager = DiffManager::new(false, Some(save_path.clone()));

    let mut first = FileReport::new(PathBuf::from("a.py"), Target::Text, FileAction::Added);
    first.diff = Some(DiffManager::render(Path::new("a.py"), "", "# h\n"));
    let unchanged = FileReport::new(PathBuf::from("b.py"), Target::Text, FileAction::Unchanged);
    let mut last = FileReport::new(PathBuf::from("c.py"), Target::Text, FileAction::Removed);
    last.diff = Some(DiffManager::render(Path::new("c.py"), "# h\n", ""));

    manager.emit(&[first, unchanged, last]).unwrap();
    let saved = std::fs::read_to_string(&save_path).unwrap();
    let a = saved.find("Diff for a.py").unwrap();
    let c = saved.find("Diff for c.py").unwrap();
    assert!(a < c);
    assert!(!saved.contains("b.py"));
  }
}
