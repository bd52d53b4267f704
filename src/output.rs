//! # Output Module
//!
//! This module centralizes all user-facing output for the addheader tool.
//! It provides consistent formatting, colors, and symbols for terminal output.
//!
//! ## Design Goals
//!
//! - **Informative**: Show which files changed without requiring flags
//! - **Scannable**: Use formatting to make output easy to parse visually
//! - **Progressive**: More detail with `-v`, silence with `-q`
//! - **Scriptable**: Keep stdout predictable for piping/automation

use std::path::Path;

use owo_colors::{OwoColorize, Stream};

use crate::logging::{is_quiet, is_verbose};
use crate::report::{FileAction, FileReport, ProcessingSummary};

/// Symbols used in output
pub mod symbols {
  /// Header added
  pub const SUCCESS: &str = "\u{2713}"; // ✓
  /// Failure
  pub const FAILURE: &str = "\u{2717}"; // ✗
  /// Header replaced
  pub const UPDATED: &str = "\u{21bb}"; // ↻
  /// Header removed
  pub const REMOVED: &str = "-";
}

/// Maximum number of files to show in the default output before truncating
const DEFAULT_FILE_LIST_LIMIT: usize = 20;

fn plural(count: usize) -> &'static str {
  if count == 1 { "file" } else { "files" }
}

/// Print the initial "Processing N files..." message.
///
/// - In write mode: "Processing N files..."
/// - In dry-run mode: "Checking N files (dry run)..."
pub fn print_start_message(file_count: usize, dry_run: bool) {
  if is_quiet() {
    return;
  }

  if dry_run {
    println!("Checking {} {} (dry run)...", file_count, plural(file_count));
  } else {
    println!("Processing {} {}...", file_count, plural(file_count));
  }
}

/// Print a blank line for visual separation (respects quiet mode).
pub fn print_blank_line() {
  if !is_quiet() {
    println!();
  }
}

/// Print one group of changed files under a header line.
///
/// In quiet mode only the paths are printed, one per line, for scripting.
/// Otherwise at most [`DEFAULT_FILE_LIST_LIMIT`] paths are shown unless in
/// verbose mode.
pub fn print_file_group(files: &[&FileReport], action: FileAction, dry_run: bool) {
  if files.is_empty() {
    return;
  }

  if is_quiet() {
    for file in files {
      println!("{}", file.path.display());
    }
    return;
  }

  let count = files.len();
  let symbol = match action {
    FileAction::Added => symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()).to_string(),
    FileAction::Updated => symbols::UPDATED.if_supports_color(Stream::Stdout, |s| s.yellow()).to_string(),
    FileAction::Removed => symbols::REMOVED.if_supports_color(Stream::Stdout, |s| s.cyan()).to_string(),
    FileAction::Unchanged | FileAction::Failed => String::new(),
  };
  println!("{} {} {} {}:", symbol, action.label(dry_run), count, plural(count));

  let show_all = is_verbose();
  let limit = if show_all { count } else { DEFAULT_FILE_LIST_LIMIT };

  for file in files.iter().take(limit) {
    println!("  {}", file.path.display());
  }

  if !show_all && count > limit {
    println!(
      "  {} ... and {} more (use -v to see all)",
      "".if_supports_color(Stream::Stdout, |s| s.dimmed()),
      count - limit
    );
  }
}

/// Print the files that could not be processed, with the reason. Always
/// shown, on stderr.
pub fn print_failed_files(files: &[&FileReport]) {
  if files.is_empty() {
    return;
  }

  let count = files.len();
  eprintln!(
    "{} {} {} could not be processed:",
    symbols::FAILURE.if_supports_color(Stream::Stderr, |s| s.red()),
    count,
    plural(count)
  );
  for file in files {
    eprintln!(
      "  {}: {}",
      file.path.display(),
      file.error.as_deref().unwrap_or("unknown error")
    );
  }
}

/// Print the message shown when no file needs a change.
pub fn print_all_files_ok(dry_run: bool) {
  if is_quiet() {
    return;
  }

  let message = if dry_run {
    "No files would change."
  } else {
    "All files are up to date."
  };
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

/// Warn that the selection matched nothing.
pub fn print_no_files_warning(root: &Path, patterns: &str) {
  eprintln!(
    "{} No files found from \"{}\" matching {}",
    "Warning:".if_supports_color(Stream::Stderr, |s| s.yellow()),
    root.display(),
    patterns
  );
}

/// Print the processing summary.
///
/// Format: "Summary: A added, U updated, R removed, N unchanged, F failed"
/// In verbose mode, also shows timing.
pub fn print_summary(summary: &ProcessingSummary) {
  if is_quiet() {
    return;
  }

  let failed_str = if summary.failed > 0 {
    summary.failed.if_supports_color(Stream::Stdout, |s| s.red()).to_string()
  } else {
    summary.failed.if_supports_color(Stream::Stdout, |s| s.cyan()).to_string()
  };

  let mut summary_line = format!(
    "Summary: {} added, {} updated, {} removed, {} unchanged, {} failed",
    summary.added.if_supports_color(Stream::Stdout, |s| s.cyan()),
    summary.updated.if_supports_color(Stream::Stdout, |s| s.cyan()),
    summary.removed.if_supports_color(Stream::Stdout, |s| s.cyan()),
    summary.unchanged.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    failed_str
  );

  if is_verbose() {
    summary_line.push_str(&format!(" ({:.2}s)", summary.processing_time_secs));
  }

  println!("{}", summary_line);
}

/// Print a hint for the user about what to do next.
pub fn print_hint(message: &str) {
  if is_quiet() {
    return;
  }

  println!("{}", message.if_supports_color(Stream::Stdout, |s| s.yellow()));
}

/// Categorize file reports into different groups for output.
pub struct CategorizedReports<'a> {
  pub added: Vec<&'a FileReport>,
  pub updated: Vec<&'a FileReport>,
  pub removed: Vec<&'a FileReport>,
  pub unchanged: Vec<&'a FileReport>,
  pub failed: Vec<&'a FileReport>,
}

impl<'a> CategorizedReports<'a> {
  /// Categorize a slice of file reports, keeping their order.
  pub fn from_reports(reports: &'a [FileReport]) -> Self {
    let mut categorized = Self {
      added: Vec::new(),
      updated: Vec::new(),
      removed: Vec::new(),
      unchanged: Vec::new(),
      failed: Vec::new(),
    };

    for report in reports {
      match report.action {
        FileAction::Added => categorized.added.push(report),
        FileAction::Updated => categorized.updated.push(report),
        FileAction::Removed => categorized.removed.push(report),
        FileAction::Unchanged => categorized.unchanged.push(report),
        FileAction::Failed => categorized.failed.push(report),
      }
    }

    categorized
  }

  /// Whether any file was (or would be) modified.
  pub fn has_changes(&self) -> bool {
    !(self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty())
  }
}
