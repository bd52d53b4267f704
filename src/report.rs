//! # Report Module
//!
//! This module records what happened to each selected file and renders the
//! optional JSON report.
//!
//! In dry-run mode the recorded action is the one that *would* be taken; the
//! summary carries the `dry_run` flag so consumers can tell the two apart.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::processor::Target;

/// Information about a processed file for reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
  /// Path to the file, relative to the root directory
  #[serde(with = "path_serialization")]
  pub path: PathBuf,
  /// Which engine handled the file
  pub target: Target,
  /// Outcome for the file
  pub action: FileAction,
  /// Error message when the file was skipped
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  /// Rendered diff, when diffs were requested and the file changes
  #[serde(skip)]
  pub diff: Option<String>,
}

impl FileReport {
  pub const fn new(path: PathBuf, target: Target, action: FileAction) -> Self {
    Self {
      path,
      target,
      action,
      error: None,
      diff: None,
    }
  }

  /// Report for a file that could not be processed.
  pub fn failed(path: PathBuf, target: Target, error: &anyhow::Error) -> Self {
    Self {
      error: Some(format!("{error:#}")),
      ..Self::new(path, target, FileAction::Failed)
    }
  }
}

/// Possible outcomes for a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileAction {
  /// No header was found; one was (or would be) inserted
  Added,
  /// An existing header was (or would be) replaced
  Updated,
  /// The header was (or would be) deleted
  Removed,
  /// The file already had the requested form
  Unchanged,
  /// The file was skipped because of an error
  Failed,
}

impl FileAction {
  /// Past-tense label used in terminal output.
  pub const fn label(self, dry_run: bool) -> &'static str {
    match (self, dry_run) {
      (Self::Added, false) => "Added header to",
      (Self::Added, true) => "Would add header to",
      (Self::Updated, false) => "Updated header in",
      (Self::Updated, true) => "Would update header in",
      (Self::Removed, false) => "Removed header from",
      (Self::Removed, true) => "Would remove header from",
      (Self::Unchanged, _) => "Unchanged",
      (Self::Failed, _) => "Failed",
    }
  }
}

/// Helper module for serializing/deserializing PathBuf
mod path_serialization {
  use std::path::PathBuf;

  use serde::{Deserialize, Deserializer, Serializer};

  pub fn serialize<S>(path: &std::path::Path, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    serializer.serialize_str(&path.to_string_lossy())
  }

  pub fn deserialize<'de, D>(deserializer: D) -> Result<PathBuf, D::Error>
  where
    D: Deserializer<'de>,
  {
    let s = String::deserialize(deserializer)?;
    Ok(PathBuf::from(s))
  }
}

/// Summary of the processing results
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessingSummary {
  /// Total number of selected files
  pub total_files: usize,
  pub added: usize,
  pub updated: usize,
  pub removed: usize,
  pub unchanged: usize,
  pub failed: usize,
  /// Whether nothing was written
  pub dry_run: bool,
  /// Processing time in seconds
  #[serde(rename = "processing_time_seconds")]
  pub processing_time_secs: f64,
  /// Timestamp when the summary was created
  #[serde(skip_serializing_if = "Option::is_none")]
  pub timestamp: Option<i64>,
}

impl ProcessingSummary {
  /// Create a ProcessingSummary from a collection of FileReports
  pub fn from_reports(files: &[FileReport], dry_run: bool, processing_time: std::time::Duration) -> Self {
    let mut summary = Self {
      total_files: files.len(),
      dry_run,
      processing_time_secs: processing_time.as_secs_f64(),
      timestamp: Some(Local::now().timestamp()),
      ..Self::default()
    };

    for file in files {
      match file.action {
        FileAction::Added => summary.added += 1,
        FileAction::Updated => summary.updated += 1,
        FileAction::Removed => summary.removed += 1,
        FileAction::Unchanged => summary.unchanged += 1,
        FileAction::Failed => summary.failed += 1,
      }
    }

    summary
  }

  /// Number of files that were (or would be) modified.
  pub const fn changed(&self) -> usize {
    self.added + self.updated + self.removed
  }
}

#[derive(Serialize)]
struct JsonReport<'a> {
  summary: &'a ProcessingSummary,
  files: &'a [FileReport],
}

/// Report Generator for the JSON report
pub struct ReportGenerator<'a> {
  /// Path where the report will be saved
  output_path: &'a Path,
}

impl<'a> ReportGenerator<'a> {
  pub const fn new(output_path: &'a Path) -> Self {
    Self { output_path }
  }

  /// Renders the report.
  pub fn render(files: &[FileReport], summary: &ProcessingSummary) -> Result<String> {
    let report = JsonReport { summary, files };
    Ok(serde_json::to_string_pretty(&report)? + "\n")
  }

  /// Writes the report to the output path.
  ///
  /// The report is a user-requested artifact, so it is written in dry-run mode
  /// as well.
  pub fn generate(&self, files: &[FileReport], summary: &ProcessingSummary) -> Result<()> {
    let content = Self::render(files, summary)?;
    fs::write(self.output_path, content)
      .with_context(|| format!("Failed to write report to {}", self.output_path.display()))
  }
}
