//! # File Collector Module
//!
//! This module walks a root directory and collects the files accepted by a
//! [`FileFilter`], in a reproducible order.

use std::path::{Path, PathBuf};

use tracing::{debug, trace};
use walkdir::{DirEntry, WalkDir};

use crate::file_filter::{FileFilter, SelectionError};

/// Collects candidate files under a root directory.
///
/// The `FileFinder` handles:
/// - Validating the root directory
/// - Depth-first traversal, sorted by file name within each directory
/// - Skipping hidden files and directories (names starting with `.`)
/// - Applying the file filter to every regular file
pub struct FileFinder<F: FileFilter> {
  root: PathBuf,
  filter: F,
}

impl<F: FileFilter> FileFinder<F> {
  /// Creates a finder rooted at `root`.
  ///
  /// # Errors
  ///
  /// Returns [`SelectionError::RootNotFound`] or
  /// [`SelectionError::NotADirectory`] for an unusable root.
  pub fn new(root: impl Into<PathBuf>, filter: F) -> Result<Self, SelectionError> {
    let root = root.into();
    if !root.exists() {
      return Err(SelectionError::RootNotFound(root));
    }
    if !root.is_dir() {
      return Err(SelectionError::NotADirectory(root));
    }
    Ok(Self { root, filter })
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub const fn filter(&self) -> &F {
    &self.filter
  }

  /// Returns the selected files, relative to the root.
  ///
  /// Symbolic links are not followed, so link cycles cannot occur.
  pub fn find(&self) -> Result<Vec<PathBuf>, SelectionError> {
    debug!("Scanning directory: {}", self.root.display());
    let start_time = std::time::Instant::now();

    let walker = WalkDir::new(&self.root)
      .follow_links(false)
      .sort_by_file_name()
      .into_iter()
      .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

    let mut files = Vec::new();
    for entry in walker {
      let entry = entry?;
      if !entry.file_type().is_file() {
        continue;
      }

      let relative = entry.path().strip_prefix(&self.root).unwrap_or(entry.path());
      let result = self.filter.should_process(relative);
      if result.should_process {
        files.push(relative.to_path_buf());
      } else if let Some(reason) = result.reason {
        trace!("Skipping {}: {}", relative.display(), reason);
      }
    }

    debug!(
      "Found {} files in {}ms",
      files.len(),
      start_time.elapsed().as_millis()
    );
    Ok(files)
  }
}

fn is_hidden(entry: &DirEntry) -> bool {
  entry.file_name().to_str().is_some_and(|name| name.starts_with('.'))
}
