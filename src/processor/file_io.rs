//! # File I/O Module
//!
//! This module provides file reading and writing utilities for the processor.
//! It encapsulates synchronous file operations.

use std::io::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

use crate::header::HeaderError;

/// File I/O operations for the processor.
///
/// This struct provides static methods for reading and writing files.
pub struct FileIO;

impl FileIO {
  /// Reads a file as UTF-8 text.
  ///
  /// Content that is not valid UTF-8 is reported as
  /// [`HeaderError::Encoding`] so the file is skipped rather than rewritten
  /// lossily.
  pub fn read_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    String::from_utf8(bytes)
      .map_err(HeaderError::from)
      .with_context(|| format!("Failed to decode file: {}", path.display()))
  }

  /// Replaces a file's content atomically.
  ///
  /// The content goes to a temporary file in the same directory, which then
  /// takes over the original's permissions and is renamed over it. An
  /// interrupted write leaves the original untouched.
  pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = match path.parent() {
      Some(parent) if !parent.as_os_str().is_empty() => parent,
      _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)
      .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    tmp
      .write_all(content.as_bytes())
      .and_then(|()| tmp.as_file().sync_all())
      .with_context(|| format!("Failed to write temporary file for {}", path.display()))?;

    if let Ok(metadata) = std::fs::metadata(path) {
      std::fs::set_permissions(tmp.path(), metadata.permissions())
        .with_context(|| format!("Failed to copy permissions of {}", path.display()))?;
    }

    tmp
      .persist(path)
      .map_err(|e| e.error)
      .with_context(|| format!("Failed to write file: {}", path.display()))?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use tempfile::tempdir;

  use super::*;

  #[test]
  fn test_write_atomic_replaces_content() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("file.py");
    std::fs::write(&path, "old\n").unwrap();

    FileIO::write_atomic(&path, "new\n").unwrap();
    assert_eq!(FileIO::read_text(&path).unwrap(), "new\n");

    let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(leftovers, 1);
  }

  #[cfg(unix)]
  #[test]
  fn test_write_atomic_keeps_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let path = dir.path().join("script.py");
    std::fs::write(&path, "#!/usr/bin/env python\n").unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

    FileIO::write_atomic(&path, "#!/usr/bin/env python\n# header\n").unwrap();
    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o755);
  }

  #[test]
  fn test_read_text_rejects_invalid_utf8() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("latin1.py");
    std::fs::write(&path, b"caf\xe9\n").unwrap();

    let err = FileIO::read_text(&path).unwrap_err();
    assert!(err.downcast_ref::<HeaderError>().is_some());
    assert_eq!(std::fs::read(&path).unwrap(), b"caf\xe9\n");
  }
}
