#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Header text used by most tests.
pub const HEADER_TEXT: &str = "Copyright (c) 2024 Example Corp.\n\nAll rights reserved.\n";

/// Python files in the source tree that carry code.
pub const CODE_FILES: [&str; 2] = ["mypackage/foo.py", "mypackage/bar.py"];

/// Creates this source tree under `root`:
///
/// ```text
/// mypackage/
///     __init__.py
///     foo.py
///     bar.py
///     tests/
///         __init__.py
///         test_foo.py
///         test_bar.py
/// ```
///
/// Package markers are empty; every other file has a line of code.
pub fn create_source_tree(root: &Path) -> Result<()> {
  let package = root.join("mypackage");
  let tests = package.join("tests");
  fs::create_dir_all(&tests).with_context(|| format!("Failed to create {}", tests.display()))?;

  for dir in [&package, &tests] {
    fs::write(dir.join("__init__.py"), "")?;
  }
  fs::write(package.join("foo.py"), "def foo():\n    return 1\n")?;
  fs::write(package.join("bar.py"), "#!/usr/bin/env python\nimport foo\n")?;
  fs::write(tests.join("test_foo.py"), "def test_foo():\n    pass\n")?;
  fs::write(tests.join("test_bar.py"), "def test_bar():\n    pass\n")?;
  Ok(())
}

/// Writes [`HEADER_TEXT`] to `header.txt` in `dir`.
pub fn write_header_file(dir: &Path) -> Result<PathBuf> {
  write_header_text(dir, HEADER_TEXT)
}

/// Writes `text` to `header.txt` in `dir`.
pub fn write_header_text(dir: &Path, text: &str) -> Result<PathBuf> {
  let path = dir.join("header.txt");
  fs::write(&path, text)?;
  Ok(path)
}

/// The block generated for [`HEADER_TEXT`] with the default options.
pub fn expected_header() -> String {
  let sep = "#".repeat(78);
  format!("{sep}\n# Copyright (c) 2024 Example Corp.\n#\n# All rights reserved.\n{sep}\n")
}

/// A minimal nbformat v4 notebook with one code cell.
pub fn notebook_json(code: &str) -> String {
  serde_json::json!({
    "cells": [{
      "cell_type": "code",
      "execution_count": null,
      "id": "0a1b2c3d",
      "metadata": {},
      "outputs": [],
      "source": [code]
    }],
    "metadata": {"kernelspec": {"name": "python3"}},
    "nbformat": 4,
    "nbformat_minor": 5
  })
  .to_string()
}

/// Reads a file below `root` as a string.
pub fn read(root: &Path, relative: &str) -> Result<String> {
  let path = root.join(relative);
  fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))
}
