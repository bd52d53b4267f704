//! # Text Header Engine
//!
//! Detects, inserts, updates and removes a header block in plain-text file
//! content. The engine is line based: it never interprets the body of a header,
//! it only looks for the separator lines that delimit it.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use super::{DetectedHeader, HeaderError, HeaderSpec};

/// Number of leading lines that may hold magic prefixes (shebang, encoding
/// declaration).
const MAX_MAGIC_LINES: usize = 2;

/// Directives that must stay on the first lines of a file, matched
/// case-insensitively against the start of the line.
const MAGIC_PREFIXES: [&str; 7] = [
  "#!",                       // shebang
  "<?xml",                    // XML declaration
  "<!doctype",                // HTML doctype
  "<?php",                    // PHP opening tag
  "# frozen_string_literal:", // Ruby interpreter instruction
  "# escape=",                // Dockerfile directive
  "# syntax=",                // Dockerfile directive
];

/// PEP 263 style encoding declarations, e.g. `# -*- coding: utf-8 -*-`.
static CODING_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^[ \t\f]*#.*?coding[:=][ \t]*[-_.a-zA-Z0-9]+").expect("coding regex must compile")
});

/// A text file split into lines, each line keeping its terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument<'a> {
  lines: Vec<&'a str>,
  line_ending: &'static str,
}

impl<'a> SourceDocument<'a> {
  /// Splits content into lines. The line ending used for generated lines is
  /// taken from the first line (`\r\n` or `\n`).
  pub fn parse(content: &'a str) -> Self {
    let lines: Vec<&str> = content.split_inclusive('\n').collect();
    let line_ending = match lines.first() {
      Some(first) if first.ends_with("\r\n") => "\r\n",
      _ => "\n",
    };
    Self { lines, line_ending }
  }

  pub fn lines(&self) -> &[&'a str] {
    &self.lines
  }

  pub const fn line_ending(&self) -> &'static str {
    self.line_ending
  }

  pub fn is_empty(&self) -> bool {
    self.lines.is_empty()
  }

  /// Number of leading lines that form the magic prefix.
  pub fn magic_prefix_len(&self) -> usize {
    self
      .lines
      .iter()
      .take(MAX_MAGIC_LINES)
      .take_while(|line| is_magic_line(line))
      .count()
  }

  /// Index at which a new header goes: after the magic prefix and any blank
  /// lines that follow it, i.e. in front of the first content line.
  pub fn insertion_point(&self) -> usize {
    let magic = self.magic_prefix_len();
    magic
      + self.lines[magic..]
        .iter()
        .take_while(|line| line.trim().is_empty())
        .count()
  }

  /// Reassembles the document, replacing the lines in `range` with `block`.
  fn splice(&self, range: Range<usize>, block: &[String], final_linesep: bool) -> String {
    let eol = self.line_ending;
    let mut out = String::with_capacity(self.lines.iter().map(|l| l.len()).sum::<usize>() + block.len() * 80);

    for line in &self.lines[..range.start] {
      out.push_str(line);
    }
    if !out.is_empty() && !block.is_empty() && !out.ends_with('\n') {
      out.push_str(eol);
    }

    let trailing = &self.lines[range.end..];
    let last = block.len().saturating_sub(1);
    for (i, line) in block.iter().enumerate() {
      out.push_str(line);
      if i < last || !trailing.is_empty() || final_linesep {
        out.push_str(eol);
      }
    }

    for line in trailing {
      out.push_str(line);
    }
    out
  }
}

fn is_magic_line(line: &str) -> bool {
  let lower = line.trim_start().to_lowercase();
  MAGIC_PREFIXES.iter().any(|prefix| lower.starts_with(prefix)) || CODING_DECLARATION.is_match(line)
}

/// Header operations on plain-text documents.
pub struct TextHeaderEngine<'a> {
  spec: &'a HeaderSpec,
}

impl<'a> TextHeaderEngine<'a> {
  pub const fn new(spec: &'a HeaderSpec) -> Self {
    Self { spec }
  }

  /// Locates an existing header block.
  ///
  /// The top separator must be the first line after the magic prefix and any
  /// blank lines. The closing separator is the next separator line below it;
  /// body lines in between are taken verbatim. Commented body lines may run
  /// on indefinitely, while uncommented ones are limited to
  /// [`HeaderSpec::scan_budget`] lines.
  ///
  /// # Errors
  ///
  /// Returns [`HeaderError::UnterminatedHeader`] when the file ends before a
  /// closing separator is found. If the uncommented budget is exhausted while
  /// the file goes on, the opening separator is treated as unrelated content
  /// and `Ok(None)` is returned.
  pub fn detect(&self, doc: &SourceDocument) -> Result<Option<DetectedHeader>, HeaderError> {
    let lines = doc.lines();
    let start = doc.insertion_point();
    let Some(first) = lines.get(start) else {
      return Ok(None);
    };
    if !self.spec.is_separator(first) {
      return Ok(None);
    }

    let budget = self.spec.scan_budget();
    let mut uncommented = 0;
    for (offset, line) in lines[start + 1..].iter().enumerate() {
      if self.spec.is_separator(line) {
        return Ok(Some(DetectedHeader {
          start,
          end: start + 1 + offset,
        }));
      }
      if !self.spec.is_commented(line) {
        uncommented += 1;
        if uncommented > budget {
          trace!("No closing separator within {} uncommented lines of line {}", budget, start + 1);
          return Ok(None);
        }
      }
    }

    Err(HeaderError::UnterminatedHeader { line: start + 1 })
  }

  /// Body lines of a detected header, with the comment prefix removed.
  pub fn header_body(&self, doc: &SourceDocument, header: &DetectedHeader) -> Vec<String> {
    doc.lines()[header.body_range()]
      .iter()
      .map(|line| self.spec.parse_body_line(line).to_string())
      .collect()
  }

  /// Inserts a fresh header at the insertion point, without looking for an
  /// existing one.
  pub fn insert(&self, doc: &SourceDocument) -> String {
    let at = doc.insertion_point();
    doc.splice(at..at, &self.spec.header_lines(), self.spec.final_linesep())
  }

  /// Replaces the detected header in place, or inserts one if none is found.
  /// Applying it twice yields the same content as applying it once.
  pub fn update(&self, doc: &SourceDocument) -> Result<String, HeaderError> {
    let range = match self.detect(doc)? {
      Some(header) => header.start..header.end + 1,
      None => {
        let at = doc.insertion_point();
        at..at
      }
    };
    Ok(doc.splice(range, &self.spec.header_lines(), self.spec.final_linesep()))
  }

  /// Deletes the detected header, leaving everything else untouched.
  pub fn remove(&self, doc: &SourceDocument) -> Result<String, HeaderError> {
    let lines = doc.lines();
    let kept = match self.detect(doc)? {
      Some(header) => lines[..header.start].iter().chain(&lines[header.end + 1..]),
      None => lines[..0].iter().chain(lines),
    };
    Ok(kept.copied().collect())
  }
}
