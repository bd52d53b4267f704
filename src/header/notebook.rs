//! # Notebook Header Engine
//!
//! Jupyter notebooks carry their header in a dedicated code cell tagged
//! [`HEADER_TAG`]. The cell source holds the same commented block the text
//! engine generates, one `source` entry per line.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{HeaderError, HeaderSpec};

/// Tag identifying the header cell.
pub const HEADER_TAG: &str = "header";

/// Tag asking notebook renderers to collapse the header cell.
pub const HIDE_TAG: &str = "hide-cell";

/// Default file suffix for notebooks.
pub const DEFAULT_NOTEBOOK_SUFFIX: &str = ".ipynb";

/// A notebook document (nbformat v4). Unknown top-level fields are kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
  pub cells: Vec<Cell>,
  pub metadata: Map<String, Value>,
  pub nbformat: u32,
  pub nbformat_minor: u32,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
  Code,
  Markdown,
  Raw,
}

/// A single notebook cell. Fields other than the ones the engine touches
/// (`execution_count`, `attachments`, ...) round-trip through `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id: Option<String>,
  pub cell_type: CellType,
  #[serde(default)]
  pub metadata: Map<String, Value>,
  #[serde(deserialize_with = "multiline_source")]
  pub source: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub outputs: Option<Vec<Value>>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

impl Cell {
  /// Whether the cell's `metadata.tags` contains `tag`.
  pub fn has_tag(&self, tag: &str) -> bool {
    self
      .metadata
      .get("tags")
      .and_then(Value::as_array)
      .is_some_and(|tags| tags.iter().any(|t| t.as_str() == Some(tag)))
  }
}

/// nbformat allows `source` as a single string or as a list of lines; both are
/// normalized to the list form.
fn multiline_source<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Multiline {
    Joined(String),
    Lines(Vec<String>),
  }

  Ok(match Multiline::deserialize(deserializer)? {
    Multiline::Joined(text) => text.split_inclusive('\n').map(str::to_string).collect(),
    Multiline::Lines(lines) => lines,
  })
}

impl Notebook {
  /// Parses notebook JSON.
  ///
  /// # Errors
  ///
  /// Returns [`HeaderError::MalformedNotebook`] if the content is not JSON or
  /// lacks `cells`, `metadata`, `nbformat` or `nbformat_minor`.
  pub fn from_json(content: &str) -> Result<Self, HeaderError> {
    Ok(serde_json::from_str(content)?)
  }

  /// Serializes the notebook the way Jupyter writes it: sorted keys, one-space
  /// indentation, trailing newline.
  pub fn to_json_string(&self) -> Result<String, HeaderError> {
    // Going through Value sorts the keys.
    let value = serde_json::to_value(self)?;
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b" "));
    value.serialize(&mut serializer)?;
    buf.push(b'\n');
    Ok(String::from_utf8(buf)?)
  }
}

/// Header operations on notebooks.
pub struct NotebookHeaderEngine<'a> {
  spec: &'a HeaderSpec,
  extra_tag: Option<&'a str>,
}

impl<'a> NotebookHeaderEngine<'a> {
  pub const fn new(spec: &'a HeaderSpec) -> Self {
    Self { spec, extra_tag: None }
  }

  /// Adds a third tag to generated header cells.
  #[must_use]
  pub const fn with_extra_tag(mut self, tag: Option<&'a str>) -> Self {
    self.extra_tag = tag;
    self
  }

  /// Index of the header cell, if any.
  ///
  /// # Errors
  ///
  /// Returns [`HeaderError::AmbiguousNotebookHeader`] when several cells carry
  /// the header tag.
  pub fn detect(&self, notebook: &Notebook) -> Result<Option<usize>, HeaderError> {
    let mut tagged = notebook
      .cells
      .iter()
      .enumerate()
      .filter(|(_, cell)| cell.has_tag(HEADER_TAG))
      .map(|(index, _)| index);

    let first = tagged.next();
    let others = tagged.count();
    if others > 0 {
      return Err(HeaderError::AmbiguousNotebookHeader {
        count: others + 1,
        tag: HEADER_TAG,
      });
    }
    Ok(first)
  }

  /// The header cell `source`: the commented block, every entry newline
  /// terminated except possibly the last one.
  pub fn header_source(&self) -> Vec<String> {
    let lines = self.spec.header_lines();
    let last = lines.len().saturating_sub(1);
    lines
      .into_iter()
      .enumerate()
      .map(|(i, line)| {
        if i < last || self.spec.final_linesep() {
          line + "\n"
        } else {
          line
        }
      })
      .collect()
  }

  /// A fresh header cell with a new id.
  pub fn header_cell(&self) -> Cell {
    let mut tags = vec![Value::from(HEADER_TAG), Value::from(HIDE_TAG)];
    if let Some(tag) = self.extra_tag
      && tag != HEADER_TAG
      && tag != HIDE_TAG
    {
      tags.push(Value::from(tag));
    }

    let mut metadata = Map::new();
    metadata.insert("tags".to_string(), Value::Array(tags));

    let mut extra = Map::new();
    extra.insert("execution_count".to_string(), Value::Null);

    Cell {
      id: Some(Uuid::new_v4().simple().to_string()),
      cell_type: CellType::Code,
      metadata,
      source: self.header_source(),
      outputs: Some(Vec::new()),
      extra,
    }
  }

  /// Puts a new header cell at the top of the notebook.
  pub fn insert(&self, mut notebook: Notebook) -> Notebook {
    notebook.cells.insert(0, self.header_cell());
    notebook
  }

  /// Refreshes the source of the existing header cell, keeping its position,
  /// id and metadata, or inserts a new cell if there is none.
  pub fn update(&self, mut notebook: Notebook) -> Result<Notebook, HeaderError> {
    match self.detect(&notebook)? {
      Some(index) => {
        notebook.cells[index].source = self.header_source();
        Ok(notebook)
      }
      None => Ok(self.insert(notebook)),
    }
  }

  /// Deletes the header cell entirely.
  pub fn remove(&self, mut notebook: Notebook) -> Result<Notebook, HeaderError> {
    if let Some(index) = self.detect(&notebook)? {
      notebook.cells.remove(index);
    }
    Ok(notebook)
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::header::HeaderOptions;

  fn spec() -> HeaderSpec {
    HeaderSpec::new(vec!["Copyright".to_string()], HeaderOptions::default())
      .unwrap()
      .with_final_linesep(false)
  }

  fn notebook(cells: Value) -> Notebook {
    Notebook::from_json(
      &json!({
        "cells": cells,
        "metadata": {"kernelspec": {"name": "python3"}},
        "nbformat": 4,
        "nbformat_minor": 5
      })
      .to_string(),
    )
    .unwrap()
  }

  fn code_cell(id: &str, source: &str, tags: &[&str]) -> Value {
    json!({
      "id": id,
      "cell_type": "code",
      "metadata": {"tags": tags},
      "source": source,
      "outputs": [],
      "execution_count": null
    })
  }

  #[test]
  fn test_insert_into_empty_notebook() {
    let spec = spec();
    let engine = NotebookHeaderEngine::new(&spec);
    let nb = engine.update(notebook(json!([]))).unwrap();

    assert_eq!(nb.cells.len(), 1);
    let cell = &nb.cells[0];
    assert_eq!(cell.cell_type, CellType::Code);
    assert!(cell.has_tag(HEADER_TAG));
    assert!(cell.has_tag(HIDE_TAG));
    assert_eq!(cell.outputs, Some(vec![]));
    assert_eq!(cell.extra.get("execution_count"), Some(&Value::Null));
    assert!(cell.id.as_deref().is_some_and(|id| !id.is_empty()));

    let sep = spec.separator_line();
    assert_eq!(cell.source, vec![format!("{sep}\n"), "# Copyright\n".to_string(), sep]);
  }

  #[test]
  fn test_final_linesep_terminates_last_entry() {
    let spec = spec().with_final_linesep(true);
    let source = NotebookHeaderEngine::new(&spec).header_source();
    assert!(source.iter().all(|line| line.ends_with('\n')));
  }

  #[test]
  fn test_update_replaces_only_header_source() {
    let spec = spec();
    let engine = NotebookHeaderEngine::new(&spec);
    let before = notebook(json!([
      code_cell("aaa", "import os\n", &[]),
      code_cell("hdr", "# old header\n", &["header", "hide-cell"]),
      code_cell("ccc", "print(1)\n", &["parameters"]),
    ]));

    let after = engine.update(before.clone()).unwrap();
    assert_eq!(after.cells.len(), 3);
    assert_eq!(after.cells[0], before.cells[0]);
    assert_eq!(after.cells[2], before.cells[2]);
    assert_eq!(after.cells[1].id.as_deref(), Some("hdr"));
    assert_eq!(after.cells[1].metadata, before.cells[1].metadata);
    assert_eq!(after.cells[1].source, engine.header_source());
  }

  #[test]
  fn test_update_is_idempotent() {
    let spec = spec();
    let engine = NotebookHeaderEngine::new(&spec);
    let once = engine.update(notebook(json!([code_cell("a", "x = 1", &[])]))).unwrap();
    let twice = engine.update(once.clone()).unwrap();
    assert_eq!(once, twice);
    assert_eq!(once.to_json_string().unwrap(), twice.to_json_string().unwrap());
  }

  #[test]
  fn test_remove_deletes_header_cell() {
    let spec = spec();
    let engine = NotebookHeaderEngine::new(&spec);
    let original = notebook(json!([code_cell("a", "x = 1", &[])]));
    let inserted = engine.insert(original.clone());
    assert_eq!(engine.remove(inserted).unwrap(), original);
    assert_eq!(engine.remove(original.clone()).unwrap(), original);
  }

  #[test]
  fn test_multiple_header_cells_are_ambiguous() {
    let spec = spec();
    let engine = NotebookHeaderEngine::new(&spec);
    let nb = notebook(json!([
      code_cell("a", "# one", &["header"]),
      code_cell("b", "# two", &["header"]),
    ]));

    let err = engine.update(nb.clone()).unwrap_err();
    assert!(matches!(err, HeaderError::AmbiguousNotebookHeader { count: 2, .. }));
    assert!(engine.remove(nb).is_err());
  }

  #[test]
  fn test_extra_tag() {
    let spec = spec();
    let cell = NotebookHeaderEngine::new(&spec)
      .with_extra_tag(Some("remove-input"))
      .header_cell();
    assert_eq!(cell.metadata["tags"], json!(["header", "hide-cell", "remove-input"]));
  }

  #[test]
  fn test_malformed_notebook() {
    assert!(matches!(
      Notebook::from_json(r#"{"cells": []}"#),
      Err(HeaderError::MalformedNotebook(_))
    ));
    assert!(Notebook::from_json("not json").is_err());
  }

  #[test]
  fn test_string_source_is_split_into_lines() {
    let nb = notebook(json!([code_cell("a", "a = 1\nb = 2", &[])]));
    assert_eq!(nb.cells[0].source, vec!["a = 1\n", "b = 2"]);
  }

  #[test]
  fn test_serialization_keeps_unknown_fields() {
    let json = r##"{
 "cells": [
  {
   "attachments": {},
   "cell_type": "markdown",
   "id": "m1",
   "metadata": {},
   "source": [
    "# Title"
   ]
  }
 ],
 "metadata": {},
 "nbformat": 4,
 "nbformat_minor": 5,
 "worksheets": []
}
"##;
    let nb = Notebook::from_json(json).unwrap();
    assert_eq!(nb.to_json_string().unwrap(), json);
  }
}
