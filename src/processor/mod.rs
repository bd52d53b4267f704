//! # Processor Module
//!
//! This module applies the requested header action to every selected file.
//!
//! The module is organized into several submodules:
//! - [`file_io`] - File reading and atomic writing
//! - [`file_collector`] - Directory traversal and file selection
//!
//! The [`Processor`] struct is the main entry point. Each file is resolved once
//! to a [`Target`] (plain text or notebook), transformed in memory, and written
//! back unless the run is a dry run. Files are independent, so they are
//! processed concurrently; reports come back in input order.

mod file_collector;
mod file_io;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
pub use file_collector::FileFinder;
pub use file_io::FileIO;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::diff::DiffManager;
use crate::header::{HeaderError, HeaderSpec, Notebook, NotebookHeaderEngine, SourceDocument, TextHeaderEngine};
use crate::report::{FileAction, FileReport};

/// Which engine handles a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
  Text,
  Notebook,
}

impl Target {
  /// Resolves the target from the file name. Notebooks are only recognized
  /// when notebook support is enabled (`notebook_suffix` is set).
  pub fn for_path(path: &Path, notebook_suffix: Option<&str>) -> Self {
    let is_notebook = notebook_suffix.is_some_and(|suffix| {
      path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(suffix))
    });
    if is_notebook { Self::Notebook } else { Self::Text }
  }
}

/// The action requested for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
  /// Insert the header, or replace an existing one
  #[default]
  Update,
  /// Delete an existing header
  Remove,
}

/// Notebook handling options.
#[derive(Debug, Clone)]
pub struct NotebookSettings {
  /// File name suffix identifying notebooks
  pub suffix: String,
  /// Header spec for notebooks (its own trailing newline policy)
  pub spec: HeaderSpec,
  /// Optional third tag on generated header cells
  pub extra_tag: Option<String>,
}

/// Configuration for creating a Processor instance.
pub struct ProcessorConfig {
  pub root: PathBuf,
  pub text_spec: HeaderSpec,
  pub notebook: Option<NotebookSettings>,
  pub action: Action,
  pub dry_run: bool,
  pub diff_manager: Option<DiffManager>,
}

impl ProcessorConfig {
  /// Creates a new ProcessorConfig with required fields and sensible defaults.
  ///
  /// Use struct update syntax to override specific fields:
  /// ```ignore
  /// ProcessorConfig {
  ///     dry_run: true,
  ///     ..ProcessorConfig::new(root, spec)
  /// }
  /// ```
  pub const fn new(root: PathBuf, text_spec: HeaderSpec) -> Self {
    Self {
      root,
      text_spec,
      notebook: None,
      action: Action::Update,
      dry_run: false,
      diff_manager: None,
    }
  }
}

/// Outcome of transforming one file's content in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformation {
  pub action: FileAction,
  /// New content, present only when it differs from the input
  pub content: Option<String>,
}

impl Transformation {
  const fn unchanged() -> Self {
    Self {
      action: FileAction::Unchanged,
      content: None,
    }
  }

  fn changed(action: FileAction, original: &str, content: String) -> Self {
    if content == original {
      Self::unchanged()
    } else {
      Self {
        action,
        content: Some(content),
      }
    }
  }
}

/// Processor for applying header actions to files.
///
/// The `Processor` is responsible for:
/// - Dispatching each file to the text or notebook engine
/// - Computing the new content and classifying the change
/// - Writing changes atomically, unless in dry-run mode
/// - Rendering diffs when requested
/// - Collecting a report entry for every file
pub struct Processor {
  root: PathBuf,
  text_spec: HeaderSpec,
  notebook: Option<NotebookSettings>,
  action: Action,
  dry_run: bool,
  diff_manager: DiffManager,
}

impl Processor {
  /// Creates a new processor with the specified configuration.
  pub fn new(config: ProcessorConfig) -> Self {
    Self {
      root: config.root,
      text_spec: config.text_spec,
      notebook: config.notebook,
      action: config.action,
      dry_run: config.dry_run,
      diff_manager: config.diff_manager.unwrap_or_default(),
    }
  }

  /// Resolves the engine for a path.
  pub fn target_for(&self, path: &Path) -> Target {
    Target::for_path(path, self.notebook.as_ref().map(|nb| nb.suffix.as_str()))
  }

  /// Applies the configured action to content in memory.
  ///
  /// # Errors
  ///
  /// Returns a [`HeaderError`] when the header cannot be located
  /// unambiguously or the notebook is malformed. The content must then be
  /// left as it is.
  pub fn transform(&self, target: Target, content: &str) -> Result<Transformation, HeaderError> {
    match target {
      Target::Text => self.transform_text(content),
      Target::Notebook => self.transform_notebook(content),
    }
  }

  fn transform_text(&self, content: &str) -> Result<Transformation, HeaderError> {
    let engine = TextHeaderEngine::new(&self.text_spec);
    let doc = SourceDocument::parse(content);
    let detected = engine.detect(&doc)?;
    trace!("Detected text header: {:?}", detected);

    match (self.action, detected) {
      (Action::Update, None) => Ok(Transformation::changed(FileAction::Added, content, engine.insert(&doc))),
      (Action::Update, Some(_)) => Ok(Transformation::changed(
        FileAction::Updated,
        content,
        engine.update(&doc)?,
      )),
      (Action::Remove, None) => Ok(Transformation::unchanged()),
      (Action::Remove, Some(_)) => Ok(Transformation::changed(
        FileAction::Removed,
        content,
        engine.remove(&doc)?,
      )),
    }
  }

  fn transform_notebook(&self, content: &str) -> Result<Transformation, HeaderError> {
    let Some(settings) = &self.notebook else {
      return self.transform_text(content);
    };

    let engine = NotebookHeaderEngine::new(&settings.spec).with_extra_tag(settings.extra_tag.as_deref());
    let notebook = Notebook::from_json(content)?;
    let detected = engine.detect(&notebook)?;
    trace!("Detected notebook header cell: {:?}", detected);

    let (action, transformed) = match (self.action, detected) {
      (Action::Update, None) => (FileAction::Added, engine.insert(notebook.clone())),
      (Action::Update, Some(_)) => (FileAction::Updated, engine.update(notebook.clone())?),
      (Action::Remove, None) => return Ok(Transformation::unchanged()),
      (Action::Remove, Some(_)) => (FileAction::Removed, engine.remove(notebook.clone())?),
    };

    // Compare documents rather than text so formatting differences in the
    // input do not count as a change.
    if transformed == notebook {
      return Ok(Transformation::unchanged());
    }
    Ok(Transformation::changed(action, content, transformed.to_json_string()?))
  }

  /// Processes a single file, relative to the root. Never fails: errors are
  /// recorded in the returned report and the file is left untouched.
  pub fn process_file(&self, relative: &Path) -> FileReport {
    let target = self.target_for(relative);
    match self.process_file_inner(relative, target) {
      Ok(report) => report,
      Err(e) => {
        if e.downcast_ref::<HeaderError>().is_some_and(HeaderError::is_ambiguity) {
          warn!("Leaving {} alone, its header cannot be located: {:#}", relative.display(), e);
        } else {
          debug!("Skipping {}: {:#}", relative.display(), e);
        }
        FileReport::failed(relative.to_path_buf(), target, &e)
      }
    }
  }

  fn process_file_inner(&self, relative: &Path, target: Target) -> Result<FileReport> {
    let path = self.root.join(relative);
    let original = FileIO::read_text(&path)?;
    let transformation = self.transform(target, &original)?;

    let mut report = FileReport::new(relative.to_path_buf(), target, transformation.action);
    let Some(content) = transformation.content else {
      trace!("No change needed for {}", relative.display());
      return Ok(report);
    };

    if self.diff_manager.is_enabled() {
      report.diff = Some(DiffManager::render(relative, &original, &content));
    }

    if self.dry_run {
      trace!("Dry run, not writing {}", relative.display());
    } else {
      FileIO::write_atomic(&path, &content)?;
      debug!("Wrote {}", path.display());
    }

    Ok(report)
  }

  /// Processes files concurrently, at most `jobs` at a time, on the blocking
  /// thread pool. Reports are returned in the order of `files`.
  pub async fn process_all(self: Arc<Self>, files: Vec<PathBuf>, jobs: usize) -> Vec<FileReport> {
    let jobs = jobs.max(1);
    debug!("Processing {} files with {} jobs", files.len(), jobs);
    let process_start = std::time::Instant::now();

    let reports: Vec<FileReport> = stream::iter(files)
      .map(|relative| {
        let processor = Arc::clone(&self);
        async move {
          let target = processor.target_for(&relative);
          let task_path = relative.clone();
          let task_processor = Arc::clone(&processor);
          match tokio::task::spawn_blocking(move || task_processor.process_file(&task_path)).await {
            Ok(report) => report,
            Err(e) => FileReport::failed(relative, target, &anyhow::Error::new(e)),
          }
        }
      })
      .buffered(jobs)
      .collect()
      .await;

    debug!(
      "Processed {} files in {}ms",
      reports.len(),
      process_start.elapsed().as_millis()
    );
    reports
  }
}
