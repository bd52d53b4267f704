use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use addheader::config::{Config, JupyterSetting, load_config};
use addheader::diff::DiffManager;
use addheader::file_filter::PatternMatcher;
use addheader::header::HeaderSpec;
use addheader::header::notebook::DEFAULT_NOTEBOOK_SUFFIX;
use addheader::info_log;
use addheader::logging::{ColorMode, init_tracing, set_quiet, set_verbose};
use addheader::output::{
  CategorizedReports, print_all_files_ok, print_blank_line, print_failed_files, print_file_group, print_hint,
  print_no_files_warning, print_start_message, print_summary,
};
use addheader::processor::{Action, FileFinder, FileIO, NotebookSettings, Processor, ProcessorConfig};
use addheader::report::{FileAction, ProcessingSummary, ReportGenerator};
use anyhow::{Context, Result, bail};
use clap::Args;
use tracing::debug;

/// Arguments for a header run
#[derive(Args, Debug)]
pub struct RunArgs {
  /// Root directory to search for files
  #[arg(value_name = "ROOT")]
  pub root: PathBuf,

  /// File holding the header text, one line per header line
  #[arg(short, long, value_name = "FILE")]
  pub text: Option<PathBuf>,

  /// File name pattern to select (repeatable); prefix with '~' to exclude
  /// (default: '*.py' '~__init__.py')
  #[arg(short, long = "pattern", value_name = "PATTERN")]
  pub patterns: Vec<String>,

  /// Report what would change without writing any file
  #[arg(short = 'n', long)]
  pub dry_run: bool,

  /// Remove the header instead of adding or updating it
  #[arg(short, long)]
  pub remove: bool,

  /// Comment prefix for header lines (default: '#')
  #[arg(short, long, value_name = "PREFIX", allow_hyphen_values = true)]
  pub comment: Option<String>,

  /// Separator character for the delimiter lines (default: '#')
  #[arg(long, value_name = "CHAR", allow_hyphen_values = true)]
  pub sep: Option<String>,

  /// Number of separator characters in a delimiter line (default: 78)
  #[arg(long, value_name = "N")]
  pub sep_len: Option<usize>,

  /// End the header block with a newline (default: true for text files,
  /// false for notebooks)
  #[arg(long, value_name = "BOOL")]
  pub final_linesep: Option<bool>,

  /// Also process Jupyter notebooks, optionally with a custom suffix
  #[arg(
    long,
    value_name = "SUFFIX",
    num_args = 0..=1,
    require_equals = true,
    default_missing_value = DEFAULT_NOTEBOOK_SUFFIX
  )]
  pub jupyter: Option<String>,

  /// Extra tag to put on notebook header cells
  #[arg(long, value_name = "TAG")]
  pub notebook_tag: Option<String>,

  /// Show a diff of every change
  #[arg(long)]
  pub show_diff: bool,

  /// Save the diff of every change to a file
  #[arg(long, value_name = "FILE")]
  pub save_diff: Option<PathBuf>,

  /// Write a JSON report of the run to the specified path
  #[arg(long, value_name = "OUTPUT")]
  pub report_json: Option<PathBuf>,

  /// Number of files to process concurrently
  #[arg(short, long, value_name = "N", default_value_t = num_cpus::get())]
  pub jobs: usize,

  /// Path to config file (default: .addheader.toml in the root directory)
  #[arg(long, value_name = "FILE")]
  pub config: Option<PathBuf>,

  /// Ignore config file even if present
  #[arg(long)]
  pub no_config: bool,

  /// Increase verbosity (-v info, -vv debug, -vvv trace)
  #[arg(short, long, action = clap::ArgAction::Count)]
  pub verbose: u8,

  /// Suppress all output except errors
  #[arg(short, long, conflicts_with = "verbose")]
  pub quiet: bool,

  /// Control when to use colored output (auto, never, always)
  #[arg(
    long,
    value_name = "WHEN",
    num_args = 0..=1,
    default_value_t = ColorMode::Auto,
    default_missing_value = "always",
    value_enum
  )]
  pub colors: ColorMode,
}

impl RunArgs {
  /// The configuration layer given on the command line.
  fn config_layer(&self) -> Config {
    Config {
      text: self.text.clone(),
      patterns: (!self.patterns.is_empty()).then(|| self.patterns.clone()),
      comment: self.comment.clone(),
      sep: self.sep.clone(),
      sep_len: self.sep_len,
      final_linesep: self.final_linesep,
      jupyter: self.jupyter.clone().map(JupyterSetting::Suffix),
      notebook_tag: self.notebook_tag.clone(),
    }
  }

  const fn action(&self) -> Action {
    if self.remove { Action::Remove } else { Action::Update }
  }
}

/// Runs the command.
///
/// Errors returned from here are usage, configuration or selection problems
/// found before any file is touched. Problems with individual files are
/// reported and turn into exit code 1.
pub async fn run(args: RunArgs) -> Result<ExitCode> {
  init_tracing(args.verbose, args.quiet);

  if args.verbose > 0 {
    set_verbose();
  } else if args.quiet {
    set_quiet();
  }
  args.colors.apply();

  let action = args.action();
  let file_config = load_config(args.config.as_deref(), &args.root, args.no_config)?;
  let settings = args.config_layer().layered_over(file_config).into_settings()?;
  debug!("Resolved settings: {:?}", settings);

  let text = match (&settings.text, action) {
    (Some(path), _) => {
      let content =
        FileIO::read_text(path).with_context(|| format!("Failed to load header text from {}", path.display()))?;
      HeaderSpec::lines_from_text(&content)
    }
    (None, Action::Remove) => Vec::new(),
    (None, Action::Update) => bail!("A header text file is required, use --text or set 'text' in the config file"),
  };

  let text_spec = HeaderSpec::new(text, settings.options.clone()).context("Invalid header settings")?;

  let notebook = settings.notebook_suffix.as_ref().map(|suffix| NotebookSettings {
    suffix: suffix.clone(),
    spec: text_spec.clone().with_final_linesep(settings.notebook_final_linesep),
    extra_tag: settings.notebook_tag.clone(),
  });
  if notebook.is_none() && settings.notebook_tag.is_some() {
    debug!("Notebook support is off, ignoring the notebook tag");
  }

  let mut matcher = PatternMatcher::new(&settings.patterns)?;
  if let Some(nb) = &notebook {
    matcher = matcher.with_notebooks(&nb.suffix)?;
  }

  let finder = FileFinder::new(args.root.clone(), matcher)?;
  let files = finder.find()?;

  if files.is_empty() {
    print_no_files_warning(finder.root(), &finder.filter().describe());
    return Ok(ExitCode::FAILURE);
  }

  let dry_run = args.dry_run;
  let diff_manager = DiffManager::new(args.show_diff, args.save_diff.clone());

  let processor = Processor::new(ProcessorConfig {
    notebook,
    action,
    dry_run,
    diff_manager: Some(diff_manager.clone()),
    ..ProcessorConfig::new(finder.root().to_path_buf(), text_spec)
  });

  print_start_message(files.len(), dry_run);

  let start_time = Instant::now();
  let file_reports = Arc::new(processor).process_all(files, args.jobs).await;
  let elapsed = start_time.elapsed();

  if let Err(e) = diff_manager.emit(&file_reports) {
    eprintln!("Error writing diff: {:#}", e);
  }

  let summary = ProcessingSummary::from_reports(&file_reports, dry_run, elapsed);
  let categorized = CategorizedReports::from_reports(&file_reports);

  print_blank_line();

  let groups = [
    (&categorized.added, FileAction::Added),
    (&categorized.updated, FileAction::Updated),
    (&categorized.removed, FileAction::Removed),
  ];
  let mut printed_group = false;
  for (group, file_action) in groups {
    if group.is_empty() {
      continue;
    }
    if printed_group {
      print_blank_line();
    }
    print_file_group(group, file_action, dry_run);
    printed_group = true;
  }

  if !categorized.has_changes() && categorized.failed.is_empty() {
    print_all_files_ok(dry_run);
  }

  if !categorized.failed.is_empty() {
    print_blank_line();
    print_failed_files(&categorized.failed);
  }

  print_blank_line();
  print_summary(&summary);

  if dry_run && categorized.has_changes() {
    print_blank_line();
    print_hint("Run without --dry-run to apply these changes.");
  }

  if let Some(ref output_path) = args.report_json {
    let report_generator = ReportGenerator::new(output_path);
    if let Err(e) = report_generator.generate(&file_reports, &summary) {
      eprintln!("Error generating JSON report: {:#}", e);
    } else {
      info_log!("Generated JSON report at {}", output_path.display());
    }
  }

  if categorized.failed.is_empty() {
    Ok(ExitCode::SUCCESS)
  } else {
    Ok(ExitCode::FAILURE)
  }
}
