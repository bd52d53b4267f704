//! # CLI Module
//!
//! This module contains the command-line interface implementation.
//! It uses clap for argument parsing; the single command is implemented in
//! [`run`].

mod run;

use clap::Parser;
use clap::builder::styling::{AnsiColor, Color, Style, Styles};
pub use run::{RunArgs, run};

const CUSTOM_STYLES: Styles = Styles::styled()
  .header(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))).bold())
  .usage(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))).bold())
  .literal(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Blue))).bold())
  .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Cyan))))
  .error(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red))).bold())
  .valid(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))))
  .invalid(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow))));

/// Top-level CLI arguments
#[derive(Parser, Debug)]
#[command(
  author,
  version,
  about,
  styles = CUSTOM_STYLES,
  after_help = "Examples:
  # Add or refresh the header in every Python file under src/
  addheader src/ --text header.txt

  # See which files would change, with diffs, without writing anything
  addheader src/ --text header.txt --dry-run --show-diff

  # Remove the header again
  addheader src/ --remove

  # Also handle Jupyter notebooks, and skip test modules
  addheader . --text header.txt --jupyter -p '*.py' -p '~test_*.py'

  # Use a different comment style and separator
  addheader src/ --text header.txt --comment '//' --sep '=' --sep-len 60

  # Write a JSON report of what happened
  addheader src/ --text header.txt --report-json report.json
",
  help_template = "{before-help}{name} v{version}
{about-section}
{usage-heading} {usage}

{all-args}{after-help}
"
)]
pub struct Cli {
  #[command(flatten)]
  pub args: RunArgs,
}

impl Cli {
  /// Parse CLI arguments and return the Cli struct
  pub fn parse_args() -> Self {
    Self::parse()
  }
}
