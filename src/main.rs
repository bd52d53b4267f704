//! # addheader
//!
//! Keeps a delimited header block (e.g. a copyright notice) in sync across a
//! tree of source files and Jupyter notebooks.

mod cli;

use std::process::ExitCode;

use owo_colors::{OwoColorize, Stream};

use crate::cli::{Cli, run};

/// Exit code for usage, configuration and selection errors.
const USAGE_ERROR: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
  let cli = Cli::parse_args();

  match run(cli.args).await {
    Ok(code) => code,
    Err(e) => {
      eprintln!("{} {:#}", "Error:".if_supports_color(Stream::Stderr, |s| s.red()), e);
      ExitCode::from(USAGE_ERROR)
    }
  }
}
