//! # addheader
//!
//! A tool that keeps a delimited header block, such as a copyright notice, in
//! sync across a tree of source files and Jupyter notebooks.
//!
//! A header is a run of comment lines between two separator lines:
//!
//! ```text
//! ##############################################################################
//! # Copyright (c) 2024 Example Corp.
//! # All rights reserved.
//! ##############################################################################
//! ```
//!
//! Running the tool again with the same header text changes nothing, and
//! running it with new text replaces the old block in place. Headers can also
//! be removed. Notebooks get the header as a tagged code cell at the top.
//!
//! ## Features
//!
//! * File selection by name patterns, with `~` exclusions
//! * Interpreter lines and encoding declarations stay on top
//! * Dry-run mode with optional diffs of what would change
//! * Atomic writes, so an interrupted run never leaves a truncated file
//! * Optional `.addheader.toml` configuration file
//! * JSON report of every file's outcome
//!
//! ## Usage as a Library
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//!
//! use addheader::file_filter::PatternMatcher;
//! use addheader::header::{HeaderOptions, HeaderSpec};
//! use addheader::processor::{FileFinder, Processor, ProcessorConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let spec = HeaderSpec::new(
//!         vec!["Copyright (c) 2024 Example Corp.".to_string()],
//!         HeaderOptions::default(),
//!     )?;
//!
//!     let finder = FileFinder::new("src", PatternMatcher::with_defaults()?)?;
//!     let processor = Processor::new(ProcessorConfig::new(PathBuf::from("src"), spec));
//!
//!     for file in finder.find()? {
//!         let report = processor.process_file(&file);
//!         println!("{}: {:?}", report.path.display(), report.action);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! * [`header`] - Header formatting and the text and notebook engines
//! * [`processor`] - File selection and applying the header to files
//! * [`config`] - Configuration file support
//! * [`logging`] - Logging utilities for verbose output
//!
//! [`header`]: crate::header
//! [`processor`]: crate::processor
//! [`config`]: crate::config
//! [`logging`]: crate::logging

pub mod config;
pub mod diff;
pub mod file_filter;
pub mod header;
pub mod logging;
pub mod output;
pub mod processor;
pub mod report;
