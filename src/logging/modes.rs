use std::sync::atomic::{AtomicU8, Ordering};

use clap::ValueEnum;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Global atomic flag to control verbose logging.
///
/// This is initialized to `Normal` by default, meaning verbose logging is
/// disabled until explicitly enabled via [`set_verbose`].
static OUTPUT_MODE: AtomicU8 = AtomicU8::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
  Normal = 0,
  Quiet = 1,
  Verbose = 2,
}

impl OutputMode {
  /// Convert from u8 to OutputMode
  const fn from_u8(value: u8) -> Self {
    match value {
      1 => OutputMode::Quiet,
      2 => OutputMode::Verbose,
      _ => OutputMode::Normal,
    }
  }
}

/// Enum representing the color mode options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorMode {
  /// Automatically determine whether to use colors based on TTY detection
  #[default]
  Auto,
  /// Never use colors
  Never,
  /// Always use colors
  Always,
}

impl ColorMode {
  /// Applies the mode to all colorized output.
  ///
  /// `Auto` leaves the decision to owo-colors' per-stream detection.
  pub fn apply(self) {
    match self {
      ColorMode::Auto => owo_colors::unset_override(),
      ColorMode::Never => owo_colors::set_override(false),
      ColorMode::Always => owo_colors::set_override(true),
    }
  }
}

/// Sets the global verbose logging flag.
///
/// When verbose logging is enabled, the [`verbose_log!`](crate::verbose_log)
/// macro will output messages to stderr. When disabled, verbose log messages
/// are suppressed.
pub fn set_verbose() {
  OUTPUT_MODE.store(OutputMode::Verbose as u8, Ordering::SeqCst);
}

/// Suppresses [`info_log!`](crate::info_log) output.
pub fn set_quiet() {
  OUTPUT_MODE.store(OutputMode::Quiet as u8, Ordering::SeqCst);
}

/// Checks if verbose logging is currently enabled.
pub fn is_verbose() -> bool {
  OutputMode::from_u8(OUTPUT_MODE.load(Ordering::SeqCst)) == OutputMode::Verbose
}

/// Checks if quiet mode is currently enabled.
pub fn is_quiet() -> bool {
  OutputMode::from_u8(OUTPUT_MODE.load(Ordering::SeqCst)) == OutputMode::Quiet
}

/// Tracing level directive for the crate given the CLI flags.
pub const fn level_for(verbosity: u8, quiet: bool) -> &'static str {
  if quiet {
    return "error";
  }
  match verbosity {
    0 => "warn",
    1 => "info",
    2 => "debug",
    _ => "trace",
  }
}

/// Installs the global tracing subscriber writing to stderr.
///
/// `RUST_LOG` takes precedence over the level derived from `-v`/`-q`. Calling
/// this more than once is harmless; later calls are ignored.
pub fn init_tracing(verbosity: u8, quiet: bool) {
  let default_directive = format!("warn,addheader={}", level_for(verbosity, quiet));
  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

  let layer = fmt::layer()
    .with_writer(std::io::stderr)
    .without_time()
    .with_target(false)
    .compact();

  let _ = tracing_subscriber::registry().with(layer).with(env_filter).try_init();
}
