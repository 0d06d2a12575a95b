//! Logging setup built on `tracing` and `tracing-subscriber`.
//!
//! `RUST_LOG` always wins. Otherwise the level comes from the CLI
//! verbosity flags: `-q` = error, default = warn, `-v` = info,
//! `-vv` = debug, `-vvv` and up = trace.

use crate::error::Result;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Mutex, Once};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

/// Map CLI verbosity flags to a default filter directive.
#[must_use]
pub const fn level_for(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Initialize the global subscriber.
///
/// Logs go to stderr, or to `log_file` (appended, no ANSI) when given.
/// Calling this more than once is harmless; later calls are ignored.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened.
pub fn init_logging(verbose: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_for(verbose, quiet)));

    if let Some(path) = log_file {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let _ = fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(verbose >= 2)
            .try_init();
    }
    Ok(())
}

static TEST_LOGGING: Once = Once::new();

/// Install a test-writer subscriber once per process.
///
/// Output is captured by the test harness and shown only for failures.
pub fn init_test_logging() {
    TEST_LOGGING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
