//! Logging configuration for sqltools.
//!
//! Query output goes to stdout, so logs go to stderr or, when requested, to
//! a file.

use std::fs::{self, File};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
fn default_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "sqltools=debug,warn" } else { "warn" })
    })
}

/// Initializes logging to stderr.
pub fn init_stderr_logging(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(default_filter(verbose))
        .with_writer(std::io::stderr)
        .init();
}

/// Initializes logging to a file, truncating it first.
///
/// Falls back to stderr logging if the file cannot be created.
pub fn init_file_logging(path: &Path, verbose: bool) {
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("Warning: Could not create log directory: {e}");
            return init_stderr_logging(verbose);
        }
    }

    let log_file = match File::create(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file: {e}");
            return init_stderr_logging(verbose);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(default_filter(verbose))
        .with_writer(log_file)
        .with_ansi(false) // No ANSI colors in file output
        .init();
}
