//! Tracing setup for the `arc-import` binary and the test suites.
//!
//! Verbosity opens up the import pipeline one stage at a time: `-v` shows
//! per-collection progress, `-vv` adds format detection, normalization and
//! conflict handling, `-vvv` traces every stored document. `RUST_LOG` always
//! wins over the flags.

use std::io::IsTerminal;
use std::path::Path;
use std::sync::{Mutex, Once};

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Modules whose decisions `-vv` surfaces.
const PIPELINE: [&str; 3] = ["intake", "normalize", "persist"];

/// Install the global subscriber: compact stderr output, plus a JSON copy of
/// every event in `log_file` when one is given.
///
/// # Errors
///
/// Returns an error if the filter is invalid, the log file cannot be created,
/// or a subscriber is already installed.
pub fn init_logging(verbosity: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter(verbosity, quiet)))
        .context("invalid log filter")?;

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbosity > 1)
        .without_time()
        .with_ansi(std::io::stderr().is_terminal());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer);

    match log_file {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("cannot create log file {}", path.display()))?;
            let file_layer = fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .json();
            tracing::subscriber::set_global_default(subscriber.with(file_layer))?;
        }
        None => tracing::subscriber::set_global_default(subscriber)?,
    }
    Ok(())
}

fn default_filter(verbosity: u8, quiet: bool) -> String {
    if quiet {
        return "arc_import=error".to_string();
    }
    match verbosity {
        0 => "arc_import=warn".to_string(),
        1 => "arc_import=info".to_string(),
        2 => {
            let mut filter = "arc_import=info".to_string();
            for module in PIPELINE {
                filter.push_str(&format!(",arc_import::{module}=debug"));
            }
            filter
        }
        _ => "arc_import=debug,arc_import::storage=trace,rusqlite=debug".to_string(),
    }
}

/// Initialize logging for tests with the test writer. `RUST_LOG` overrides
/// the pipeline-level default.
pub fn init_test_logging() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter(2, false)));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}
