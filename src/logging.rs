//! Logging setup
//!
//! Two sinks: a plain-text log file, truncated at startup, receiving
//! `info` and above; and stderr, whose level follows the CLI verbosity.
//! `RUST_LOG` overrides both filters.

use crate::error::{ClipError, Result};
use std::fs::File;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Default level for the log file
const FILE_LEVEL: &str = "info";

/// Install the global subscriber
///
/// The returned guard flushes the file writer on drop; keep it alive for
/// the whole run.
pub fn init(log_file: &Path, console_level: &str) -> Result<WorkerGuard> {
    if let Some(parent) = log_file.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ClipError::output_error(parent, e))?;
        }
    }

    // File::create truncates, so each run starts with an empty log
    let file = File::create(log_file).map_err(|e| ClipError::output_error(log_file, e))?;
    let (file_writer, guard) = tracing_appender::non_blocking(file);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(false)
        .with_filter(filter_or(FILE_LEVEL));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter_or(console_level));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| ClipError::ConfigError(format!("Failed to initialize logging: {}", e)))?;

    Ok(guard)
}

fn filter_or(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}
