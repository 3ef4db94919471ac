//! Log file setup.
//!
//! Status lines own stdout, so tracing output goes to the configured log
//! file through a non-blocking writer. `RUST_LOG` overrides the configured
//! level.

use std::fs;
use std::path::Path;

use dlwatch::config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::CliError;

/// Install the global subscriber.
///
/// The returned guard flushes buffered records when dropped; keep it alive
/// for the life of the process.
pub fn init(config: &LoggingConfig, verbose: bool) -> Result<WorkerGuard, CliError> {
    let file_name = config.file.file_name().ok_or_else(|| {
        CliError::Logging(format!("invalid log file path: {}", config.file.display()))
    })?;
    let directory = config
        .file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(directory)
        .map_err(|e| CliError::Logging(format!("{}: {}", directory.display(), e)))?;

    let appender = tracing_appender::rolling::never(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter(&config.level, verbose))
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()
        .map_err(|e| CliError::Logging(e.to_string()))?;

    Ok(guard)
}

fn filter(level: &str, verbose: bool) -> EnvFilter {
    let level = if verbose { "debug" } else { level };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("dlwatch={level}")))
}
