//! Tracing setup for Lectern
//!
//! Console logs at a user-controlled level plus a full trace log on disk, so a
//! failed stream can be diagnosed after the fact without rerunning at `trace`.

use std::fs::{File, create_dir_all};
use std::path::{Path, PathBuf};

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::LecternError;

/// File the per-run trace log is written to, relative to the logs directory.
pub const LOG_FILE_NAME: &str = "lectern-last-run.log";

/// Directives for the on-disk log: everything from our crates, HTTP plumbing at debug.
const FILE_FILTER: &str =
    "lectern_core=trace,lectern_web=trace,lectern=trace,tower_http=debug,info";

/// Initialize tracing with dual output: console (user level) + file (full trace)
///
/// `RUST_LOG` overrides the console level when set. The log file is truncated
/// on every start, so it only ever describes the last run.
///
/// Returns the path of the log file.
///
/// # Errors
///
/// - `LecternError::Io` - If the logs directory or file cannot be created
/// - `LecternError::Configuration` - If a global subscriber is already installed
pub fn init_tracing(
    console_level: Level,
    logs_dir: Option<&Path>,
) -> Result<PathBuf, LecternError> {
    let logs_path = logs_dir.unwrap_or_else(|| Path::new("logs"));
    create_dir_all(logs_path)?;

    let log_file_path = logs_path.join(LOG_FILE_NAME);
    let log_file = File::create(&log_file_path)?;

    let console_layer = fmt::layer()
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_filter(console_filter(console_level));

    let file_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(log_file)
        .with_filter(EnvFilter::new(FILE_FILTER));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LecternError::Configuration {
            reason: format!("tracing already initialized: {e}"),
        })?;

    tracing::info!(
        "Tracing initialized: console={}, debug_file={}",
        console_level,
        log_file_path.display()
    );

    Ok(log_file_path)
}

/// Initialize console-only tracing for short-lived commands.
///
/// # Errors
///
/// - `LecternError::Configuration` - If a global subscriber is already installed
pub fn init_console_tracing(console_level: Level) -> Result<(), LecternError> {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_filter(console_filter(console_level)),
        )
        .try_init()
        .map_err(|e| LecternError::Configuration {
            reason: format!("tracing already initialized: {e}"),
        })
}

fn console_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()))
}

/// CLI log levels for user control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CliLogLevel {
    /// Only error messages
    Error,
    /// Warning and error messages
    Warn,
    /// Informational, warning, and error messages
    #[default]
    Info,
    /// Debug, informational, warning, and error messages
    Debug,
    /// All messages including detailed tracing
    Trace,
}

impl From<CliLogLevel> for Level {
    fn from(level: CliLogLevel) -> Self {
        match level {
            CliLogLevel::Error => Level::ERROR,
            CliLogLevel::Warn => Level::WARN,
            CliLogLevel::Info => Level::INFO,
            CliLogLevel::Debug => Level::DEBUG,
            CliLogLevel::Trace => Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::ValueEnum;

    use super::*;

    #[test]
    fn test_cli_level_maps_to_tracing_level() {
        assert_eq!(Level::from(CliLogLevel::Error), Level::ERROR);
        assert_eq!(Level::from(CliLogLevel::Info), Level::INFO);
        assert_eq!(Level::from(CliLogLevel::Trace), Level::TRACE);
        assert_eq!(CliLogLevel::default(), CliLogLevel::Info);
    }

    #[test]
    fn test_cli_level_parses_from_lowercase() {
        assert_eq!(
            CliLogLevel::from_str("debug", true).unwrap(),
            CliLogLevel::Debug
        );
        assert!(CliLogLevel::from_str("verbose", true).is_err());
    }
}
