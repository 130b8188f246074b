//! Logging setup.
//!
//! Structured `tracing` output to stderr, plus an optional plain-text log
//! file written through a non-blocking appender. The filter comes from an
//! explicit directive, else `RUST_LOG`, else `info`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Filter used when neither a directive nor `RUST_LOG` is given.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Logging options.
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    /// Filter directive such as `debug` or `locationd=trace`.
    pub filter: Option<String>,
    /// Also append to this file.
    pub file: Option<PathBuf>,
}

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping it flushes and closes the log file writer.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Errors raised while installing the subscriber.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Invalid log filter '{filter}': {reason}")]
    Filter { filter: String, reason: String },

    #[error("Cannot open log file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("A global logger is already installed: {0}")]
    AlreadyInstalled(String),
}

/// Builds the filter from an explicit directive, `RUST_LOG`, or the default.
pub fn build_filter(directive: Option<&str>) -> Result<EnvFilter, LoggingError> {
    match directive {
        Some(d) => EnvFilter::try_new(d).map_err(|e| LoggingError::Filter {
            filter: d.to_string(),
            reason: e.to_string(),
        }),
        None => Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))),
    }
}

fn split_log_path(path: &Path) -> Result<(PathBuf, String), io::Error> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "log path has no file name"))?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok((dir, file_name))
}

/// Installs the global subscriber.
pub fn init_logging(config: &LoggingConfig) -> Result<LoggingGuard, LoggingError> {
    let filter = build_filter(config.filter.as_deref())?;

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false);

    let (file_layer, file_guard) = match &config.file {
        Some(path) => {
            let (dir, file_name) = split_log_path(path).map_err(|e| LoggingError::File {
                path: path.clone(),
                source: e,
            })?;
            fs::create_dir_all(&dir).map_err(|e| LoggingError::File {
                path: path.clone(),
                source: e,
            })?;

            let appender = RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix(file_name)
                .build(dir)
                .map_err(|e| LoggingError::File {
                    path: path.clone(),
                    source: io::Error::other(e),
                })?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInstalled(e.to_string()))?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}
