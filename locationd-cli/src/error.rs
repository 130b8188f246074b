//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and the process exit code.

use std::fmt;
use std::process;

use locationd::bus::BusError;
use locationd::config::ConfigFileError;
use locationd::daemon::{DaemonError, LockError};
use locationd::logging::LoggingError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(LoggingError),
    /// Configuration file or flag error
    Config(String),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
    /// Startup failure from the daemon library
    Daemon(DaemonError),
    /// Failed to install the signal handler
    SignalHandler(String),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Daemon(DaemonError::SourceUnavailable(_)) => {
                eprintln!();
                eprintln!("Is gpsd running? Check with:");
                eprintln!("  systemctl status gpsd");
                eprintln!("  gpspipe -w -n 5");
            }
            CliError::Daemon(DaemonError::BusUnavailable(BusError::NameTaken { .. })) => {
                eprintln!();
                eprintln!("Another location daemon already owns the bus name.");
            }
            CliError::Daemon(DaemonError::BusUnavailable(_)) => {
                eprintln!();
                eprintln!("Common issues:");
                eprintln!("  1. No D-Bus daemon for the selected bus (try --session-bus)");
                eprintln!("  2. Bus policy does not allow owning org.maemo.LocationDaemon");
            }
            CliError::Daemon(DaemonError::Lock(LockError::Held { .. })) => {
                eprintln!();
                eprintln!("Another instance is running. Stop it first.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::Daemon(e) => write!(f, "{}", e),
            CliError::SignalHandler(msg) => write!(f, "Failed to set signal handler: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::LoggingInit(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::Daemon(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DaemonError> for CliError {
    fn from(e: DaemonError) -> Self {
        CliError::Daemon(e)
    }
}

impl From<LockError> for CliError {
    fn from(e: LockError) -> Self {
        CliError::Daemon(DaemonError::Lock(e))
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Daemon(DaemonError::Config(e))
    }
}
