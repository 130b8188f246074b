//! Daemon startup errors.

use thiserror::Error;

use super::lock::LockError;
use crate::bus::BusError;
use crate::config::ConfigFileError;
use crate::source::SourceError;

/// Failures that prevent the daemon from starting.
///
/// Once running, nothing in the sampling path produces one of these.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// The location source could not be opened or streaming enabled.
    #[error("Location source unavailable: {0}")]
    SourceUnavailable(#[source] SourceError),

    /// No bus connection, or the bus name could not be acquired.
    #[error("Message bus unavailable: {0}")]
    BusUnavailable(#[source] BusError),

    /// Another instance is running.
    #[error(transparent)]
    Lock(#[from] LockError),

    /// The configuration file is unusable.
    #[error(transparent)]
    Config(#[from] ConfigFileError),
}
