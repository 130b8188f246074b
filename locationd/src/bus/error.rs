//! Error types for the message bus.

use std::time::Duration;

use thiserror::Error;

use super::EventKind;

/// Errors that can occur while connecting to or publishing on the bus.
#[derive(Debug, Error)]
pub enum BusError {
    /// Could not connect to the bus.
    #[error("Failed to connect to {bus} bus: {reason}")]
    Connection { bus: &'static str, reason: String },

    /// The well-known name is owned by another process.
    #[error("Bus name {name} is already owned by another process")]
    NameTaken { name: String },

    /// The bus refused or failed to deliver a signal.
    #[error("Failed to emit {kind}: {reason}")]
    Send { kind: EventKind, reason: String },

    /// Delivery did not finish within the publish timeout.
    #[error("Timed out after {timeout:?} emitting {kind}")]
    Timeout { kind: EventKind, timeout: Duration },
}
