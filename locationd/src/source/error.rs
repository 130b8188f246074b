//! Error types for location sources.

use thiserror::Error;

/// Errors raised while talking to a location source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source could not be reached.
    #[error("Failed to connect to location source at {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading from or writing to the source failed.
    #[error("Location source I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The source sent data that could not be decoded.
    #[error("Malformed report from location source: {0}")]
    Protocol(String),

    /// The source closed the connection.
    #[error("Location source closed the connection")]
    Closed,
}

impl From<serde_json::Error> for SourceError {
    fn from(e: serde_json::Error) -> Self {
        SourceError::Protocol(e.to_string())
    }
}
