//! Location sources.
//!
//! The daemon depends only on the small surface of [`LocationSource`]: start
//! and stop streaming, wait for readiness, and read one fix. The concrete
//! implementation is [`GpsdClient`], which speaks gpsd's JSON socket
//! protocol.
//!
//! # Example
//!
//! ```ignore
//! use locationd::source::{GpsdClient, LocationSource};
//!
//! let mut client = GpsdClient::connect("localhost", 2947).await?;
//! client.enable_streaming().await?;
//!
//! if client.wait_ready(Duration::from_millis(500)).await {
//!     let fix = client.read().await?;
//!     println!("mode: {}", fix.mode);
//! }
//! ```

mod error;
mod gpsd;

use std::time::Duration;

use futures::future::BoxFuture;

use crate::fix::Fix;

pub use error::SourceError;
pub use gpsd::{GpsdClient, DEFAULT_GPSD_HOST, DEFAULT_GPSD_PORT};

/// A device or service that produces positioning fixes.
///
/// Methods return boxed futures so the sampler can hold any source behind a
/// generic parameter or a trait object.
pub trait LocationSource: Send {
    /// Asks the source to start pushing reports.
    fn enable_streaming(&mut self) -> BoxFuture<'_, Result<(), SourceError>>;

    /// Asks the source to stop pushing reports.
    fn disable_streaming(&mut self) -> BoxFuture<'_, Result<(), SourceError>>;

    /// Waits up to `timeout` for data to become readable.
    ///
    /// Returns false if nothing arrived in time.
    fn wait_ready(&mut self, timeout: Duration) -> BoxFuture<'_, bool>;

    /// Performs exactly one read and returns the resulting snapshot.
    fn read(&mut self) -> BoxFuture<'_, Result<Fix, SourceError>>;

    /// Releases the connection.
    fn close(&mut self) -> BoxFuture<'_, Result<(), SourceError>>;
}
