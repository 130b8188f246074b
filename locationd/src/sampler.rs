//! Fix sampler - one bounded poll of a location source.
//!
//! [`FixSampler::poll`] waits for the source to become readable, performs at
//! most one read and classifies the result. It never retries; the caller's
//! loop provides retry by polling again.

use std::time::Duration;

use tracing::trace;

use crate::fix::Fix;
use crate::source::{LocationSource, SourceError};

/// Default time to wait for the source on each poll.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_millis(500);

/// Result of one poll.
#[derive(Debug)]
pub enum SampleOutcome {
    /// A read succeeded; carries the full snapshot.
    FreshFix(Fix),
    /// Nothing became readable within the timeout.
    NoUpdate,
    /// Data was readable but the read failed.
    ReadError(SourceError),
}

impl SampleOutcome {
    /// Returns the fix if this outcome carries one.
    pub fn into_fix(self) -> Option<Fix> {
        match self {
            SampleOutcome::FreshFix(fix) => Some(fix),
            _ => None,
        }
    }
}

/// Wraps a [`LocationSource`] with the poll contract.
pub struct FixSampler<S: LocationSource> {
    source: S,
}

impl<S: LocationSource> FixSampler<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Waits up to `timeout` for data and performs exactly one read.
    pub async fn poll(&mut self, timeout: Duration) -> SampleOutcome {
        if !self.source.wait_ready(timeout).await {
            trace!(timeout_ms = timeout.as_millis() as u64, "No update from source");
            return SampleOutcome::NoUpdate;
        }

        match self.source.read().await {
            Ok(fix) => SampleOutcome::FreshFix(fix),
            Err(e) => SampleOutcome::ReadError(e),
        }
    }

    /// Mutable access to the wrapped source (streaming control, shutdown).
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn into_inner(self) -> S {
        self.source
    }
}
