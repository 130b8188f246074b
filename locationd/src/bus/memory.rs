//! In-memory event bus.

use std::sync::Mutex;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};

use super::{BusError, EventBus, EventKind, LocationEvent};

#[derive(Debug, Default)]
struct Inner {
    events: Vec<LocationEvent>,
    fail_next: usize,
}

/// Bus that records every published event.
///
/// Can be told to reject the next N publishes to exercise failure paths, or
/// to stall each publish for a fixed delay.
#[derive(Debug, Default)]
pub struct MemoryBus {
    inner: Mutex<Inner>,
    delay: Option<Duration>,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every publish take `delay` before completing.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            inner: Mutex::default(),
            delay: Some(delay),
        }
    }

    /// Rejects the next `count` publishes.
    pub fn fail_next(&self, count: usize) {
        self.lock().fail_next = count;
    }

    /// All successfully delivered events, in order.
    pub fn events(&self) -> Vec<LocationEvent> {
        self.lock().events.clone()
    }

    /// Kinds of delivered events, in order.
    pub fn kinds(&self) -> Vec<EventKind> {
        self.lock().events.iter().map(LocationEvent::kind).collect()
    }

    /// Removes and returns delivered events.
    pub fn take(&self) -> Vec<LocationEvent> {
        std::mem::take(&mut self.lock().events)
    }

    pub fn len(&self) -> usize {
        self.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only means a test panicked mid-record.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, event: &LocationEvent) -> Result<(), BusError> {
        let mut inner = self.lock();
        if inner.fail_next > 0 {
            inner.fail_next -= 1;
            return Err(BusError::Send {
                kind: event.kind(),
                reason: "rejected by memory bus".to_string(),
            });
        }
        inner.events.push(event.clone());
        Ok(())
    }
}

impl EventBus for MemoryBus {
    fn publish<'a>(&'a self, event: &'a LocationEvent) -> BoxFuture<'a, Result<(), BusError>> {
        async move {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.record(event)
        }
        .boxed()
    }
}
