//! Message bus publishing.
//!
//! Change events leave the daemon through an [`EventBus`]. The production
//! implementation is [`DbusPublisher`], which emits D-Bus signals from
//! [`OBJECT_PATH`]; [`MemoryBus`] records events in memory for tests and
//! dry runs.
//!
//! # Signals
//!
//! ```text
//! Interface                              Signal              Signature
//! ─────────────────────────────────────  ──────────────────  ─────────
//! org.maemo.LocationDaemon.Device        FixStatusChanged    y
//! org.maemo.LocationDaemon.Device        Running             b
//! org.maemo.LocationDaemon.Time          TimeChanged         xx
//! org.maemo.LocationDaemon.Position      PositionChanged     ddd
//! org.maemo.LocationDaemon.Course        CourseChanged       ddd
//! org.maemo.LocationDaemon.Accuracy      AccuracyChanged     dddddd
//! org.maemo.LocationDaemon.Satellite     SatellitesChanged   a(ndddb)
//! ```

mod dbus;
mod error;
mod event;
mod memory;

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;

pub use dbus::{BusKind, DbusPublisher};
pub use error::BusError;
pub use event::{
    EventKind, LocationEvent, ACCURACY_INTERFACE, COURSE_INTERFACE, DEVICE_INTERFACE,
    OBJECT_PATH, POSITION_INTERFACE, SATELLITE_INTERFACE, SERVICE_NAME, TIME_INTERFACE,
};
pub use memory::MemoryBus;

/// Default bound on a single publish call.
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(1);

/// Destination for location events.
pub trait EventBus: Send + Sync + 'static {
    /// Delivers one event. Implementations must not retry.
    fn publish<'a>(&'a self, event: &'a LocationEvent) -> BoxFuture<'a, Result<(), BusError>>;
}

impl<T: EventBus> EventBus for Arc<T> {
    fn publish<'a>(&'a self, event: &'a LocationEvent) -> BoxFuture<'a, Result<(), BusError>> {
        (**self).publish(event)
    }
}

/// Publishes `event`, failing with [`BusError::Timeout`] if delivery takes
/// longer than `timeout`.
pub async fn publish_with_timeout<B: EventBus + ?Sized>(
    bus: &B,
    event: &LocationEvent,
    timeout: Duration,
) -> Result<(), BusError> {
    match tokio::time::timeout(timeout, bus.publish(event)).await {
        Ok(result) => result,
        Err(_) => Err(BusError::Timeout {
            kind: event.kind(),
            timeout,
        }),
    }
}
