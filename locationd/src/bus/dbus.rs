//! D-Bus signal publisher backed by `zbus`.
//!
//! Each event kind is serialised with its own typed body, so the field
//! order and D-Bus signature of every signal is fixed at compile time.

use std::fmt;
use std::str::FromStr;

use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, info};
use zbus::fdo::{RequestNameFlags, RequestNameReply};
use zbus::names::BusName;
use zbus::Connection;

use super::{BusError, EventBus, EventKind, LocationEvent, OBJECT_PATH, SERVICE_NAME};
use crate::fix::{Accuracy, Course, FixMode, FixTime, Position, Satellite};

/// Which bus to publish on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BusKind {
    /// The system bus (default for a device daemon).
    #[default]
    System,
    /// The per-login session bus.
    Session,
}

impl BusKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BusKind::System => "system",
            BusKind::Session => "session",
        }
    }
}

impl fmt::Display for BusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BusKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "system" => Ok(BusKind::System),
            "session" => Ok(BusKind::Session),
            other => Err(format!("unknown bus '{}', expected system or session", other)),
        }
    }
}

// Signal bodies, one per event shape.

fn status_body(mode: FixMode) -> u8 {
    mode.as_byte()
}

fn time_body(time: &FixTime) -> (i64, i64) {
    (time.seconds, time.nanoseconds)
}

fn position_body(p: &Position) -> (f64, f64, f64) {
    (p.latitude, p.longitude, p.altitude)
}

fn course_body(c: &Course) -> (f64, f64, f64) {
    (c.speed, c.track, c.climb)
}

type AccuracyBody = (f64, f64, f64, f64, f64, f64);

/// Follows [`Accuracy::values`] so the wire order has a single definition.
fn accuracy_body(a: &Accuracy) -> AccuracyBody {
    let [time, vertical, track, speed, climb, horizontal] = a.values();
    (time, vertical, track, speed, climb, horizontal)
}

/// Wire shape of one `SatellitesChanged` array element: `(ndddb)`.
type SatelliteBody = (i16, f64, f64, f64, bool);

fn satellite_body(satellite: &Satellite) -> SatelliteBody {
    (
        satellite.prn,
        satellite.elevation,
        satellite.azimuth,
        satellite.signal_strength,
        satellite.used,
    )
}

fn satellites_body(satellites: &[Satellite]) -> Vec<SatelliteBody> {
    satellites.iter().map(satellite_body).collect()
}

/// Emits location signals on a D-Bus connection that owns [`SERVICE_NAME`].
pub struct DbusPublisher {
    connection: Connection,
    bus: BusKind,
}

impl DbusPublisher {
    /// Connects to `bus` and takes exclusive ownership of [`SERVICE_NAME`].
    ///
    /// Replaces a previous owner that allows replacement; fails if the name
    /// stays owned by someone else.
    pub async fn connect(bus: BusKind) -> Result<Self, BusError> {
        let connection = match bus {
            BusKind::System => Connection::system().await,
            BusKind::Session => Connection::session().await,
        }
        .map_err(|e| BusError::Connection {
            bus: bus.as_str(),
            reason: e.to_string(),
        })?;

        let flags = RequestNameFlags::ReplaceExisting | RequestNameFlags::DoNotQueue;
        let reply = connection
            .request_name_with_flags(SERVICE_NAME, flags)
            .await
            .map_err(|e| match e {
                zbus::Error::NameTaken => BusError::NameTaken {
                    name: SERVICE_NAME.to_string(),
                },
                other => BusError::Connection {
                    bus: bus.as_str(),
                    reason: other.to_string(),
                },
            })?;

        match reply {
            RequestNameReply::PrimaryOwner | RequestNameReply::AlreadyOwner => {
                info!(bus = %bus, name = SERVICE_NAME, "Acquired bus name");
                Ok(Self { connection, bus })
            }
            _ => Err(BusError::NameTaken {
                name: SERVICE_NAME.to_string(),
            }),
        }
    }

    /// The bus this publisher is connected to.
    pub fn bus(&self) -> BusKind {
        self.bus
    }

    async fn emit(&self, event: &LocationEvent) -> zbus::Result<()> {
        let kind = event.kind();
        match event {
            LocationEvent::FixStatusChanged(mode) => self.emit_body(kind, &status_body(*mode)).await,
            LocationEvent::TimeChanged(time) => self.emit_body(kind, &time_body(time)).await,
            LocationEvent::PositionChanged(p) => self.emit_body(kind, &position_body(p)).await,
            LocationEvent::CourseChanged(c) => self.emit_body(kind, &course_body(c)).await,
            LocationEvent::AccuracyChanged(a) => self.emit_body(kind, &accuracy_body(a)).await,
            LocationEvent::SatellitesChanged(satellites) => {
                self.emit_body(kind, &satellites_body(satellites)).await
            }
            LocationEvent::Running(running) => self.emit_body(kind, running).await,
        }
    }

    async fn emit_body<B>(&self, kind: EventKind, body: &B) -> zbus::Result<()>
    where
        B: serde::Serialize + zbus::zvariant::DynamicType,
    {
        self.connection
            .emit_signal(
                None::<BusName<'_>>,
                OBJECT_PATH,
                kind.interface(),
                kind.signal_name(),
                body,
            )
            .await
    }
}

impl EventBus for DbusPublisher {
    fn publish<'a>(&'a self, event: &'a LocationEvent) -> BoxFuture<'a, Result<(), BusError>> {
        async move {
            self.emit(event).await.map_err(|e| BusError::Send {
                kind: event.kind(),
                reason: e.to_string(),
            })?;
            debug!(signal = %event.kind(), "Emitted signal");
            Ok(())
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zbus::zvariant::DynamicType;

    fn signature<T: DynamicType>(body: &T) -> String {
        body.dynamic_signature().as_str().to_string()
    }

    #[test]
    fn test_bus_kind_parse() {
        assert_eq!("system".parse::<BusKind>().unwrap(), BusKind::System);
        assert_eq!(" Session ".parse::<BusKind>().unwrap(), BusKind::Session);
        assert!("starship".parse::<BusKind>().is_err());
    }

    #[test]
    fn test_bus_kind_default_is_system() {
        assert_eq!(BusKind::default(), BusKind::System);
        assert_eq!(BusKind::System.to_string(), "system");
    }

    #[test]
    fn test_satellite_body_field_order() {
        let satellite = Satellite {
            prn: 7,
            elevation: 30.0,
            azimuth: 200.0,
            signal_strength: 41.0,
            used: true,
        };
        assert_eq!(satellite_body(&satellite), (7, 30.0, 200.0, 41.0, true));
    }

    #[test]
    fn test_signal_signatures() {
        let satellite = Satellite {
            prn: 7,
            elevation: 30.0,
            azimuth: 200.0,
            signal_strength: 41.0,
            used: true,
        };

        assert_eq!(signature(&status_body(FixMode::ThreeD)), "y");
        assert_eq!(signature(&time_body(&FixTime::new(1, 2))), "xx");
        assert_eq!(signature(&position_body(&Position::UNKNOWN)), "ddd");
        assert_eq!(signature(&course_body(&Course::UNKNOWN)), "ddd");
        assert_eq!(signature(&accuracy_body(&Accuracy::UNKNOWN)), "dddddd");
        assert_eq!(signature(&satellites_body(&[satellite])), "a(ndddb)");
        assert_eq!(signature(&true), "b");
    }

    #[test]
    fn test_status_body_is_gpsd_mode() {
        assert_eq!(status_body(FixMode::NotSeen), 0);
        assert_eq!(status_body(FixMode::ThreeD), 3);
    }

    #[test]
    fn test_accuracy_body_field_order() {
        let accuracy = Accuracy {
            time: 1.0,
            vertical: 2.0,
            track: 3.0,
            speed: 4.0,
            climb: 5.0,
            horizontal: 6.0,
        };
        assert_eq!(accuracy_body(&accuracy), (1.0, 2.0, 3.0, 4.0, 5.0, 6.0));
    }

    #[test]
    fn test_position_and_course_field_order() {
        assert_eq!(
            position_body(&Position::new(37.0, -122.0, 10.0)),
            (37.0, -122.0, 10.0)
        );
        assert_eq!(course_body(&Course::new(1.5, 90.0, -0.5)), (1.5, 90.0, -0.5));
    }
}
