//! Location change events and their bus addressing.

use std::fmt;

use crate::fix::{Accuracy, Course, FixMode, FixTime, Position, Satellite};

/// Object path every signal is emitted from.
pub const OBJECT_PATH: &str = "/org/maemo/LocationDaemon";

/// Well-known bus name owned by the daemon.
pub const SERVICE_NAME: &str = "org.maemo.LocationDaemon";

pub const DEVICE_INTERFACE: &str = "org.maemo.LocationDaemon.Device";
pub const TIME_INTERFACE: &str = "org.maemo.LocationDaemon.Time";
pub const POSITION_INTERFACE: &str = "org.maemo.LocationDaemon.Position";
pub const COURSE_INTERFACE: &str = "org.maemo.LocationDaemon.Course";
pub const ACCURACY_INTERFACE: &str = "org.maemo.LocationDaemon.Accuracy";
pub const SATELLITE_INTERFACE: &str = "org.maemo.LocationDaemon.Satellite";

/// Event kind, one per signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    FixStatus,
    Time,
    Position,
    Course,
    Accuracy,
    Satellites,
    Running,
}

impl EventKind {
    /// Interface the signal belongs to.
    pub fn interface(self) -> &'static str {
        match self {
            EventKind::FixStatus | EventKind::Running => DEVICE_INTERFACE,
            EventKind::Time => TIME_INTERFACE,
            EventKind::Position => POSITION_INTERFACE,
            EventKind::Course => COURSE_INTERFACE,
            EventKind::Accuracy => ACCURACY_INTERFACE,
            EventKind::Satellites => SATELLITE_INTERFACE,
        }
    }

    /// Signal member name.
    pub fn signal_name(self) -> &'static str {
        match self {
            EventKind::FixStatus => "FixStatusChanged",
            EventKind::Time => "TimeChanged",
            EventKind::Position => "PositionChanged",
            EventKind::Course => "CourseChanged",
            EventKind::Accuracy => "AccuracyChanged",
            EventKind::Satellites => "SatellitesChanged",
            EventKind::Running => "Running",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.interface(), self.signal_name())
    }
}

/// A change event with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationEvent {
    FixStatusChanged(FixMode),
    TimeChanged(FixTime),
    PositionChanged(Position),
    CourseChanged(Course),
    AccuracyChanged(Accuracy),
    SatellitesChanged(Vec<Satellite>),
    /// Daemon liveness, `true` at startup and `false` at shutdown.
    Running(bool),
}

impl LocationEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            LocationEvent::FixStatusChanged(_) => EventKind::FixStatus,
            LocationEvent::TimeChanged(_) => EventKind::Time,
            LocationEvent::PositionChanged(_) => EventKind::Position,
            LocationEvent::CourseChanged(_) => EventKind::Course,
            LocationEvent::AccuracyChanged(_) => EventKind::Accuracy,
            LocationEvent::SatellitesChanged(_) => EventKind::Satellites,
            LocationEvent::Running(_) => EventKind::Running,
        }
    }

    pub fn interface(&self) -> &'static str {
        self.kind().interface()
    }

    pub fn signal_name(&self) -> &'static str {
        self.kind().signal_name()
    }
}
