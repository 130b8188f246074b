//! Core fix types.

use std::fmt;

use super::equality::{is_known, ApproxEq};

/// Fix mode reported by the location source.
///
/// Discriminants match gpsd's `mode` values and are the byte published in
/// `FixStatusChanged`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum FixMode {
    /// The source has not reported a mode yet.
    #[default]
    NotSeen = 0,
    /// Reported, but no fix.
    NoFix = 1,
    /// Two-dimensional fix (no altitude).
    TwoD = 2,
    /// Three-dimensional fix.
    ThreeD = 3,
}

impl FixMode {
    /// Maps a gpsd mode value; anything outside 1..=3 is `NotSeen`.
    pub fn from_gpsd(mode: i64) -> Self {
        match mode {
            1 => FixMode::NoFix,
            2 => FixMode::TwoD,
            3 => FixMode::ThreeD,
            _ => FixMode::NotSeen,
        }
    }

    /// Wire value of this mode.
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for FixMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FixMode::NotSeen => "not seen",
            FixMode::NoFix => "no fix",
            FixMode::TwoD => "2D",
            FixMode::ThreeD => "3D",
        };
        f.write_str(name)
    }
}

/// Fix timestamp, seconds and nanoseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FixTime {
    pub seconds: i64,
    pub nanoseconds: i64,
}

impl FixTime {
    pub fn new(seconds: i64, nanoseconds: i64) -> Self {
        Self {
            seconds,
            nanoseconds,
        }
    }
}

/// Geographic position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Altitude above mean sea level, meters.
    pub altitude: f64,
}

impl Position {
    pub const UNKNOWN: Position = Position {
        latitude: f64::NAN,
        longitude: f64::NAN,
        altitude: f64::NAN,
    };

    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
        }
    }

    fn values(&self) -> [f64; 3] {
        [self.latitude, self.longitude, self.altitude]
    }

    /// Returns true if at least one field carries a measurement.
    pub fn any_known(&self) -> bool {
        self.values().into_iter().any(is_known)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

impl ApproxEq for Position {
    fn approx_eq(&self, other: &Self) -> bool {
        self.values().approx_eq(&other.values())
    }
}

/// Movement over ground.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Course {
    /// Ground speed, m/s.
    pub speed: f64,
    /// Track over ground, degrees from true north.
    pub track: f64,
    /// Climb rate, m/s.
    pub climb: f64,
}

impl Course {
    pub const UNKNOWN: Course = Course {
        speed: f64::NAN,
        track: f64::NAN,
        climb: f64::NAN,
    };

    pub fn new(speed: f64, track: f64, climb: f64) -> Self {
        Self {
            speed,
            track,
            climb,
        }
    }

    fn values(&self) -> [f64; 3] {
        [self.speed, self.track, self.climb]
    }

    pub fn any_known(&self) -> bool {
        self.values().into_iter().any(is_known)
    }
}

impl Default for Course {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

impl ApproxEq for Course {
    fn approx_eq(&self, other: &Self) -> bool {
        self.values().approx_eq(&other.values())
    }
}

/// Uncertainty estimates attached to a fix.
///
/// Published in declaration order: time, vertical, track, speed, climb,
/// horizontal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Accuracy {
    /// Time uncertainty, seconds.
    pub time: f64,
    /// Vertical position uncertainty, meters.
    pub vertical: f64,
    /// Track uncertainty, degrees.
    pub track: f64,
    /// Speed uncertainty, m/s.
    pub speed: f64,
    /// Vertical speed uncertainty, m/s.
    pub climb: f64,
    /// Horizontal position uncertainty, meters.
    pub horizontal: f64,
}

impl Accuracy {
    pub const UNKNOWN: Accuracy = Accuracy {
        time: f64::NAN,
        vertical: f64::NAN,
        track: f64::NAN,
        speed: f64::NAN,
        climb: f64::NAN,
        horizontal: f64::NAN,
    };

    /// Fields in publication order.
    pub fn values(&self) -> [f64; 6] {
        [
            self.time,
            self.vertical,
            self.track,
            self.speed,
            self.climb,
            self.horizontal,
        ]
    }

    pub fn any_known(&self) -> bool {
        self.values().into_iter().any(is_known)
    }
}

impl Default for Accuracy {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

impl ApproxEq for Accuracy {
    fn approx_eq(&self, other: &Self) -> bool {
        self.values().approx_eq(&other.values())
    }
}

/// One entry of the satellite view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Satellite {
    /// PRN / satellite id.
    pub prn: i16,
    /// Elevation, degrees.
    pub elevation: f64,
    /// Azimuth, degrees.
    pub azimuth: f64,
    /// Signal strength, dB-Hz.
    pub signal_strength: f64,
    /// Whether the satellite is used in the current fix.
    pub used: bool,
}

impl ApproxEq for Satellite {
    fn approx_eq(&self, other: &Self) -> bool {
        self.prn == other.prn
            && self.used == other.used
            && [self.elevation, self.azimuth, self.signal_strength].approx_eq(&[
                other.elevation,
                other.azimuth,
                other.signal_strength,
            ])
    }
}

/// One snapshot read from the location source.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fix {
    pub mode: FixMode,
    /// Present only when the source supplied a time with this sample.
    pub time: Option<FixTime>,
    pub position: Position,
    pub course: Course,
    pub accuracy: Accuracy,
    /// Satellite view in the order the source reported it.
    pub satellites: Vec<Satellite>,
}

impl Fix {
    /// A fix with every field unknown.
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: FixMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_time(mut self, time: FixTime) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn with_course(mut self, course: Course) -> Self {
        self.course = course;
        self
    }

    pub fn with_accuracy(mut self, accuracy: Accuracy) -> Self {
        self.accuracy = accuracy;
        self
    }

    pub fn with_satellites(mut self, satellites: Vec<Satellite>) -> Self {
        self.satellites = satellites;
        self
    }
}
