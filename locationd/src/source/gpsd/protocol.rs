//! gpsd JSON report decoding.
//!
//! gpsd sends one JSON object per line, discriminated by `class`. Only two
//! classes carry fix data:
//!
//! - **TPV** (time-position-velocity) - replaces the whole fix
//! - **SKY** - replaces the satellite view
//!
//! Everything else (`VERSION`, `DEVICES`, `WATCH`, `ERROR`, ...) is accepted
//! and ignored.

use chrono::DateTime;
use serde::Deserialize;
use tracing::debug;

use super::super::error::SourceError;
use crate::fix::{Accuracy, Course, Fix, FixMode, FixTime, Position, Satellite};

/// A decoded gpsd report.
#[derive(Debug, Deserialize)]
#[serde(tag = "class")]
pub(super) enum Report {
    #[serde(rename = "TPV")]
    Tpv(Tpv),
    #[serde(rename = "SKY")]
    Sky(Sky),
    #[serde(other)]
    Other,
}

/// Time-position-velocity report.
#[derive(Debug, Default, Deserialize)]
pub(super) struct Tpv {
    mode: Option<i64>,
    time: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    /// Deprecated since gpsd 3.20, still sent by older daemons.
    alt: Option<f64>,
    #[serde(rename = "altMSL")]
    alt_msl: Option<f64>,
    track: Option<f64>,
    speed: Option<f64>,
    climb: Option<f64>,
    ept: Option<f64>,
    epv: Option<f64>,
    epd: Option<f64>,
    eps: Option<f64>,
    epc: Option<f64>,
    eph: Option<f64>,
}

/// Sky view report.
#[derive(Debug, Default, Deserialize)]
pub(super) struct Sky {
    satellites: Option<Vec<SkySatellite>>,
}

#[derive(Debug, Deserialize)]
struct SkySatellite {
    #[serde(rename = "PRN")]
    prn: i16,
    el: Option<f64>,
    az: Option<f64>,
    ss: Option<f64>,
    #[serde(default)]
    used: bool,
}

/// Decodes one line from the gpsd socket.
pub(super) fn parse_report(line: &str) -> Result<Report, SourceError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Report::Other);
    }
    Ok(serde_json::from_str(line)?)
}

fn unknown(value: Option<f64>) -> f64 {
    value.unwrap_or(f64::NAN)
}

/// Parses an ISO 8601 / RFC 3339 gpsd timestamp.
pub(super) fn parse_time(text: &str) -> Option<FixTime> {
    match DateTime::parse_from_rfc3339(text) {
        Ok(time) => Some(FixTime::new(
            time.timestamp(),
            i64::from(time.timestamp_subsec_nanos()),
        )),
        Err(e) => {
            debug!(time = text, error = %e, "Ignoring unparseable gpsd time");
            None
        }
    }
}

/// Cumulative view of the gpsd stream.
///
/// gpsd splits a fix across report classes, so the latest TPV and SKY are
/// folded together. The held fix never carries a time; time is attached to
/// a snapshot only for the TPV that supplied it.
#[derive(Debug, Default)]
pub(super) struct GpsdState {
    fix: Fix,
}

impl GpsdState {
    /// Folds a report into the state and returns the resulting snapshot.
    pub(super) fn apply(&mut self, report: Report) -> Fix {
        match report {
            Report::Tpv(tpv) => {
                let time = tpv.time.as_deref().and_then(parse_time);
                self.fix.mode = tpv.mode.map(FixMode::from_gpsd).unwrap_or_default();
                self.fix.position = Position {
                    latitude: unknown(tpv.lat),
                    longitude: unknown(tpv.lon),
                    altitude: unknown(tpv.alt_msl.or(tpv.alt)),
                };
                self.fix.course = Course {
                    speed: unknown(tpv.speed),
                    track: unknown(tpv.track),
                    climb: unknown(tpv.climb),
                };
                self.fix.accuracy = Accuracy {
                    time: unknown(tpv.ept),
                    vertical: unknown(tpv.epv),
                    track: unknown(tpv.epd),
                    speed: unknown(tpv.eps),
                    climb: unknown(tpv.epc),
                    horizontal: unknown(tpv.eph),
                };

                let mut snapshot = self.fix.clone();
                snapshot.time = time;
                snapshot
            }
            Report::Sky(sky) => {
                if let Some(satellites) = sky.satellites {
                    self.fix.satellites = satellites
                        .into_iter()
                        .map(|s| Satellite {
                            prn: s.prn,
                            elevation: unknown(s.el),
                            azimuth: unknown(s.az),
                            signal_strength: unknown(s.ss),
                            used: s.used,
                        })
                        .collect();
                }
                self.fix.clone()
            }
            Report::Other => self.fix.clone(),
        }
    }
}
