//! Positioning fix data model.
//!
//! A [`Fix`] is one immutable snapshot read from the location source. Its
//! fields are split into the groups that drive change events:
//!
//! ```text
//! Fix ─┬─ mode ────────► FixStatusChanged
//!      ├─ time ────────► TimeChanged
//!      ├─ position ────► PositionChanged
//!      ├─ course ──────► CourseChanged
//!      ├─ accuracy ────► AccuracyChanged
//!      └─ satellites ──► SatellitesChanged
//! ```
//!
//! Unknown floating-point values are represented as NaN. Comparison between
//! samples goes through [`ApproxEq`], which treats two unknowns as equal and
//! tolerates last-bit jitter between finite readings.

mod equality;
mod model;

pub use equality::{approx_eq, is_known, ApproxEq, EPSILON};
pub use model::{Accuracy, Course, Fix, FixMode, FixTime, Position, Satellite};
