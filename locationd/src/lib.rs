//! locationd - republishes gpsd fixes as D-Bus change signals
//!
//! The daemon polls a location source (gpsd), compares each fix with what it
//! last published, and emits one signal per field group that changed. Groups
//! are fix status, time, position, course, accuracy and satellites. Floating
//! point fields are compared with a relative epsilon; NaN means unknown.
//!
//! # Modules
//!
//! - [`fix`] - fix data model and the equality policy
//! - [`source`] - the [`source::LocationSource`] trait and the gpsd client
//! - [`sampler`] - one bounded poll of a source
//! - [`detector`] - per-group change rules and published state
//! - [`bus`] - the [`bus::EventBus`] trait, D-Bus and in-memory buses
//! - [`daemon`] - the sampling loop tying everything together
//! - [`config`], [`logging`], [`metrics`] - ambient plumbing

pub mod bus;
pub mod config;
pub mod daemon;
pub mod detector;
pub mod fix;
pub mod logging;
pub mod metrics;
pub mod sampler;
pub mod source;

/// Crate version, as reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use bus::{EventBus, EventKind, LocationEvent};
pub use config::DaemonConfig;
pub use daemon::{DaemonError, LocationDaemon};
pub use detector::ChangeDetector;
pub use fix::Fix;
pub use source::LocationSource;
