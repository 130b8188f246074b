//! Daemon configuration.
//!
//! [`DaemonConfig`] carries every tunable with its default. Values can be
//! overlaid from an INI file (see [`load_config_file`]) and then from CLI
//! flags, in that order of increasing precedence.
//!
//! # INI layout
//!
//! ```ini
//! [gpsd]
//! host = localhost
//! port = 2947
//!
//! [daemon]
//! interval = 0            ; seconds between poll cycles
//! wait_timeout_ms = 500
//! publish_timeout_ms = 1000
//! lock_file = /run/location-daemon.lock
//!
//! [dbus]
//! bus = system            ; or session
//! ```

mod file;

use std::path::PathBuf;
use std::time::Duration;

use crate::bus::{BusKind, DEFAULT_PUBLISH_TIMEOUT};
use crate::sampler::DEFAULT_WAIT_TIMEOUT;
use crate::source::{DEFAULT_GPSD_HOST, DEFAULT_GPSD_PORT};

pub use file::{load_config_file, parse_config_str, ConfigFileError};

/// Default capacity of the sampler → detector channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// Complete daemon configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DaemonConfig {
    /// gpsd host name or address.
    pub gpsd_host: String,

    /// gpsd TCP port.
    pub gpsd_port: u16,

    /// Bus to publish on.
    pub bus: BusKind,

    /// How long each poll waits for the source.
    pub wait_timeout: Duration,

    /// Pause between poll cycles (zero polls continuously).
    pub poll_interval: Duration,

    /// Pause after a failed read before polling again.
    pub error_backoff: Duration,

    /// Bound on each bus publish.
    pub publish_timeout: Duration,

    /// Capacity of the fix channel between sampler and detector.
    pub channel_capacity: usize,

    /// Advisory single-instance lock file.
    pub lock_file: Option<PathBuf>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            gpsd_host: DEFAULT_GPSD_HOST.to_string(),
            gpsd_port: DEFAULT_GPSD_PORT,
            bus: BusKind::System,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
            poll_interval: Duration::ZERO,
            error_backoff: DEFAULT_WAIT_TIMEOUT,
            publish_timeout: DEFAULT_PUBLISH_TIMEOUT,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            lock_file: None,
        }
    }
}

impl DaemonConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the gpsd endpoint.
    pub fn with_gpsd(mut self, host: impl Into<String>, port: u16) -> Self {
        self.gpsd_host = host.into();
        self.gpsd_port = port;
        self
    }

    pub fn with_bus(mut self, bus: BusKind) -> Self {
        self.bus = bus;
        self
    }

    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_error_backoff(mut self, backoff: Duration) -> Self {
        self.error_backoff = backoff;
        self
    }

    pub fn with_publish_timeout(mut self, timeout: Duration) -> Self {
        self.publish_timeout = timeout;
        self
    }

    /// Set the channel capacity (clamped to at least 1).
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    pub fn with_lock_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.lock_file = Some(path.into());
        self
    }
}
