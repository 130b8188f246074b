//! Daemon counters.
//!
//! Lock-free atomic counters shared between the sampler and detector tasks,
//! with a point-in-time [`MetricsSnapshot`] for logging.
//!
//! ```text
//! Sampler task ──┐
//!                ├──► DaemonMetrics ──► MetricsSnapshot ──► shutdown log
//! Detector task ─┘    (atomics)        (plain copy)
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Counters for one daemon run.
#[derive(Debug)]
pub struct DaemonMetrics {
    started: Instant,
    fixes_read: AtomicU64,
    idle_polls: AtomicU64,
    read_errors: AtomicU64,
    events_published: AtomicU64,
    publish_failures: AtomicU64,
}

impl Default for DaemonMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl DaemonMetrics {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            fixes_read: AtomicU64::new(0),
            idle_polls: AtomicU64::new(0),
            read_errors: AtomicU64::new(0),
            events_published: AtomicU64::new(0),
            publish_failures: AtomicU64::new(0),
        }
    }

    pub fn fix_read(&self) {
        self.fixes_read.fetch_add(1, Ordering::Relaxed);
    }

    pub fn idle_poll(&self) {
        self.idle_polls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn read_error(&self) {
        self.read_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn events_published(&self, count: u64) {
        self.events_published.fetch_add(count, Ordering::Relaxed);
    }

    pub fn publish_failures(&self, count: u64) {
        self.publish_failures.fetch_add(count, Ordering::Relaxed);
    }

    /// Copies the current counter values.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime: self.started.elapsed(),
            fixes_read: self.fixes_read.load(Ordering::Relaxed),
            idle_polls: self.idle_polls.load(Ordering::Relaxed),
            read_errors: self.read_errors.load(Ordering::Relaxed),
            events_published: self.events_published.load(Ordering::Relaxed),
            publish_failures: self.publish_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`DaemonMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub uptime: Duration,
    pub fixes_read: u64,
    pub idle_polls: u64,
    pub read_errors: u64,
    pub events_published: u64,
    pub publish_failures: u64,
}

impl MetricsSnapshot {
    /// Fraction of attempted publishes that failed (0.0 when none attempted).
    pub fn failure_rate(&self) -> f64 {
        let attempted = self.events_published + self.publish_failures;
        if attempted == 0 {
            0.0
        } else {
            self.publish_failures as f64 / attempted as f64
        }
    }

    /// Uptime as `HH:MM:SS`.
    pub fn uptime_human(&self) -> String {
        let secs = self.uptime.as_secs();
        format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
    }
}
