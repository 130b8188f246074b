//! Location daemon - sampling loop and change publication.
//!
//! [`LocationDaemon`] runs two tasks connected by a bounded channel:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          LocationDaemon                          │
//! │                                                                  │
//! │  Sampler task                         Detector task              │
//! │  ┌──────────────┐    mpsc<Fix>     ┌────────────────┐            │
//! │  │  FixSampler  │ ───────────────► │ ChangeDetector │ ──► EventBus
//! │  │ (poll source)│                  │ (owns state)   │            │
//! │  └──────────────┘                  └────────────────┘            │
//! │         ▲                                   ▲                    │
//! │         └──────── CancellationToken ────────┘                    │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only `Fix` snapshots cross the channel. The published state lives inside
//! the detector task, so no locking is needed. On shutdown the sampler stops
//! within one wait timeout; a fix the detector has already received is
//! observed to completion, never half-applied.
//!
//! # Example
//!
//! ```ignore
//! use locationd::daemon::{open_bus, open_source, LocationDaemon};
//!
//! let bus = Arc::new(open_bus(&config).await?);
//! let source = open_source(&config).await?;
//!
//! let shutdown = CancellationToken::new();
//! let daemon = LocationDaemon::new(config, source, bus);
//! let metrics = daemon.run(shutdown.clone()).await;
//! ```

mod error;
mod lock;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::bus::{publish_with_timeout, BusKind, DbusPublisher, EventBus, LocationEvent};
use crate::config::DaemonConfig;
use crate::detector::ChangeDetector;
use crate::fix::Fix;
use crate::metrics::{DaemonMetrics, MetricsSnapshot};
use crate::sampler::{FixSampler, SampleOutcome};
use crate::source::{GpsdClient, LocationSource};

pub use error::DaemonError;
pub use lock::{InstanceLock, LockError};

/// Connects to gpsd and enables streaming.
pub async fn open_source(config: &DaemonConfig) -> Result<GpsdClient, DaemonError> {
    let mut client = GpsdClient::connect(&config.gpsd_host, config.gpsd_port)
        .await
        .map_err(DaemonError::SourceUnavailable)?;
    client
        .enable_streaming()
        .await
        .map_err(DaemonError::SourceUnavailable)?;
    Ok(client)
}

/// Connects to the configured bus and acquires the service name.
pub async fn open_bus(config: &DaemonConfig) -> Result<DbusPublisher, DaemonError> {
    connect_bus(config.bus).await
}

async fn connect_bus(bus: BusKind) -> Result<DbusPublisher, DaemonError> {
    DbusPublisher::connect(bus)
        .await
        .map_err(DaemonError::BusUnavailable)
}

/// The sampling daemon.
///
/// # Type Parameters
///
/// * `S` - Location source polled by the sampler task
/// * `B` - Bus the detector publishes on
pub struct LocationDaemon<S, B>
where
    S: LocationSource + 'static,
    B: EventBus,
{
    config: DaemonConfig,
    source: S,
    bus: Arc<B>,
    metrics: Arc<DaemonMetrics>,
}

impl<S, B> LocationDaemon<S, B>
where
    S: LocationSource + 'static,
    B: EventBus,
{
    /// Creates a daemon around an opened, streaming source.
    pub fn new(config: DaemonConfig, source: S, bus: Arc<B>) -> Self {
        Self {
            config,
            source,
            bus,
            metrics: Arc::new(DaemonMetrics::new()),
        }
    }

    /// Shared counters, readable while the daemon runs.
    pub fn metrics(&self) -> Arc<DaemonMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Runs until `shutdown` is cancelled, then stops streaming, closes the
    /// source and returns the final counters.
    pub async fn run(self, shutdown: CancellationToken) -> MetricsSnapshot {
        let Self {
            config,
            source,
            bus,
            metrics,
        } = self;

        info!(
            gpsd = %format!("{}:{}", config.gpsd_host, config.gpsd_port),
            wait_timeout_ms = config.wait_timeout.as_millis() as u64,
            poll_interval_ms = config.poll_interval.as_millis() as u64,
            "Location daemon starting"
        );
        announce(&*bus, true, config.publish_timeout).await;

        let (fix_tx, mut fix_rx) = mpsc::channel(config.channel_capacity);
        let sampler = FixSampler::new(source);
        let sampler_handle = tokio::spawn(run_sampler(
            sampler,
            config.clone(),
            fix_tx,
            shutdown.clone(),
            Arc::clone(&metrics),
        ));

        let mut detector =
            ChangeDetector::new(Arc::clone(&bus)).with_publish_timeout(config.publish_timeout);

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Location daemon shutting down");
                    break;
                }

                fix = fix_rx.recv() => {
                    let Some(fix) = fix else {
                        warn!("Sampler stopped unexpectedly");
                        break;
                    };
                    // Runs to completion; shutdown is only checked between fixes.
                    let report = detector.observe(&fix).await;
                    metrics.events_published(report.delivered() as u64);
                    metrics.publish_failures(report.failed.len() as u64);
                }
            }
        }

        drop(fix_rx);
        if let Err(e) = sampler_handle.await {
            error!(error = %e, "Sampler task failed");
        }

        announce(&*bus, false, config.publish_timeout).await;

        let snapshot = metrics.snapshot();
        info!(
            uptime = %snapshot.uptime_human(),
            fixes_read = snapshot.fixes_read,
            idle_polls = snapshot.idle_polls,
            read_errors = snapshot.read_errors,
            events_published = snapshot.events_published,
            publish_failures = snapshot.publish_failures,
            "Location daemon stopped"
        );
        snapshot
    }
}

/// Publishes the `Running` liveness signal.
async fn announce<B: EventBus>(bus: &B, running: bool, timeout: Duration) {
    let event = LocationEvent::Running(running);
    match publish_with_timeout(bus, &event, timeout).await {
        Ok(()) => debug!(running, "Announced daemon state"),
        Err(e) => warn!(running, error = %e, "Failed to announce daemon state"),
    }
}

/// Sampler task: polls the source and forwards fresh fixes.
async fn run_sampler<S: LocationSource>(
    mut sampler: FixSampler<S>,
    config: DaemonConfig,
    fix_tx: mpsc::Sender<Fix>,
    shutdown: CancellationToken,
    metrics: Arc<DaemonMetrics>,
) {
    debug!("Sampler started");

    loop {
        let outcome = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            outcome = sampler.poll(config.wait_timeout) => outcome,
        };

        let pause = match outcome {
            SampleOutcome::FreshFix(fix) => {
                metrics.fix_read();
                let sent = tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    sent = fix_tx.send(fix) => sent,
                };
                if sent.is_err() {
                    debug!("Detector gone, stopping sampler");
                    break;
                }
                config.poll_interval
            }
            SampleOutcome::NoUpdate => {
                metrics.idle_poll();
                config.poll_interval
            }
            SampleOutcome::ReadError(e) => {
                metrics.read_error();
                warn!(error = %e, "Failed to read from location source");
                config.poll_interval.max(config.error_backoff)
            }
        };

        if !pause.is_zero() {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(pause) => {}
            }
        }
    }

    let source = sampler.source_mut();
    if let Err(e) = source.disable_streaming().await {
        debug!(error = %e, "Failed to disable streaming");
    }
    if let Err(e) = source.close().await {
        debug!(error = %e, "Failed to close location source");
    }
    debug!("Sampler stopped");
}
