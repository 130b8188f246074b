//! Daemon startup and shutdown.
//!
//! Brings the process up in a fixed order: logging, instance lock, bus name,
//! gpsd, signal handlers. Then runs until SIGINT, SIGTERM, SIGHUP or SIGQUIT
//! arrives; each one stops the daemon cleanly.

use std::io;
use std::sync::Arc;

use locationd::config::DaemonConfig;
use locationd::daemon::{open_bus, open_source, InstanceLock, LocationDaemon};
use locationd::logging::{init_logging, LoggingConfig};
use tokio::signal::unix::{signal, SignalKind};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::CliError;

/// Runs the daemon to completion on a fresh multi-threaded runtime.
pub fn run(config: DaemonConfig, logging: LoggingConfig) -> Result<(), CliError> {
    let _logging_guard = init_logging(&logging).map_err(CliError::LoggingInit)?;
    info!("location-daemon v{}", locationd::VERSION);

    let _lock = match &config.lock_file {
        Some(path) => Some(InstanceLock::acquire(path)?),
        None => None,
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    runtime.block_on(serve(config))
}

async fn serve(config: DaemonConfig) -> Result<(), CliError> {
    let bus = Arc::new(open_bus(&config).await?);
    let source = open_source(&config).await?;

    let shutdown = CancellationToken::new();
    let handler_token = shutdown.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        handler_token.cancel();
    })
    .map_err(|e| CliError::SignalHandler(e.to_string()))?;
    let quit_listener =
        listen_for_quit(shutdown.clone()).map_err(|e| CliError::SignalHandler(e.to_string()))?;

    let daemon = LocationDaemon::new(config, source, bus);
    daemon.run(shutdown).await;
    quit_listener.abort();
    Ok(())
}

/// Cancels `shutdown` on SIGQUIT, which `ctrlc` leaves at its default
/// core-dumping action.
fn listen_for_quit(shutdown: CancellationToken) -> io::Result<JoinHandle<()>> {
    let mut quit = signal(SignalKind::quit())?;
    Ok(tokio::spawn(async move {
        tokio::select! {
            _ = shutdown.cancelled() => {}
            received = quit.recv() => {
                if received.is_some() {
                    info!("Received SIGQUIT");
                    shutdown.cancel();
                }
            }
        }
    }))
}
