//! location-daemon - republishes gpsd fixes as D-Bus change signals.

mod error;
mod runner;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use locationd::bus::BusKind;
use locationd::config::{load_config_file, DaemonConfig};
use locationd::logging::LoggingConfig;

use crate::error::CliError;

#[derive(Debug, Parser)]
#[command(name = "location-daemon")]
#[command(version, about = "Republish gpsd fixes as D-Bus change signals", long_about = None)]
struct Args {
    /// Seconds to pause between poll cycles [default: 0, poll continuously;
    /// pass -t 1 for the classic once-per-second cadence]
    #[arg(short = 't', long = "interval", value_name = "SECS")]
    interval: Option<u64>,

    /// gpsd host
    #[arg(long)]
    host: Option<String>,

    /// gpsd port
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    port: Option<u16>,

    /// How long each poll waits for gpsd, in milliseconds
    #[arg(long, value_name = "MS")]
    wait_timeout_ms: Option<u64>,

    /// Bound on each signal emission, in milliseconds
    #[arg(long, value_name = "MS")]
    publish_timeout_ms: Option<u64>,

    /// Publish on the session bus instead of the system bus
    #[arg(long)]
    session_bus: bool,

    /// INI configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Advisory single-instance lock file
    #[arg(long, value_name = "PATH")]
    lock_file: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "locationd=trace" (default: RUST_LOG or info)
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

impl Args {
    /// Builds the daemon configuration: defaults, then the config file, then
    /// flags.
    fn daemon_config(&self) -> Result<DaemonConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => load_config_file(path)?,
            None => DaemonConfig::default(),
        };

        if let Some(host) = &self.host {
            if host.trim().is_empty() {
                return Err(CliError::Config("--host must not be empty".to_string()));
            }
            config.gpsd_host = host.clone();
        }
        if let Some(port) = self.port {
            config.gpsd_port = port;
        }
        if let Some(secs) = self.interval {
            config = config.with_poll_interval(Duration::from_secs(secs));
        }
        if let Some(ms) = self.wait_timeout_ms {
            let timeout = Duration::from_millis(ms);
            config = config.with_wait_timeout(timeout).with_error_backoff(timeout);
        }
        if let Some(ms) = self.publish_timeout_ms {
            config = config.with_publish_timeout(Duration::from_millis(ms));
        }
        if self.session_bus {
            config = config.with_bus(BusKind::Session);
        }
        if let Some(path) = &self.lock_file {
            config = config.with_lock_file(path);
        }

        Ok(config)
    }

    fn logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            filter: self.log_level.clone(),
            file: self.log_file.clone(),
        }
    }
}

fn main() {
    let args = Args::parse();

    let result = args
        .daemon_config()
        .and_then(|config| runner::run(config, args.logging_config()));

    if let Err(e) = result {
        e.exit();
    }
}
