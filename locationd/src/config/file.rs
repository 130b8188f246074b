//! INI configuration file parsing.
//!
//! This is the single place where INI key names are mapped to
//! [`DaemonConfig`] fields. Parsing starts from `DaemonConfig::default()` and
//! overlays whatever the file sets.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use super::DaemonConfig;
use crate::bus::BusKind;

/// Errors raised while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// The file could not be read or is not valid INI.
    #[error("Failed to read config file {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    /// The text is not valid INI.
    #[error("Invalid INI syntax: {0}")]
    Parse(String),

    /// A key holds a value that cannot be used.
    #[error("Invalid value '{value}' for [{section}] {key}: {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// Loads `path` and overlays it on the defaults.
pub fn load_config_file(path: &Path) -> Result<DaemonConfig, ConfigFileError> {
    let ini = Ini::load_from_file(path).map_err(|e| ConfigFileError::Read {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_ini(&ini)
}

/// Parses INI text and overlays it on the defaults.
pub fn parse_config_str(text: &str) -> Result<DaemonConfig, ConfigFileError> {
    let ini = Ini::load_from_str(text).map_err(|e| ConfigFileError::Parse(e.to_string()))?;
    parse_ini(&ini)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_millis(section: &str, key: &str, value: &str) -> Result<Duration, ConfigFileError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| invalid(section, key, value, "must be a non-negative integer (milliseconds)"))
}

fn parse_ini(ini: &Ini) -> Result<DaemonConfig, ConfigFileError> {
    let mut config = DaemonConfig::default();

    // [gpsd] section
    if let Some(section) = ini.section(Some("gpsd")) {
        if let Some(v) = section.get("host") {
            let v = v.trim();
            if v.is_empty() {
                return Err(invalid("gpsd", "host", v, "must not be empty"));
            }
            config.gpsd_host = v.to_string();
        }
        if let Some(v) = section.get("port") {
            config.gpsd_port = v
                .trim()
                .parse()
                .map_err(|_| invalid("gpsd", "port", v, "must be a port number (1-65535)"))?;
            if config.gpsd_port == 0 {
                return Err(invalid("gpsd", "port", v, "must be a port number (1-65535)"));
            }
        }
    }

    // [daemon] section
    if let Some(section) = ini.section(Some("daemon")) {
        if let Some(v) = section.get("interval") {
            let secs: u64 = v
                .trim()
                .parse()
                .map_err(|_| invalid("daemon", "interval", v, "must be whole seconds"))?;
            config.poll_interval = Duration::from_secs(secs);
        }
        if let Some(v) = section.get("wait_timeout_ms") {
            config.wait_timeout = parse_millis("daemon", "wait_timeout_ms", v)?;
            config.error_backoff = config.wait_timeout;
        }
        if let Some(v) = section.get("publish_timeout_ms") {
            config.publish_timeout = parse_millis("daemon", "publish_timeout_ms", v)?;
        }
        if let Some(v) = section.get("lock_file") {
            let v = v.trim();
            if !v.is_empty() {
                config.lock_file = Some(PathBuf::from(v));
            }
        }
    }

    // [dbus] section
    if let Some(section) = ini.section(Some("dbus")) {
        if let Some(v) = section.get("bus") {
            config.bus = v
                .parse::<BusKind>()
                .map_err(|reason| invalid("dbus", "bus", v, &reason))?;
        }
    }

    Ok(config)
}
