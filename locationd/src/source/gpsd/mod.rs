//! gpsd client - JSON socket protocol over TCP.
//!
//! Connects to a running gpsd, enables JSON watch mode and reads one report
//! per [`LocationSource::read`]. Reports are folded into a cumulative state
//! so each read returns a complete snapshot, as libgps does.
//!
//! Incoming bytes accumulate in a pending buffer that survives a timed-out
//! wait, so a report split across TCP segments is never lost and a stalled
//! partial report never blocks past the wait timeout.

mod protocol;

use std::io;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::{debug, info, trace};

use super::{LocationSource, SourceError};
use crate::fix::Fix;
use protocol::{parse_report, GpsdState, Report};

/// Default gpsd host.
pub const DEFAULT_GPSD_HOST: &str = "localhost";

/// Default gpsd port.
pub const DEFAULT_GPSD_PORT: u16 = 2947;

const WATCH_ENABLE: &[u8] = b"?WATCH={\"enable\":true,\"json\":true};\n";
const WATCH_DISABLE: &[u8] = b"?WATCH={\"enable\":false};\n";

/// Client for a gpsd instance.
pub struct GpsdClient {
    address: String,
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    pending: Vec<u8>,
    eof: bool,
    read_error: Option<io::Error>,
    state: GpsdState,
    reports_read: u64,
}

impl GpsdClient {
    /// Opens a connection to gpsd at `host:port`.
    pub async fn connect(host: &str, port: u16) -> Result<Self, SourceError> {
        let address = format!("{}:{}", host, port);
        let stream = TcpStream::connect(&address)
            .await
            .map_err(|e| SourceError::Connect {
                address: address.clone(),
                source: e,
            })?;

        let peer = stream.peer_addr().ok();
        info!(address = %address, peer = ?peer, "Connected to gpsd");

        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            address,
            reader: BufReader::new(read_half),
            writer: write_half,
            pending: Vec::new(),
            eof: false,
            read_error: None,
            state: GpsdState::default(),
            reports_read: 0,
        })
    }

    /// Address this client connected to.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Number of reports read so far.
    pub fn reports_read(&self) -> u64 {
        self.reports_read
    }

    async fn send(&mut self, command: &[u8]) -> Result<(), SourceError> {
        self.writer.write_all(command).await?;
        self.writer.flush().await?;
        Ok(())
    }

    fn has_line(&self) -> bool {
        self.pending.contains(&b'\n')
    }

    /// Takes the next complete line, or the unterminated tail at EOF.
    fn take_line(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let end = self
            .pending
            .iter()
            .position(|b| *b == b'\n')
            .map_or(self.pending.len(), |i| i + 1);
        let line: Vec<u8> = self.pending.drain(..end).collect();
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    async fn read_report(&mut self) -> Result<Fix, SourceError> {
        if let Some(e) = self.read_error.take() {
            return Err(e.into());
        }
        if !self.has_line() && !self.eof {
            // `read_until` keeps partial data in `pending` if this is cancelled.
            let len = self.reader.read_until(b'\n', &mut self.pending).await?;
            if len == 0 {
                self.eof = true;
            }
        }

        let line = self.take_line().ok_or(SourceError::Closed)?;
        let report = parse_report(&line)?;
        self.reports_read += 1;
        match &report {
            Report::Tpv(_) => trace!(report = self.reports_read, "TPV report"),
            Report::Sky(_) => trace!(report = self.reports_read, "SKY report"),
            Report::Other => trace!(report = self.reports_read, "Ignored report"),
        }

        Ok(self.state.apply(report))
    }

    /// True once a whole line is pending, or EOF or an I/O error is waiting
    /// to be reported by the next read.
    async fn ready_within(&mut self, timeout: Duration) -> bool {
        if self.has_line() || self.eof || self.read_error.is_some() {
            return true;
        }
        let fill = self.reader.read_until(b'\n', &mut self.pending);
        match tokio::time::timeout(timeout, fill).await {
            Ok(Ok(0)) => {
                self.eof = true;
                true
            }
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                self.read_error = Some(e);
                true
            }
            Err(_) => {
                if !self.pending.is_empty() {
                    trace!(buffered = self.pending.len(), "Partial report pending");
                }
                false
            }
        }
    }
}

impl LocationSource for GpsdClient {
    fn enable_streaming(&mut self) -> BoxFuture<'_, Result<(), SourceError>> {
        async move {
            self.send(WATCH_ENABLE).await?;
            debug!(address = %self.address, "gpsd watch enabled");
            Ok(())
        }
        .boxed()
    }

    fn disable_streaming(&mut self) -> BoxFuture<'_, Result<(), SourceError>> {
        async move {
            self.send(WATCH_DISABLE).await?;
            debug!(address = %self.address, "gpsd watch disabled");
            Ok(())
        }
        .boxed()
    }

    fn wait_ready(&mut self, timeout: Duration) -> BoxFuture<'_, bool> {
        self.ready_within(timeout).boxed()
    }

    fn read(&mut self) -> BoxFuture<'_, Result<Fix, SourceError>> {
        self.read_report().boxed()
    }

    fn close(&mut self) -> BoxFuture<'_, Result<(), SourceError>> {
        async move {
            self.writer.shutdown().await?;
            info!(
                address = %self.address,
                reports = self.reports_read,
                "Closed gpsd connection"
            );
            Ok(())
        }
        .boxed()
    }
}
