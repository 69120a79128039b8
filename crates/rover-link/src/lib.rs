pub mod doctor;

use anyhow::{Context, Result};
use rover_proto::LineFramer;
use serde::Deserialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, info, warn};

/// Longest partial line kept before the link drops it and resyncs.
pub const MAX_PENDING_LINE: usize = 4096;

const READ_CHUNK: usize = 512;

#[derive(Debug, Clone, Deserialize)]
pub struct LinkConfig {
    #[serde(default = "default_enable")]
    pub enable: bool,
    pub serial_dev: String,
    pub baud: u32,
}

fn default_enable() -> bool {
    true
}

/// One serial connection to a vehicle controller, 8N1 without flow control.
///
/// A link that failed to open, or died on a read error, stays around as a
/// closed link: it never yields lines and every write fails.
pub struct SerialLink {
    name: &'static str,
    port: Option<SerialStream>,
    framer: LineFramer,
    buf: Vec<u8>,
}

impl SerialLink {
    pub fn open(name: &'static str, cfg: Option<&LinkConfig>) -> Self {
        let Some(cfg) = cfg.filter(|c| c.enable) else {
            info!(link = name, "link disabled");
            return Self::closed(name);
        };
        match open_port(cfg) {
            Ok(port) => {
                info!(link = name, dev = %cfg.serial_dev, baud = cfg.baud, "serial link open");
                Self { port: Some(port), ..Self::closed(name) }
            }
            Err(e) => {
                warn!(link = name, "serial link unavailable: {:#}", e);
                Self::closed(name)
            }
        }
    }

    pub fn closed(name: &'static str) -> Self {
        Self {
            name,
            port: None,
            framer: LineFramer::with_limit(MAX_PENDING_LINE),
            buf: vec![0; READ_CHUNK],
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    /// Waits for the next read and returns the lines it completed (possibly
    /// none). Never resolves on a closed link. Cancel safe.
    pub async fn next_lines(&mut self) -> Vec<String> {
        let Some(port) = self.port.as_mut() else {
            return std::future::pending().await;
        };

        let n = match port.read(&mut self.buf).await {
            Ok(0) => {
                warn!(link = self.name, "serial link closed by peer");
                self.close();
                return Vec::new();
            }
            Ok(n) => n,
            Err(e) => {
                warn!(link = self.name, "serial read failed: {}", e);
                self.close();
                return Vec::new();
            }
        };

        let overflows = self.framer.overflow_count();
        let lines: Vec<String> = self.framer.feed(&self.buf[..n]).collect();
        if self.framer.overflow_count() != overflows {
            warn!(link = self.name, limit = MAX_PENDING_LINE, "unterminated line dropped, resyncing");
        }
        lines
    }

    /// Best effort: a failed write is logged and dropped.
    pub async fn send(&mut self, bytes: &[u8]) -> bool {
        if self.port.is_none() {
            debug!(link = self.name, "link closed, dropping {} bytes", bytes.len());
            return false;
        }
        match self.write(bytes).await {
            Ok(()) => true,
            Err(e) => {
                warn!(link = self.name, "couldn't write to serial: {:#}", e);
                false
            }
        }
    }

    pub async fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let port = self.port.as_mut().context("link not open")?;
        port.write_all(bytes).await.context("serial write")?;
        Ok(())
    }

    pub fn close(&mut self) {
        if self.port.take().is_some() {
            info!(link = self.name, "serial link closed");
        }
        self.framer.discard_pending();
    }
}

fn open_port(cfg: &LinkConfig) -> Result<SerialStream> {
    tokio_serial::new(&cfg.serial_dev, cfg.baud)
        .data_bits(tokio_serial::DataBits::Eight)
        .parity(tokio_serial::Parity::None)
        .stop_bits(tokio_serial::StopBits::One)
        .flow_control(tokio_serial::FlowControl::None)
        .open_native_async()
        .with_context(|| format!("open serial {}", cfg.serial_dev))
}
