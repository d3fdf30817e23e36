//! vMix TCP tally device
//!
//! Connects to the vMix TCP API, subscribes to tally updates and turns
//! incoming `TALLY OK` lines into change-detected color snapshots.

use std::time::Duration;

use tally_protocol::vmix::{status_bytes, VmixCodec, SUBSCRIBE};
use tally_protocol::{CameraColor, CameraStatus, MAX_CAMERAS};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::config::VmixConfig;
use crate::error::DeviceError;
use crate::Device;

/// Change-detecting state machine over vMix tally lines
///
/// Change detection compares the raw status byte per camera, so repeated
/// identical lines stay quiet even when a byte is not a valid color code.
pub struct VmixState {
    status: CameraStatus,
    byte_shadow: [u8; MAX_CAMERAS],
}

impl VmixState {
    /// Create a state machine with a zeroed byte shadow
    pub fn new() -> Self {
        Self {
            status: CameraStatus::new(MAX_CAMERAS),
            byte_shadow: [0; MAX_CAMERAS],
        }
    }

    /// Apply one received line
    ///
    /// Non-tally lines are ignored. A short line covers only the leading
    /// cameras; the rest keep their prior color without flagging a
    /// change. Returns true if any camera's color changed.
    pub fn apply_line(&mut self, line: &[u8]) -> bool {
        let Some(codes) = status_bytes(line) else {
            return false;
        };

        let mut changed = false;
        for (index, &code) in codes.iter().enumerate() {
            if code == self.byte_shadow[index] {
                continue;
            }
            self.byte_shadow[index] = code;
            match CameraColor::from_code(code) {
                Some(color) => {
                    self.status.set(index, color);
                    changed = true;
                }
                None => debug!(camera = index + 1, code, "ignoring non-color status byte"),
            }
        }

        changed
    }

    /// The current snapshot
    pub fn snapshot(&self) -> CameraStatus {
        self.status
    }
}

impl Default for VmixState {
    fn default() -> Self {
        Self::new()
    }
}

/// Tally device for the vMix TCP feed
pub struct VmixDevice {
    config: VmixConfig,
    stream: Option<TcpStream>,
    codec: VmixCodec,
    state: VmixState,
    read_buf: Vec<u8>,
}

impl VmixDevice {
    /// Create an unconnected device; `init` establishes the session
    pub fn new(config: VmixConfig) -> Self {
        Self {
            config,
            stream: None,
            codec: VmixCodec::new(),
            state: VmixState::new(),
            read_buf: vec![0u8; 1024],
        }
    }

    /// True if the TCP session is currently believed alive
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Connect and subscribe, with a bounded retry budget
    async fn connect(&mut self) -> Result<(), DeviceError> {
        let addr = (self.config.host.as_str(), self.config.port);
        for attempt in 1..=self.config.connect_attempts {
            match TcpStream::connect(addr).await {
                Ok(mut stream) => {
                    stream.write_all(SUBSCRIBE).await?;
                    info!(
                        host = %self.config.host,
                        port = self.config.port,
                        "connected to vMix, tally subscription sent"
                    );
                    self.codec.clear();
                    self.stream = Some(stream);
                    return Ok(());
                }
                Err(e) => {
                    debug!(attempt, error = %e, "vMix connect attempt failed");
                    sleep(Duration::from_millis(self.config.connect_delay_ms)).await;
                }
            }
        }
        Err(DeviceError::ConnectExhausted {
            attempts: self.config.connect_attempts,
        })
    }

    /// Wait for readable data within the sliced read budget
    ///
    /// Returns true if bytes were pushed into the codec. Read errors and
    /// EOF drop the connection for the next `check_connection` to repair.
    async fn wait_for_data(&mut self) -> bool {
        let slice = Duration::from_millis(self.config.read_slice_ms);
        for _ in 0..self.config.read_slices {
            let Some(stream) = self.stream.as_mut() else {
                return false;
            };
            match timeout(slice, stream.read(&mut self.read_buf)).await {
                Ok(Ok(0)) => {
                    info!("vMix closed the connection");
                    self.stream = None;
                    return false;
                }
                Ok(Ok(n)) => {
                    self.codec.push_bytes(&self.read_buf[..n]);
                    return true;
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "vMix read error");
                    self.stream = None;
                    return false;
                }
                Err(_) => {} // slice elapsed with no data
            }
        }
        false
    }
}

impl Device for VmixDevice {
    async fn init(&mut self) {
        if let Err(e) = self.connect().await {
            warn!(error = %e, "vMix unavailable, will retry on connection check");
        }
    }

    async fn handle_data(&mut self) -> Option<CameraStatus> {
        if !self.wait_for_data().await {
            return None;
        }

        let mut changed = false;
        while let Some(line) = self.codec.next_line() {
            if self.state.apply_line(&line) {
                changed = true;
                debug!(tally = ?self.state.snapshot().as_slice(), "vMix tally change");
            }
        }

        changed.then(|| self.state.snapshot())
    }

    async fn check_connection(&mut self) {
        if self.stream.is_some() {
            return;
        }
        info!("vMix disconnected, reconnecting");
        if let Err(e) = self.connect().await {
            warn!(error = %e, "vMix reconnect failed");
        }
    }
}
