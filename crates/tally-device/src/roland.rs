//! Roland serial tally device
//!
//! A spawned task polls the switcher with the fixed status request on a
//! configurable period; `handle_data` drains the serial link, reassembles
//! ACK-terminated response frames and turns them into change-detected
//! color snapshots.
//!
//! The poll task owns the serial write half and nothing else. The
//! inbound buffer and the previous snapshot are owned exclusively by the
//! poll-handling side.

use std::time::Duration;

use tally_protocol::roland::{RolandCodec, RolandFrame, POLL_REQUEST};
use tally_protocol::{CameraColor, CameraStatus, SERIAL_CAMERAS};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf};
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout};
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, info, warn};

use crate::config::RolandConfig;
use crate::error::DeviceError;
use crate::Device;

/// Bounded wait for one serial read while draining available bytes
const READ_SLICE: Duration = Duration::from_millis(20);

/// Change-detecting state machine over Roland status frames
pub struct RolandState {
    status: CameraStatus,
    previous: CameraStatus,
}

impl RolandState {
    /// Create a state machine with an all-off previous snapshot
    pub fn new() -> Self {
        Self {
            status: CameraStatus::new(SERIAL_CAMERAS),
            previous: CameraStatus::new(SERIAL_CAMERAS),
        }
    }

    /// Apply the program/preview channels of one decoded frame
    ///
    /// Rebuilds the snapshot from scratch; preview overwrites program
    /// when both land on the same channel. Returns the snapshot only if
    /// it differs from the previous one.
    pub fn apply(&mut self, program: usize, preview: usize) -> Option<CameraStatus> {
        self.status.clear();
        self.status.set(program, CameraColor::Program);
        self.status.set(preview, CameraColor::Preview);

        if self.status != self.previous {
            self.previous = self.status;
            Some(self.status)
        } else {
            None
        }
    }
}

impl Default for RolandState {
    fn default() -> Self {
        Self::new()
    }
}

/// Tally device for the Roland serial link
///
/// Generic over the reader half so tests can drive it through an
/// in-memory duplex stream.
pub struct RolandDevice<R> {
    reader: R,
    writer: Option<Box<dyn AsyncWrite + Send + Unpin>>,
    poll_interval: Duration,
    poll_task: Option<JoinHandle<()>>,
    codec: RolandCodec,
    state: RolandState,
    read_buf: Vec<u8>,
}

impl RolandDevice<ReadHalf<SerialStream>> {
    /// Open the configured serial port
    pub fn open(config: &RolandConfig) -> Result<Self, DeviceError> {
        let stream = tokio_serial::new(config.port.as_str(), config.baud_rate).open_native_async()?;
        info!(port = %config.port, baud = config.baud_rate, "opened Roland serial port");
        let (reader, writer) = tokio::io::split(stream);
        Ok(Self::with_io(
            reader,
            writer,
            Duration::from_millis(config.poll_interval_ms),
        ))
    }
}

impl<R: AsyncRead + Unpin + Send> RolandDevice<R> {
    /// Build a device over an arbitrary transport pair
    pub fn with_io(
        reader: R,
        writer: impl AsyncWrite + Send + Unpin + 'static,
        poll_interval: Duration,
    ) -> Self {
        Self {
            reader,
            writer: Some(Box::new(writer)),
            poll_interval,
            poll_task: None,
            codec: RolandCodec::new(),
            state: RolandState::new(),
            read_buf: vec![0u8; 256],
        }
    }

    /// Drain currently available bytes into the codec
    async fn drain_input(&mut self) {
        loop {
            match timeout(READ_SLICE, self.reader.read(&mut self.read_buf)).await {
                Ok(Ok(0)) => break,
                Ok(Ok(n)) => self.codec.push_bytes(&self.read_buf[..n]),
                Ok(Err(e)) => {
                    warn!(error = %e, "Roland read error");
                    break;
                }
                Err(_) => break, // nothing pending
            }
        }
    }
}

impl<R: AsyncRead + Unpin + Send> Device for RolandDevice<R> {
    async fn init(&mut self) {
        // Arm the periodic status poll; it owns the write half and never
        // touches the inbound state.
        let Some(mut writer) = self.writer.take() else {
            return;
        };
        let period = self.poll_interval;
        info!(period_ms = period.as_millis() as u64, "arming Roland status poll");
        self.poll_task = Some(tokio::spawn(async move {
            let mut ticker = interval(period);
            loop {
                ticker.tick().await;
                if writer.write_all(&POLL_REQUEST).await.is_err() {
                    break;
                }
                if writer.flush().await.is_err() {
                    break;
                }
            }
        }));
    }

    async fn handle_data(&mut self) -> Option<CameraStatus> {
        self.drain_input().await;

        let mut update = None;
        while let Some(raw) = self.codec.next_frame() {
            let frame = match RolandFrame::decode(&raw) {
                Ok(frame) => frame,
                Err(e) => {
                    debug!(error = %e, "discarding non-status frame");
                    continue;
                }
            };
            match frame.tally_channels() {
                Ok((program, preview)) => {
                    if let Some(snapshot) = self.state.apply(program, preview) {
                        debug!(tally = ?snapshot.as_slice(), "Roland tally change");
                        update = Some(snapshot);
                    }
                }
                Err(e) => warn!(error = %e, "rejecting Roland frame"),
            }
        }
        update
    }

    async fn check_connection(&mut self) {
        // The serial link has no liveness signal to act on.
    }
}

impl<R> Drop for RolandDevice<R> {
    fn drop(&mut self) {
        if let Some(task) = self.poll_task.take() {
            task.abort();
        }
    }
}
