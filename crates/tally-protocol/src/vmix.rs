//! vMix TCP Tally Protocol Implementation
//!
//! vMix publishes tally state as ASCII lines over its TCP API
//! (fixed port 8099). A client subscribes once and then receives an
//! update line whenever the mix changes.
//!
//! # Format
//! - Subscription: `SUBSCRIBE TALLY\r\n`
//! - Updates: `TALLY OK <codes>\r\n` with one status byte per camera
//! - Status bytes are raw color codes: `0x30` off, `0x31` preview,
//!   `0x32` program
//!
//! Anything else on the connection (acknowledgements, XML responses,
//! unrelated chatter) is not a tally update and is skipped.

use crate::MAX_CAMERAS;

/// Prefix of a tally update line
pub const TALLY_OK: &[u8] = b"TALLY OK";

/// Subscription command sent once after connecting
pub const SUBSCRIBE: &[u8] = b"SUBSCRIBE TALLY\r\n";

/// Maximum line length (reasonable limit to prevent buffer growth)
const MAX_LINE_LEN: usize = 256;

/// Streaming line extractor for the vMix TCP feed
///
/// Accumulates raw bytes and yields complete CR/LF-terminated lines,
/// keeping any partial tail buffered for the next read.
pub struct VmixCodec {
    buffer: Vec<u8>,
}

impl VmixCodec {
    /// Create a new vMix codec
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(128),
        }
    }

    /// Push raw bytes into the codec's buffer
    pub fn push_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);

        // Prevent buffer overflow on a feed that never sends a newline
        if self.buffer.len() > MAX_LINE_LEN * 4 {
            tracing::debug!("discarding {} unterminated bytes", self.buffer.len());
            let start = self.buffer.len() - MAX_LINE_LEN;
            self.buffer = self.buffer[start..].to_vec();
        }
    }

    /// Try to extract the next complete line, without its terminator
    pub fn next_line(&mut self) -> Option<Vec<u8>> {
        let nl_pos = self.buffer.iter().position(|&b| b == b'\n')?;

        let mut line: Vec<u8> = self.buffer.drain(..=nl_pos).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }

        Some(line)
    }

    /// Clear the internal buffer
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for VmixCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-camera status code bytes of a tally update line
///
/// Returns `None` for lines that do not carry tally state. Camera 1's
/// byte sits one position past the `TALLY OK` prefix (the separator),
/// so a short line covers only the leading cameras: the returned slice
/// is exactly as long as the line allows, capped at [`MAX_CAMERAS`].
pub fn status_bytes(line: &[u8]) -> Option<&[u8]> {
    let rest = line.strip_prefix(TALLY_OK)?;
    let codes = rest.get(1..).unwrap_or(&[]);
    Some(&codes[..codes.len().min(MAX_CAMERAS)])
}
