//! Virtual switcher simulation
//!
//! Generates protocol-accurate tally output when its mix state changes.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tally_protocol::roland::{ACK, PREAMBLE};
use tally_protocol::{Protocol, MAX_CAMERAS};
use tracing::debug;

/// A simulated switcher that emits protocol-accurate tally updates
#[derive(Debug)]
pub struct VirtualSwitcher {
    /// Protocol used for encoding updates
    protocol: Protocol,
    /// Channel currently on program (0-based)
    program: u8,
    /// Channel currently on preview (0-based)
    preview: u8,
    /// Pending output bytes (protocol-encoded)
    pending_output: VecDeque<Vec<u8>>,
}

/// Configuration for creating a virtual switcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualSwitcherConfig {
    /// Protocol to use for output encoding
    pub protocol: Protocol,
    /// Initial program channel (0-based)
    pub initial_program: u8,
    /// Initial preview channel (0-based)
    pub initial_preview: u8,
}

impl Default for VirtualSwitcherConfig {
    fn default() -> Self {
        Self {
            protocol: Protocol::Vmix,
            initial_program: 0,
            initial_preview: 1,
        }
    }
}

impl VirtualSwitcher {
    /// Create a virtual switcher with camera 1 on program, 2 on preview
    pub fn new(protocol: Protocol) -> Self {
        Self {
            protocol,
            program: 0,
            preview: 1,
            pending_output: VecDeque::new(),
        }
    }

    /// Create a virtual switcher from configuration
    pub fn from_config(config: VirtualSwitcherConfig) -> Self {
        Self {
            protocol: config.protocol,
            program: config.initial_program,
            preview: config.initial_preview,
            pending_output: VecDeque::new(),
        }
    }

    /// Channel currently on program (0-based)
    pub fn program(&self) -> u8 {
        self.program
    }

    /// Channel currently on preview (0-based)
    pub fn preview(&self) -> u8 {
        self.preview
    }

    /// Cut to a new program/preview pair and enqueue the wire update
    pub fn set_tally(&mut self, program: u8, preview: u8) {
        self.program = program;
        self.preview = preview;
        self.emit_update();
    }

    /// Enqueue the current state without changing it
    ///
    /// Roland switchers answer every poll, changed or not; this models
    /// the unchanged response.
    pub fn emit_update(&mut self) {
        let bytes = match self.protocol {
            Protocol::Vmix => self.encode_vmix_line(),
            Protocol::Roland => self.encode_roland_frame(),
            // The ATEM binary protocol lives in the external client;
            // there is nothing to emulate at the byte level here.
            Protocol::Atem => return,
        };
        debug!(protocol = self.protocol.name(), len = bytes.len(), "queued tally update");
        self.pending_output.push_back(bytes);
    }

    /// Get the next pending protocol-encoded update
    pub fn take_output(&mut self) -> Option<Vec<u8>> {
        self.pending_output.pop_front()
    }

    fn encode_vmix_line(&self) -> Vec<u8> {
        let mut line = b"TALLY OK ".to_vec();
        for camera in 0..MAX_CAMERAS as u8 {
            let code = if camera == self.program {
                b'2'
            } else if camera == self.preview {
                b'1'
            } else {
                b'0'
            };
            line.push(code);
        }
        line.extend_from_slice(b"\r\n");
        line
    }

    fn encode_roland_frame(&self) -> Vec<u8> {
        let mut frame = PREAMBLE.to_vec();
        frame.extend_from_slice(
            format!("{},{},0,0,0,0,128,255;", self.program, self.preview).as_bytes(),
        );
        frame.push(ACK);
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vmix_line_encoding() {
        let mut switcher = VirtualSwitcher::new(Protocol::Vmix);
        switcher.set_tally(0, 1);
        assert_eq!(switcher.take_output().as_deref(), Some(&b"TALLY OK 21000000\r\n"[..]));
        assert_eq!(switcher.take_output(), None);
    }

    #[test]
    fn test_roland_frame_encoding() {
        let mut switcher = VirtualSwitcher::new(Protocol::Roland);
        switcher.set_tally(2, 3);
        assert_eq!(
            switcher.take_output().as_deref(),
            Some(&b"\x02QPL:2,3,0,0,0,0,128,255;\x06"[..]),
        );
    }

    #[test]
    fn test_atem_emits_no_bytes() {
        let mut switcher = VirtualSwitcher::new(Protocol::Atem);
        switcher.set_tally(0, 1);
        assert_eq!(switcher.take_output(), None);
    }

    #[test]
    fn test_from_config() {
        let mut switcher = VirtualSwitcher::from_config(VirtualSwitcherConfig {
            protocol: Protocol::Roland,
            initial_program: 3,
            initial_preview: 0,
        });
        assert_eq!(switcher.program(), 3);
        assert_eq!(switcher.preview(), 0);

        // Nothing is queued until the first update is emitted
        assert_eq!(switcher.take_output(), None);
        switcher.emit_update();
        assert!(switcher.take_output().is_some());
    }
}
