//! Roland Smart Tally Serial Protocol Implementation
//!
//! Roland video switchers report panel state over a 9600 baud serial
//! link. The controller polls with a fixed request and the switcher
//! answers with an ACK-terminated ASCII frame.
//!
//! # Frame Format
//! ```text
//! request:  STX 'Q' 'P' 'L' ':' '8' ';'
//! response: STX 'Q' 'P' 'L' ':' p0 ',' p1 ',' ... ';' ACK
//! ```
//!
//! - `STX` (0x02): frame start
//! - `ACK` (0x06): end of response
//! - Parameters: up to 8 decimal integers split on `,`/`;`
//!
//! # Response parameters
//! - 0: program channel, `0` (CH 1) to `3` (CH 4)
//! - 1: preset channel, `0` (CH 1) to `3` (CH 4)
//! - 2: \[PinP\] button, `0` off / `1` on
//! - 3: \[SPLIT\] button, `0` off / `1` on
//! - 4: \[DSK\] button, `0` off / `1` on
//! - 5: transition buttons, `0` wipe / `1` mix / `2` cut
//! - 6: output fade level, `0`-`255`
//! - 7: A/B fader position, `0`-`255`
//!
//! Example: `stx QPL:0,1,0,1,1,0,100,255; ack`

use crate::error::ParseError;
use crate::SERIAL_CAMERAS;

/// Frame start byte
pub const STX: u8 = 0x02;
/// Response terminator byte
pub const ACK: u8 = 0x06;
/// Preamble shared by requests and responses: `STX 'Q' 'P' 'L' ':'`
pub const PREAMBLE: &[u8] = &[STX, b'Q', b'P', b'L', b':'];
/// Fixed poll request asking for all panel parameters
pub const POLL_REQUEST: [u8; 7] = [STX, b'Q', b'P', b'L', b':', b'8', b';'];

/// Parameters carried by a full status response
pub const MAX_PARAMS: usize = 8;

/// Maximum frame length (reasonable limit to prevent buffer growth)
const MAX_FRAME_LEN: usize = 64;

/// Named parameter indices of a status response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolandParam {
    /// Program channel
    Program = 0,
    /// Preset (preview) channel
    Preset = 1,
    /// \[PinP\] button
    PinP = 2,
    /// \[SPLIT\] button
    Split = 3,
    /// \[DSK\] button
    Dsk = 4,
    /// Transition buttons
    Transition = 5,
    /// Output fade level
    Fade = 6,
    /// A/B fader position
    Fader = 7,
}

/// A decoded status response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolandFrame {
    params: [u8; MAX_PARAMS],
}

impl RolandFrame {
    /// Decode a frame (the bytes yielded by [`RolandCodec::next_frame`])
    ///
    /// Verifies the preamble and tokenizes the remainder into decimal
    /// parameters. Extra tokens beyond [`MAX_PARAMS`] are ignored;
    /// missing trailing tokens leave their slots at zero.
    pub fn decode(frame: &[u8]) -> Result<Self, ParseError> {
        let rest = frame
            .strip_prefix(PREAMBLE)
            .ok_or_else(|| ParseError::InvalidFrame("missing QPL preamble".into()))?;

        let mut params = [0u8; MAX_PARAMS];
        let tokens = rest
            .split(|&b| b == b',' || b == b';')
            .filter(|t| !t.is_empty())
            .take(MAX_PARAMS);
        for (slot, token) in params.iter_mut().zip(tokens) {
            *slot = std::str::from_utf8(token)
                .ok()
                .and_then(|t| t.trim().parse().ok())
                .unwrap_or(0);
        }

        Ok(Self { params })
    }

    /// Raw value of a named parameter
    pub fn param(&self, param: RolandParam) -> u8 {
        self.params[param as usize]
    }

    /// Channel currently on program (0-based)
    pub fn program_channel(&self) -> u8 {
        self.param(RolandParam::Program)
    }

    /// Channel currently on preset/preview (0-based)
    pub fn preview_channel(&self) -> u8 {
        self.param(RolandParam::Preset)
    }

    /// Program and preview channels, validated against the camera array
    ///
    /// The protocol guarantees in-range channels, but a frame is rejected
    /// here rather than trusted with an unchecked array index.
    pub fn tally_channels(&self) -> Result<(usize, usize), ParseError> {
        let program = self.program_channel();
        let preview = self.preview_channel();
        for channel in [program, preview] {
            if usize::from(channel) >= SERIAL_CAMERAS {
                return Err(ParseError::ChannelOutOfRange(channel));
            }
        }
        Ok((usize::from(program), usize::from(preview)))
    }
}

/// Streaming frame extractor for the Roland serial link
///
/// Accumulates raw bytes and yields one frame per observed ACK byte,
/// with the ACK itself stripped.
pub struct RolandCodec {
    buffer: Vec<u8>,
}

impl RolandCodec {
    /// Create a new Roland codec
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(64),
        }
    }

    /// Push raw bytes into the codec's buffer
    pub fn push_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);

        // Prevent buffer overflow on a link that never sends an ACK
        if self.buffer.len() > MAX_FRAME_LEN * 4 {
            tracing::debug!("discarding {} unterminated bytes", self.buffer.len());
            let start = self.buffer.len() - MAX_FRAME_LEN;
            self.buffer = self.buffer[start..].to_vec();
        }
    }

    /// Try to extract the next complete frame, without its ACK terminator
    pub fn next_frame(&mut self) -> Option<Vec<u8>> {
        let ack_pos = self.buffer.iter().position(|&b| b == ACK)?;

        let mut frame: Vec<u8> = self.buffer.drain(..=ack_pos).collect();
        frame.pop();

        Some(frame)
    }

    /// Clear the internal buffer
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for RolandCodec {
    fn default() -> Self {
        Self::new()
    }
}
