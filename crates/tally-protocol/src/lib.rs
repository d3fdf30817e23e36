//! Tally Protocol Library
//!
//! This crate provides parsing for the tally feeds of video production
//! switchers:
//!
//! - **vMix**: ASCII lines over TCP, one status byte per camera
//! - **Roland**: ACK-terminated ASCII frames over a 9600 baud serial link
//! - **ATEM**: binary/UDP protocol, decoded by an external client library
//!   (only the normalized color model lives here)
//!
//! # Architecture
//!
//! Each protocol module provides:
//! - A streaming frame extractor that handles partial data
//! - Frame decoding into typed values
//!
//! The normalized output is a [`CameraStatus`] snapshot: one
//! [`CameraColor`] per camera slot, using the wire codes consumed by the
//! indicator-light driver (`0x30` off, `0x31` preview, `0x32` program).
//!
//! # Example
//!
//! ```rust
//! use tally_protocol::roland::{RolandCodec, RolandFrame};
//!
//! let mut codec = RolandCodec::new();
//! codec.push_bytes(b"\x02QPL:0,1,0,1,1,0,100,255;\x06");
//!
//! let raw = codec.next_frame().unwrap();
//! let frame = RolandFrame::decode(&raw).unwrap();
//! assert_eq!(frame.program_channel(), 0);
//! assert_eq!(frame.preview_channel(), 1);
//! ```

pub mod error;
pub mod roland;
pub mod vmix;

pub use error::ParseError;

/// Camera slots carried by the network tally protocols
pub const MAX_CAMERAS: usize = 8;

/// Camera slots carried by the Roland serial protocol
pub const SERIAL_CAMERAS: usize = 4;

/// Identifies which switcher protocol a tally source speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Protocol {
    /// Blackmagic ATEM binary protocol (via an external client)
    #[default]
    Atem,
    /// vMix TCP tally feed (ASCII lines)
    Vmix,
    /// Roland smart tally serial protocol (ASCII poll/response)
    Roland,
}

impl Protocol {
    /// Returns a human-readable name for the protocol
    pub fn name(&self) -> &'static str {
        match self {
            Protocol::Atem => "ATEM",
            Protocol::Vmix => "vMix",
            Protocol::Roland => "Roland",
        }
    }

    /// Number of camera slots a snapshot for this protocol carries
    pub fn camera_count(&self) -> usize {
        match self {
            Protocol::Atem | Protocol::Vmix => MAX_CAMERAS,
            Protocol::Roland => SERIAL_CAMERAS,
        }
    }
}

impl TryFrom<u8> for Protocol {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Protocol::Atem),
            1 => Ok(Protocol::Vmix),
            2 => Ok(Protocol::Roland),
            _ => Err(ParseError::UnknownDevice(value)),
        }
    }
}

/// Normalized per-camera tally color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraColor {
    /// Camera is neither live nor selected
    #[default]
    Off,
    /// Camera is selected as the next on-air source
    Preview,
    /// Camera is on-air
    Program,
}

impl CameraColor {
    /// Wire code consumed by the indicator-light driver
    pub fn code(self) -> u8 {
        match self {
            CameraColor::Off => 0x30,
            CameraColor::Preview => 0x31,
            CameraColor::Program => 0x32,
        }
    }

    /// Decode a wire code byte
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x30 => Some(CameraColor::Off),
            0x31 => Some(CameraColor::Preview),
            0x32 => Some(CameraColor::Program),
            _ => None,
        }
    }
}

impl std::fmt::Display for CameraColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CameraColor::Off => "off",
            CameraColor::Preview => "preview",
            CameraColor::Program => "program",
        };
        f.write_str(name)
    }
}

/// A full per-camera color snapshot at a point in time
///
/// Backed by a fixed array; the active length is set once per protocol
/// (8 for the network protocols, 4 for the serial protocol) and never
/// changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraStatus {
    colors: [CameraColor; MAX_CAMERAS],
    len: usize,
}

impl CameraStatus {
    /// Create a snapshot with `len` camera slots, all off
    ///
    /// # Panics
    /// Panics if `len` exceeds [`MAX_CAMERAS`].
    pub fn new(len: usize) -> Self {
        assert!(len <= MAX_CAMERAS, "snapshot larger than {MAX_CAMERAS} slots");
        Self {
            colors: [CameraColor::Off; MAX_CAMERAS],
            len,
        }
    }

    /// Number of camera slots
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the snapshot has no camera slots
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Color of the camera at `index`, if in range
    pub fn get(&self, index: usize) -> Option<CameraColor> {
        self.as_slice().get(index).copied()
    }

    /// Set the color of the camera at `index`
    ///
    /// Out-of-range writes are rejected; callers are expected to have
    /// validated the index against the snapshot length.
    pub fn set(&mut self, index: usize, color: CameraColor) -> bool {
        if index < self.len {
            self.colors[index] = color;
            true
        } else {
            false
        }
    }

    /// Reset every slot to [`CameraColor::Off`]
    pub fn clear(&mut self) {
        self.colors[..self.len].fill(CameraColor::Off);
    }

    /// The snapshot as a slice, one entry per camera
    pub fn as_slice(&self) -> &[CameraColor] {
        &self.colors[..self.len]
    }

    /// Encode the snapshot to its wire format, one code byte per camera
    pub fn encode(&self) -> Vec<u8> {
        self.as_slice().iter().map(|c| c.code()).collect()
    }
}
