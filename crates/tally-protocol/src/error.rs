//! Error types for tally protocol parsing

use thiserror::Error;

/// Errors that can occur while parsing tally protocol data
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Invalid frame structure
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// Unknown or unsupported device id
    #[error("unknown device id: {0}")]
    UnknownDevice(u8),

    /// Reported channel does not fit the camera array
    #[error("channel out of range: {0}")]
    ChannelOutOfRange(u8),
}
