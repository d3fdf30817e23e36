//! Error types for the device layer

use thiserror::Error;

/// Errors that can occur while selecting or driving a tally device
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Selection id does not name a supported device
    #[error("unsupported device id: {0}")]
    UnsupportedDevice(u8),

    /// No device has been selected yet
    #[error("no active tally device")]
    NoActiveDevice,

    /// Connection retry budget exhausted
    #[error("connection attempts exhausted after {attempts} tries")]
    ConnectExhausted { attempts: u32 },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port error
    #[error("serial error: {0}")]
    Serial(#[from] tokio_serial::Error),
}
