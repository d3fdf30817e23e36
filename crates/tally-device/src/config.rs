//! Device configuration

use serde::{Deserialize, Serialize};
use tally_protocol::Protocol;

/// Top-level tally controller configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TallyConfig {
    /// Device selected at startup
    #[serde(default)]
    pub default_device: Protocol,
    /// ATEM switcher connection
    #[serde(default)]
    pub atem: AtemConfig,
    /// vMix TCP feed connection
    #[serde(default)]
    pub vmix: VmixConfig,
    /// Roland serial link
    #[serde(default)]
    pub roland: RolandConfig,
}

/// ATEM switcher connection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AtemConfig {
    /// Switcher address
    pub host: String,
}

impl Default for AtemConfig {
    fn default() -> Self {
        Self {
            host: "192.168.0.100".to_string(),
        }
    }
}

/// vMix TCP feed settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VmixConfig {
    /// Server address
    pub host: String,
    /// TCP API port
    #[serde(default = "default_vmix_port")]
    pub port: u16,
    /// Connection attempts before giving up until the next check
    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: u32,
    /// Delay between connection attempts (ms)
    #[serde(default = "default_connect_delay")]
    pub connect_delay_ms: u64,
    /// Number of read slices to wait for data in one poll
    #[serde(default = "default_read_slices")]
    pub read_slices: u32,
    /// Length of one read slice (ms)
    #[serde(default = "default_read_slice")]
    pub read_slice_ms: u64,
}

fn default_vmix_port() -> u16 {
    8099
}

fn default_connect_attempts() -> u32 {
    5
}

fn default_connect_delay() -> u64 {
    1000
}

fn default_read_slices() -> u32 {
    5
}

fn default_read_slice() -> u64 {
    20
}

impl Default for VmixConfig {
    fn default() -> Self {
        Self {
            host: "192.168.0.100".to_string(),
            port: default_vmix_port(),
            connect_attempts: default_connect_attempts(),
            connect_delay_ms: default_connect_delay(),
            read_slices: default_read_slices(),
            read_slice_ms: default_read_slice(),
        }
    }
}

/// Roland serial link settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RolandConfig {
    /// Serial port path
    pub port: String,
    /// Baud rate
    #[serde(default = "default_roland_baud")]
    pub baud_rate: u32,
    /// Outbound poll period (ms)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

fn default_roland_baud() -> u32 {
    9600
}

fn default_poll_interval() -> u64 {
    500
}

impl Default for RolandConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: default_roland_baud(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}
