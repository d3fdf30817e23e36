//! Tally Device Layer
//!
//! This crate turns raw switcher transports into change-detected
//! per-camera color snapshots. Exactly one device is live at a time;
//! the [`DeviceSelector`] owns it and switches protocol implementations
//! on demand.
//!
//! # Architecture
//!
//! Each protocol has a device (transport + session handling) wrapping a
//! pure state machine (decode + change detection):
//!
//! - [`AtemDevice`]/[`AtemState`]: binary switcher protocol, decoded
//!   per-channel program/preview booleans read from an external client
//! - [`VmixDevice`]/[`VmixState`]: vMix ASCII tally lines over TCP
//! - [`RolandDevice`]/[`RolandState`]: Roland ACK-framed serial responses
//!
//! A poll loop repeatedly asks the selector for the active device and
//! calls [`Device::handle_data`]; a non-empty snapshot means at least one
//! camera changed color and is forwarded to the indicator-light driver.
//! [`Device::check_connection`] runs on a separate, lower-frequency
//! cadence to detect and repair transport-level disconnection.
//!
//! # Example
//!
//! ```rust,no_run
//! use tally_device::{Device, DeviceSelector, TallyConfig};
//! # use tally_device::AtemClient;
//! # struct MyAtemClient;
//! # impl AtemClient for MyAtemClient {
//! #     fn open(_: &str) -> Self { MyAtemClient }
//! #     async fn connect(&mut self) {}
//! #     async fn service(&mut self) {}
//! #     fn program_tally(&self, _: u8) -> bool { false }
//! #     fn preview_tally(&self, _: u8) -> bool { false }
//! #     fn is_timed_out(&self) -> bool { false }
//! # }
//!
//! # async fn run() -> Result<(), tally_device::DeviceError> {
//! let mut selector = DeviceSelector::<MyAtemClient>::new(TallyConfig::default());
//! let device = selector.select(tally_protocol::Protocol::Vmix).await?;
//! if let Some(snapshot) = device.handle_data().await {
//!     println!("tally: {:02X?}", snapshot.encode());
//! }
//! # Ok(())
//! # }
//! ```

pub mod atem;
pub mod config;
pub mod error;
pub mod roland;
pub mod selector;
pub mod vmix;

pub use atem::{AtemClient, AtemDevice, AtemState};
pub use config::{AtemConfig, RolandConfig, TallyConfig, VmixConfig};
pub use error::DeviceError;
pub use roland::{RolandDevice, RolandState};
pub use selector::{ActiveDevice, DeviceSelector};
pub use vmix::{VmixDevice, VmixState};

use tally_protocol::CameraStatus;

/// Shared contract implemented by every protocol device
///
/// Not object-safe; the closed set of implementations is dispatched
/// through [`ActiveDevice`].
#[allow(async_fn_in_trait)]
pub trait Device {
    /// Establish the protocol-specific session
    ///
    /// Opens/authenticates a connection or arms a periodic outbound
    /// poll. Called exactly once per activation by the selector.
    async fn init(&mut self);

    /// Consume available input and decode it
    ///
    /// Returns a snapshot only if at least one camera's color differs
    /// from the previous snapshot. Never blocks indefinitely; each
    /// protocol bounds its own wait.
    async fn handle_data(&mut self) -> Option<CameraStatus>;

    /// Inspect transport liveness and repair disconnection
    ///
    /// Bounded by the device's retry policy; intended for a separate,
    /// lower-frequency cadence than [`Device::handle_data`].
    async fn check_connection(&mut self);
}
