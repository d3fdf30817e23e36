//! Active device ownership and switching
//!
//! Exactly one protocol device is live at any time. The selector owns
//! it; switching kinds drops the outgoing device (closing its transport
//! and aborting its poll task) before the replacement is constructed and
//! initialized.

use tally_protocol::{CameraStatus, Protocol};
use tokio::io::ReadHalf;
use tokio_serial::SerialStream;
use tracing::info;

use crate::atem::{AtemClient, AtemDevice};
use crate::config::TallyConfig;
use crate::error::DeviceError;
use crate::roland::RolandDevice;
use crate::vmix::VmixDevice;
use crate::Device;

/// The one live protocol device
///
/// A closed set of variants; the selector is the only constructor.
pub enum ActiveDevice<C> {
    /// Binary switcher protocol via the external client
    Atem(AtemDevice<C>),
    /// vMix TCP tally feed
    Vmix(VmixDevice),
    /// Roland serial poll/response
    Roland(RolandDevice<ReadHalf<SerialStream>>),
}

impl<C> std::fmt::Debug for ActiveDevice<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ActiveDevice::Atem(_) => "ActiveDevice::Atem",
            ActiveDevice::Vmix(_) => "ActiveDevice::Vmix",
            ActiveDevice::Roland(_) => "ActiveDevice::Roland",
        })
    }
}

impl<C> ActiveDevice<C> {
    /// Protocol this device speaks
    pub fn protocol(&self) -> Protocol {
        match self {
            ActiveDevice::Atem(_) => Protocol::Atem,
            ActiveDevice::Vmix(_) => Protocol::Vmix,
            ActiveDevice::Roland(_) => Protocol::Roland,
        }
    }
}

impl<C: AtemClient> Device for ActiveDevice<C> {
    async fn init(&mut self) {
        match self {
            ActiveDevice::Atem(device) => device.init().await,
            ActiveDevice::Vmix(device) => device.init().await,
            ActiveDevice::Roland(device) => device.init().await,
        }
    }

    async fn handle_data(&mut self) -> Option<CameraStatus> {
        match self {
            ActiveDevice::Atem(device) => device.handle_data().await,
            ActiveDevice::Vmix(device) => device.handle_data().await,
            ActiveDevice::Roland(device) => device.handle_data().await,
        }
    }

    async fn check_connection(&mut self) {
        match self {
            ActiveDevice::Atem(device) => device.check_connection().await,
            ActiveDevice::Vmix(device) => device.check_connection().await,
            ActiveDevice::Roland(device) => device.check_connection().await,
        }
    }
}

/// Owns the single live device and switches protocols on demand
pub struct DeviceSelector<C> {
    config: TallyConfig,
    active: Option<ActiveDevice<C>>,
}

impl<C: AtemClient> DeviceSelector<C> {
    /// Create a selector with no device selected yet
    pub fn new(config: TallyConfig) -> Self {
        Self {
            config,
            active: None,
        }
    }

    /// Protocol of the currently active device, if any
    pub fn active_protocol(&self) -> Option<Protocol> {
        self.active.as_ref().map(ActiveDevice::protocol)
    }

    /// The currently active device, if any
    pub fn active(&mut self) -> Option<&mut ActiveDevice<C>> {
        self.active.as_mut()
    }

    /// Activate the device for `protocol`
    ///
    /// Selecting the active protocol again returns the live instance
    /// unchanged. Otherwise the outgoing device is dropped first, then
    /// the replacement is constructed and initialized exactly once.
    pub async fn select(
        &mut self,
        protocol: Protocol,
    ) -> Result<&mut ActiveDevice<C>, DeviceError> {
        if self.active_protocol() != Some(protocol) {
            self.active = None;
            let mut device = self.build(protocol)?;
            device.init().await;
            info!(device = protocol.name(), "switched active tally device");
            return Ok(self.active.insert(device));
        }
        self.active.as_mut().ok_or(DeviceError::NoActiveDevice)
    }

    /// Activate a device by raw selection id
    ///
    /// Unknown ids are rejected without touching the active device.
    pub async fn select_id(&mut self, id: u8) -> Result<&mut ActiveDevice<C>, DeviceError> {
        let protocol =
            Protocol::try_from(id).map_err(|_| DeviceError::UnsupportedDevice(id))?;
        self.select(protocol).await
    }

    /// Activate the configured startup device
    pub async fn select_default(&mut self) -> Result<&mut ActiveDevice<C>, DeviceError> {
        self.select(self.config.default_device).await
    }

    fn build(&self, protocol: Protocol) -> Result<ActiveDevice<C>, DeviceError> {
        Ok(match protocol {
            Protocol::Atem => ActiveDevice::Atem(AtemDevice::new(C::open(&self.config.atem.host))),
            Protocol::Vmix => ActiveDevice::Vmix(VmixDevice::new(self.config.vmix.clone())),
            Protocol::Roland => ActiveDevice::Roland(RolandDevice::open(&self.config.roland)?),
        })
    }
}
