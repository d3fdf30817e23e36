//! ATEM switcher device
//!
//! The binary ATEM wire protocol is handled by an external client
//! library; this module consumes its already-decoded per-channel
//! program/preview booleans and turns them into change-detected color
//! snapshots.

use tally_protocol::{CameraColor, CameraStatus, MAX_CAMERAS};
use tracing::{info, warn};

use crate::Device;

/// Collaborator surface of the external ATEM client library
///
/// Channel numbering is 1-based, matching the switcher's input labels.
#[allow(async_fn_in_trait)]
pub trait AtemClient: Send {
    /// Create a client for the switcher at `host` (no I/O yet)
    fn open(host: &str) -> Self
    where
        Self: Sized;

    /// Establish the session
    async fn connect(&mut self);

    /// Keep the session alive
    ///
    /// Must be called every poll, or the switcher drops the link when
    /// its packets go unanswered.
    async fn service(&mut self);

    /// True if `channel` is on program
    fn program_tally(&self, channel: u8) -> bool;

    /// True if `channel` is on preview
    fn preview_tally(&self, channel: u8) -> bool;

    /// True if the switcher has timed the session out
    fn is_timed_out(&self) -> bool;
}

/// Change-detecting state machine over the client's tally booleans
///
/// The shadow booleans start out all-true: a camera whose real initial
/// state is "not in program/preview" emits no color update until its
/// state changes away from the assumed-true sentinel. This asymmetry is
/// inherited switcher behavior, kept as-is.
pub struct AtemState {
    status: CameraStatus,
    program_shadow: [bool; MAX_CAMERAS],
    preview_shadow: [bool; MAX_CAMERAS],
}

impl AtemState {
    /// Create a state machine with the all-true shadow sentinel
    pub fn new() -> Self {
        Self {
            status: CameraStatus::new(MAX_CAMERAS),
            program_shadow: [true; MAX_CAMERAS],
            preview_shadow: [true; MAX_CAMERAS],
        }
    }

    /// Apply one poll's worth of per-camera booleans
    ///
    /// A camera's color is rewritten only when either boolean differs
    /// from its shadow; shadows are updated unconditionally. Returns the
    /// full snapshot if any camera changed.
    pub fn apply(&mut self, tally: &[(bool, bool); MAX_CAMERAS]) -> Option<CameraStatus> {
        let mut changed = false;

        for (index, &(program, preview)) in tally.iter().enumerate() {
            if self.program_shadow[index] != program || self.preview_shadow[index] != preview {
                // Program wins over preview
                let color = if program {
                    CameraColor::Program
                } else if preview {
                    CameraColor::Preview
                } else {
                    CameraColor::Off
                };
                self.status.set(index, color);
                changed = true;
            }

            self.program_shadow[index] = program;
            self.preview_shadow[index] = preview;
        }

        changed.then_some(self.status)
    }
}

impl Default for AtemState {
    fn default() -> Self {
        Self::new()
    }
}

/// Tally device backed by the external ATEM client
pub struct AtemDevice<C> {
    client: C,
    state: AtemState,
}

impl<C: AtemClient> AtemDevice<C> {
    /// Wrap a client in a fresh device
    pub fn new(client: C) -> Self {
        Self {
            client,
            state: AtemState::new(),
        }
    }
}

impl<C: AtemClient> Device for AtemDevice<C> {
    async fn init(&mut self) {
        info!("connecting to ATEM switcher");
        self.client.connect().await;
    }

    async fn handle_data(&mut self) -> Option<CameraStatus> {
        // Keep the connection alive before reading anything; skipping
        // this even once risks the switcher dropping the session.
        self.client.service().await;

        let mut tally = [(false, false); MAX_CAMERAS];
        for (index, slot) in tally.iter_mut().enumerate() {
            let channel = index as u8 + 1;
            *slot = (
                self.client.program_tally(channel),
                self.client.preview_tally(channel),
            );
        }

        self.state.apply(&tally)
    }

    async fn check_connection(&mut self) {
        if self.client.is_timed_out() {
            warn!("ATEM session timed out, reconnecting");
            self.client.connect().await;
        }
    }
}
