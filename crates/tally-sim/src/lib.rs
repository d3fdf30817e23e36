//! Tally Simulation Library
//!
//! This crate provides a simulated video switcher for testing tally
//! devices without physical hardware:
//!
//! - **VirtualSwitcher**: holds a program/preview state and emits
//!   protocol-accurate vMix lines or Roland frames on every change
//!
//! # Example
//!
//! ```rust
//! use tally_sim::VirtualSwitcher;
//! use tally_protocol::Protocol;
//!
//! let mut switcher = VirtualSwitcher::new(Protocol::Vmix);
//! switcher.set_tally(0, 1);
//!
//! while let Some(bytes) = switcher.take_output() {
//!     println!("switcher output: {:02X?}", bytes);
//! }
//! ```

pub mod switcher;

pub use switcher::{VirtualSwitcher, VirtualSwitcherConfig};
