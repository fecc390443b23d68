//! Board-agnostic core logic for the pick-and-place arm firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (actuator, touch/reflection sensor, sound)
//! - Rig configuration types and the embedded TOML parser
//! - Angle mapping through gear trains and acceleration-limited speed ramps
//! - Sensor-gated wait primitive
//! - Homing and pick/release sequencers
//! - Cycle state machine and the controller that drives it

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod controller;
pub mod error;
pub mod motion;
pub mod rig;
pub mod sequence;
pub mod state;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use controller::{Controller, Transition};
pub use error::ArmError;
pub use rig::{Arm, Rig};
