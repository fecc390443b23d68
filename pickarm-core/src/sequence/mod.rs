//! Motion sequences
//!
//! Homing runs once at startup; pick and release alternate afterwards.
//! Every step blocks until its motion completes, so the order of steps is
//! the order of physical motion.

pub mod homing;
pub mod pick_place;
pub mod wait;

pub use homing::{configure, home, HomingReport};
pub use pick_place::{pick, release};
pub use wait::{wait_until, Timeout, WaitError, WaitPolicy};
