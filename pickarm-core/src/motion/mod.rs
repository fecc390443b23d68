//! Motion helpers
//!
//! Unit conversion through gear trains and acceleration-limited speed
//! ramps. Used by actuator drivers; the sequencers only see degrees.

pub mod angle;
pub mod profile;

pub use angle::AngleMap;
pub use profile::SpeedProfile;
