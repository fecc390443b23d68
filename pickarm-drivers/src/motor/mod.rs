//! Motor drivers

pub mod dc_servo;
pub mod encoder;
pub mod stall;

pub use dc_servo::{DcServo, DcServoConfig};
pub use encoder::{Encoder, PulseCounter, SingleChannelEncoder};
pub use stall::StallDetector;
