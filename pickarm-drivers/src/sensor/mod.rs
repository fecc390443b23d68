//! Sensor drivers

pub mod reflection;
pub mod touch;

pub use reflection::{AdcReader, AnalogReflection, Calibration};
pub use touch::TouchSwitch;
