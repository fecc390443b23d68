//! Sensor traits
//!
//! The rig has two sensors: a touch switch marking the base datum and a
//! reflectance sensor that sees the white beam when the elbow is up.

/// Errors that can occur when reading a sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// The underlying pin or ADC read failed
    ReadFailed,
}

/// Binary touch sensor
pub trait TouchSensor {
    /// Check if the switch is currently pressed
    fn pressed(&mut self) -> Result<bool, SensorError>;
}

/// Reflected-light sensor
pub trait ReflectionSensor {
    /// Reflected light intensity, 0 (dark) to 100 (bright)
    fn reflection(&mut self) -> Result<u8, SensorError>;
}
