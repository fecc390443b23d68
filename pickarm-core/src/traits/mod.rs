//! Hardware abstraction traits
//!
//! These traits define the interface between the sequencing logic
//! and hardware-specific implementations.

pub mod actuator;
pub mod sensor;
pub mod sound;

pub use actuator::{Actuator, ActuatorError, Direction, RunSettings, StopPolicy};
pub use sensor::{ReflectionSensor, SensorError, TouchSensor};
pub use sound::Sound;
