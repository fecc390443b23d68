//! Touch switch on a GPIO input

use embedded_hal::digital::InputPin;
use pickarm_core::traits::{SensorError, TouchSensor};

/// Mechanical switch read from a digital input
///
/// The usual wiring closes the switch to ground against a pull-up, so a
/// pressed switch reads low.
pub struct TouchSwitch<P> {
    pin: P,
}

impl<P: InputPin> TouchSwitch<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }
}

impl<P: InputPin> TouchSensor for TouchSwitch<P> {
    fn pressed(&mut self) -> Result<bool, SensorError> {
        self.pin.is_low().map_err(|_| SensorError::ReadFailed)
    }
}
