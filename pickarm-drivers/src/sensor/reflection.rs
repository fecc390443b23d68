//! Analog reflectance sensor
//!
//! An IR LED and phototransistor pair read through the ADC. The raw value
//! is scaled to 0-100 between two calibration points taken on the rig:
//! the reading with nothing in view (dark) and the reading off the white
//! marker (bright). Either point may be the larger raw value, depending on
//! how the phototransistor is wired.

use pickarm_core::traits::{ReflectionSensor, SensorError};

/// ADC reading trait for platform abstraction
pub trait AdcReader {
    /// Read ADC value (12-bit, 0-4095)
    fn read(&mut self) -> Result<u16, SensorError>;
}

/// Raw ADC values at 0 % and 100 % reflection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    pub dark: u16,
    pub bright: u16,
}

impl Calibration {
    /// Phototransistor to ground with a pull-up: brighter reads lower
    pub const PULL_UP: Calibration = Calibration {
        dark: 3800,
        bright: 300,
    };

    /// Scale a raw reading to 0-100
    pub fn percent(&self, raw: u16) -> u8 {
        let span = self.bright as i32 - self.dark as i32;
        if span == 0 {
            return 0;
        }
        let scaled = (raw as i32 - self.dark as i32) * 100 / span;
        scaled.clamp(0, 100) as u8
    }
}

/// Reflectance sensor on an ADC channel
pub struct AnalogReflection<ADC> {
    adc: ADC,
    calibration: Calibration,
}

impl<ADC: AdcReader> AnalogReflection<ADC> {
    pub fn new(adc: ADC, calibration: Calibration) -> Self {
        Self { adc, calibration }
    }

    /// Unscaled ADC reading, for calibrating
    pub fn raw(&mut self) -> Result<u16, SensorError> {
        self.adc.read()
    }
}

impl<ADC: AdcReader> ReflectionSensor for AnalogReflection<ADC> {
    fn reflection(&mut self) -> Result<u8, SensorError> {
        let raw = self.adc.read()?;
        Ok(self.calibration.percent(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockAdc {
        value: Option<u16>,
    }

    impl AdcReader for MockAdc {
        fn read(&mut self) -> Result<u16, SensorError> {
            self.value.ok_or(SensorError::ReadFailed)
        }
    }

    #[test]
    fn test_rising_calibration() {
        let calibration = Calibration {
            dark: 100,
            bright: 1100,
        };
        assert_eq!(calibration.percent(100), 0);
        assert_eq!(calibration.percent(420), 32);
        assert_eq!(calibration.percent(1100), 100);
        // Out of range readings clamp
        assert_eq!(calibration.percent(0), 0);
        assert_eq!(calibration.percent(4095), 100);
    }

    #[test]
    fn test_falling_calibration() {
        let calibration = Calibration::PULL_UP;
        assert_eq!(calibration.percent(3800), 0);
        assert_eq!(calibration.percent(300), 100);
        assert_eq!(calibration.percent(2050), 50);
        assert_eq!(calibration.percent(4095), 0);
    }

    #[test]
    fn test_degenerate_calibration() {
        let calibration = Calibration {
            dark: 500,
            bright: 500,
        };
        assert_eq!(calibration.percent(500), 0);
    }

    #[test]
    fn test_reflection_sensor() {
        let mut sensor = AnalogReflection::new(
            MockAdc { value: Some(2050) },
            Calibration::PULL_UP,
        );
        assert_eq!(sensor.reflection(), Ok(50));
        assert_eq!(sensor.raw(), Ok(2050));

        sensor.adc.value = None;
        assert_eq!(sensor.reflection(), Err(SensorError::ReadFailed));
    }
}
