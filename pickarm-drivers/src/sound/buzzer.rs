//! Active buzzer on a GPIO output

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use pickarm_core::traits::Sound;

/// Buzzer that sounds while its pin is high
pub struct Buzzer<P, D> {
    pin: P,
    delay: D,
    /// Tone length of one beep
    on_ms: u32,
    /// Silence between beeps
    off_ms: u32,
}

impl<P: OutputPin, D: DelayNs> Buzzer<P, D> {
    pub fn new(pin: P, delay: D, on_ms: u32, off_ms: u32) -> Self {
        let mut buzzer = Self {
            pin,
            delay,
            on_ms,
            off_ms,
        };
        // Start silent
        let _ = buzzer.pin.set_low();
        buzzer
    }

    /// 100 ms beeps separated by 100 ms
    pub fn with_default_timing(pin: P, delay: D) -> Self {
        Self::new(pin, delay, 100, 100)
    }
}

impl<P: OutputPin, D: DelayNs> Sound for Buzzer<P, D> {
    fn beeps(&mut self, count: u8) {
        for i in 0..count {
            if i > 0 {
                self.delay.delay_ms(self.off_ms);
            }
            // A stuck pin only loses the beep
            let _ = self.pin.set_high();
            self.delay.delay_ms(self.on_ms);
            let _ = self.pin.set_low();
        }
    }
}
