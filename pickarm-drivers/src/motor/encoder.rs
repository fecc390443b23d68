//! Motor position feedback
//!
//! The board counts single-channel encoder pulses in hardware. A single
//! channel carries no direction, so the count is signed with the direction
//! the motor is being driven in.

/// Signed position source in encoder counts
pub trait Encoder {
    /// Accumulated count
    fn count(&mut self) -> i32;

    /// Direction the motor is being driven: 1, -1, or 0 when unpowered
    ///
    /// Quadrature encoders ignore this.
    fn motion_hint(&mut self, _direction: i32) {}
}

/// Free-running hardware pulse counter
pub trait PulseCounter {
    /// Pulses seen so far, wrapping at `u16::MAX`
    fn pulses(&mut self) -> u16;
}

/// Signed count from a single-channel pulse counter
///
/// Pulses that arrive while unpowered (coasting down) are counted in the
/// last driven direction.
#[derive(Debug)]
pub struct SingleChannelEncoder<C> {
    counter: C,
    last_pulses: u16,
    count: i32,
    direction: i32,
}

impl<C: PulseCounter> SingleChannelEncoder<C> {
    pub fn new(mut counter: C) -> Self {
        let last_pulses = counter.pulses();
        Self {
            counter,
            last_pulses,
            count: 0,
            direction: 1,
        }
    }

    /// Fold pulses since the last poll into the count
    fn accumulate(&mut self) {
        let pulses = self.counter.pulses();
        let delta = pulses.wrapping_sub(self.last_pulses) as i32;
        self.last_pulses = pulses;
        self.count = self.count.wrapping_add(delta * self.direction);
    }
}

impl<C: PulseCounter> Encoder for SingleChannelEncoder<C> {
    fn count(&mut self) -> i32 {
        self.accumulate();
        self.count
    }

    fn motion_hint(&mut self, direction: i32) {
        // Pulses so far belong to the old direction
        self.accumulate();
        if direction != 0 {
            self.direction = direction.signum();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    struct MockCounter<'a> {
        pulses: &'a Cell<u16>,
    }

    impl PulseCounter for MockCounter<'_> {
        fn pulses(&mut self) -> u16 {
            self.pulses.get()
        }
    }

    #[test]
    fn test_counts_in_driven_direction() {
        let pulses = Cell::new(0);
        let mut encoder = SingleChannelEncoder::new(MockCounter { pulses: &pulses });

        encoder.motion_hint(1);
        pulses.set(40);
        assert_eq!(encoder.count(), 40);

        encoder.motion_hint(-1);
        pulses.set(100);
        assert_eq!(encoder.count(), -20);
    }

    #[test]
    fn test_coasting_keeps_last_direction() {
        let pulses = Cell::new(0);
        let mut encoder = SingleChannelEncoder::new(MockCounter { pulses: &pulses });

        encoder.motion_hint(-1);
        pulses.set(10);
        encoder.motion_hint(0);
        pulses.set(15);
        assert_eq!(encoder.count(), -15);
    }

    #[test]
    fn test_counter_wraps() {
        let pulses = Cell::new(u16::MAX - 5);
        let mut encoder = SingleChannelEncoder::new(MockCounter { pulses: &pulses });

        pulses.set(10);
        assert_eq!(encoder.count(), 16);
    }
}
