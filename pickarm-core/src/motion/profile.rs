//! Acceleration-limited speed ramp
//!
//! Ramps the commanded speed toward a target at a fixed acceleration and
//! computes the highest speed from which a move can still stop in time.

/// Speed ramp for one actuator
///
/// Speeds are signed degrees per second. An acceleration of zero means no
/// limit: the target is reached on the next update.
#[derive(Debug, Clone)]
pub struct SpeedProfile {
    /// Current speed in millidegrees per second
    current_mdps: i64,
    /// Target speed in degrees per second
    target_dps: i32,
    /// Acceleration in degrees per second squared
    accel: u16,
}

impl SpeedProfile {
    /// Create a stopped profile
    pub fn new(accel: u16) -> Self {
        Self {
            current_mdps: 0,
            target_dps: 0,
            accel,
        }
    }

    /// Change the acceleration limit, keeping the current speed
    pub fn set_accel(&mut self, accel: u16) {
        self.accel = accel;
    }

    /// Set the target speed
    pub fn set_target(&mut self, speed: i32) {
        self.target_dps = speed;
    }

    /// Current speed (may be ramping)
    pub fn current(&self) -> i32 {
        (self.current_mdps / 1000) as i32
    }

    /// Advance the ramp by `delta_ms` and return the new current speed
    pub fn update(&mut self, delta_ms: u32) -> i32 {
        let target = self.target_dps as i64 * 1000;

        if self.accel == 0 {
            self.current_mdps = target;
        } else {
            // deg/s² × ms = millidegrees/s
            let step = self.accel as i64 * delta_ms as i64;
            if self.current_mdps < target {
                self.current_mdps = (self.current_mdps + step).min(target);
            } else if self.current_mdps > target {
                self.current_mdps = (self.current_mdps - step).max(target);
            }
        }

        self.current()
    }

    /// Start the ramp from `speed` instead of the current value
    pub fn reset(&mut self, speed: i32) {
        self.current_mdps = speed as i64 * 1000;
    }

    /// Immediately stop
    pub fn emergency_stop(&mut self) {
        self.target_dps = 0;
        self.current_mdps = 0;
    }

    /// Highest speed that can still stop within `distance` degrees
    ///
    /// v = sqrt(2 · a · d). Unlimited acceleration yields `i32::MAX`.
    pub fn braking_speed(&self, distance: i32) -> i32 {
        if self.accel == 0 {
            return i32::MAX;
        }
        let d = distance.unsigned_abs() as u64;
        isqrt(2 * self.accel as u64 * d).min(i32::MAX as u64) as i32
    }
}

/// Integer square root (floor)
fn isqrt(n: u64) -> u64 {
    if n < 2 {
        return n;
    }
    let mut x = n;
    let mut y = (x + 1) / 2;
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let mut profile = SpeedProfile::new(120);
        assert_eq!(profile.current(), 0);
        assert_eq!(profile.update(100), 0);
    }

    #[test]
    fn test_acceleration() {
        let mut profile = SpeedProfile::new(120);
        profile.set_target(60);

        // 120 deg/s² for 250 ms = 30 deg/s
        assert_eq!(profile.update(250), 30);
        assert_eq!(profile.update(250), 60);

        // Does not overshoot
        assert_eq!(profile.update(1000), 60);
    }

    #[test]
    fn test_negative_speeds() {
        let mut profile = SpeedProfile::new(100);
        profile.set_target(-50);
        assert_eq!(profile.update(200), -20);
        assert_eq!(profile.update(1000), -50);

        // Reversal decelerates through zero
        profile.set_target(50);
        assert_eq!(profile.update(500), 0);
        assert_eq!(profile.update(500), 50);
    }

    #[test]
    fn test_deceleration_to_stop() {
        let mut profile = SpeedProfile::new(100);
        profile.reset(80);
        profile.set_target(0);
        assert_eq!(profile.update(400), 40);
        profile.update(800);
        assert_eq!(profile.current(), 0);
    }

    #[test]
    fn test_unlimited_acceleration() {
        let mut profile = SpeedProfile::new(0);
        profile.set_target(200);
        assert_eq!(profile.update(1), 200);
        assert_eq!(profile.braking_speed(1), i32::MAX);
    }

    #[test]
    fn test_braking_speed() {
        let profile = SpeedProfile::new(120);
        // sqrt(2 * 120 * 15) = 60
        assert_eq!(profile.braking_speed(15), 60);
        assert_eq!(profile.braking_speed(-15), 60);
        assert_eq!(profile.braking_speed(0), 0);
    }

    #[test]
    fn test_emergency_stop() {
        let mut profile = SpeedProfile::new(100);
        profile.set_target(100);
        profile.update(500);
        assert!(profile.current() > 0);

        profile.emergency_stop();
        assert_eq!(profile.current(), 0);
        // The target is cleared too
        assert_eq!(profile.update(500), 0);
    }

    #[test]
    fn test_isqrt() {
        assert_eq!(isqrt(0), 0);
        assert_eq!(isqrt(1), 1);
        assert_eq!(isqrt(15), 3);
        assert_eq!(isqrt(16), 4);
        assert_eq!(isqrt(3600), 60);
    }
}
