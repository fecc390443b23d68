//! Conversion between joint degrees, motor degrees and encoder counts

use crate::config::ActuatorConfig;

/// Maps joint (output shaft) angles to motor angles and encoder counts
///
/// Applies the gear train and the direction sign. All divisions round to
/// the nearest integer so that repeated conversions do not drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AngleMap {
    /// +1 or -1
    sign: i32,
    /// Teeth on the motor side
    driver_teeth: i32,
    /// Teeth on the output side
    follower_teeth: i32,
    /// Encoder counts per motor revolution
    counts_per_rev: i32,
}

impl AngleMap {
    /// Build from a validated actuator configuration
    pub fn from_config(config: &ActuatorConfig) -> Self {
        let (driver, follower) = config
            .gears
            .map(|g| (g.driver_teeth.max(1) as i32, g.follower_teeth.max(1) as i32))
            .unwrap_or((1, 1));
        Self {
            sign: config.direction.sign(),
            driver_teeth: driver,
            follower_teeth: follower,
            counts_per_rev: config.counts_per_rev.max(1) as i32,
        }
    }

    /// Joint degrees to signed motor degrees
    pub fn output_to_motor(&self, degrees: i32) -> i32 {
        let num = degrees as i64 * self.follower_teeth as i64 * self.sign as i64;
        div_round(num, self.driver_teeth as i64) as i32
    }

    /// Joint degrees to encoder counts
    pub fn output_to_counts(&self, degrees: i32) -> i32 {
        let num = degrees as i64
            * self.follower_teeth as i64
            * self.counts_per_rev as i64
            * self.sign as i64;
        div_round(num, self.driver_teeth as i64 * 360) as i32
    }

    /// Encoder counts to joint degrees
    pub fn counts_to_output(&self, counts: i32) -> i32 {
        let num = counts as i64 * self.driver_teeth as i64 * 360 * self.sign as i64;
        div_round(num, self.follower_teeth as i64 * self.counts_per_rev as i64) as i32
    }
}

/// Integer division rounding half away from zero
fn div_round(num: i64, den: i64) -> i64 {
    let half = den / 2;
    if (num < 0) != (den < 0) {
        (num - half) / den
    } else {
        (num + half) / den
    }
}
