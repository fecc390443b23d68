//! Actuator trait
//!
//! A rotational actuator with a position model in output-shaft degrees.
//! Gear trains and direction inversion are the implementation's concern:
//! callers always speak in degrees at the joint.

/// Motor rotation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Positive speed turns the output clockwise
    #[default]
    Clockwise,
    /// Positive speed turns the output counter-clockwise
    CounterClockwise,
}

impl Direction {
    /// Sign applied to commanded speeds and reported angles
    pub fn sign(self) -> i32 {
        match self {
            Direction::Clockwise => 1,
            Direction::CounterClockwise => -1,
        }
    }
}

/// What the actuator does once a motion completes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopPolicy {
    /// Remove power; the output turns freely
    #[default]
    Coast,
    /// Short the windings; passive resistance, no position control
    Brake,
    /// Actively resist displacement from the stop position
    ///
    /// Drivers that only run control inside their blocking calls cannot
    /// correct position afterwards and brake instead.
    Hold,
}

/// Motion profile limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RunSettings {
    /// Maximum speed in degrees per second
    pub max_speed: u16,
    /// Maximum acceleration in degrees per second squared
    pub max_accel: u16,
}

/// Errors that can occur with actuator operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActuatorError {
    /// A move was requested with zero speed
    InvalidSpeed,
    /// Stall duty limit outside 1..=100
    InvalidDutyLimit,
    /// Output blocked while moving to a target
    Stalled,
    /// Underlying driver (PWM, GPIO, encoder) rejected a command
    Driver,
}

/// Rotational actuator
///
/// Speeds are signed degrees per second, angles are signed degrees.
/// Every method except [`Actuator::run`] blocks until its motion is over.
pub trait Actuator {
    /// Start rotating at `speed` and return immediately
    ///
    /// The motion continues until another command replaces it.
    fn run(&mut self, speed: i32) -> Result<(), ActuatorError>;

    /// Rotate at `speed` for `duration_ms`, then coast
    fn run_time(&mut self, speed: i32, duration_ms: u32) -> Result<(), ActuatorError>;

    /// Rotate to the absolute angle `target` at `|speed|`, then apply `then`
    fn run_target(&mut self, speed: i32, target: i32, then: StopPolicy)
        -> Result<(), ActuatorError>;

    /// Rotate at `speed` until the output stalls, then apply `then`
    ///
    /// `duty_limit_pct` caps the drive effort; the stall condition is the
    /// effort sitting at that cap without angular progress. Returns the
    /// angle at which the stall was detected.
    fn run_until_stalled(
        &mut self,
        speed: i32,
        then: StopPolicy,
        duty_limit_pct: u8,
    ) -> Result<i32, ActuatorError>;

    /// Redefine the current physical position as `angle`
    fn reset_angle(&mut self, angle: i32);

    /// Stop immediately using `then`
    fn stop(&mut self, then: StopPolicy);

    /// Configure speed and acceleration limits for subsequent moves
    fn set_run_settings(&mut self, settings: RunSettings);

    /// Current angle in degrees relative to the last datum
    fn angle(&mut self) -> i32;
}
