//! Closed-loop DC servo
//!
//! Drives a brushed DC motor through a TB6612-style H-bridge (two direction
//! inputs plus PWM) and closes the position loop on an encoder.
//!
//! Control runs inside the blocking calls at a fixed period:
//! - A setpoint advances along an acceleration-limited speed ramp.
//! - Duty = feed-forward from the ramp speed + proportional term on the
//!   encoder lagging behind the setpoint. Once the setpoint has arrived an
//!   integral term builds up until friction gives way.
//! - Positions and the setpoint live in encoder counts. Joint degrees only
//!   appear at the [`Actuator`] boundary, converted by the [`AngleMap`].
//!
//! Duty is signed permille: positive drives IN1 high and must make the
//! encoder count up.
//!
//! There is no background task, so nothing controls position between calls.
//! [`StopPolicy::Hold`] after a move therefore shorts the windings like
//! [`StopPolicy::Brake`]; only `run_until_stalled` keeps pushing with it.
//!
//! ```ignore
//! let config = DcServoConfig::new(AngleMap::from_config(&rig.actuators.elbow));
//! let mut elbow = DcServo::new(pwm, in1, in2, encoder, Delay, config);
//! elbow.run_target(60, -40, StopPolicy::Hold)?;
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use pickarm_core::motion::{AngleMap, SpeedProfile};
use pickarm_core::traits::{Actuator, ActuatorError, RunSettings, StopPolicy};

use super::encoder::Encoder;
use super::stall::StallDetector;

/// Full-scale duty in permille
const FULL_DUTY: i32 = 1000;

/// DC servo tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DcServoConfig {
    /// Gear train, direction and encoder resolution
    pub map: AngleMap,
    /// Motor shaft speed at full duty, degrees per second
    pub max_motor_speed: u16,
    /// Proportional gain, permille of duty per count of lag
    pub kp: u16,
    /// Integral gain, permille of duty per count-second of lag at the target
    pub ki: u16,
    /// A target counts as reached within this many joint degrees
    pub tolerance: i32,
    /// Slowest approach speed near a target, joint degrees per second
    pub min_speed: i32,
    /// Control loop period
    pub period_ms: u32,
    /// Duty (percent) above which `run_target` watches for a stall
    pub target_stall_duty: u8,
    /// Saturated time without progress that counts as a stall
    pub stall_window_ms: u32,
    /// Encoder counts that count as progress
    pub stall_min_counts: i32,
    /// Time at the target setpoint without a single count of movement
    /// after which `run_target` gives up
    pub settle_window_ms: u32,
    /// Duty (percent) kept on to squeeze after a stall with `Hold`
    pub hold_duty: u8,
    /// Limits until `set_run_settings` replaces them
    pub settings: RunSettings,
}

impl DcServoConfig {
    /// Defaults for a small geared hobby motor with a 360-count encoder
    pub const fn new(map: AngleMap) -> Self {
        Self {
            map,
            max_motor_speed: 1000,
            kp: 10,
            ki: 100,
            tolerance: 2,
            min_speed: 5,
            period_ms: 10,
            target_stall_duty: 40,
            stall_window_ms: 200,
            stall_min_counts: 4,
            settle_window_ms: 1000,
            hold_duty: 30,
            settings: RunSettings {
                max_speed: 1000,
                max_accel: 2000,
            },
        }
    }
}

/// DC motor with encoder feedback implementing [`Actuator`]
pub struct DcServo<PWM, PIN, ENC, D> {
    pwm: PWM,
    in1: PIN,
    in2: PIN,
    encoder: ENC,
    delay: D,
    config: DcServoConfig,
    profile: SpeedProfile,
    /// Speed cap in joint degrees per second
    max_speed: i32,
    /// Encoder count that corresponds to angle zero
    offset: i32,
    /// Last applied duty, signed permille
    duty: i32,
}

impl<PWM, PIN, ENC, D> DcServo<PWM, PIN, ENC, D>
where
    PWM: SetDutyCycle,
    PIN: OutputPin,
    ENC: Encoder,
    D: DelayNs,
{
    /// Create a servo; the motor starts coasting
    pub fn new(
        pwm: PWM,
        in1: PIN,
        in2: PIN,
        encoder: ENC,
        delay: D,
        config: DcServoConfig,
    ) -> Self {
        let mut servo = Self {
            pwm,
            in1,
            in2,
            encoder,
            delay,
            config,
            profile: SpeedProfile::new(config.settings.max_accel),
            max_speed: config.settings.max_speed as i32,
            offset: 0,
            duty: 0,
        };
        servo.stop(StopPolicy::Coast);
        servo.offset = servo.encoder.count();
        servo
    }

    /// Last applied duty, signed permille
    pub fn duty(&self) -> i32 {
        self.duty
    }

    /// Encoder counts relative to the datum
    fn counts(&mut self) -> i32 {
        self.encoder.count().wrapping_sub(self.offset)
    }

    /// Feed-forward duty magnitude for a joint speed
    fn feed_forward(&self, speed: i32) -> i32 {
        let motor = self.config.map.output_to_motor(speed).abs();
        motor * FULL_DUTY / self.config.max_motor_speed.max(1) as i32
    }

    /// Encoder counts per second for a joint speed, unsigned
    fn count_rate(&self, speed: i32) -> i64 {
        self.config.map.output_to_counts(speed).abs() as i64
    }

    /// Drive the bridge at a signed duty
    fn apply(&mut self, duty: i32) -> Result<(), ActuatorError> {
        let duty = duty.clamp(-FULL_DUTY, FULL_DUTY);
        // Count pulses up to now in the old direction
        self.encoder.motion_hint(duty.signum());

        let (in1, in2) = match duty.signum() {
            1 => (true, false),
            -1 => (false, true),
            _ => (false, false),
        };
        self.in1.set_state(in1.into()).map_err(|_| ActuatorError::Driver)?;
        self.in2.set_state(in2.into()).map_err(|_| ActuatorError::Driver)?;
        self.pwm
            .set_duty_cycle_fraction(duty.unsigned_abs() as u16, FULL_DUTY as u16)
            .map_err(|_| ActuatorError::Driver)?;

        self.duty = duty;
        Ok(())
    }

    /// Short both motor terminals
    fn brake(&mut self) -> Result<(), ActuatorError> {
        self.encoder.motion_hint(0);
        self.in1.set_high().map_err(|_| ActuatorError::Driver)?;
        self.in2.set_high().map_err(|_| ActuatorError::Driver)?;
        self.pwm
            .set_duty_cycle_fully_on()
            .map_err(|_| ActuatorError::Driver)?;
        self.duty = 0;
        Ok(())
    }

    fn halt(&mut self, then: StopPolicy) -> Result<(), ActuatorError> {
        self.profile.emergency_stop();
        match then {
            StopPolicy::Coast => self.apply(0),
            StopPolicy::Brake | StopPolicy::Hold => self.brake(),
        }
    }

    /// Proportional duty for the encoder lagging `setpoint` (millicounts)
    fn correction(&self, setpoint: i64, position: i32) -> i32 {
        let lag = (setpoint / 1000) as i32 - position;
        lag.saturating_mul(self.config.kp as i32)
    }
}

impl<PWM, PIN, ENC, D> Actuator for DcServo<PWM, PIN, ENC, D>
where
    PWM: SetDutyCycle,
    PIN: OutputPin,
    ENC: Encoder,
    D: DelayNs,
{
    fn run(&mut self, speed: i32) -> Result<(), ActuatorError> {
        let speed = speed.clamp(-self.max_speed, self.max_speed);
        self.profile.reset(speed);
        self.profile.set_target(speed);

        let direction = self.config.map.output_to_motor(speed).signum();
        self.apply(direction * self.feed_forward(speed))
    }

    fn run_time(&mut self, speed: i32, duration_ms: u32) -> Result<(), ActuatorError> {
        if speed == 0 {
            return Err(ActuatorError::InvalidSpeed);
        }
        let period = self.config.period_ms.max(1);
        let direction = self.config.map.output_to_motor(speed).signum() as i64;

        self.profile.reset(0);
        self.profile
            .set_target(speed.unsigned_abs().min(self.max_speed as u32) as i32);
        let mut setpoint = self.counts() as i64 * 1000;

        let mut elapsed = 0;
        while elapsed < duration_ms {
            let position = self.counts();
            let speed = self.profile.update(period);
            setpoint += direction * self.count_rate(speed) * period as i64;

            let duty = direction as i32 * self.feed_forward(speed)
                + self.correction(setpoint, position);
            if let Err(error) = self.apply(duty) {
                let _ = self.halt(StopPolicy::Coast);
                return Err(error);
            }

            let step = period.min(duration_ms - elapsed);
            self.delay.delay_ms(step);
            elapsed += step;
        }

        self.halt(StopPolicy::Coast)
    }

    fn run_target(
        &mut self,
        speed: i32,
        target: i32,
        then: StopPolicy,
    ) -> Result<(), ActuatorError> {
        if speed == 0 {
            return Err(ActuatorError::InvalidSpeed);
        }
        let period = self.config.period_ms.max(1);
        let cap = speed.unsigned_abs().min(self.max_speed as u32) as i32;
        let map = self.config.map;
        let tolerance = map.output_to_counts(self.config.tolerance).abs();
        let stall_duty = self.config.target_stall_duty as i32 * 10;

        let target_counts = map.output_to_counts(target);
        if (target_counts - self.counts()).abs() <= tolerance {
            return self.halt(then);
        }
        let goal = target_counts as i64 * 1000;
        let mut setpoint = self.counts() as i64 * 1000;
        let mut stall =
            StallDetector::new(self.config.stall_window_ms, self.config.stall_min_counts);
        stall.reset(self.counts());
        let mut settle = StallDetector::new(self.config.settle_window_ms, 1);
        settle.reset(self.counts());
        // Lag integrated over time at the goal, count-milliseconds
        let mut integral: i64 = 0;
        self.profile.reset(0);

        loop {
            let position = self.counts();
            if setpoint == goal && (target_counts - position).abs() <= tolerance {
                break;
            }

            // Slow down so the ramp can stop on the target
            let remaining = map.counts_to_output(((goal - setpoint) / 1000) as i32);
            let limit = cap
                .min(self.profile.braking_speed(remaining))
                .max(self.config.min_speed);
            self.profile.set_target(limit);
            let speed = self.profile.update(period);

            let direction = (goal - setpoint).signum();
            setpoint += direction * self.count_rate(speed) * period as i64;
            setpoint = match direction {
                1 => setpoint.min(goal),
                -1 => setpoint.max(goal),
                _ => goal,
            };

            let parked = setpoint == goal;
            let lag = (setpoint / 1000) as i32 - position;
            if !parked || (lag as i64).signum() != integral.signum() {
                integral = 0;
            }
            if parked {
                integral += lag as i64 * period as i64;
            }
            let boost = (integral * self.config.ki as i64 / 1000)
                .clamp(-FULL_DUTY as i64, FULL_DUTY as i64) as i32;

            let duty = direction as i32 * self.feed_forward(speed)
                + self.correction(setpoint, position)
                + boost;
            if let Err(error) = self.apply(duty) {
                let _ = self.halt(StopPolicy::Coast);
                return Err(error);
            }

            // Pushing hard without progress, or stuck short of the target
            let pushing = stall.update(self.duty.abs() >= stall_duty, position, period);
            let stuck = settle.update(parked, position, period);
            if pushing || stuck {
                let _ = self.halt(StopPolicy::Coast);
                return Err(ActuatorError::Stalled);
            }

            self.delay.delay_ms(period);
        }

        self.halt(then)
    }

    fn run_until_stalled(
        &mut self,
        speed: i32,
        then: StopPolicy,
        duty_limit_pct: u8,
    ) -> Result<i32, ActuatorError> {
        if !(1..=100).contains(&duty_limit_pct) {
            return Err(ActuatorError::InvalidDutyLimit);
        }
        if speed == 0 {
            return Err(ActuatorError::InvalidSpeed);
        }
        let period = self.config.period_ms.max(1);
        let limit = duty_limit_pct as i32 * 10;
        let direction = self.config.map.output_to_motor(speed).signum();

        self.profile.reset(0);
        self.profile
            .set_target(speed.unsigned_abs().min(self.max_speed as u32) as i32);
        let mut setpoint = self.counts() as i64 * 1000;
        let mut stall =
            StallDetector::new(self.config.stall_window_ms, self.config.stall_min_counts);
        stall.reset(self.counts());

        loop {
            let position = self.counts();
            let speed = self.profile.update(period);
            setpoint += direction as i64 * self.count_rate(speed) * period as i64;

            let duty = (direction * self.feed_forward(speed) + self.correction(setpoint, position))
                .clamp(-limit, limit);
            if let Err(error) = self.apply(duty) {
                let _ = self.halt(StopPolicy::Coast);
                return Err(error);
            }

            if stall.update(self.duty.abs() >= limit, position, period) {
                break;
            }

            self.delay.delay_ms(period);
        }

        let angle = self.angle();
        match then {
            // Keep pushing into whatever stopped the motor
            StopPolicy::Hold => {
                self.profile.emergency_stop();
                let hold = (self.config.hold_duty as i32 * 10).min(limit);
                self.apply(direction * hold)?;
            }
            other => self.halt(other)?,
        }
        Ok(angle)
    }

    fn reset_angle(&mut self, angle: i32) {
        self.offset = self
            .encoder
            .count()
            .wrapping_sub(self.config.map.output_to_counts(angle));
    }

    fn stop(&mut self, then: StopPolicy) {
        // A failed pin write leaves the previous output; nothing to report to
        let _ = self.halt(then);
    }

    fn set_run_settings(&mut self, settings: RunSettings) {
        self.max_speed = settings.max_speed as i32;
        self.profile.set_accel(settings.max_accel);
    }

    fn angle(&mut self) -> i32 {
        let counts = self.counts();
        self.config.map.counts_to_output(counts)
    }
}
