//! Recording mocks shared by the sequencer and controller tests

use core::cell::Cell;

use embedded_hal::delay::DelayNs;
use heapless::Vec;

use crate::config::{Joint, RigConfig};
use crate::rig::{Arm, Rig};
use crate::traits::{
    Actuator, ActuatorError, ReflectionSensor, RunSettings, SensorError, Sound, StopPolicy,
    TouchSensor,
};

const LOG_CAPACITY: usize = 64;

/// Delay that only counts the time it was asked to sleep
#[derive(Debug, Default)]
pub struct CountingDelay {
    elapsed_ns: u64,
    sleeps: u32,
}

impl CountingDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ns / 1_000_000
    }

    pub fn sleeps(&self) -> u32 {
        self.sleeps
    }
}

impl DelayNs for CountingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns += ns as u64;
        self.sleeps += 1;
    }

    fn delay_us(&mut self, us: u32) {
        self.elapsed_ns += us as u64 * 1_000;
        self.sleeps += 1;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.elapsed_ns += ms as u64 * 1_000_000;
        self.sleeps += 1;
    }
}

/// A command received by [`MockActuator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Run(i32),
    RunTime(i32, u32),
    RunTarget {
        speed: i32,
        target: i32,
        then: StopPolicy,
    },
    RunUntilStalled {
        speed: i32,
        then: StopPolicy,
        duty_limit: u8,
    },
    ResetAngle(i32),
    Stop(StopPolicy),
    SetRunSettings(RunSettings),
}

/// A logged command with its position in the rig-wide order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub seq: u32,
    pub command: Command,
}

/// Shared sequence counter ordering commands across mocks
pub type Clock = Cell<u32>;

fn tick(clock: &Clock) -> u32 {
    let seq = clock.get();
    clock.set(seq + 1);
    seq
}

/// Actuator that records every command
///
/// Moves are instantaneous: `run_target` lands on the target,
/// `run_until_stalled` lands on the configured stall angle.
#[derive(Debug)]
pub struct MockActuator<'a> {
    clock: &'a Clock,
    angle: i32,
    speed: i32,
    stall_angle: i32,
    last_stop: Option<StopPolicy>,
    settings: Option<RunSettings>,
    /// Fail the command with this log index
    fail: Option<(usize, ActuatorError)>,
    log: Vec<Entry, LOG_CAPACITY>,
}

impl<'a> MockActuator<'a> {
    pub fn new(clock: &'a Clock) -> Self {
        Self {
            clock,
            angle: 0,
            speed: 0,
            stall_angle: 0,
            last_stop: None,
            settings: None,
            fail: None,
            log: Vec::new(),
        }
    }

    pub fn with_angle(mut self, angle: i32) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_stall_angle(mut self, angle: i32) -> Self {
        self.stall_angle = angle;
        self
    }

    /// Make the `index`th command (0-based) fail with `error`
    pub fn failing_at(mut self, index: usize, error: ActuatorError) -> Self {
        self.fail = Some((index, error));
        self
    }

    fn record(&mut self, command: Command) -> Result<(), ActuatorError> {
        let index = self.log.len();
        let seq = tick(self.clock);
        self.log
            .push(Entry { seq, command })
            .expect("command log full");
        match self.fail {
            Some((at, error)) if at == index => Err(error),
            _ => Ok(()),
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.log
    }

    pub fn commands(&self) -> impl Iterator<Item = Command> + '_ {
        self.log.iter().map(|entry| entry.command)
    }

    /// Targets of every `run_target`, in order
    pub fn targets(&self) -> Vec<i32, LOG_CAPACITY> {
        self.commands()
            .filter_map(|command| match command {
                Command::RunTarget { target, .. } => Some(target),
                _ => None,
            })
            .collect()
    }

    pub fn current_angle(&self) -> i32 {
        self.angle
    }

    pub fn speed(&self) -> i32 {
        self.speed
    }

    pub fn last_stop(&self) -> Option<StopPolicy> {
        self.last_stop
    }

    pub fn settings(&self) -> Option<RunSettings> {
        self.settings
    }
}

impl Actuator for MockActuator<'_> {
    fn run(&mut self, speed: i32) -> Result<(), ActuatorError> {
        self.record(Command::Run(speed))?;
        self.speed = speed;
        Ok(())
    }

    fn run_time(&mut self, speed: i32, duration_ms: u32) -> Result<(), ActuatorError> {
        self.record(Command::RunTime(speed, duration_ms))?;
        self.angle += speed * duration_ms as i32 / 1000;
        self.speed = 0;
        self.last_stop = Some(StopPolicy::Coast);
        Ok(())
    }

    fn run_target(
        &mut self,
        speed: i32,
        target: i32,
        then: StopPolicy,
    ) -> Result<(), ActuatorError> {
        self.record(Command::RunTarget {
            speed,
            target,
            then,
        })?;
        if speed == 0 {
            return Err(ActuatorError::InvalidSpeed);
        }
        self.angle = target;
        self.speed = 0;
        self.last_stop = Some(then);
        Ok(())
    }

    fn run_until_stalled(
        &mut self,
        speed: i32,
        then: StopPolicy,
        duty_limit_pct: u8,
    ) -> Result<i32, ActuatorError> {
        self.record(Command::RunUntilStalled {
            speed,
            then,
            duty_limit: duty_limit_pct,
        })?;
        if !(1..=100).contains(&duty_limit_pct) {
            return Err(ActuatorError::InvalidDutyLimit);
        }
        self.angle = self.stall_angle;
        self.speed = 0;
        self.last_stop = Some(then);
        Ok(self.angle)
    }

    fn reset_angle(&mut self, angle: i32) {
        let _ = self.record(Command::ResetAngle(angle));
        // The stall position moves with the datum
        self.stall_angle += angle - self.angle;
        self.angle = angle;
    }

    fn stop(&mut self, then: StopPolicy) {
        let _ = self.record(Command::Stop(then));
        self.speed = 0;
        self.last_stop = Some(then);
    }

    fn set_run_settings(&mut self, settings: RunSettings) {
        let _ = self.record(Command::SetRunSettings(settings));
        self.settings = Some(settings);
    }

    fn angle(&mut self) -> i32 {
        self.angle
    }
}

/// Reflection sensor replaying a fixed series of readings
///
/// The last reading repeats once the series is exhausted.
#[derive(Debug)]
pub struct ScriptedReflection<'a> {
    readings: &'a [u8],
    polls: u32,
    fail_at: Option<u32>,
}

impl<'a> ScriptedReflection<'a> {
    pub fn new(readings: &'a [u8]) -> Self {
        Self {
            readings,
            polls: 0,
            fail_at: None,
        }
    }

    /// Fail the `poll`th read (1-based)
    pub fn failing_at(mut self, poll: u32) -> Self {
        self.fail_at = Some(poll);
        self
    }

    pub fn polls(&self) -> u32 {
        self.polls
    }
}

impl ReflectionSensor for ScriptedReflection<'_> {
    fn reflection(&mut self) -> Result<u8, SensorError> {
        self.polls += 1;
        if self.fail_at == Some(self.polls) {
            return Err(SensorError::ReadFailed);
        }
        let index = (self.polls as usize - 1).min(self.readings.len().saturating_sub(1));
        Ok(self.readings.get(index).copied().unwrap_or(0))
    }
}

/// Touch switch that reads released for a number of polls, then pressed
#[derive(Debug)]
pub struct ScriptedTouch {
    released_polls: u32,
    polls: u32,
    broken: bool,
}

impl ScriptedTouch {
    pub fn pressed_after(released_polls: u32) -> Self {
        Self {
            released_polls,
            polls: 0,
            broken: false,
        }
    }

    pub fn never() -> Self {
        Self::pressed_after(u32::MAX)
    }

    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::never()
        }
    }

    pub fn polls(&self) -> u32 {
        self.polls
    }
}

impl TouchSensor for ScriptedTouch {
    fn pressed(&mut self) -> Result<bool, SensorError> {
        self.polls += 1;
        if self.broken {
            return Err(SensorError::ReadFailed);
        }
        Ok(self.polls > self.released_polls)
    }
}

/// Buzzer that remembers when it beeped
#[derive(Debug)]
pub struct MockSound<'a> {
    clock: &'a Clock,
    beeps: Vec<(u32, u8), 8>,
}

impl<'a> MockSound<'a> {
    pub fn new(clock: &'a Clock) -> Self {
        Self {
            clock,
            beeps: Vec::new(),
        }
    }

    /// (sequence number, count) of each `beeps` call
    pub fn beeps(&self) -> &[(u32, u8)] {
        &self.beeps
    }
}

impl Sound for MockSound<'_> {
    fn beeps(&mut self, count: u8) {
        let seq = tick(self.clock);
        self.beeps.push((seq, count)).expect("beep log full");
    }
}

pub type MockRig<'a> =
    Rig<MockActuator<'a>, ScriptedTouch, ScriptedReflection<'a>, MockSound<'a>, CountingDelay>;

/// Rig whose sensors trigger on the first poll
///
/// The gripper stalls 30 degrees past its starting point, the way a real
/// gripper closes on nothing.
pub fn rig<'a>(clock: &'a Clock) -> MockRig<'a> {
    rig_with(clock, ScriptedTouch::pressed_after(0), ScriptedReflection::new(&[100]))
}

pub fn rig_with<'a>(
    clock: &'a Clock,
    base_switch: ScriptedTouch,
    elbow_sensor: ScriptedReflection<'a>,
) -> MockRig<'a> {
    Rig {
        arm: Arm {
            base: MockActuator::new(clock).with_angle(17),
            elbow: MockActuator::new(clock).with_angle(-12),
            gripper: MockActuator::new(clock).with_angle(-60).with_stall_angle(30),
        },
        track: MockActuator::new(clock),
        base_switch,
        elbow_sensor,
        sound: MockSound::new(clock),
        delay: CountingDelay::new(),
    }
}

/// The as-built configuration
pub fn config() -> RigConfig {
    RigConfig::default()
}

/// Mock for `joint` in `rig`
pub fn actuator<'r, 'a>(rig: &'r MockRig<'a>, joint: Joint) -> &'r MockActuator<'a> {
    match joint {
        Joint::Gripper => &rig.arm.gripper,
        Joint::Track => &rig.track,
        Joint::Elbow => &rig.arm.elbow,
        Joint::Base => &rig.arm.base,
    }
}
