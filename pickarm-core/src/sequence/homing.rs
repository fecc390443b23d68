//! Startup homing
//!
//! Establishes a zero-angle datum for each joint from a physical landmark:
//!
//! 1. Elbow: back off downward, then rise slowly until the reflectance
//!    sensor sees the beam. That point is elbow zero.
//! 2. Base: turn toward the touch switch until it reads pressed. That point
//!    is base zero.
//! 3. Gripper: close until it stalls (zero), then open to the open angle.
//! 4. Track: start the conveyor. It is never stopped.
//! 5. Beep to signal the arm is ready.

use embedded_hal::delay::DelayNs;

use super::wait::{wait_until, WaitError};
use crate::config::{Joint, RigConfig};
use crate::error::ArmError;
use crate::rig::Rig;
use crate::traits::{Actuator, ReflectionSensor, SensorError, Sound, StopPolicy, TouchSensor};

/// What homing observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HomingReport {
    /// Reflectance polls until the elbow landmark was seen
    pub elbow_polls: u32,
    /// Touch polls until the base landmark was hit
    pub base_polls: u32,
    /// Gripper angle at the stall, before it became the datum
    pub gripper_stall_angle: i32,
}

/// Apply configured speed and acceleration limits to every actuator
///
/// Actuators without run settings keep their driver defaults.
pub fn configure<A: Actuator, T, R, S, D>(rig: &mut Rig<A, T, R, S, D>, config: &RigConfig) {
    for joint in Joint::ALL {
        if let Some(settings) = config.actuators.get(joint).run_settings {
            rig.actuator_mut(joint).set_run_settings(settings);
        }
    }
}

/// Run the full homing sequence
///
/// On a failed wait the joint being homed is left coasting and the error is
/// returned; joints homed earlier keep holding.
pub fn home<A, T, R, S, D>(
    rig: &mut Rig<A, T, R, S, D>,
    config: &RigConfig,
) -> Result<HomingReport, ArmError>
where
    A: Actuator,
    T: TouchSensor,
    R: ReflectionSensor,
    S: Sound,
    D: DelayNs,
{
    let elbow_polls = home_elbow(rig, config)?;
    let base_polls = home_base(rig, config)?;
    let gripper_stall_angle = home_gripper(rig, config)?;

    rig.track
        .run(config.track.speed)
        .map_err(ArmError::actuator(Joint::Track))?;

    rig.sound.beeps(config.homing.beeps);

    Ok(HomingReport {
        elbow_polls,
        base_polls,
        gripper_stall_angle,
    })
}

fn home_elbow<A, T, R, S, D>(
    rig: &mut Rig<A, T, R, S, D>,
    config: &RigConfig,
) -> Result<u32, ArmError>
where
    A: Actuator,
    R: ReflectionSensor,
    D: DelayNs,
{
    let elbow = &config.homing.elbow;
    let failed = ArmError::actuator(Joint::Elbow);

    rig.arm
        .elbow
        .run_time(elbow.backoff_speed, elbow.backoff_ms)
        .map_err(&failed)?;
    rig.arm.elbow.run(elbow.seek_speed).map_err(&failed)?;

    let sensor = &mut rig.elbow_sensor;
    let threshold = elbow.reflection_threshold;
    let result = wait_until(&mut rig.delay, &config.homing.wait, || {
        sensor.reflection().map(|reading| reading >= threshold)
    });

    settle(&mut rig.arm.elbow, Joint::Elbow, result)
}

fn home_base<A, T, R, S, D>(
    rig: &mut Rig<A, T, R, S, D>,
    config: &RigConfig,
) -> Result<u32, ArmError>
where
    A: Actuator,
    T: TouchSensor,
    D: DelayNs,
{
    rig.arm
        .base
        .run(config.homing.base.seek_speed)
        .map_err(ArmError::actuator(Joint::Base))?;

    let switch = &mut rig.base_switch;
    let result = wait_until(&mut rig.delay, &config.homing.wait, || switch.pressed());

    settle(&mut rig.arm.base, Joint::Base, result)
}

fn home_gripper<A, T, R, S, D>(
    rig: &mut Rig<A, T, R, S, D>,
    config: &RigConfig,
) -> Result<i32, ArmError>
where
    A: Actuator,
{
    let gripper = &config.homing.gripper;
    let failed = ArmError::actuator(Joint::Gripper);

    let stall_angle = rig
        .arm
        .gripper
        .run_until_stalled(gripper.close_speed, StopPolicy::Coast, gripper.duty_limit)
        .map_err(&failed)?;
    rig.arm.gripper.reset_angle(0);
    rig.arm
        .gripper
        .run_target(gripper.open_speed, gripper.open_angle, StopPolicy::Coast)
        .map_err(&failed)?;

    Ok(stall_angle)
}

/// Finish a sensor-gated seek
///
/// On success the landmark becomes zero and the joint holds there. On
/// failure the joint coasts.
fn settle<A: Actuator>(
    actuator: &mut A,
    joint: Joint,
    result: Result<u32, WaitError<SensorError>>,
) -> Result<u32, ArmError> {
    match result {
        Ok(polls) => {
            actuator.reset_angle(0);
            actuator.stop(StopPolicy::Hold);
            Ok(polls)
        }
        Err(error) => {
            actuator.stop(StopPolicy::Coast);
            Err(match error {
                WaitError::TimedOut { .. } => ArmError::HomingTimeout(joint),
                WaitError::Condition(error) => ArmError::Sensor { joint, error },
            })
        }
    }
}
