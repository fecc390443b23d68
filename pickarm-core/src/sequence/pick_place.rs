//! Pick and release choreography
//!
//! Both sequences turn the base to a station first, then work the elbow
//! and gripper. Angles are relative to the datums set by homing.

use crate::config::{Joint, PickConfig, ReleaseConfig};
use crate::error::ArmError;
use crate::rig::Arm;
use crate::traits::{Actuator, StopPolicy};

/// Pick up the object at base angle `position`
///
/// Lowers the elbow, closes the gripper until it stalls on the object and
/// keeps squeezing, then lifts. Returns the gripper angle at the stall.
pub fn pick<A: Actuator>(
    arm: &mut Arm<A>,
    config: &PickConfig,
    position: i32,
) -> Result<i32, ArmError> {
    arm.base
        .run_target(config.base_speed, position, StopPolicy::Hold)
        .map_err(ArmError::actuator(Joint::Base))?;

    let elbow = ArmError::actuator(Joint::Elbow);
    arm.elbow
        .run_target(config.lower_speed, config.lower_angle, StopPolicy::Hold)
        .map_err(&elbow)?;

    let grip_angle = arm
        .gripper
        .run_until_stalled(config.grip_speed, StopPolicy::Hold, config.grip_duty_limit)
        .map_err(ArmError::actuator(Joint::Gripper))?;

    arm.elbow
        .run_target(config.lift_speed, config.lift_angle, StopPolicy::Hold)
        .map_err(&elbow)?;

    Ok(grip_angle)
}

/// Set the held object down at base angle `position` and let go
pub fn release<A: Actuator>(
    arm: &mut Arm<A>,
    config: &ReleaseConfig,
    position: i32,
) -> Result<(), ArmError> {
    arm.base
        .run_target(config.base_speed, position, StopPolicy::Hold)
        .map_err(ArmError::actuator(Joint::Base))?;
    arm.elbow
        .run_target(config.elbow_speed, config.elbow_angle, StopPolicy::Hold)
        .map_err(ArmError::actuator(Joint::Elbow))?;
    arm.gripper
        .run_target(config.open_speed, config.open_angle, StopPolicy::Coast)
        .map_err(ArmError::actuator(Joint::Gripper))?;

    Ok(())
}
