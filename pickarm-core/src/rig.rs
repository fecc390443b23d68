//! The physical rig: four actuators, two sensors, a buzzer and a clock

use crate::config::Joint;
use crate::traits::{Actuator, StopPolicy};

/// The three actuators that move the object
#[derive(Debug)]
pub struct Arm<A> {
    pub base: A,
    pub elbow: A,
    pub gripper: A,
}

impl<A: Actuator> Arm<A> {
    /// Current angles as (base, elbow, gripper)
    pub fn angles(&mut self) -> (i32, i32, i32) {
        (self.base.angle(), self.elbow.angle(), self.gripper.angle())
    }
}

/// Everything the homing sequence and the cycle touch
///
/// `T` is the base touch switch, `R` the elbow reflectance sensor, `S` the
/// buzzer and `D` the blocking delay used for sensor polling.
#[derive(Debug)]
pub struct Rig<A, T, R, S, D> {
    pub arm: Arm<A>,
    /// Conveyor; started once during homing and never stopped
    pub track: A,
    pub base_switch: T,
    pub elbow_sensor: R,
    pub sound: S,
    pub delay: D,
}

impl<A: Actuator, T, R, S, D> Rig<A, T, R, S, D> {
    /// Actuator driving `joint`
    pub fn actuator_mut(&mut self, joint: Joint) -> &mut A {
        match joint {
            Joint::Gripper => &mut self.arm.gripper,
            Joint::Track => &mut self.track,
            Joint::Elbow => &mut self.arm.elbow,
            Joint::Base => &mut self.arm.base,
        }
    }

    /// Remove power from every actuator, track included
    pub fn coast_all(&mut self) {
        for joint in Joint::ALL {
            self.actuator_mut(joint).stop(StopPolicy::Coast);
        }
    }
}
