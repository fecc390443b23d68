//! Errors surfaced by the sequencers and the controller

use crate::config::{ConfigError, Joint};
use crate::state::ErrorKind;
use crate::traits::{ActuatorError, SensorError};

/// Anything that can stop the arm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ArmError {
    /// An actuator command failed
    Actuator { joint: Joint, error: ActuatorError },
    /// A sensor read failed while homing `joint`
    Sensor { joint: Joint, error: SensorError },
    /// The homing landmark of `joint` was not reached before the timeout
    HomingTimeout(Joint),
    /// Configuration rejected at boot
    Config(ConfigError),
}

impl ArmError {
    /// Adapter for `map_err` on actuator calls
    ///
    /// ```ignore
    /// arm.base.run_target(60, 200, StopPolicy::Hold)
    ///     .map_err(ArmError::actuator(Joint::Base))?;
    /// ```
    pub fn actuator(joint: Joint) -> impl Fn(ActuatorError) -> ArmError {
        move |error| ArmError::Actuator { joint, error }
    }

    /// Classification used by the state machine
    pub fn kind(&self) -> ErrorKind {
        match self {
            ArmError::Actuator { .. } => ErrorKind::ActuatorFault,
            ArmError::Sensor { .. } => ErrorKind::SensorFault,
            ArmError::HomingTimeout(_) => ErrorKind::HomingTimeout,
            ArmError::Config(_) => ErrorKind::ConfigInvalid,
        }
    }

    /// Joint involved, if any
    pub fn joint(&self) -> Option<Joint> {
        match self {
            ArmError::Actuator { joint, .. }
            | ArmError::Sensor { joint, .. }
            | ArmError::HomingTimeout(joint) => Some(*joint),
            ArmError::Config(_) => None,
        }
    }
}

impl From<ConfigError> for ArmError {
    fn from(error: ConfigError) -> Self {
        ArmError::Config(error)
    }
}
