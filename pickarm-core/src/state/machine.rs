//! State machine definition
//!
//! Every motion the arm makes is a function of the current state.
//! After homing the machine alternates between picking and releasing
//! forever; an error is terminal.

use super::events::Event;

/// Arm states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Power-on: validate configuration, apply run settings
    Boot,
    /// Establishing joint datums from sensor landmarks
    Homing,
    /// Moving to the pick station and gripping
    Picking,
    /// Moving to the release station and opening the gripper
    Releasing,
    /// Fault detected; no further motion
    Error(ErrorKind),
}

/// Types of errors that can occur
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorKind {
    /// Configuration failed validation
    ConfigInvalid,
    /// A homing landmark was not reached in time
    HomingTimeout,
    /// A sensor could not be read
    SensorFault,
    /// A motor driver rejected a command or stalled unexpectedly
    ActuatorFault,
}

impl State {
    /// Process an event and return the next state
    ///
    /// This is the core state transition logic.
    pub fn transition(self, event: Event) -> Self {
        use Event::*;
        use State::*;

        match (self, event) {
            // Boot transitions
            (Boot, BootComplete) => Homing,
            (Boot, ErrorDetected(kind)) => Error(kind),

            // Homing transitions
            (Homing, HomingComplete) => Picking,
            (Homing, ErrorDetected(kind)) => Error(kind),

            // Cycle transitions
            (Picking, PickComplete) => Releasing,
            (Picking, ErrorDetected(kind)) => Error(kind),
            (Releasing, ReleaseComplete) => Picking,
            (Releasing, ErrorDetected(kind)) => Error(kind),

            // Error is terminal; anything else leaves the state unchanged
            _ => self,
        }
    }
}
