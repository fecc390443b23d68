//! Events that trigger state transitions

use super::machine::ErrorKind;

/// Events that can trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    // Lifecycle events
    /// Configuration validated and run settings applied
    BootComplete,
    /// Every joint has its datum and the track is running
    HomingComplete,

    // Cycle events
    /// Object gripped and lifted
    PickComplete,
    /// Object set down and gripper opened
    ReleaseComplete,

    // Fault events
    /// A sequence step failed
    ErrorDetected(ErrorKind),
}

impl Event {
    /// Check if this event ends one half of the pick/release cycle
    pub fn is_cycle_event(&self) -> bool {
        matches!(self, Event::PickComplete | Event::ReleaseComplete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_events() {
        assert!(Event::PickComplete.is_cycle_event());
        assert!(Event::ReleaseComplete.is_cycle_event());
        assert!(!Event::HomingComplete.is_cycle_event());
        assert!(!Event::ErrorDetected(ErrorKind::SensorFault).is_cycle_event());
    }
}
