//! Cycle controller
//!
//! Owns the rig and drives it through the state machine: boot, homing, then
//! pick and release alternating forever. Each call to [`Controller::step`]
//! performs the action of exactly one state.
//!
//! ```ignore
//! let mut controller = Controller::new(rig, &config);
//! loop {
//!     match controller.step() {
//!         Ok(transition) => info!("{} -> {}", transition.from, transition.to),
//!         Err(error) => {
//!             controller.park();
//!             break;
//!         }
//!     }
//! }
//! ```

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;

use crate::config::{CyclePlan, RigConfig, CYCLE_PLAN};
use crate::error::ArmError;
use crate::rig::Rig;
use crate::sequence::{configure, home, pick, release};
use crate::state::{Event, State};
use crate::traits::{Actuator, ReflectionSensor, Sound, TouchSensor};

/// One completed step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transition {
    pub from: State,
    pub event: Event,
    pub to: State,
}

/// Runs the arm
pub struct Controller<'c, A, T, R, S, D> {
    rig: Rig<A, T, R, S, D>,
    config: &'c RigConfig,
    plan: CyclePlan,
    state: State,
    /// Set together with `State::Error`
    fault: Option<ArmError>,
    /// Completed pick/release pairs
    cycles: u32,
}

impl<'c, A, T, R, S, D> Controller<'c, A, T, R, S, D>
where
    A: Actuator,
    T: TouchSensor,
    R: ReflectionSensor,
    S: Sound,
    D: DelayNs,
{
    /// Create a controller in the `Boot` state
    pub fn new(rig: Rig<A, T, R, S, D>, config: &'c RigConfig) -> Self {
        Self {
            rig,
            config,
            plan: CYCLE_PLAN,
            state: State::Boot,
            fault: None,
            cycles: 0,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// The error that stopped the controller, if any
    pub fn fault(&self) -> Option<ArmError> {
        self.fault
    }

    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    pub fn rig(&self) -> &Rig<A, T, R, S, D> {
        &self.rig
    }

    /// Give the rig back
    pub fn into_rig(self) -> Rig<A, T, R, S, D> {
        self.rig
    }

    /// Perform the action of the current state and advance
    ///
    /// Once an error has occurred every further call returns it again
    /// without touching the hardware.
    pub fn step(&mut self) -> Result<Transition, ArmError> {
        if let Some(error) = self.fault {
            return Err(error);
        }

        let from = self.state;
        let outcome = match from {
            State::Boot => self.boot().map(|()| Event::BootComplete),
            State::Homing => home(&mut self.rig, self.config).map(|_| Event::HomingComplete),
            State::Picking => {
                let position = self.config.stations.angle(self.plan.pick_from);
                pick(&mut self.rig.arm, &self.config.pick, position).map(|_| Event::PickComplete)
            }
            State::Releasing => {
                let position = self.config.stations.angle(self.plan.release_to);
                release(&mut self.rig.arm, &self.config.release, position)
                    .map(|()| Event::ReleaseComplete)
            }
            // Only reachable with a fault recorded, handled above
            State::Error(kind) => Ok(Event::ErrorDetected(kind)),
        };

        match outcome {
            Ok(event) => {
                let to = from.transition(event);
                self.state = to;
                if event == Event::ReleaseComplete {
                    self.cycles = self.cycles.wrapping_add(1);
                }
                Ok(Transition { from, event, to })
            }
            Err(error) => {
                self.state = from.transition(Event::ErrorDetected(error.kind()));
                self.fault = Some(error);
                Err(error)
            }
        }
    }

    /// Step forever; only returns when a step fails
    pub fn run(&mut self) -> Result<Infallible, ArmError> {
        loop {
            self.step()?;
        }
    }

    /// Coast every actuator
    pub fn park(&mut self) {
        self.rig.coast_all();
    }

    fn boot(&mut self) -> Result<(), ArmError> {
        self.config.validate()?;
        configure(&mut self.rig, self.config);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigError, Joint, Station};
    use crate::sequence::Timeout;
    use crate::state::ErrorKind;
    use crate::testing::{
        actuator, config, rig, rig_with, Clock, MockActuator, MockRig, ScriptedReflection,
        ScriptedTouch,
    };
    use crate::traits::{ActuatorError, StopPolicy};

    fn step_n(controller: &mut Controller<'_, '_>, n: usize) {
        for _ in 0..n {
            controller.step().unwrap();
        }
    }

    // Fills in the mock type parameters
    type Controller<'c, 'a> = super::Controller<
        'c,
        MockActuator<'a>,
        ScriptedTouch,
        ScriptedReflection<'a>,
        crate::testing::MockSound<'a>,
        crate::testing::CountingDelay,
    >;

    fn controller<'c, 'a>(rig: MockRig<'a>, config: &'c RigConfig) -> Controller<'c, 'a> {
        super::Controller::new(rig, config)
    }

    #[test]
    fn test_startup_transitions() {
        let clock = Clock::new(0);
        let config = config();
        let mut controller = controller(rig(&clock), &config);
        assert_eq!(controller.state(), State::Boot);

        let boot = controller.step().unwrap();
        assert_eq!(
            boot,
            Transition {
                from: State::Boot,
                event: Event::BootComplete,
                to: State::Homing
            }
        );
        assert!(controller.rig().arm.elbow.settings().is_some());

        let homing = controller.step().unwrap();
        assert_eq!(homing.event, Event::HomingComplete);
        assert_eq!(homing.to, State::Picking);
        assert_eq!(controller.rig().sound.beeps().len(), 1);
    }

    #[test]
    fn test_cycle_alternates_left_and_right() {
        let clock = Clock::new(0);
        let config = config();
        let mut controller = controller(rig(&clock), &config);
        step_n(&mut controller, 2);

        let mut events = heapless::Vec::<Event, 8>::new();
        for _ in 0..6 {
            events.push(controller.step().unwrap().event).unwrap();
        }
        assert_eq!(
            events.as_slice(),
            &[
                Event::PickComplete,
                Event::ReleaseComplete,
                Event::PickComplete,
                Event::ReleaseComplete,
                Event::PickComplete,
                Event::ReleaseComplete,
            ]
        );
        assert_eq!(controller.cycles(), 3);

        let targets = controller.rig().arm.base.targets();
        assert_eq!(targets.as_slice(), &[200, 4, 200, 4, 200, 4]);
    }

    #[test]
    fn test_middle_station_is_never_visited() {
        // The middle station is configured but no cycle step uses it
        let clock = Clock::new(0);
        let config = config();
        let middle = config.stations.angle(Station::Middle);
        assert_eq!(middle, 100);

        let mut controller = controller(rig(&clock), &config);
        step_n(&mut controller, 12);
        assert!(!controller.rig().arm.base.targets().contains(&middle));
    }

    #[test]
    fn test_track_runs_through_cycle() {
        let clock = Clock::new(0);
        let config = config();
        let mut controller = controller(rig(&clock), &config);
        step_n(&mut controller, 6);

        let rig = controller.rig();
        assert_eq!(actuator(rig, Joint::Track).speed(), 140);
        assert_eq!(actuator(rig, Joint::Track).entries().len(), 1);
    }

    #[test]
    fn test_invalid_config_fails_boot() {
        let clock = Clock::new(0);
        let mut config = config();
        config.homing.wait.poll_interval_ms = 0;
        let mut controller = controller(rig(&clock), &config);

        let error = controller.step().unwrap_err();
        assert_eq!(error, ArmError::Config(ConfigError::ZeroPollInterval));
        assert_eq!(controller.state(), State::Error(ErrorKind::ConfigInvalid));
        // Nothing moved or was configured
        assert!(controller.rig().arm.elbow.entries().is_empty());
    }

    #[test]
    fn test_error_is_sticky() {
        let clock = Clock::new(0);
        let mut config = config();
        config.homing.wait.timeout = Timeout::AfterMs(50);
        let rig = rig_with(&clock, ScriptedTouch::never(), ScriptedReflection::new(&[100]));
        let mut controller = controller(rig, &config);

        controller.step().unwrap();
        let error = controller.step().unwrap_err();
        assert_eq!(error, ArmError::HomingTimeout(Joint::Base));
        assert_eq!(controller.state(), State::Error(ErrorKind::HomingTimeout));
        assert_eq!(controller.fault(), Some(error));

        let polls = controller.rig().base_switch.polls();
        assert_eq!(controller.step(), Err(error));
        assert_eq!(controller.rig().base_switch.polls(), polls);
    }

    #[test]
    fn test_run_returns_first_error() {
        let clock = Clock::new(0);
        let config = config();
        let mut rig = rig(&clock);
        // configure, then 3 picks and 2 releases succeed; the 3rd release fails
        rig.arm.base = MockActuator::new(&clock).failing_at(9, ActuatorError::Stalled);
        let mut controller = controller(rig, &config);

        let error = controller.run().unwrap_err();
        assert_eq!(
            error,
            ArmError::Actuator {
                joint: Joint::Base,
                error: ActuatorError::Stalled
            }
        );
        assert_eq!(controller.state(), State::Error(ErrorKind::ActuatorFault));
        assert_eq!(controller.cycles(), 2);
    }

    #[test]
    fn test_park_coasts_everything() {
        let clock = Clock::new(0);
        let config = config();
        let mut controller = controller(rig(&clock), &config);
        step_n(&mut controller, 3);
        controller.park();

        let rig = controller.into_rig();
        for joint in Joint::ALL {
            let mock = actuator(&rig, joint);
            assert_eq!(mock.last_stop(), Some(StopPolicy::Coast), "{joint:?}");
            assert_eq!(mock.speed(), 0);
        }
    }
}
