//! Configuration type definitions
//!
//! Defaults reproduce the rig as built: elbow on an 8:40 gear train, base on
//! 12:36, both counter-clockwise and limited to 50 deg/s and 120 deg/s².

use crate::sequence::wait::{Timeout, WaitPolicy};
use crate::traits::{Direction, RunSettings};

/// Configuration format version understood by this firmware
pub const CONFIG_VERSION: u8 = 1;

/// Encoder counts per motor revolution (quadrature, both edges)
pub const DEFAULT_COUNTS_PER_REV: u16 = 360;

/// Sensor poll interval during homing
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 10;

/// Motion limits of the geared joints
pub const DEFAULT_RUN_SETTINGS: RunSettings = RunSettings {
    max_speed: 50,
    max_accel: 120,
};

/// Logical actuator names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Joint {
    Gripper,
    Track,
    Elbow,
    Base,
}

impl Joint {
    /// All joints, in port order (A to D)
    pub const ALL: [Joint; 4] = [Joint::Gripper, Joint::Elbow, Joint::Base, Joint::Track];

    /// Name used in `[actuator.<name>]` sections
    pub fn name(self) -> &'static str {
        match self {
            Joint::Gripper => "gripper",
            Joint::Track => "track",
            Joint::Elbow => "elbow",
            Joint::Base => "base",
        }
    }

    /// Look up a joint by its section name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|j| j.name() == name)
    }
}

/// Gear train between motor and output, as tooth counts
///
/// `driver_teeth` sits on the motor shaft. An 8-tooth gear driving a
/// 40-tooth gear turns the output 1 degree per 5 motor degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GearTrain {
    pub driver_teeth: u16,
    pub follower_teeth: u16,
}

impl GearTrain {
    pub const fn new(driver_teeth: u16, follower_teeth: u16) -> Self {
        Self {
            driver_teeth,
            follower_teeth,
        }
    }
}

/// Per-actuator mechanics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActuatorConfig {
    /// Which way positive speed turns the output
    pub direction: Direction,
    /// Gear train, or `None` for direct drive
    pub gears: Option<GearTrain>,
    /// Motion limits applied before homing
    pub run_settings: Option<RunSettings>,
    /// Encoder resolution at the motor shaft
    pub counts_per_rev: u16,
}

impl ActuatorConfig {
    /// Direct-drive clockwise actuator with no run settings
    pub const fn direct() -> Self {
        Self {
            direction: Direction::Clockwise,
            gears: None,
            run_settings: None,
            counts_per_rev: DEFAULT_COUNTS_PER_REV,
        }
    }

    /// Geared actuator with motion limits
    pub const fn geared(direction: Direction, gears: GearTrain, run_settings: RunSettings) -> Self {
        Self {
            direction,
            gears: Some(gears),
            run_settings: Some(run_settings),
            counts_per_rev: DEFAULT_COUNTS_PER_REV,
        }
    }
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self::direct()
    }
}

/// Mechanics of all four actuators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Actuators {
    pub gripper: ActuatorConfig,
    pub track: ActuatorConfig,
    pub elbow: ActuatorConfig,
    pub base: ActuatorConfig,
}

impl Actuators {
    pub fn get(&self, joint: Joint) -> &ActuatorConfig {
        match joint {
            Joint::Gripper => &self.gripper,
            Joint::Track => &self.track,
            Joint::Elbow => &self.elbow,
            Joint::Base => &self.base,
        }
    }

    pub fn get_mut(&mut self, joint: Joint) -> &mut ActuatorConfig {
        match joint {
            Joint::Gripper => &mut self.gripper,
            Joint::Track => &mut self.track,
            Joint::Elbow => &mut self.elbow,
            Joint::Base => &mut self.base,
        }
    }
}

impl Default for Actuators {
    fn default() -> Self {
        let limits = DEFAULT_RUN_SETTINGS;
        Self {
            gripper: ActuatorConfig::direct(),
            track: ActuatorConfig::direct(),
            elbow: ActuatorConfig::geared(Direction::CounterClockwise, GearTrain::new(8, 40), limits),
            base: ActuatorConfig::geared(Direction::CounterClockwise, GearTrain::new(12, 36), limits),
        }
    }
}

/// Elbow homing against the reflectance sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ElbowHoming {
    /// Speed of the initial move that frees the arm (deg/s)
    pub backoff_speed: i32,
    /// Duration of the initial move
    pub backoff_ms: u32,
    /// Speed while seeking the white beam (deg/s)
    pub seek_speed: i32,
    /// Reflection reading that marks the datum (0-100)
    pub reflection_threshold: u8,
}

impl Default for ElbowHoming {
    fn default() -> Self {
        Self {
            backoff_speed: -30,
            backoff_ms: 500,
            seek_speed: 15,
            reflection_threshold: 32,
        }
    }
}

/// Base homing against the touch switch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BaseHoming {
    /// Speed while seeking the switch (deg/s)
    pub seek_speed: i32,
}

impl Default for BaseHoming {
    fn default() -> Self {
        Self { seek_speed: -60 }
    }
}

/// Gripper initialization against its mechanical end stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GripperHoming {
    /// Closing speed (deg/s)
    pub close_speed: i32,
    /// Duty limit for stall detection (percent)
    pub duty_limit: u8,
    /// Opening speed (deg/s)
    pub open_speed: i32,
    /// Open position relative to the closed stop (degrees)
    pub open_angle: i32,
}

impl Default for GripperHoming {
    fn default() -> Self {
        Self {
            close_speed: 200,
            duty_limit: 50,
            open_speed: 200,
            open_angle: -90,
        }
    }
}

/// Homing sequence configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HomingConfig {
    /// Poll interval and timeout for sensor waits
    pub wait: WaitPolicy,
    /// Beeps emitted once homing is complete
    pub beeps: u8,
    pub elbow: ElbowHoming,
    pub base: BaseHoming,
    pub gripper: GripperHoming,
}

impl Default for HomingConfig {
    fn default() -> Self {
        Self {
            wait: WaitPolicy {
                poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
                timeout: Timeout::Never,
            },
            beeps: 3,
            elbow: ElbowHoming::default(),
            base: BaseHoming::default(),
            gripper: GripperHoming::default(),
        }
    }
}

/// Conveyor track configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TrackConfig {
    /// Constant speed started at the end of homing (deg/s)
    pub speed: i32,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self { speed: 140 }
    }
}

/// Pick choreography
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PickConfig {
    /// Base rotation speed (deg/s)
    pub base_speed: i32,
    /// Elbow angle at which the gripper reaches the object
    pub lower_angle: i32,
    pub lower_speed: i32,
    /// Gripper closing speed (deg/s)
    pub grip_speed: i32,
    /// Duty limit while closing on the object (percent)
    pub grip_duty_limit: u8,
    /// Elbow angle the object is carried at
    pub lift_angle: i32,
    pub lift_speed: i32,
}

impl Default for PickConfig {
    fn default() -> Self {
        Self {
            base_speed: 60,
            lower_angle: -40,
            lower_speed: 60,
            grip_speed: 200,
            grip_duty_limit: 50,
            lift_angle: 0,
            lift_speed: 80,
        }
    }
}

/// Release choreography
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReleaseConfig {
    /// Base rotation speed (deg/s)
    pub base_speed: i32,
    /// Elbow angle the object is dropped from
    pub elbow_angle: i32,
    pub elbow_speed: i32,
    /// Gripper open position
    pub open_angle: i32,
    pub open_speed: i32,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            base_speed: 60,
            elbow_angle: -5,
            elbow_speed: 60,
            open_angle: -90,
            open_speed: 200,
        }
    }
}

/// Named base positions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Station {
    Left,
    Middle,
    Right,
}

/// Base angle of each station (degrees from the touch-switch datum)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Stations {
    pub left: i32,
    /// Not visited by [`CYCLE_PLAN`]; kept for a third destination
    pub middle: i32,
    pub right: i32,
}

impl Stations {
    pub fn angle(&self, station: Station) -> i32 {
        match station {
            Station::Left => self.left,
            Station::Middle => self.middle,
            Station::Right => self.right,
        }
    }
}

impl Default for Stations {
    fn default() -> Self {
        Self {
            left: 200,
            middle: 100,
            right: 4,
        }
    }
}

/// Where the cycle picks from and releases to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CyclePlan {
    pub pick_from: Station,
    pub release_to: Station,
}

/// The only cycle this rig runs
pub const CYCLE_PLAN: CyclePlan = CyclePlan {
    pick_from: Station::Left,
    release_to: Station::Right,
};

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A move speed is zero; the named field never completes
    ZeroSpeed(&'static str),
    /// A gear train has a zero tooth count
    ZeroGearTeeth(Joint),
    /// Encoder resolution is zero
    ZeroCountsPerRev(Joint),
    /// A stall duty limit is outside 1..=100
    InvalidDutyLimit(&'static str),
    /// Sensor poll interval is zero
    ZeroPollInterval,
    /// Elbow reflection threshold above 100; the sensor never reaches it
    InvalidReflectionThreshold(u8),
    /// Config file is for a different firmware
    UnsupportedVersion(u8),
}

/// Complete rig configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RigConfig {
    /// Configuration version for compatibility checks
    pub version: u8,
    pub actuators: Actuators,
    pub homing: HomingConfig,
    pub track: TrackConfig,
    pub pick: PickConfig,
    pub release: ReleaseConfig,
    pub stations: Stations,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            actuators: Actuators::default(),
            homing: HomingConfig::default(),
            track: TrackConfig::default(),
            pick: PickConfig::default(),
            release: ReleaseConfig::default(),
            stations: Stations::default(),
        }
    }
}

impl RigConfig {
    /// Create the as-built configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the configuration for values that cannot work
    ///
    /// The track speed may be zero (track stopped); every other speed must
    /// be non-zero or its move would never finish.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion(self.version));
        }

        for joint in Joint::ALL {
            let actuator = self.actuators.get(joint);
            if let Some(gears) = actuator.gears {
                if gears.driver_teeth == 0 || gears.follower_teeth == 0 {
                    return Err(ConfigError::ZeroGearTeeth(joint));
                }
            }
            if actuator.counts_per_rev == 0 {
                return Err(ConfigError::ZeroCountsPerRev(joint));
            }
        }

        if self.homing.wait.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        let threshold = self.homing.elbow.reflection_threshold;
        if threshold > 100 {
            return Err(ConfigError::InvalidReflectionThreshold(threshold));
        }

        let speeds = [
            ("homing.elbow.backoff_speed", self.homing.elbow.backoff_speed),
            ("homing.elbow.seek_speed", self.homing.elbow.seek_speed),
            ("homing.base.seek_speed", self.homing.base.seek_speed),
            ("homing.gripper.close_speed", self.homing.gripper.close_speed),
            ("homing.gripper.open_speed", self.homing.gripper.open_speed),
            ("pick.base_speed", self.pick.base_speed),
            ("pick.lower_speed", self.pick.lower_speed),
            ("pick.grip_speed", self.pick.grip_speed),
            ("pick.lift_speed", self.pick.lift_speed),
            ("release.base_speed", self.release.base_speed),
            ("release.elbow_speed", self.release.elbow_speed),
            ("release.open_speed", self.release.open_speed),
        ];
        if let Some((name, _)) = speeds.iter().find(|(_, speed)| *speed == 0) {
            return Err(ConfigError::ZeroSpeed(*name));
        }

        let duty_limits = [
            ("homing.gripper.duty_limit", self.homing.gripper.duty_limit),
            ("pick.grip_duty_limit", self.pick.grip_duty_limit),
        ];
        if let Some((name, _)) = duty_limits
            .iter()
            .find(|(_, limit)| *limit == 0 || *limit > 100)
        {
            return Err(ConfigError::InvalidDutyLimit(*name));
        }

        Ok(())
    }
}
