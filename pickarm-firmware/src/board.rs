//! Board wiring
//!
//! Pin assignments for an RP2040 board with two dual H-bridges:
//!
//! | Motor    | PWM (A)  | IN1    | IN2     | Encoder (B)        |
//! |----------|----------|--------|---------|--------------------|
//! | gripper  | GPIO0    | GPIO1  | GPIO16  | GPIO9  (slice 4)   |
//! | track    | GPIO2    | GPIO3  | GPIO17  | GPIO11 (slice 5)   |
//! | elbow    | GPIO4    | GPIO5  | GPIO18  | GPIO13 (slice 6)   |
//! | base     | GPIO6    | GPIO7  | GPIO19  | GPIO15 (slice 7)   |
//!
//! The base touch switch is on GPIO20 (to ground, internal pull-up), the
//! buzzer on GPIO21 and the elbow reflectance sensor on ADC0 (GPIO26).
//!
//! Encoder pulses are counted by PWM slices 4-7 in input mode, so position
//! tracking needs no interrupts.

use core::convert::Infallible;

use defmt::*;
use embassy_rp::adc::{self, Adc, Blocking, Channel};
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::pwm::{self, InputMode, Pwm};
use embassy_rp::Peripherals;
use embassy_time::Delay;
use embedded_hal::pwm::{ErrorType, SetDutyCycle};

use pickarm_core::config::{ActuatorConfig, RigConfig};
use pickarm_core::motion::AngleMap;
use pickarm_core::rig::{Arm, Rig};
use pickarm_core::traits::SensorError;
use pickarm_drivers::motor::{DcServo, DcServoConfig, PulseCounter, SingleChannelEncoder};
use pickarm_drivers::sensor::{AdcReader, AnalogReflection, Calibration, TouchSwitch};
use pickarm_drivers::sound::Buzzer;

/// H-bridge PWM period in clock cycles (125 MHz / 6250 = 20 kHz)
const BRIDGE_PWM_TOP: u16 = 6250;

pub type Servo = DcServo<BridgePwm, Output<'static>, SingleChannelEncoder<EdgeCounter>, Delay>;

pub type BoardRig = Rig<
    Servo,
    TouchSwitch<Input<'static>>,
    AnalogReflection<ReflectanceAdc>,
    Buzzer<Output<'static>, Delay>,
    Delay,
>;

/// H-bridge enable line on PWM channel A
pub struct BridgePwm {
    pwm: Pwm<'static>,
    config: pwm::Config,
}

impl BridgePwm {
    fn new(pwm: Pwm<'static>, config: pwm::Config) -> Self {
        Self { pwm, config }
    }
}

impl ErrorType for BridgePwm {
    type Error = Infallible;
}

impl SetDutyCycle for BridgePwm {
    fn max_duty_cycle(&self) -> u16 {
        self.config.top
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.config.compare_a = duty.min(self.config.top);
        self.pwm.set_config(&self.config);
        Ok(())
    }
}

/// Encoder channel counted by a PWM slice in edge-counting mode
pub struct EdgeCounter {
    pwm: Pwm<'static>,
}

impl PulseCounter for EdgeCounter {
    fn pulses(&mut self) -> u16 {
        self.pwm.counter()
    }
}

/// Reflectance sensor channel on the blocking ADC
pub struct ReflectanceAdc {
    adc: Adc<'static, Blocking>,
    channel: Channel<'static>,
}

impl AdcReader for ReflectanceAdc {
    fn read(&mut self) -> Result<u16, SensorError> {
        self.adc.blocking_read(&mut self.channel).map_err(|e| {
            warn!("ADC read failed: {:?}", e);
            SensorError::ReadFailed
        })
    }
}

fn bridge_config() -> pwm::Config {
    let mut config = pwm::Config::default();
    config.top = BRIDGE_PWM_TOP;
    config.compare_a = 0;
    config
}

fn counter_config() -> pwm::Config {
    let mut config = pwm::Config::default();
    config.top = u16::MAX;
    config
}

fn servo(
    pwm: Pwm<'static>,
    in1: Output<'static>,
    in2: Output<'static>,
    counter: Pwm<'static>,
    actuator: &ActuatorConfig,
) -> Servo {
    let config = DcServoConfig::new(AngleMap::from_config(actuator));
    let encoder = SingleChannelEncoder::new(EdgeCounter { pwm: counter });
    DcServo::new(
        BridgePwm::new(pwm, bridge_config()),
        in1,
        in2,
        encoder,
        Delay,
        config,
    )
}

/// Claim the peripherals and assemble the rig
pub fn build_rig(p: Peripherals, config: &RigConfig) -> BoardRig {
    let actuators = &config.actuators;

    let gripper = servo(
        Pwm::new_output_a(p.PWM_SLICE0, p.PIN_0, bridge_config()),
        Output::new(p.PIN_1, Level::Low),
        Output::new(p.PIN_16, Level::Low),
        Pwm::new_input(p.PWM_SLICE4, p.PIN_9, Pull::Up, InputMode::RisingEdge, counter_config()),
        &actuators.gripper,
    );
    let track = servo(
        Pwm::new_output_a(p.PWM_SLICE1, p.PIN_2, bridge_config()),
        Output::new(p.PIN_3, Level::Low),
        Output::new(p.PIN_17, Level::Low),
        Pwm::new_input(p.PWM_SLICE5, p.PIN_11, Pull::Up, InputMode::RisingEdge, counter_config()),
        &actuators.track,
    );
    let elbow = servo(
        Pwm::new_output_a(p.PWM_SLICE2, p.PIN_4, bridge_config()),
        Output::new(p.PIN_5, Level::Low),
        Output::new(p.PIN_18, Level::Low),
        Pwm::new_input(p.PWM_SLICE6, p.PIN_13, Pull::Up, InputMode::RisingEdge, counter_config()),
        &actuators.elbow,
    );
    let base = servo(
        Pwm::new_output_a(p.PWM_SLICE3, p.PIN_6, bridge_config()),
        Output::new(p.PIN_7, Level::Low),
        Output::new(p.PIN_19, Level::Low),
        Pwm::new_input(p.PWM_SLICE7, p.PIN_15, Pull::Up, InputMode::RisingEdge, counter_config()),
        &actuators.base,
    );
    info!("Motors initialized");

    let base_switch = TouchSwitch::new(Input::new(p.PIN_20, Pull::Up));

    let adc = Adc::new_blocking(p.ADC, adc::Config::default());
    let channel = Channel::new_pin(p.PIN_26, Pull::None);
    let mut elbow_sensor =
        AnalogReflection::new(ReflectanceAdc { adc, channel }, Calibration::PULL_UP);
    // Raw value for recalibrating Calibration::PULL_UP on a new rig
    match elbow_sensor.raw() {
        Ok(raw) => debug!("Reflectance raw reading {}", raw),
        Err(e) => warn!("Reflectance sensor unreadable: {:?}", e),
    }

    let sound = Buzzer::with_default_timing(Output::new(p.PIN_21, Level::Low), Delay);
    info!("Sensors initialized");

    Rig {
        arm: Arm {
            base,
            elbow,
            gripper,
        },
        track,
        base_switch,
        elbow_sensor,
        sound,
        delay: Delay,
    }
}
