//! Pickarm - Pick-and-place arm firmware
//!
//! Main firmware binary for an RP2040 driving a three-joint arm and a
//! conveyor track. On power-up the arm homes itself, starts the track and
//! then moves objects from the left station to the right station until it
//! is switched off or a fault stops it.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_time::Timer;
use {defmt_rtt as _, panic_probe as _};

use pickarm_core::Controller;

mod board;
mod config;

/// Main entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Pickarm firmware starting...");

    // Initialize RP2040 peripherals
    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = config::load();
    let rig = board::build_rig(p, &config);

    let mut controller = Controller::new(rig, &config);
    info!("Controller ready, homing");

    // The sequencers block on the motor loops, so this runs on the
    // executor's only task
    let error = loop {
        match controller.step() {
            Ok(transition) => {
                info!("{:?} -> {:?}", transition.from, transition.to);
                if transition.event.is_cycle_event() {
                    debug!("{:?} ({} cycles done)", transition.event, controller.cycles());
                }
            }
            Err(e) => break e,
        }
    };

    error!(
        "Stopped in {:?} after {} cycles: {:?}",
        controller.state(),
        controller.cycles(),
        error
    );
    controller.park();
    warn!("All motors coasting, power cycle to restart");

    loop {
        Timer::after_secs(60).await;
    }
}
