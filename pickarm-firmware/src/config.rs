//! Rig configuration loading
//!
//! The configuration is `rig.toml`, compiled into the firmware. build.rs
//! has already rejected files with bad syntax or unknown keys, so a failure
//! here means the firmware parser and the build check disagree. The rig
//! then runs on its built-in defaults rather than not at all.

use defmt::*;

use pickarm_core::config::{parse_config, Joint, RigConfig};
use pickarm_core::sequence::Timeout;

/// Embedded configuration (edit rig.toml and rebuild to customize)
const EMBEDDED_CONFIG: &str = include_str!("../rig.toml");

/// Parse and validate the embedded configuration
pub fn load() -> RigConfig {
    let config = match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => config,
        Err(e) => {
            error!("rig.toml line {}: {:?}, using defaults", e.line, e.kind);
            return RigConfig::default();
        }
    };

    if let Err(e) = config.validate() {
        error!("rig.toml rejected: {:?}, using defaults", e);
        return RigConfig::default();
    }

    log_config_summary(&config);
    config
}

/// Log a summary of the loaded configuration
fn log_config_summary(config: &RigConfig) {
    info!("Configuration loaded successfully");
    for joint in Joint::ALL {
        let actuator = config.actuators.get(joint);
        match actuator.gears {
            Some(gears) => debug!(
                "  {}: {:?}, gears {}:{}",
                joint.name(),
                actuator.direction,
                gears.driver_teeth,
                gears.follower_teeth
            ),
            None => debug!("  {}: {:?}, direct", joint.name(), actuator.direction),
        }
    }
    match config.homing.wait.timeout {
        Timeout::Never => debug!("  homing waits forever"),
        Timeout::AfterMs(ms) => debug!("  homing times out after {} ms", ms),
    }
    debug!(
        "  stations: left={} middle={} right={}",
        config.stations.left, config.stations.middle, config.stations.right
    );
}
