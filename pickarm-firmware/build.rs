//! Build script for pickarm-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates rig.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Keys accepted in each section, mirroring the firmware's parser
const SECTIONS: &[(&str, &[&str])] = &[
    ("actuator", &["direction", "gears", "max_speed", "max_accel", "counts_per_rev"]),
    ("homing", &["poll_interval_ms", "timeout_ms", "beeps", "elbow", "base", "gripper"]),
    ("homing.elbow", &["backoff_speed", "backoff_ms", "seek_speed", "reflection_threshold"]),
    ("homing.base", &["seek_speed"]),
    ("homing.gripper", &["close_speed", "duty_limit", "open_speed", "open_angle"]),
    ("track", &["speed"]),
    (
        "pick",
        &[
            "base_speed",
            "lower_angle",
            "lower_speed",
            "grip_speed",
            "grip_duty_limit",
            "lift_angle",
            "lift_speed",
        ],
    ),
    ("release", &["base_speed", "elbow_angle", "elbow_speed", "open_angle", "open_speed"]),
    ("stations", &["left", "middle", "right"]),
];

const JOINTS: &[&str] = &["gripper", "track", "elbow", "base"];

/// Moves that would never finish with a zero speed
const NONZERO_SPEEDS: &[(&str, &str)] = &[
    ("homing.elbow", "backoff_speed"),
    ("homing.elbow", "seek_speed"),
    ("homing.base", "seek_speed"),
    ("homing.gripper", "close_speed"),
    ("homing.gripper", "open_speed"),
    ("pick", "base_speed"),
    ("pick", "lower_speed"),
    ("pick", "grip_speed"),
    ("pick", "lift_speed"),
    ("release", "base_speed"),
    ("release", "elbow_speed"),
    ("release", "open_speed"),
];

const DUTY_LIMITS: &[(&str, &str)] = &[("homing.gripper", "duty_limit"), ("pick", "grip_duty_limit")];

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate rig.toml configuration at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=rig.toml");

    let config_path = Path::new("rig.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: rig.toml not found!                                      ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds rig.toml as its configuration.              ║\n\
            ║  Please create one in the pickarm-firmware directory.            ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read rig.toml                                  ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    // Parse and validate TOML syntax
    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in rig.toml                          ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    validate_version(&config, &mut errors);
    validate_keys(&config, &mut errors);
    validate_actuators(&config, &mut errors);
    validate_motion(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid rig configuration                                ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=rig.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Look up a dotted section path like "homing.elbow"
fn section<'a>(config: &'a toml::Value, path: &str) -> Option<&'a toml::value::Table> {
    path.split('.')
        .try_fold(config, |value, part| value.get(part))
        .and_then(|value| value.as_table())
}

fn validate_version(config: &toml::Value, errors: &mut Vec<String>) {
    match config.get("version") {
        Some(toml::Value::Integer(1)) => {}
        Some(other) => errors.push(format!("version must be 1, found {}", other)),
        None => errors.push("missing 'version'".to_string()),
    }
}

/// Reject sections and keys the firmware parser would reject
fn validate_keys(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(root) = config.as_table() else {
        return;
    };

    for (name, value) in root {
        if name == "version" {
            continue;
        }
        if name == "actuator" {
            let Some(actuators) = value.as_table() else {
                errors.push("[actuator] must contain [actuator.<joint>] tables".to_string());
                continue;
            };
            for (joint, table) in actuators {
                if !JOINTS.contains(&joint.as_str()) {
                    errors.push(format!("[actuator.{}] is not a joint", joint));
                    continue;
                }
                check_table_keys(&format!("actuator.{}", joint), table, "actuator", errors);
            }
            continue;
        }
        match SECTIONS.iter().find(|(section, _)| *section == name.as_str()) {
            Some(_) => check_table_keys(name, value, name, errors),
            None => errors.push(format!("unknown section [{}]", name)),
        }
    }

    for sub in ["homing.elbow", "homing.base", "homing.gripper"] {
        if let Some(table) = section(config, sub) {
            check_table_keys(sub, &toml::Value::Table(table.clone()), sub, errors);
        }
    }
}

fn check_table_keys(label: &str, value: &toml::Value, kind: &str, errors: &mut Vec<String>) {
    let Some(table) = value.as_table() else {
        errors.push(format!("[{}] must be a table", label));
        return;
    };
    let allowed = SECTIONS
        .iter()
        .find(|(section, _)| *section == kind)
        .map(|(_, keys)| *keys)
        .unwrap_or(&[]);

    for key in table.keys() {
        if !allowed.contains(&key.as_str()) {
            errors.push(format!("[{}] unknown key '{}'", label, key));
        }
    }
}

fn validate_actuators(config: &toml::Value, errors: &mut Vec<String>) {
    for joint in JOINTS {
        let Some(actuator) = section(config, &format!("actuator.{}", joint)) else {
            continue;
        };

        if let Some(direction) = actuator.get("direction") {
            match direction.as_str() {
                Some("cw" | "clockwise" | "ccw" | "counterclockwise") => {}
                _ => errors.push(format!("[actuator.{}] direction must be cw or ccw", joint)),
            }
        }

        if let Some(gears) = actuator.get("gears") {
            let teeth: Vec<i64> = gears
                .as_array()
                .map(|a| a.iter().filter_map(|v| v.as_integer()).collect())
                .unwrap_or_default();
            if teeth.len() != 2 || teeth.iter().any(|&t| t <= 0 || t > u16::MAX as i64) {
                errors.push(format!(
                    "[actuator.{}] gears must be two positive tooth counts",
                    joint
                ));
            }
        }

        if let Some(counts) = actuator.get("counts_per_rev") {
            if !matches!(counts.as_integer(), Some(1..=65535)) {
                errors.push(format!("[actuator.{}] counts_per_rev must be 1-65535", joint));
            }
        }
    }
}

fn validate_motion(config: &toml::Value, errors: &mut Vec<String>) {
    for (path, key) in NONZERO_SPEEDS {
        if let Some(value) = section(config, path).and_then(|t| t.get(*key)) {
            if value.as_integer() == Some(0) {
                errors.push(format!("[{}] {} must not be zero", path, key));
            }
        }
    }

    for (path, key) in DUTY_LIMITS {
        if let Some(value) = section(config, path).and_then(|t| t.get(*key)) {
            if !matches!(value.as_integer(), Some(1..=100)) {
                errors.push(format!("[{}] {} must be 1-100", path, key));
            }
        }
    }

    if let Some(value) = section(config, "homing").and_then(|t| t.get("poll_interval_ms")) {
        if !matches!(value.as_integer(), Some(1..)) {
            errors.push("[homing] poll_interval_ms must be positive".to_string());
        }
    }

    if let Some(value) = section(config, "homing.elbow").and_then(|t| t.get("reflection_threshold"))
    {
        if !matches!(value.as_integer(), Some(0..=100)) {
            errors.push("[homing.elbow] reflection_threshold must be 0-100".to_string());
        }
    }
}
