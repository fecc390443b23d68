//! Minimal TOML parser for the rig configuration
//!
//! Handles only the subset `rig.toml` uses. It does NOT support the full
//! TOML spec, and it does not allocate.
//!
//! Supported features:
//! - Key = value pairs (integer, quoted string, integer array)
//! - [section] and [section.subsection] headers
//! - Comments (# ...), including trailing comments
//!
//! Keys that are absent keep their default value. Unknown sections and
//! keys are errors, so a typo cannot silently fall back to a default.

use heapless::Vec as HVec;

use super::types::{GearTrain, Joint, RigConfig, DEFAULT_RUN_SETTINGS};
use crate::sequence::wait::Timeout;
use crate::traits::Direction;

/// Parse error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseErrorKind {
    /// Line is neither a header, a comment nor `key = value`
    InvalidLine,
    /// Unknown or malformed section header
    InvalidSection,
    /// Key not valid in the current section
    UnknownKey,
    /// Value has the wrong type or is out of range
    InvalidValue,
    /// Array has the wrong number of elements
    WrongArrayLength,
}

/// Parse error with the 1-based line it occurred on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParseError {
    pub line: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    fn new(line: usize, kind: ParseErrorKind) -> Self {
        Self { line, kind }
    }
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Actuator(Joint),
    Homing,
    HomingElbow,
    HomingBase,
    HomingGripper,
    Track,
    Pick,
    Release,
    Stations,
}

/// Parse TOML configuration into a [`RigConfig`]
///
/// The result is not validated; call [`RigConfig::validate`] before use.
pub fn parse_config(input: &str) -> Result<RigConfig, ParseError> {
    let mut config = RigConfig::new();
    let mut section = Section::Root;

    for (index, raw) in input.lines().enumerate() {
        let line_no = index + 1;
        let line = strip_comment(raw).trim();

        if line.is_empty() {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            section = parse_section_header(&line[1..line.len() - 1])
                .ok_or(ParseError::new(line_no, ParseErrorKind::InvalidSection))?;
            continue;
        }

        let (key, value) = parse_key_value(line)
            .ok_or(ParseError::new(line_no, ParseErrorKind::InvalidLine))?;

        apply_value(&mut config, section, key, value)
            .map_err(|kind| ParseError::new(line_no, kind))?;
    }

    Ok(config)
}

/// Drop a trailing `# comment` unless the `#` is inside a string
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..i],
            _ => {}
        }
    }
    line
}

/// Parse section header like "actuator.elbow" or "homing.gripper"
fn parse_section_header(header: &str) -> Option<Section> {
    let header = header.trim();
    let (kind, name) = match header.split_once('.') {
        Some((kind, name)) => (kind.trim(), Some(name.trim())),
        None => (header, None),
    };

    match (kind, name) {
        ("actuator", Some(name)) => Joint::from_name(name).map(Section::Actuator),
        ("homing", None) => Some(Section::Homing),
        ("homing", Some("elbow")) => Some(Section::HomingElbow),
        ("homing", Some("base")) => Some(Section::HomingBase),
        ("homing", Some("gripper")) => Some(Section::HomingGripper),
        ("track", None) => Some(Section::Track),
        ("pick", None) => Some(Section::Pick),
        ("release", None) => Some(Section::Release),
        ("stations", None) => Some(Section::Stations),
        _ => None,
    }
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let value = value.trim();

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Parse a string value (removes quotes)
fn parse_string(value: &str) -> Result<&str, ParseErrorKind> {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        Ok(&value[1..value.len() - 1])
    } else {
        Err(ParseErrorKind::InvalidValue)
    }
}

/// Parse an integer value
fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseErrorKind> {
    value.parse().map_err(|_| ParseErrorKind::InvalidValue)
}

/// Parse an integer array like "[8, 40]" with exactly `N` elements
fn parse_int_array<T: core::str::FromStr, const N: usize>(
    value: &str,
) -> Result<HVec<T, N>, ParseErrorKind> {
    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .ok_or(ParseErrorKind::InvalidValue)?;

    let mut items = HVec::new();
    for item in inner.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        items
            .push(parse_int(item)?)
            .map_err(|_| ParseErrorKind::WrongArrayLength)?;
    }

    if items.len() != N {
        return Err(ParseErrorKind::WrongArrayLength);
    }
    Ok(items)
}

/// Parse rotation direction
fn parse_direction(value: &str) -> Result<Direction, ParseErrorKind> {
    match parse_string(value)? {
        "cw" | "clockwise" => Ok(Direction::Clockwise),
        "ccw" | "counterclockwise" => Ok(Direction::CounterClockwise),
        _ => Err(ParseErrorKind::InvalidValue),
    }
}

/// Parse a wait timeout; zero means wait forever
fn parse_timeout(value: &str) -> Result<Timeout, ParseErrorKind> {
    match parse_int::<u32>(value)? {
        0 => Ok(Timeout::Never),
        ms => Ok(Timeout::AfterMs(ms)),
    }
}

/// Apply a parsed value to the appropriate config field
fn apply_value(
    config: &mut RigConfig,
    section: Section,
    key: &str,
    value: &str,
) -> Result<(), ParseErrorKind> {
    match section {
        Section::Root => match key {
            "version" => config.version = parse_int(value)?,
            _ => return Err(ParseErrorKind::UnknownKey),
        },
        Section::Actuator(joint) => {
            let actuator = config.actuators.get_mut(joint);
            match key {
                "direction" => actuator.direction = parse_direction(value)?,
                "gears" => {
                    let teeth = parse_int_array::<u16, 2>(value)?;
                    actuator.gears = Some(GearTrain::new(teeth[0], teeth[1]));
                }
                "max_speed" => {
                    actuator
                        .run_settings
                        .get_or_insert(DEFAULT_RUN_SETTINGS)
                        .max_speed = parse_int(value)?
                }
                "max_accel" => {
                    actuator
                        .run_settings
                        .get_or_insert(DEFAULT_RUN_SETTINGS)
                        .max_accel = parse_int(value)?
                }
                "counts_per_rev" => actuator.counts_per_rev = parse_int(value)?,
                _ => return Err(ParseErrorKind::UnknownKey),
            }
        }
        Section::Homing => match key {
            "poll_interval_ms" => config.homing.wait.poll_interval_ms = parse_int(value)?,
            "timeout_ms" => config.homing.wait.timeout = parse_timeout(value)?,
            "beeps" => config.homing.beeps = parse_int(value)?,
            _ => return Err(ParseErrorKind::UnknownKey),
        },
        Section::HomingElbow => {
            let elbow = &mut config.homing.elbow;
            match key {
                "backoff_speed" => elbow.backoff_speed = parse_int(value)?,
                "backoff_ms" => elbow.backoff_ms = parse_int(value)?,
                "seek_speed" => elbow.seek_speed = parse_int(value)?,
                "reflection_threshold" => elbow.reflection_threshold = parse_int(value)?,
                _ => return Err(ParseErrorKind::UnknownKey),
            }
        }
        Section::HomingBase => match key {
            "seek_speed" => config.homing.base.seek_speed = parse_int(value)?,
            _ => return Err(ParseErrorKind::UnknownKey),
        },
        Section::HomingGripper => {
            let gripper = &mut config.homing.gripper;
            match key {
                "close_speed" => gripper.close_speed = parse_int(value)?,
                "duty_limit" => gripper.duty_limit = parse_int(value)?,
                "open_speed" => gripper.open_speed = parse_int(value)?,
                "open_angle" => gripper.open_angle = parse_int(value)?,
                _ => return Err(ParseErrorKind::UnknownKey),
            }
        }
        Section::Track => match key {
            "speed" => config.track.speed = parse_int(value)?,
            _ => return Err(ParseErrorKind::UnknownKey),
        },
        Section::Pick => {
            let pick = &mut config.pick;
            match key {
                "base_speed" => pick.base_speed = parse_int(value)?,
                "lower_angle" => pick.lower_angle = parse_int(value)?,
                "lower_speed" => pick.lower_speed = parse_int(value)?,
                "grip_speed" => pick.grip_speed = parse_int(value)?,
                "grip_duty_limit" => pick.grip_duty_limit = parse_int(value)?,
                "lift_angle" => pick.lift_angle = parse_int(value)?,
                "lift_speed" => pick.lift_speed = parse_int(value)?,
                _ => return Err(ParseErrorKind::UnknownKey),
            }
        }
        Section::Release => {
            let release = &mut config.release;
            match key {
                "base_speed" => release.base_speed = parse_int(value)?,
                "elbow_angle" => release.elbow_angle = parse_int(value)?,
                "elbow_speed" => release.elbow_speed = parse_int(value)?,
                "open_angle" => release.open_angle = parse_int(value)?,
                "open_speed" => release.open_speed = parse_int(value)?,
                _ => return Err(ParseErrorKind::UnknownKey),
            }
        }
        Section::Stations => {
            let stations = &mut config.stations;
            match key {
                "left" => stations.left = parse_int(value)?,
                "middle" => stations.middle = parse_int(value)?,
                "right" => stations.right = parse_int(value)?,
                _ => return Err(ParseErrorKind::UnknownKey),
            }
        }
    }

    Ok(())
}
