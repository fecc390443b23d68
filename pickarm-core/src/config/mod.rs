//! Rig configuration
//!
//! Every speed, angle and threshold the sequencers use lives in
//! [`RigConfig`]. It is built once at startup, either from the compiled-in
//! defaults or from the embedded `rig.toml`, and then passed by reference.

pub mod parse;
pub mod types;

pub use parse::{parse_config, ParseError, ParseErrorKind};
pub use types::*;
