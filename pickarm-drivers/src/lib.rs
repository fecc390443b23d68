//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in pickarm-core for the arm's hardware, written against `embedded-hal`:
//!
//! - Closed-loop DC servo (H-bridge + PWM + encoder) with stall detection
//! - Touch switch on a GPIO input
//! - Analog reflectance sensor
//! - Active buzzer

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod motor;
pub mod sensor;
pub mod sound;
