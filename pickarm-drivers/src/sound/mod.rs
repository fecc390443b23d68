//! Audible feedback

pub mod buzzer;

pub use buzzer::Buzzer;
