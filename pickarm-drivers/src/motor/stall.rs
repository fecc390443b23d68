//! Stall detection
//!
//! A motor is stalled when it has been driven at its duty limit for a
//! whole window without making progress.

/// Detects a blocked output from position feedback
#[derive(Debug, Clone)]
pub struct StallDetector {
    /// How long the saturated, motionless condition must last
    window_ms: u32,
    /// Movement (encoder counts) that counts as progress
    min_progress: i32,
    /// Position at the start of the current window
    anchor: i32,
    elapsed_ms: u32,
}

impl StallDetector {
    pub fn new(window_ms: u32, min_progress: i32) -> Self {
        Self {
            window_ms,
            min_progress: min_progress.max(1),
            anchor: 0,
            elapsed_ms: 0,
        }
    }

    /// Start a new motion from `position`
    pub fn reset(&mut self, position: i32) {
        self.anchor = position;
        self.elapsed_ms = 0;
    }

    /// Feed one control period; returns true once stalled
    pub fn update(&mut self, saturated: bool, position: i32, dt_ms: u32) -> bool {
        if !saturated || (position - self.anchor).abs() >= self.min_progress {
            self.reset(position);
            return false;
        }

        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms);
        self.elapsed_ms >= self.window_ms
    }
}
