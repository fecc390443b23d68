//! Audible feedback

/// Something that can beep
///
/// Used once, to acknowledge that homing finished. Failures are not
/// observable by the sequencer.
pub trait Sound {
    /// Emit `count` short beeps, blocking until done
    fn beeps(&mut self, count: u8);
}
