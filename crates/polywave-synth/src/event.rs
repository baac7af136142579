//! Events consumed by the engine and what they changed.

use alloc::string::String;

/// One input event.
///
/// Note and controller arguments above 127 saturate when applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SynthEvent {
    /// Key pressed.
    NoteOn {
        /// Note number (0-127).
        note: u8,
        /// Velocity (0-127); sets the envelope target.
        velocity: u8,
    },
    /// Key released.
    NoteOff {
        /// Note number (0-127).
        note: u8,
        /// Release velocity; accepted and ignored.
        velocity: u8,
    },
    /// Controller moved.
    ControlChange {
        /// Controller number (0-127).
        controller: u8,
        /// New value (0-127).
        value: u8,
    },
    /// Pitch bend, already normalized to [-1, 1].
    PitchBend(f32),
}

/// Side effect of an event that outer layers may want to report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EventOutcome {
    /// Nothing beyond the state change itself.
    #[default]
    None,
    /// The active patch switched.
    PatchChanged {
        /// New patch index.
        index: usize,
        /// New patch name.
        name: String,
    },
}
