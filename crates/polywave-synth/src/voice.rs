//! Voices and the fixed-capacity voice bank.
//!
//! A [`Voice`] is one note slot: note number, velocity, envelope state,
//! gain and oscillator phase. The [`VoiceBank`] owns exactly `N` of them and
//! implements note allocation with "steal the quietest" voice stealing.
//! Slot positions are an implementation detail and never leave this module.

use crate::envelope::EnvelopeState;
use crate::tone_map::MAX_NOTE;

/// Number of voices in the default bank.
pub const MAX_POLYPHONY: usize = 16;

/// Highest velocity value; also the divisor for the velocity target level.
pub const MAX_VELOCITY: u8 = 127;

/// One note slot.
///
/// A voice is free when both its gain and velocity are zero. Free voices
/// render silence and are the first candidates for new notes.
///
/// # Invariants
///
/// - `0.0 <= gain <= 1.0`
/// - `0.0 <= phase < 1.0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Voice {
    pub(crate) note: u8,
    pub(crate) velocity: u8,
    pub(crate) state: EnvelopeState,
    pub(crate) gain: f32,
    pub(crate) phase: f32,
}

impl Default for Voice {
    fn default() -> Self {
        Self::new()
    }
}

impl Voice {
    /// A free, silent voice.
    pub const fn new() -> Self {
        Self {
            note: 0,
            velocity: 0,
            state: EnvelopeState::Idle,
            gain: 0.0,
            phase: 0.0,
        }
    }

    /// Current note number (0 doubles as "unassigned").
    pub fn note(&self) -> u8 {
        self.note
    }

    /// Current velocity (0 means silent).
    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    /// Current envelope stage.
    pub fn state(&self) -> EnvelopeState {
        self.state
    }

    /// Current envelope gain.
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Current oscillator phase in [0, 1).
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Envelope target for this velocity, in [0, 1].
    #[inline]
    pub fn target_level(&self) -> f32 {
        f32::from(self.velocity) / f32::from(MAX_VELOCITY)
    }

    /// True when the voice holds no sound and can be reused freely.
    #[inline]
    pub fn is_free(&self) -> bool {
        self.gain == 0.0 && self.velocity == 0
    }

    /// True while the key for this voice is held.
    pub fn is_gated(&self) -> bool {
        self.state.is_gated()
    }

    /// True once the attack ramp has reached the target level.
    pub fn peak_reached(&self) -> bool {
        matches!(
            self.state,
            EnvelopeState::DecaySustain | EnvelopeState::ReleaseStart
        )
    }

    /// Return the voice to the free state.
    pub(crate) fn clear(&mut self) {
        *self = Self::new();
    }
}

/// How a note-on was placed in the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allocation {
    /// The note was already in a slot; it was retriggered in place with its
    /// phase and gain preserved.
    Retriggered,
    /// A free slot took the note.
    Assigned,
    /// A sounding slot was reassigned.
    Stolen {
        /// Note the slot held before.
        previous_note: u8,
    },
}

/// Fixed-size bank of voices with linear-scan allocation.
///
/// # Example
///
/// ```rust
/// use polywave_synth::{Allocation, VoiceBank};
///
/// let mut bank: VoiceBank = VoiceBank::new();
/// assert_eq!(bank.note_on(60, 100), Allocation::Assigned);
/// assert_eq!(bank.note_on(60, 80), Allocation::Retriggered);
/// bank.note_off(60);
/// ```
#[derive(Debug, Clone)]
pub struct VoiceBank<const N: usize = MAX_POLYPHONY> {
    voices: [Voice; N],
}

impl<const N: usize> Default for VoiceBank<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> VoiceBank<N> {
    /// Create a bank of `N` free voices.
    pub fn new() -> Self {
        Self {
            voices: [Voice::new(); N],
        }
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        N
    }

    /// Number of voices that are not free.
    pub fn active_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| !v.is_free()).count()
    }

    /// Read access to every voice.
    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub(crate) fn iter_mut(&mut self) -> core::slice::IterMut<'_, Voice> {
        self.voices.iter_mut()
    }

    /// Start (or retrigger) `note` at `velocity`.
    ///
    /// A slot already holding `note` is retriggered without touching its
    /// phase or gain. Otherwise the slot with the lowest gain is taken and
    /// its phase restarts at zero. Ties go to a free slot first, then to the
    /// lowest slot. Never rejects a note. Values above 127 saturate.
    pub fn note_on(&mut self, note: u8, velocity: u8) -> Allocation {
        let note = note.min(MAX_NOTE);
        let velocity = velocity.min(MAX_VELOCITY);

        let mut quietest = 0;
        let mut quietest_free = false;
        let mut min_gain = f32::INFINITY;
        for (i, voice) in self.voices.iter_mut().enumerate() {
            if voice.note == note {
                voice.velocity = velocity;
                voice.gate_on();
                return Allocation::Retriggered;
            }
            // A note that has not rendered yet also sits at zero gain; a free
            // slot wins that tie so simultaneous notes do not evict each other.
            let free = voice.is_free();
            if voice.gain < min_gain || (voice.gain == min_gain && free && !quietest_free) {
                min_gain = voice.gain;
                quietest = i;
                quietest_free = free;
            }
        }

        let voice = &mut self.voices[quietest];
        let allocation = if voice.is_free() {
            Allocation::Assigned
        } else {
            Allocation::Stolen {
                previous_note: voice.note,
            }
        };
        voice.note = note;
        voice.velocity = velocity;
        voice.phase = 0.0;
        voice.gate_on();
        allocation
    }

    /// Release the first sounding voice holding `note`.
    ///
    /// Only the gate is cleared; the envelope carries the voice through its
    /// release. Returns `false` when no sounding voice holds the note.
    pub fn note_off(&mut self, note: u8) -> bool {
        let note = note.min(MAX_NOTE);
        match self
            .voices
            .iter_mut()
            .find(|v| v.note == note && !v.is_free())
        {
            Some(voice) => {
                voice.gate_off();
                true
            }
            None => false,
        }
    }

    /// Silence every voice immediately.
    pub fn reset(&mut self) {
        for voice in &mut self.voices {
            voice.clear();
        }
    }
}
