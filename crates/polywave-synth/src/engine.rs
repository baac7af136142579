//! The complete single-threaded engine: voices, controls, patches, renderer.
//!
//! [`SynthState`] owns everything the event and render paths touch. It does
//! no locking of its own; wrap it in [`SharedSynth`](crate::SharedSynth) to
//! drive it from two threads.

use crate::control::ControlState;
use crate::event::{EventOutcome, SynthEvent};
use crate::patch::{Patch, PatchError, PatchSet};
use crate::tone_map::bent_frequency;
use crate::voice::{Allocation, MAX_POLYPHONY, Voice, VoiceBank};

/// Scale applied to each voice before summing.
pub const VOICE_MIX_GAIN: f32 = 0.8;

/// Sample rate used when none is configured.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Polyphonic wavetable engine.
///
/// # Example
///
/// ```rust
/// use polywave_synth::{SynthEvent, SynthState};
///
/// let mut synth: SynthState = SynthState::with_factory_patches(44_100.0).unwrap();
/// synth.handle_event(SynthEvent::NoteOn { note: 60, velocity: 100 });
/// synth.handle_event(SynthEvent::NoteOn { note: 64, velocity: 100 });
///
/// let mut left = vec![0.0; 512];
/// let mut right = vec![0.0; 512];
/// synth.render(&mut left, &mut right);
///
/// assert_eq!(left, right);
/// assert!(left.iter().all(|s| (-1.0..=1.0).contains(s)));
/// ```
#[derive(Debug, Clone)]
pub struct SynthState<const N: usize = MAX_POLYPHONY> {
    bank: VoiceBank<N>,
    control: ControlState,
    patches: PatchSet,
    sample_rate: f32,
}

impl<const N: usize> SynthState<N> {
    /// Create an engine over `patches`, starting on patch 0.
    pub fn new(patches: PatchSet, sample_rate: f32) -> Result<Self, PatchError> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(PatchError::InvalidSampleRate(sample_rate));
        }
        Ok(Self {
            bank: VoiceBank::new(),
            control: ControlState::new(patches.len()),
            patches,
            sample_rate,
        })
    }

    /// Create an engine with the built-in `sine` and `sampled` patches.
    pub fn with_factory_patches(sample_rate: f32) -> Result<Self, PatchError> {
        Self::new(PatchSet::factory(sample_rate)?, sample_rate)
    }

    /// Apply one event.
    pub fn handle_event(&mut self, event: SynthEvent) -> EventOutcome {
        match event {
            SynthEvent::NoteOn { note, velocity } => {
                self.note_on(note, velocity);
                EventOutcome::None
            }
            SynthEvent::NoteOff { note, .. } => {
                self.note_off(note);
                EventOutcome::None
            }
            SynthEvent::ControlChange { controller, value } => {
                self.control_change(controller, value)
            }
            SynthEvent::PitchBend(pitch) => {
                self.control.apply_pitch_bend(pitch);
                EventOutcome::None
            }
        }
    }

    /// Start or retrigger a note.
    pub fn note_on(&mut self, note: u8, velocity: u8) -> Allocation {
        let allocation = self.bank.note_on(note, velocity);
        #[cfg(feature = "tracing")]
        if let Allocation::Stolen { previous_note } = allocation {
            tracing::trace!(note, previous_note, "voice stolen");
        }
        allocation
    }

    /// Release a note. Unknown notes are ignored.
    pub fn note_off(&mut self, note: u8) -> bool {
        self.bank.note_off(note)
    }

    /// Store a controller value; controllers 1 and 2 may switch the patch.
    pub fn control_change(&mut self, controller: u8, value: u8) -> EventOutcome {
        match self.control.apply_control_change(controller, value) {
            Some(change) => {
                let name = self.patches.get(change.current).name();
                #[cfg(feature = "tracing")]
                tracing::info!(
                    from = change.previous,
                    to = change.current,
                    patch = name,
                    "patch changed"
                );
                EventOutcome::PatchChanged {
                    index: change.current,
                    name: name.into(),
                }
            }
            None => EventOutcome::None,
        }
    }

    /// Set the normalized pitch bend.
    pub fn pitch_bend(&mut self, pitch: f32) {
        self.control.apply_pitch_bend(pitch);
    }

    /// Compute one mono sample from every voice.
    ///
    /// Each voice's envelope is advanced, its bent frequency computed and
    /// its oscillator output summed at [`VOICE_MIX_GAIN`]. The sum is
    /// clipped to [-1, 1].
    #[inline]
    pub fn render_frame(&mut self) -> f32 {
        let patch = self.patches.get(self.control.patch_index());
        let pedal = self.control.sustain();
        let pitch = self.control.pitch();

        let mut sum = 0.0;
        for voice in self.bank.iter_mut() {
            voice.advance_envelope(patch, pedal);
            let frequency = bent_frequency(voice.note(), pitch);
            sum += VOICE_MIX_GAIN * voice.oscillate(patch, frequency, self.sample_rate);
        }
        sum.clamp(-1.0, 1.0)
    }

    /// Fill a stereo pair; both channels receive the same samples.
    ///
    /// Renders `min(left.len(), right.len())` frames.
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let sample = self.render_frame();
            *l = sample;
            *r = sample;
        }
    }

    /// Fill an interleaved buffer, duplicating each sample into every channel.
    ///
    /// A trailing partial frame is left untouched. `channels == 0` does nothing.
    pub fn render_interleaved(&mut self, out: &mut [f32], channels: usize) {
        if channels == 0 {
            return;
        }
        for frame in out.chunks_exact_mut(channels) {
            frame.fill(self.render_frame());
        }
    }

    /// Silence every voice and return all controls to rest.
    pub fn reset(&mut self) {
        self.bank.reset();
        self.control.reset();
    }

    /// All voices, in slot order.
    pub fn voices(&self) -> &[Voice] {
        self.bank.voices()
    }

    /// Number of voices that are not free.
    pub fn active_voice_count(&self) -> usize {
        self.bank.active_voice_count()
    }

    /// Controller table, pitch and patch selection.
    pub fn control(&self) -> &ControlState {
        &self.control
    }

    /// Current pitch bend in [-1, 1].
    pub fn pitch(&self) -> f32 {
        self.control.pitch()
    }

    /// Index of the active patch.
    pub fn patch_index(&self) -> usize {
        self.control.patch_index()
    }

    /// The active patch.
    pub fn active_patch(&self) -> &Patch {
        self.patches.get(self.control.patch_index())
    }

    /// Every selectable patch.
    pub fn patches(&self) -> &PatchSet {
        &self.patches
    }

    /// Output sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}
