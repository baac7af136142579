//! Polywave Synth - Polyphonic wavetable voice engine
//!
//! This crate turns a stream of note and controller events into audio. It
//! owns voice allocation, the envelope generator, the wavetable oscillator,
//! pitch bend mapping and the block renderer. Opening devices and parsing
//! MIDI bytes live in `polywave-io`.
//!
//! # Core Components
//!
//! ## Voices
//!
//! - [`Voice`] - One note slot: note, velocity, envelope state, gain, phase
//! - [`VoiceBank`] - Fixed-capacity bank with "steal the quietest" allocation
//! - [`EnvelopeState`] - Idle, Attack, DecaySustain, ReleaseStart, Release
//!
//! ```rust
//! use polywave_synth::{Allocation, VoiceBank};
//!
//! let mut bank: VoiceBank<2> = VoiceBank::new();
//! bank.note_on(60, 100);
//! bank.note_on(64, 100);
//! // Both slots are busy; the quietest is reassigned.
//! assert!(matches!(bank.note_on(67, 100), Allocation::Stolen { .. }));
//! ```
//!
//! ## Patches
//!
//! - [`Patch`] - Envelope steps plus a single-cycle waveform table
//! - [`PatchSet`] - Non-empty list selectable by controllers 1 and 2
//! - [`EnvelopeParams`] - Envelope rates in gain per second
//!
//! ## Controls
//!
//! - [`ControlState`] - Controller table, pitch bend, active patch
//! - [`pitch_bend_from_14bit`] - Raw MIDI bend to [-1, 1]
//! - [`TONE_MAP`] / [`bent_frequency`] - Note frequencies and the whole-tone bend
//!
//! ## Engine
//!
//! - [`SynthState`] - Everything above, plus the renderer
//! - [`SharedSynth`] - Lock-guarded handle for an event thread and an audio thread
//!
//! # no_std Support
//!
//! The engine itself needs only `alloc`. Disable the default `std` feature to
//! drop [`SharedSynth`]:
//!
//! ```toml
//! [dependencies]
//! polywave-synth = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use polywave_synth::{SynthEvent, SynthState};
//!
//! let mut synth: SynthState = SynthState::with_factory_patches(44_100.0).unwrap();
//!
//! synth.handle_event(SynthEvent::NoteOn { note: 60, velocity: 100 });
//! synth.handle_event(SynthEvent::PitchBend(0.5));
//!
//! let mut left = vec![0.0; 1024];
//! let mut right = vec![0.0; 1024];
//! synth.render(&mut left, &mut right);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod control;
pub mod engine;
pub mod envelope;
pub mod event;
pub mod oscillator;
pub mod patch;
#[cfg(feature = "std")]
pub mod shared;
pub mod tone_map;
pub mod voice;

// Re-export main types at crate root
pub use control::{
    CC_PATCH_NEXT, CC_PATCH_PREV, CC_SUSTAIN, ControlState, PatchChange, pitch_bend_from_14bit,
};
pub use engine::{DEFAULT_SAMPLE_RATE, SynthState, VOICE_MIX_GAIN};
pub use envelope::EnvelopeState;
pub use event::{EventOutcome, SynthEvent};
pub use patch::{EnvelopeParams, FACTORY_TABLE_LEN, Patch, PatchError, PatchSet};
#[cfg(feature = "std")]
pub use shared::{EngineSnapshot, SharedSynth};
pub use tone_map::{BEND_RANGE_SEMITONES, MAX_NOTE, TONE_MAP, bent_frequency, tone};
pub use voice::{Allocation, MAX_POLYPHONY, MAX_VELOCITY, Voice, VoiceBank};
