//! Device and file I/O for the polywave synth.
//!
//! This crate provides the collaborators around the engine:
//!
//! - **Audio output**: [`OutputStream`] opens a cpal output stream and pulls
//!   interleaved buffers from a callback
//! - **MIDI input**: [`MidiInput`] connects a midir port and delivers decoded
//!   [`SynthEvent`](polywave_synth::SynthEvent)s; [`decode_midi`] does the
//!   byte-level decoding on its own
//! - **WAV output**: [`write_wav_stereo`] and [`read_wav_info`] for offline renders
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use polywave_io::{MidiInput, OutputStream, StreamConfig};
//! use polywave_synth::{SharedSynth, SynthState};
//!
//! let synth: SharedSynth = SharedSynth::new(SynthState::with_factory_patches(44_100.0)?);
//!
//! let events = synth.clone();
//! let _midi = MidiInput::connect(None, move |event| {
//!     events.send(event);
//! })?;
//!
//! let audio = synth.clone();
//! let _stream = OutputStream::start(&StreamConfig::default(), move |out, channels| {
//!     audio.render_interleaved(out, channels);
//! })?;
//! ```

mod midi;
mod stream;
mod wav;

pub use midi::{MidiInput, decode_midi, list_midi_ports};
pub use stream::{AudioDevice, OutputStream, StreamConfig, default_output_device, list_devices};
pub use wav::{WavFormat, WavInfo, WavSpec, read_wav_info, read_wav_stereo, write_wav_stereo};

/// Error types for audio and MIDI I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Audio stream setup or runtime error.
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// No audio device available on the system.
    #[error("No audio device available")]
    NoDevice,

    /// The requested audio device or MIDI port was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// MIDI subsystem or connection error.
    #[error("MIDI error: {0}")]
    Midi(String),

    /// WAV bit depth other than 8, 16, 24 or 32.
    #[error("Unsupported bit depth: {0} (expected 8, 16, 24 or 32)")]
    UnsupportedBitDepth(u16),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
