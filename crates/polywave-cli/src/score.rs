//! Score file format for offline rendering.
//!
//! A score is a TOML file with optional render settings and a list of timed
//! events:
//!
//! ```toml
//! sample_rate = 44100
//! tail = 1.5
//!
//! [[events]]
//! time = 0.0
//! type = "note_on"
//! note = 60
//! velocity = 100
//!
//! [[events]]
//! time = 0.5
//! type = "note_off"
//! note = 60
//! ```

use polywave_synth::{DEFAULT_SAMPLE_RATE, EventOutcome, PatchError, SynthEvent, SynthState};
use serde::Deserialize;
use std::path::Path;

const MAX_DATA_VALUE: u8 = 127;

/// Longest render accepted: ten minutes at 192 kHz.
pub const MAX_RENDER_FRAMES: usize = 192_000 * 60 * 10;

/// Errors raised while loading, validating or rendering a score.
#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    /// The file could not be read.
    #[error("failed to read score: {0}")]
    Read(#[from] std::io::Error),

    /// The file is not valid score TOML.
    #[error("failed to parse score: {0}")]
    Parse(#[from] toml::de::Error),

    /// An event time is negative or not finite.
    #[error("event {index}: invalid time {time}")]
    InvalidTime {
        /// Position of the event in the file.
        index: usize,
        /// The offending time in seconds.
        time: f64,
    },

    /// A note, velocity, controller or value above 127.
    #[error("event {index}: {field} {value} is out of range 0-127")]
    OutOfRange {
        /// Position of the event in the file.
        index: usize,
        /// Field name.
        field: &'static str,
        /// The offending value.
        value: u8,
    },

    /// A pitch bend outside [-1, 1] or not finite.
    #[error("event {index}: pitch bend {value} is outside [-1, 1]")]
    InvalidPitchBend {
        /// Position of the event in the file.
        index: usize,
        /// The offending value.
        value: f32,
    },

    /// The release tail is negative or not finite.
    #[error("invalid tail length {0}")]
    InvalidTail(f64),

    /// The render would be longer than [`MAX_RENDER_FRAMES`].
    #[error("render of {seconds}s at {sample_rate} Hz exceeds {max} frames")]
    TooLong {
        /// Requested length in seconds, last event plus tail.
        seconds: f64,
        /// Sample rate of the render.
        sample_rate: u32,
        /// The frame limit.
        max: usize,
    },

    /// The sample rate is zero.
    #[error("invalid sample rate {0}")]
    InvalidSampleRate(u32),

    /// The engine rejected its configuration.
    #[error(transparent)]
    Engine(#[from] PatchError),
}

fn default_tail() -> f64 {
    2.0
}

/// A parsed score.
#[derive(Debug, Clone, Deserialize)]
pub struct Score {
    /// Sample rate hint; the command line overrides it.
    #[serde(default)]
    pub sample_rate: Option<u32>,
    /// Seconds rendered after the last event.
    #[serde(default = "default_tail")]
    pub tail: f64,
    /// Timed events in file order.
    #[serde(default)]
    pub events: Vec<TimedEvent>,
}

/// One event at a point in time.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TimedEvent {
    /// Seconds from the start of the render.
    pub time: f64,
    /// The event itself.
    #[serde(flatten)]
    pub event: ScoreEvent,
}

/// Event kinds as written in score files.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScoreEvent {
    /// Key pressed.
    NoteOn {
        /// Note number.
        note: u8,
        /// Velocity.
        velocity: u8,
    },
    /// Key released.
    NoteOff {
        /// Note number.
        note: u8,
        /// Release velocity.
        #[serde(default)]
        velocity: u8,
    },
    /// Controller moved.
    ControlChange {
        /// Controller number.
        controller: u8,
        /// New value.
        value: u8,
    },
    /// Pitch bend in [-1, 1].
    PitchBend {
        /// Bend amount.
        value: f32,
    },
}

impl From<ScoreEvent> for SynthEvent {
    fn from(event: ScoreEvent) -> Self {
        match event {
            ScoreEvent::NoteOn { note, velocity } => SynthEvent::NoteOn { note, velocity },
            ScoreEvent::NoteOff { note, velocity } => SynthEvent::NoteOff { note, velocity },
            ScoreEvent::ControlChange { controller, value } => {
                SynthEvent::ControlChange { controller, value }
            }
            ScoreEvent::PitchBend { value } => SynthEvent::PitchBend(value),
        }
    }
}

fn check_data(index: usize, field: &'static str, value: u8) -> Result<(), ScoreError> {
    if value > MAX_DATA_VALUE {
        return Err(ScoreError::OutOfRange {
            index,
            field,
            value,
        });
    }
    Ok(())
}

impl Score {
    /// Parse and validate score TOML.
    pub fn parse(text: &str) -> Result<Self, ScoreError> {
        let score: Score = toml::from_str(text)?;
        score.validate()?;
        Ok(score)
    }

    /// Read, parse and validate a score file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScoreError> {
        Self::parse(&std::fs::read_to_string(path)?)
    }

    fn validate(&self) -> Result<(), ScoreError> {
        if !(self.tail.is_finite() && self.tail >= 0.0) {
            return Err(ScoreError::InvalidTail(self.tail));
        }
        if self.sample_rate == Some(0) {
            return Err(ScoreError::InvalidSampleRate(0));
        }

        for (index, timed) in self.events.iter().enumerate() {
            if !(timed.time.is_finite() && timed.time >= 0.0) {
                return Err(ScoreError::InvalidTime {
                    index,
                    time: timed.time,
                });
            }
            match timed.event {
                ScoreEvent::NoteOn { note, velocity } | ScoreEvent::NoteOff { note, velocity } => {
                    check_data(index, "note", note)?;
                    check_data(index, "velocity", velocity)?;
                }
                ScoreEvent::ControlChange { controller, value } => {
                    check_data(index, "controller", controller)?;
                    check_data(index, "value", value)?;
                }
                ScoreEvent::PitchBend { value } => {
                    if !(-1.0..=1.0).contains(&value) {
                        return Err(ScoreError::InvalidPitchBend { index, value });
                    }
                }
            }
        }
        Ok(())
    }

    /// Sample rate to render at: `requested`, else the file's, else the default.
    pub fn resolve_sample_rate(&self, requested: Option<u32>) -> Result<u32, ScoreError> {
        match requested.or(self.sample_rate).unwrap_or(DEFAULT_SAMPLE_RATE) {
            0 => Err(ScoreError::InvalidSampleRate(0)),
            rate => Ok(rate),
        }
    }

    /// Events paired with the frame they land on, in time order.
    ///
    /// An event at `time` lands on the first frame at or after
    /// `time * sample_rate`. Events with equal times keep file order.
    pub fn scheduled(&self, sample_rate: u32) -> Vec<(usize, SynthEvent)> {
        let mut events: Vec<&TimedEvent> = self.events.iter().collect();
        events.sort_by(|a, b| a.time.total_cmp(&b.time));
        events
            .into_iter()
            .map(|e| (seconds_to_frames(e.time, sample_rate), e.event.into()))
            .collect()
    }
}

fn seconds_to_frames(seconds: f64, sample_rate: u32) -> usize {
    (seconds * f64::from(sample_rate)).ceil() as usize
}

/// A finished offline render.
#[derive(Debug, Clone)]
pub struct Rendered {
    /// Left channel.
    pub left: Vec<f32>,
    /// Right channel.
    pub right: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Patch switches that happened, as (frame, patch name).
    pub patch_changes: Vec<(usize, String)>,
}

/// Render `score` with the factory patches.
///
/// `tail` overrides the score's tail length when given.
pub fn render_score(
    score: &Score,
    sample_rate: Option<u32>,
    tail: Option<f64>,
) -> Result<Rendered, ScoreError> {
    let sample_rate = score.resolve_sample_rate(sample_rate)?;
    let tail = tail.unwrap_or(score.tail);
    if !(tail.is_finite() && tail >= 0.0) {
        return Err(ScoreError::InvalidTail(tail));
    }

    let last_time = score.events.iter().map(|e| e.time).fold(0.0, f64::max);
    let too_long = || ScoreError::TooLong {
        seconds: last_time + tail,
        sample_rate,
        max: MAX_RENDER_FRAMES,
    };
    let within_limit = |seconds: f64| {
        let frames = (seconds * f64::from(sample_rate)).ceil();
        (frames <= MAX_RENDER_FRAMES as f64).then_some(frames as usize)
    };
    let total_frames = within_limit(last_time)
        .zip(within_limit(tail))
        .and_then(|(events, tail)| events.checked_add(tail))
        .filter(|frames| *frames <= MAX_RENDER_FRAMES)
        .ok_or_else(too_long)?;

    let schedule = score.scheduled(sample_rate);

    let mut synth: SynthState = SynthState::with_factory_patches(sample_rate as f32)?;
    let mut left = vec![0.0; total_frames];
    let mut right = vec![0.0; total_frames];
    let mut patch_changes = Vec::new();
    let mut cursor = 0;

    for (frame, event) in schedule {
        synth.render(&mut left[cursor..frame], &mut right[cursor..frame]);
        cursor = frame;
        if let EventOutcome::PatchChanged { name, .. } = synth.handle_event(event) {
            patch_changes.push((frame, name));
        }
    }
    synth.render(&mut left[cursor..], &mut right[cursor..]);

    tracing::debug!(
        frames = total_frames,
        sample_rate,
        active_voices = synth.active_voice_count(),
        "score rendered"
    );

    Ok(Rendered {
        left,
        right,
        sample_rate,
        patch_changes,
    })
}
