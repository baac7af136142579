//! Thread-safe handle shared by the event and render contexts.
//!
//! [`SharedSynth`] puts one [`SynthState`] behind a single `parking_lot::Mutex`.
//! The event side locks for one event at a time. The render side locks once
//! per buffer with `try_lock`; if an event handler holds the lock at that
//! moment the buffer is filled with silence and counted as a dropout, so the
//! audio callback never waits.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::engine::SynthState;
use crate::event::{EventOutcome, SynthEvent};
use crate::voice::MAX_POLYPHONY;

/// Engine status read under the lock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSnapshot {
    /// Voices that are not free.
    pub active_voices: usize,
    /// Active patch index.
    pub patch_index: usize,
    /// Current pitch bend in [-1, 1].
    pub pitch: f32,
    /// Current sustain pedal value.
    pub sustain: u8,
}

struct SharedSynthData<const N: usize> {
    state: Mutex<SynthState<N>>,
    dropouts: AtomicU64,
}

/// Cloneable handle to an engine driven from two threads.
///
/// # Thread Safety
///
/// - **Events**: `lock()` held for a single event, O(voices).
/// - **Render**: `try_lock()` once per buffer, held for the whole buffer.
/// - **Dropouts**: `AtomicU64`, incremented by the render side only.
///
/// ```rust
/// use polywave_synth::{SharedSynth, SynthEvent, SynthState};
///
/// let synth: SharedSynth = SharedSynth::new(SynthState::with_factory_patches(44_100.0).unwrap());
/// let events = synth.clone();
/// events.send(SynthEvent::NoteOn { note: 60, velocity: 100 });
///
/// let mut left = [0.0; 128];
/// let mut right = [0.0; 128];
/// assert!(synth.render(&mut left, &mut right));
/// assert_eq!(synth.snapshot().active_voices, 1);
/// ```
pub struct SharedSynth<const N: usize = MAX_POLYPHONY> {
    inner: Arc<SharedSynthData<N>>,
}

impl<const N: usize> Clone for SharedSynth<N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<const N: usize> core::fmt::Debug for SharedSynth<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SharedSynth")
            .field("dropouts", &self.dropouts())
            .finish_non_exhaustive()
    }
}

impl<const N: usize> SharedSynth<N> {
    /// Take ownership of an engine.
    pub fn new(state: SynthState<N>) -> Self {
        Self {
            inner: Arc::new(SharedSynthData {
                state: Mutex::new(state),
                dropouts: AtomicU64::new(0),
            }),
        }
    }

    // ── Event context ────────────────────────────────────────────────────────

    /// Apply one event, waiting for the lock if a buffer is being rendered.
    pub fn send(&self, event: SynthEvent) -> EventOutcome {
        self.inner.state.lock().handle_event(event)
    }

    // ── Render context ───────────────────────────────────────────────────────

    /// Fill a stereo pair without blocking.
    ///
    /// Returns `false` when the lock was busy; both buffers are then silent
    /// and the dropout counter is incremented.
    pub fn render(&self, left: &mut [f32], right: &mut [f32]) -> bool {
        if let Some(mut state) = self.inner.state.try_lock() {
            state.render(left, right);
            true
        } else {
            left.fill(0.0);
            right.fill(0.0);
            self.record_dropout();
            false
        }
    }

    /// Fill an interleaved buffer without blocking.
    ///
    /// Same contention behavior as [`render`](Self::render).
    pub fn render_interleaved(&self, out: &mut [f32], channels: usize) -> bool {
        if let Some(mut state) = self.inner.state.try_lock() {
            state.render_interleaved(out, channels);
            true
        } else {
            out.fill(0.0);
            self.record_dropout();
            false
        }
    }

    /// Fill a stereo pair, waiting for the lock. For offline rendering.
    pub fn render_blocking(&self, left: &mut [f32], right: &mut [f32]) {
        self.inner.state.lock().render(left, right);
    }

    /// Buffers skipped because the lock was busy.
    pub fn dropouts(&self) -> u64 {
        self.inner.dropouts.load(Ordering::Relaxed)
    }

    fn record_dropout(&self) {
        self.inner.dropouts.fetch_add(1, Ordering::Relaxed);
    }

    // ── Inspection ───────────────────────────────────────────────────────────

    /// Read voice and control status under the lock.
    pub fn snapshot(&self) -> EngineSnapshot {
        let state = self.inner.state.lock();
        EngineSnapshot {
            active_voices: state.active_voice_count(),
            patch_index: state.patch_index(),
            pitch: state.pitch(),
            sustain: state.control().sustain(),
        }
    }

    /// Run `f` with exclusive access to the engine.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut SynthState<N>) -> R) -> R {
        f(&mut self.inner.state.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn shared() -> SharedSynth<4> {
        SharedSynth::new(SynthState::with_factory_patches(44_100.0).unwrap())
    }

    #[test]
    fn test_send_and_render() {
        let synth = shared();
        synth.send(SynthEvent::NoteOn {
            note: 60,
            velocity: 100,
        });
        let mut left = [0.0; 256];
        let mut right = [0.0; 256];
        assert!(synth.render(&mut left, &mut right));
        assert!(left.iter().any(|s| *s != 0.0));
        assert_eq!(left, right);
        assert_eq!(synth.dropouts(), 0);
    }

    #[test]
    fn test_contended_render_outputs_silence_and_counts() {
        let synth = shared();
        synth.send(SynthEvent::NoteOn {
            note: 60,
            velocity: 100,
        });

        let mut left = [0.5; 64];
        let mut right = [0.5; 64];
        let mut out = [0.5; 128];
        synth.with_state(|_| {
            assert!(!synth.render(&mut left, &mut right));
            assert!(!synth.render_interleaved(&mut out, 2));
        });

        assert_eq!(left, [0.0; 64]);
        assert_eq!(right, [0.0; 64]);
        assert_eq!(out, [0.0; 128]);
        assert_eq!(synth.dropouts(), 2);
    }

    #[test]
    fn test_snapshot() {
        let synth = shared();
        synth.send(SynthEvent::NoteOn {
            note: 60,
            velocity: 100,
        });
        synth.send(SynthEvent::ControlChange {
            controller: 64,
            value: 90,
        });
        synth.send(SynthEvent::PitchBend(0.5));
        assert_eq!(
            synth.snapshot(),
            EngineSnapshot {
                active_voices: 1,
                patch_index: 0,
                pitch: 0.5,
                sustain: 90,
            }
        );
    }

    #[test]
    fn test_events_from_another_thread() {
        let synth = shared();
        let events = synth.clone();
        let handle = thread::spawn(move || {
            for note in [60, 64, 67] {
                events.send(SynthEvent::NoteOn { note, velocity: 100 });
            }
        });
        handle.join().unwrap();

        let mut left = [0.0; 32];
        let mut right = [0.0; 32];
        synth.render_blocking(&mut left, &mut right);
        assert_eq!(synth.snapshot().active_voices, 3);
    }
}
