//! Wavetable oscillator.
//!
//! Reads a voice's phase against the active patch's single-cycle table with
//! linear interpolation, then advances the phase by the bent note frequency.

use crate::patch::Patch;
use crate::voice::Voice;

/// Read a cyclic table at `phase` in [0, 1) with linear interpolation.
///
/// The point after the last sample is the first one, so the cycle joins
/// without a step. An empty table reads as silence.
///
/// ```rust
/// use polywave_synth::oscillator::read_table;
///
/// let table = [0.0, 1.0, 0.0, -1.0];
/// assert_eq!(read_table(&table, 0.25), 1.0);
/// assert_eq!(read_table(&table, 0.125), 0.5);
/// assert_eq!(read_table(&table, 0.875), -0.5);
/// ```
#[inline]
pub fn read_table(table: &[f32], phase: f32) -> f32 {
    let len = table.len();
    if len == 0 {
        return 0.0;
    }

    let position = phase * len as f32;
    let floor = libm::floorf(position);
    let frac = position - floor;
    let i = (floor as usize) % len;
    let next = (i + 1) % len;

    table[i] * (1.0 - frac) + table[next] * frac
}

impl Voice {
    /// Produce one sample for this voice and advance its phase.
    ///
    /// Free voices return exactly zero and keep their phase. The output is
    /// scaled by the envelope gain and the patch's form gain, then clipped
    /// to [-1, 1].
    #[inline]
    pub fn oscillate(&mut self, patch: &Patch, frequency: f32, sample_rate: f32) -> f32 {
        if self.is_free() {
            return 0.0;
        }

        let sample = read_table(patch.waveform(), self.phase) * self.gain * patch.form_gain();

        self.phase += frequency / sample_rate * patch.form_rate();
        self.phase -= libm::floorf(self.phase);
        if !(0.0..1.0).contains(&self.phase) {
            self.phase = 0.0;
        }

        sample.clamp(-1.0, 1.0)
    }
}
