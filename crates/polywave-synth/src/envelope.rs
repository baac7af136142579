//! Per-sample envelope generator.
//!
//! Each voice carries an [`EnvelopeState`] and its gain. Once per sample the
//! renderer calls [`Voice::advance_envelope`], which moves gain linearly:
//!
//! ```text
//!  gain
//!   1 |     /\
//!     |    /  \___________            fast decay to the plateau,
//!     |   /               ------___   then a slow bleed while held
//!     |  /                         \
//!   0 |_/___________________________\___
//!       Attack  DecaySustain    Release -> Idle
//! ```
//!
//! A key released after its peak passes through [`EnvelopeState::ReleaseStart`]
//! until the first release sample runs. Pressing the key again before that
//! sample resumes the decay instead of ramping up a second time.
//!
//! Above the plateau (`sustain_level * target`) both the held and the
//! released voice fall by the decay step. Below it a held voice bleeds by the
//! sustain step and a released voice falls by the release step, stretched by
//! the sustain pedal (controller 64). Falling through zero frees the voice.

use crate::patch::Patch;
use crate::voice::Voice;

/// Envelope stages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EnvelopeState {
    /// Voice is free; output is zero.
    #[default]
    Idle,
    /// Key held, gain ramping up toward the velocity target.
    Attack,
    /// Key held, target reached; gain falls toward and then below the plateau.
    DecaySustain,
    /// Key released after the peak; no release sample has run yet.
    ReleaseStart,
    /// Key released; gain falls to zero.
    Release,
}

impl EnvelopeState {
    /// True for the stages entered by a held key.
    #[inline]
    pub fn is_gated(self) -> bool {
        matches!(self, Self::Attack | Self::DecaySustain)
    }

    /// Stage after a key press.
    ///
    /// A voice still holding its peak keeps decaying from where it is;
    /// every other stage ramps up again from the current gain.
    #[inline]
    pub fn on_gate_on(self) -> Self {
        match self {
            Self::DecaySustain | Self::ReleaseStart => Self::DecaySustain,
            Self::Idle | Self::Attack | Self::Release => Self::Attack,
        }
    }

    /// Stage after a key release.
    #[inline]
    pub fn on_gate_off(self) -> Self {
        match self {
            Self::Idle => Self::Idle,
            Self::DecaySustain | Self::ReleaseStart => Self::ReleaseStart,
            Self::Attack | Self::Release => Self::Release,
        }
    }
}

impl Voice {
    pub(crate) fn gate_on(&mut self) {
        self.state = self.state.on_gate_on();
    }

    pub(crate) fn gate_off(&mut self) {
        self.state = self.state.on_gate_off();
    }

    /// Advance the envelope by one sample and return the new gain.
    ///
    /// `pedal` is the current value of controller 64 (0-127).
    #[inline]
    pub fn advance_envelope(&mut self, patch: &Patch, pedal: u8) -> f32 {
        if self.is_free() {
            self.state = EnvelopeState::Idle;
            self.phase = 0.0;
            return 0.0;
        }

        let target = self.target_level();
        match self.state {
            EnvelopeState::Idle => {
                self.clear();
                return 0.0;
            }
            EnvelopeState::Attack => {
                self.gain += patch.attack_step();
                if self.gain > target {
                    self.gain = target;
                    self.state = EnvelopeState::DecaySustain;
                }
                return self.gain;
            }
            EnvelopeState::DecaySustain => {
                let step = if self.gain > patch.sustain_level() * target {
                    patch.decay_step()
                } else {
                    patch.sustain_step()
                };
                self.gain -= step;
            }
            EnvelopeState::ReleaseStart | EnvelopeState::Release => {
                let step = if self.gain > patch.sustain_level() * target {
                    patch.decay_step()
                } else {
                    patch.pedal_release_step(pedal)
                };
                self.gain -= step;
                self.state = EnvelopeState::Release;
            }
        }

        if self.gain < 0.0 {
            self.clear();
        }
        self.gain
    }
}
