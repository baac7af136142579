//! Patch (timbre) definitions.
//!
//! A [`Patch`] bundles per-sample envelope steps with a single-cycle
//! waveform table. Patches are immutable once built; the engine switches
//! between them by index through a [`PatchSet`].

use alloc::string::String;
use alloc::vec::Vec;
use core::f32::consts::TAU;

/// Number of points in the factory waveform tables.
pub const FACTORY_TABLE_LEN: usize = 128;

/// One recorded cycle used by the `sampled` factory patch.
const SAMPLED_CYCLE: [f32; FACTORY_TABLE_LEN] = [
    0.02228, 0.02765, 0.02053, -0.01519, -0.06787, -0.06072, -0.04724, -0.05765,
    -0.0191, 0.03289, 0.08273, 0.1394, 0.11706, 0.06689, 0.03338, -0.05285,
    -0.13366, -0.16491, -0.20506, -0.20248, -0.16497, -0.13637, -0.04612, 0.05436,
    0.10167, 0.11837, 0.09184, 0.03813, -0.03075, -0.12342, -0.19155, -0.24263,
    -0.33331, -0.35835, -0.29186, -0.18098, -0.04185, 0.0562, 0.10544, 0.15068,
    0.16912, 0.14566, 0.10187, 0.02552, -0.05956, -0.14947, -0.19638, -0.19449,
    -0.15328, -0.11134, -0.10183, -0.06497, -0.00833, 0.0425, 0.09087, 0.12332,
    0.14033, 0.14816, 0.14266, 0.14905, 0.18481, 0.20491, 0.19229, 0.17313,
    0.14034, 0.12052, 0.12403, 0.12324, 0.10882, 0.11918, 0.12034, 0.1337,
    0.17856, 0.22018, 0.25724, 0.26085, 0.24341, 0.22923, 0.21964, 0.18427,
    0.1572, 0.13564, 0.0877, 0.05586, 0.06215, 0.11416, 0.18126, 0.17765,
    0.13364, 0.10718, 0.09003, 0.07549, 0.04007, 0.02016, 0.03321, 0.02301,
    0.04958, 0.09636, 0.13982, 0.2146, 0.2176, 0.14192, 0.0185, -0.13288,
    -0.2939, -0.50247, -0.67149, -0.70905, -0.7096, -0.62262, -0.41466, -0.19885,
    0.0447, 0.26506, 0.36032, 0.39179, 0.38315, 0.24268, 0.06933, -0.06901,
    -0.24582, -0.3478, -0.35623, -0.3708, -0.29164, -0.1708, -0.11854, -0.04797,
];

/// Errors raised while building a patch or patch set.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PatchError {
    /// The waveform table has no samples.
    #[error("waveform table is empty")]
    EmptyWaveform,

    /// A waveform sample is NaN or infinite.
    #[error("waveform sample {index} is not finite")]
    NonFiniteWaveform {
        /// Position of the offending sample.
        index: usize,
    },

    /// Sample rate must be finite and positive.
    #[error("invalid sample rate: {0}")]
    InvalidSampleRate(f32),

    /// A rate or scalar parameter is negative or not finite.
    #[error("invalid value for '{name}': {value}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Rejected value.
        value: f32,
    },

    /// Sustain level must lie in [0, 1].
    #[error("sustain level {0} outside 0.0..=1.0")]
    InvalidSustainLevel(f32),

    /// A patch set needs at least one patch.
    #[error("patch set is empty")]
    EmptyPatchSet,
}

/// Envelope shape in per-second units.
///
/// Rates are gain change per second; [`Patch::new`] divides them by the
/// sample rate to get per-sample steps.
///
/// ## Parameters
/// - `attack`: Gain added per second while ramping up to the velocity target
/// - `decay`: Gain removed per second while above the sustain plateau
/// - `sustain_level`: Plateau as a fraction of the velocity target (0.0 to 1.0)
/// - `sustain_rate`: How strongly controller 64 stretches the release
/// - `sustain`: Gain removed per second while held below the plateau
/// - `release`: Gain removed per second after key-up below the plateau
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeParams {
    /// Attack rate (gain per second).
    pub attack: f32,
    /// Decay rate above the plateau (gain per second).
    pub decay: f32,
    /// Sustain plateau as a fraction of the target level.
    pub sustain_level: f32,
    /// Release stretch factor applied through controller 64.
    pub sustain_rate: f32,
    /// Slow bleed while held below the plateau (gain per second).
    pub sustain: f32,
    /// Release rate below the plateau (gain per second).
    pub release: f32,
}

impl EnvelopeParams {
    fn validate(&self) -> Result<(), PatchError> {
        let rates = [
            ("attack", self.attack),
            ("decay", self.decay),
            ("sustain_rate", self.sustain_rate),
            ("sustain", self.sustain),
            ("release", self.release),
        ];
        for (name, value) in rates {
            check_non_negative(name, value)?;
        }
        if !(0.0..=1.0).contains(&self.sustain_level) {
            return Err(PatchError::InvalidSustainLevel(self.sustain_level));
        }
        Ok(())
    }
}

fn check_non_negative(name: &'static str, value: f32) -> Result<(), PatchError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(PatchError::InvalidParameter { name, value })
    }
}

/// An immutable timbre: envelope steps plus a cyclic waveform table.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    name: String,
    attack_step: f32,
    decay_step: f32,
    sustain_level: f32,
    sustain_rate: f32,
    sustain_step: f32,
    release_step: f32,
    waveform: Vec<f32>,
    form_gain: f32,
    form_rate: f32,
}

impl Patch {
    /// Build a patch for the given sample rate.
    ///
    /// `form_gain` scales the table output and `form_rate` multiplies the
    /// playback speed relative to the note's fundamental (0.5 plays an
    /// octave down).
    pub fn new(
        name: impl Into<String>,
        envelope: EnvelopeParams,
        waveform: Vec<f32>,
        form_gain: f32,
        form_rate: f32,
        sample_rate: f32,
    ) -> Result<Self, PatchError> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(PatchError::InvalidSampleRate(sample_rate));
        }
        envelope.validate()?;
        if waveform.is_empty() {
            return Err(PatchError::EmptyWaveform);
        }
        if let Some(index) = waveform.iter().position(|s| !s.is_finite()) {
            return Err(PatchError::NonFiniteWaveform { index });
        }
        check_non_negative("form_gain", form_gain)?;
        check_non_negative("form_rate", form_rate)?;

        Ok(Self {
            name: name.into(),
            attack_step: envelope.attack / sample_rate,
            decay_step: envelope.decay / sample_rate,
            sustain_level: envelope.sustain_level,
            sustain_rate: envelope.sustain_rate,
            sustain_step: envelope.sustain / sample_rate,
            release_step: envelope.release / sample_rate,
            waveform,
            form_gain,
            form_rate,
        })
    }

    /// Pure sine: slow sustain bleed, high plateau, half gain.
    pub fn sine(sample_rate: f32) -> Result<Self, PatchError> {
        let table = (0..FACTORY_TABLE_LEN)
            .map(|i| libm::sinf(TAU * i as f32 / FACTORY_TABLE_LEN as f32))
            .collect();
        Self::new(
            "sine",
            EnvelopeParams {
                attack: 10.0,
                decay: 5.0,
                sustain_level: 0.9,
                sustain_rate: 9.0,
                sustain: 0.44,
                release: 2.0,
            },
            table,
            0.5,
            1.0,
            sample_rate,
        )
    }

    /// Recorded single cycle played at 0.3x speed for a low, reedy tone.
    pub fn sampled(sample_rate: f32) -> Result<Self, PatchError> {
        Self::new(
            "sampled",
            EnvelopeParams {
                attack: 10.0,
                decay: 5.0,
                sustain_level: 0.7,
                sustain_rate: 9.0,
                sustain: 0.4,
                release: 2.0,
            },
            SAMPLED_CYCLE.to_vec(),
            0.8,
            0.3,
            sample_rate,
        )
    }

    /// Patch name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gain added per sample during attack.
    pub fn attack_step(&self) -> f32 {
        self.attack_step
    }

    /// Gain removed per sample above the sustain plateau.
    pub fn decay_step(&self) -> f32 {
        self.decay_step
    }

    /// Sustain plateau as a fraction of the velocity target.
    pub fn sustain_level(&self) -> f32 {
        self.sustain_level
    }

    /// Release stretch factor for controller 64.
    pub fn sustain_rate(&self) -> f32 {
        self.sustain_rate
    }

    /// Gain removed per sample while held below the plateau.
    pub fn sustain_step(&self) -> f32 {
        self.sustain_step
    }

    /// Gain removed per sample after key-up below the plateau, before pedal scaling.
    pub fn release_step(&self) -> f32 {
        self.release_step
    }

    /// Release step stretched by the sustain pedal value (0-127).
    #[inline]
    pub fn pedal_release_step(&self, pedal: u8) -> f32 {
        self.release_step / (1.0 + f32::from(pedal.min(127)) * self.sustain_rate / 127.0)
    }

    /// The cyclic waveform table.
    pub fn waveform(&self) -> &[f32] {
        &self.waveform
    }

    /// Output gain applied to the table.
    pub fn form_gain(&self) -> f32 {
        self.form_gain
    }

    /// Playback-rate multiplier relative to the note frequency.
    pub fn form_rate(&self) -> f32 {
        self.form_rate
    }
}

/// Ordered, non-empty collection of patches selectable by index.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchSet {
    patches: Vec<Patch>,
}

impl PatchSet {
    /// Wrap a list of patches. Fails if the list is empty.
    pub fn new(patches: Vec<Patch>) -> Result<Self, PatchError> {
        if patches.is_empty() {
            return Err(PatchError::EmptyPatchSet);
        }
        Ok(Self { patches })
    }

    /// The built-in two-slot set: `sine` then `sampled`.
    pub fn factory(sample_rate: f32) -> Result<Self, PatchError> {
        Self::new(alloc::vec![
            Patch::sine(sample_rate)?,
            Patch::sampled(sample_rate)?,
        ])
    }

    /// Number of patches (always at least one).
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.patches.len()
    }

    /// Index of the last patch.
    pub fn last_index(&self) -> usize {
        self.patches.len() - 1
    }

    /// Patch at `index`, clamped to the last patch.
    pub fn get(&self, index: usize) -> &Patch {
        &self.patches[index.min(self.last_index())]
    }

    /// Iterate over all patches in index order.
    pub fn iter(&self) -> core::slice::Iter<'_, Patch> {
        self.patches.iter()
    }

    /// Patch names in index order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.patches.iter().map(Patch::name)
    }
}
