//! Note-number to frequency lookup and pitch-bend mapping.
//!
//! The table is equal-tempered with index 0 at 16.3516 Hz (one semitone per
//! step). Two guard entries sit above note 127 so an upward bend of the top
//! notes can read `note + 2` without leaving the table.

/// Highest playable note number.
pub const MAX_NOTE: u8 = 127;

/// Pitch-bend range in semitones, in each direction.
pub const BEND_RANGE_SEMITONES: u8 = 2;

/// Fundamental frequency in Hz for every note index, plus two guard entries.
pub const TONE_MAP: [f32; 130] = [
    16.351599, 17.323914, 18.354048, 19.445436,
    20.601723, 21.826765, 23.124651, 24.499714,
    25.956543, 27.5, 29.135235, 30.867706,
    32.703197, 34.647827, 36.708096, 38.890873,
    41.203445, 43.65353, 46.249302, 48.999428,
    51.913086, 55.0, 58.27047, 61.735413,
    65.406395, 69.295654, 73.41619, 77.781746,
    82.40689, 87.30706, 92.498604, 97.998856,
    103.82617, 110.0, 116.54094, 123.470825,
    130.81279, 138.59131, 146.83238, 155.56349,
    164.81378, 174.61412, 184.99721, 195.99771,
    207.65234, 220.0, 233.08188, 246.94165,
    261.62558, 277.18262, 293.66476, 311.12698,
    329.62756, 349.22824, 369.99442, 391.99542,
    415.3047, 440.0, 466.16376, 493.8833,
    523.25116, 554.36523, 587.3295, 622.25397,
    659.2551, 698.4565, 739.98883, 783.99084,
    830.6094, 880.0, 932.3275, 987.7666,
    1046.5023, 1108.7305, 1174.659, 1244.5079,
    1318.5103, 1396.913, 1479.9777, 1567.9817,
    1661.2188, 1760.0, 1864.655, 1975.5332,
    2093.0046, 2217.461, 2349.318, 2489.0159,
    2637.0205, 2793.826, 2959.9553, 3135.9634,
    3322.4375, 3520.0, 3729.31, 3951.0664,
    4186.0093, 4434.922, 4698.636, 4978.0317,
    5274.041, 5587.652, 5919.9106, 6271.927,
    6644.875, 7040.0, 7458.62, 7902.133,
    8372.019, 8869.844, 9397.272, 9956.063,
    10548.082, 11175.304, 11839.821, 12543.854,
    13289.75, 14080.0, 14917.24, 15804.266,
    16744.037, 17739.688, 18794.545, 19912.127,
    21096.164, 22350.607, 23679.643, 25087.707,
    26579.5, 28160.0,
];

/// Fundamental frequency of `note` in Hz.
///
/// Notes above 127 saturate to 127.
#[inline]
pub fn tone(note: u8) -> f32 {
    TONE_MAP[note.min(MAX_NOTE) as usize]
}

/// Frequency of `note` bent by `pitch` in [-1, 1].
///
/// The bend covers one whole tone each way. Positive bends interpolate
/// linearly toward `note + 2`; negative bends toward `note - 2`, which
/// saturates at index 0 for the lowest notes. `pitch` outside [-1, 1] is
/// clamped and NaN is treated as centered.
///
/// ```rust
/// use polywave_synth::{TONE_MAP, bent_frequency};
///
/// assert_eq!(bent_frequency(60, 0.0), TONE_MAP[60]);
/// assert_eq!(bent_frequency(60, 1.0), TONE_MAP[62]);
/// assert_eq!(bent_frequency(1, -1.0), TONE_MAP[0]);
/// ```
#[inline]
pub fn bent_frequency(note: u8, pitch: f32) -> f32 {
    let note = note.min(MAX_NOTE) as usize;
    let range = BEND_RANGE_SEMITONES as usize;
    let pitch = if pitch.is_nan() {
        0.0
    } else {
        pitch.clamp(-1.0, 1.0)
    };

    let base = TONE_MAP[note];
    let (target, amount) = if pitch >= 0.0 {
        (TONE_MAP[note + range], pitch)
    } else {
        (TONE_MAP[note.saturating_sub(range)], -pitch)
    };

    base * (1.0 - amount) + target * amount
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_strictly_increasing() {
        for pair in TONE_MAP.windows(2) {
            assert!(pair[1] > pair[0], "{} !< {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_octaves_double() {
        for i in 0..(TONE_MAP.len() - 12) {
            let ratio = TONE_MAP[i + 12] / TONE_MAP[i];
            assert!((ratio - 2.0).abs() < 1e-4, "index {i}: ratio {ratio}");
        }
    }

    #[test]
    fn test_reference_pitches() {
        assert_eq!(tone(57), 440.0);
        assert_eq!(tone(9), 27.5);
        assert!((tone(48) - 261.6256).abs() < 0.01);
    }

    #[test]
    fn test_tone_saturates_above_range() {
        assert_eq!(tone(200), TONE_MAP[127]);
    }

    #[test]
    fn test_bend_extremes_hit_table_entries() {
        assert_eq!(bent_frequency(60, 1.0), TONE_MAP[62]);
        assert_eq!(bent_frequency(60, -1.0), TONE_MAP[58]);
        assert_eq!(bent_frequency(1, -1.0), TONE_MAP[0]);
        assert_eq!(bent_frequency(0, -1.0), TONE_MAP[0]);
        assert_eq!(bent_frequency(127, 1.0), TONE_MAP[129]);
    }

    #[test]
    fn test_half_bend_is_midpoint() {
        let expected = (TONE_MAP[60] + TONE_MAP[62]) * 0.5;
        assert!((bent_frequency(60, 0.5) - expected).abs() < 1e-3);

        let expected = (TONE_MAP[60] + TONE_MAP[58]) * 0.5;
        assert!((bent_frequency(60, -0.5) - expected).abs() < 1e-3);
    }

    #[test]
    fn test_out_of_range_pitch_is_clamped() {
        assert_eq!(bent_frequency(60, 3.0), TONE_MAP[62]);
        assert_eq!(bent_frequency(60, -7.5), TONE_MAP[58]);
        assert_eq!(bent_frequency(60, f32::NAN), TONE_MAP[60]);
    }
}
