//! Property-based tests for polywave-synth.
//!
//! Drives the engine with random event sequences and checks the gain,
//! phase and output-range invariants after every rendered frame.

use polywave_synth::{SynthEvent, SynthState, TONE_MAP, VoiceBank, bent_frequency, tone};
use proptest::prelude::*;

fn event_strategy() -> impl Strategy<Value = SynthEvent> {
    prop_oneof![
        4 => (any::<u8>(), any::<u8>())
            .prop_map(|(note, velocity)| SynthEvent::NoteOn { note, velocity }),
        3 => (any::<u8>(), any::<u8>())
            .prop_map(|(note, velocity)| SynthEvent::NoteOff { note, velocity }),
        2 => (prop_oneof![Just(1u8), Just(2u8), Just(64u8), any::<u8>()], any::<u8>())
            .prop_map(|(controller, value)| SynthEvent::ControlChange { controller, value }),
        1 => (-4.0f32..4.0f32).prop_map(SynthEvent::PitchBend),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Any interleaving of events and rendering keeps every voice inside its
    /// gain and phase ranges and every sample inside [-1, 1].
    #[test]
    fn engine_invariants_hold(
        script in prop::collection::vec((event_strategy(), 0usize..300), 1..40),
        sample_rate in prop_oneof![Just(22_050.0f32), Just(44_100.0f32), Just(96_000.0f32)],
    ) {
        let mut synth: SynthState<8> = SynthState::with_factory_patches(sample_rate).unwrap();

        for (event, frames) in script {
            synth.handle_event(event);
            prop_assert!(synth.patch_index() < synth.patches().len());
            prop_assert!((-1.0..=1.0).contains(&synth.pitch()));

            for _ in 0..frames {
                let sample = synth.render_frame();
                prop_assert!((-1.0..=1.0).contains(&sample), "sample {} out of range", sample);

                for voice in synth.voices() {
                    prop_assert!((0.0..=1.0).contains(&voice.gain()), "gain {}", voice.gain());
                    prop_assert!((0.0..1.0).contains(&voice.phase()), "phase {}", voice.phase());
                    prop_assert!(voice.note() <= 127 && voice.velocity() <= 127);
                }
            }
        }
    }

    /// A free voice contributes exactly zero: an engine with no notes is silent.
    #[test]
    fn no_notes_means_silence(
        controls in prop::collection::vec((any::<u8>(), any::<u8>()), 0..20),
        pitch in -1.0f32..=1.0f32,
    ) {
        let mut synth: SynthState<4> = SynthState::with_factory_patches(44_100.0).unwrap();
        for (controller, value) in controls {
            synth.control_change(controller, value);
        }
        synth.pitch_bend(pitch);
        for _ in 0..256 {
            prop_assert_eq!(synth.render_frame(), 0.0);
        }
    }

    /// Bent frequencies stay between the note and its whole-tone neighbor.
    #[test]
    fn bend_stays_within_whole_tone(note in 0u8..=127, pitch in -1.0f32..=1.0f32) {
        let hz = bent_frequency(note, pitch);
        let base = tone(note);
        if pitch >= 0.0 {
            let upper = TONE_MAP[note as usize + 2];
            prop_assert!(hz >= base * 0.999_999 && hz <= upper * 1.000_001);
        } else {
            let lower = TONE_MAP[note.saturating_sub(2) as usize];
            prop_assert!(hz <= base * 1.000_001 && hz >= lower * 0.999_999);
        }
    }

    /// The bank never holds more sounding voices than it has slots, and a
    /// note that is on is always findable.
    #[test]
    fn bank_holds_latest_note(notes in prop::collection::vec((0u8..=127, 1u8..=127), 1..64)) {
        let mut bank: VoiceBank<6> = VoiceBank::new();
        for (note, velocity) in notes {
            bank.note_on(note, velocity);
            prop_assert!(bank.active_voice_count() <= 6);
            prop_assert!(bank.voices().iter().any(|v| v.note() == note && v.is_gated()));
        }
    }
}
