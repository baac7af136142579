//! Criterion benchmarks for polywave-synth
//!
//! Run with: cargo bench -p polywave-synth

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use polywave_synth::{
    CC_PATCH_NEXT, MAX_POLYPHONY, Patch, SharedSynth, SynthEvent, SynthState, VoiceBank,
    oscillator::read_table,
};

const SAMPLE_RATE: f32 = 44_100.0;
const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512, 1024];

fn playing_synth(voices: usize, patch_next: bool) -> SynthState {
    let mut synth = SynthState::with_factory_patches(SAMPLE_RATE).unwrap();
    if patch_next {
        synth.control_change(CC_PATCH_NEXT, 127);
    }
    for i in 0..voices as u8 {
        synth.note_on(48 + i * 3, 100);
    }
    synth
}

// ============================================================================
// Wavetable read
// ============================================================================

fn bench_read_table(c: &mut Criterion) {
    let patch = Patch::sampled(SAMPLE_RATE).unwrap();
    let table = patch.waveform();

    c.bench_function("read_table/1024", |b| {
        b.iter(|| {
            let mut sum = 0.0f32;
            for i in 0..1024 {
                sum += read_table(table, i as f32 / 1024.0);
            }
            black_box(sum)
        })
    });
}

// ============================================================================
// Block rendering
// ============================================================================

fn bench_render_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("SynthState_render");

    for voices in [1, 4, 8, MAX_POLYPHONY] {
        for &block_size in BLOCK_SIZES {
            let mut synth = playing_synth(voices, false);
            let mut left = vec![0.0; block_size];
            let mut right = vec![0.0; block_size];

            group.bench_with_input(
                BenchmarkId::new(format!("{voices}_voices"), block_size),
                &block_size,
                |b, _| {
                    b.iter(|| {
                        synth.render(&mut left, &mut right);
                        black_box(left[0])
                    })
                },
            );
        }
    }

    group.finish();
}

fn bench_render_sampled_patch(c: &mut Criterion) {
    let mut group = c.benchmark_group("SynthState_sampled");

    for &block_size in BLOCK_SIZES {
        let mut synth = playing_synth(MAX_POLYPHONY, true);
        let mut out = vec![0.0; block_size * 2];

        group.bench_with_input(
            BenchmarkId::from_parameter(block_size),
            &block_size,
            |b, _| {
                b.iter(|| {
                    synth.render_interleaved(&mut out, 2);
                    black_box(out[0])
                })
            },
        );
    }

    group.finish();
}

fn bench_shared_render(c: &mut Criterion) {
    let shared = SharedSynth::new(playing_synth(8, false));
    let mut out = vec![0.0; 512 * 2];

    c.bench_function("SharedSynth/render_interleaved/512", |b| {
        b.iter(|| black_box(shared.render_interleaved(&mut out, 2)))
    });
}

// ============================================================================
// Allocation
// ============================================================================

fn bench_note_on_full_bank(c: &mut Criterion) {
    c.bench_function("VoiceBank/note_on_steal", |b| {
        let mut bank: VoiceBank = VoiceBank::new();
        for i in 0..MAX_POLYPHONY as u8 {
            bank.note_on(i, 100);
        }
        let mut note = 40u8;
        b.iter(|| {
            note = 40 + (note + 1) % 60;
            black_box(bank.note_on(note, 100))
        })
    });
}

fn bench_event_dispatch(c: &mut Criterion) {
    let mut synth = playing_synth(8, false);
    c.bench_function("SynthState/handle_event", |b| {
        b.iter(|| {
            synth.handle_event(black_box(SynthEvent::PitchBend(0.25)));
            synth.handle_event(black_box(SynthEvent::ControlChange {
                controller: 64,
                value: 80,
            }))
        })
    });
}

criterion_group!(
    benches,
    bench_read_table,
    bench_render_voices,
    bench_render_sampled_patch,
    bench_shared_render,
    bench_note_on_full_bank,
    bench_event_dispatch,
);

criterion_main!(benches);
