//! Live playback: MIDI input drives the engine, cpal pulls audio from it.

use clap::Args;
use polywave_io::{MidiInput, OutputStream, StreamConfig};
use polywave_synth::{DEFAULT_SAMPLE_RATE, EventOutcome, SharedSynth, SynthState};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Args)]
pub struct PlayArgs {
    /// Sample rate
    #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE)]
    sample_rate: u32,

    /// Buffer size in frames
    #[arg(long, default_value = "512")]
    buffer_size: u32,

    /// Output device (index or name)
    #[arg(long)]
    output: Option<String>,

    /// MIDI input port (index or name); first port if omitted
    #[arg(long)]
    midi: Option<String>,
}

pub fn run(args: PlayArgs) -> anyhow::Result<()> {
    let synth: SharedSynth =
        SharedSynth::new(SynthState::with_factory_patches(args.sample_rate as f32)?);

    let events = synth.clone();
    let midi = MidiInput::connect(args.midi.as_deref(), move |event| {
        if let EventOutcome::PatchChanged { index, name } = events.send(event) {
            println!("Patch {index}: {name}");
        }
    })?;

    let config = StreamConfig {
        sample_rate: args.sample_rate,
        buffer_size: args.buffer_size,
        output_device: args.output,
    };
    let audio = synth.clone();
    let stream = OutputStream::start(&config, move |out, channels| {
        audio.render_interleaved(out, channels);
    })?;

    println!("Playing");
    println!("  MIDI:   {}", midi.port());
    println!("  Output: {}", stream.device());
    println!("  Sample rate: {} Hz", stream.sample_rate());
    println!("  Buffer size: {} frames", args.buffer_size);
    println!("\nPress Ctrl+C to stop...\n");

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    let mut reported = 0;
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(POLL_INTERVAL);
        let dropouts = synth.dropouts();
        if dropouts > reported {
            tracing::warn!(
                total = dropouts,
                new = dropouts - reported,
                "render buffers skipped while the engine was busy"
            );
            reported = dropouts;
        }
    }

    println!("\nStopping...");
    drop(stream);
    drop(midi);

    let snapshot = synth.snapshot();
    tracing::info!(
        dropouts = synth.dropouts(),
        active_voices = snapshot.active_voices,
        patch = snapshot.patch_index,
        "stopped"
    );
    Ok(())
}
