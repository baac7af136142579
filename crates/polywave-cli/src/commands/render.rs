//! Offline rendering of a score file to WAV.

use crate::score::{Score, render_score};
use clap::Args;
use polywave_io::{WavSpec, write_wav_stereo};
use std::path::PathBuf;

#[derive(Args)]
pub struct RenderArgs {
    /// Score file (TOML)
    score: PathBuf,

    /// Output WAV file
    output: PathBuf,

    /// Sample rate (overrides the score)
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Seconds rendered after the last event (overrides the score)
    #[arg(long)]
    tail: Option<f64>,

    /// Output bit depth
    #[arg(long, default_value = "16", value_parser = parse_bits)]
    bits: u16,
}

fn parse_bits(s: &str) -> Result<u16, String> {
    match s {
        "16" => Ok(16),
        "24" => Ok(24),
        "32" => Ok(32),
        _ => Err(format!("Invalid bit depth: '{}' (expected 16, 24 or 32)", s)),
    }
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    let score = Score::load(&args.score)?;
    let rendered = render_score(&score, args.sample_rate, args.tail)?;

    let spec = WavSpec {
        channels: 2,
        sample_rate: rendered.sample_rate,
        bits_per_sample: args.bits,
    };
    write_wav_stereo(&args.output, &rendered.left, &rendered.right, spec)?;

    let frames = rendered.left.len();
    let peak = rendered.left.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    println!(
        "Rendered {} events to {} ({} frames, {:.2}s at {} Hz, {}-bit, peak {:.3})",
        score.events.len(),
        args.output.display(),
        frames,
        frames as f64 / f64::from(rendered.sample_rate),
        rendered.sample_rate,
        args.bits,
        peak
    );
    for (frame, name) in &rendered.patch_changes {
        println!(
            "  patch -> {} at {:.3}s",
            name,
            *frame as f64 / f64::from(rendered.sample_rate)
        );
    }
    Ok(())
}
