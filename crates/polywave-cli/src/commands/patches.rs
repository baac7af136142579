//! Built-in patch listing.

use clap::Args;
use polywave_synth::{CC_PATCH_NEXT, CC_PATCH_PREV, DEFAULT_SAMPLE_RATE, PatchSet};

#[derive(Args)]
pub struct PatchesArgs {
    /// Sample rate used to build the patches
    #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE)]
    sample_rate: u32,
}

pub fn run(args: PatchesArgs) -> anyhow::Result<()> {
    let sr = args.sample_rate as f32;
    let patches = PatchSet::factory(sr)?;

    println!("Built-in Patches");
    println!("================\n");
    for (idx, patch) in patches.iter().enumerate() {
        println!("  [{}] {}", idx, patch.name());
        println!(
            "      table: {} samples, gain {:.2}, rate {:.2}x",
            patch.waveform().len(),
            patch.form_gain(),
            patch.form_rate()
        );
        println!(
            "      envelope/s: attack {:.2}, decay {:.2}, sustain {:.2}, release {:.2}",
            patch.attack_step() * sr,
            patch.decay_step() * sr,
            patch.sustain_step() * sr,
            patch.release_step() * sr
        );
        println!(
            "      plateau {:.2}, pedal stretch {:.1}",
            patch.sustain_level(),
            patch.sustain_rate()
        );
    }
    println!();
    println!(
        "CC {} selects the next patch, CC {} the previous one.",
        CC_PATCH_NEXT, CC_PATCH_PREV
    );
    Ok(())
}
