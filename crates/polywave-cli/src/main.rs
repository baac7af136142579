//! Polywave CLI - play the synth live from MIDI or render score files.

mod commands;
mod score;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "polywave")]
#[command(author, version, about = "Polyphonic wavetable synth", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play live: MIDI input to the audio output
    Play(commands::play::PlayArgs),

    /// Render a score file to WAV
    Render(commands::render::RenderArgs),

    /// List audio output devices and MIDI input ports
    Devices,

    /// List the built-in patches
    Patches(commands::patches::PatchesArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play(args) => commands::play::run(args),
        Commands::Render(args) => commands::render::run(args),
        Commands::Devices => commands::devices::run(),
        Commands::Patches(args) => commands::patches::run(args),
    }
}
