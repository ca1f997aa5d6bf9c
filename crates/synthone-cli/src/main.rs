//! synthone CLI - play the synthesizer from a terminal.

mod commands;
mod input;
mod scope;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "synthone")]
#[command(author, version, about = "Polyphonic subtractive/FM synthesizer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play the synthesizer from the keyboard, MIDI and the step sequencer
    Play(commands::play::PlayArgs),

    /// List parameters with their ranges and current values
    Params(commands::params::ParamsArgs),

    /// List audio output devices
    Devices(commands::devices::DevicesArgs),
}

fn main() -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play(args) => commands::play::run(args),
        Commands::Params(args) => commands::params::run(args),
        Commands::Devices(args) => commands::devices::run(args),
    }
}
