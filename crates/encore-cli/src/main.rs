//! Encore CLI - inspect effect presets and settings, and simulate playback.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "encore")]
#[command(author, version, about = "Encore playback engine CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List effect presets or show one in detail
    Presets(commands::presets::PresetsArgs),

    /// Show or initialize the audio settings file
    Settings(commands::settings::SettingsArgs),

    /// Run the effect chain against an in-memory backend
    Simulate(commands::simulate::SimulateArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Presets(args) => commands::presets::run(args),
        Commands::Settings(args) => commands::settings::run(args),
        Commands::Simulate(args) => commands::simulate::run(args),
    }
}
