//! Settings file inspection command.

use clap::Args;
use encore_config::{AudioSettings, settings_path};
use std::path::PathBuf;

#[derive(Args)]
pub struct SettingsArgs {
    /// Settings file (defaults to the user config directory)
    #[arg(long, value_name = "PATH")]
    path: Option<PathBuf>,

    /// Write default settings if the file does not exist
    #[arg(long)]
    init: bool,
}

pub fn run(args: SettingsArgs) -> anyhow::Result<()> {
    let path = args.path.unwrap_or_else(settings_path);

    if args.init {
        if path.exists() {
            tracing::info!(path = %path.display(), "settings file already exists");
        } else {
            AudioSettings::default().save(&path)?;
            tracing::info!(path = %path.display(), "wrote default settings");
        }
    }

    let exists = path.exists();
    let settings = AudioSettings::load_or_default(&path)?;

    println!("# {}{}", path.display(), if exists { "" } else { " (not found, showing defaults)" });
    print!("{}", settings.to_toml()?);
    Ok(())
}
