//! Platform-specific location of the settings file.
//!
//! - Linux: `~/.config/encore/audio.toml`
//! - macOS: `~/Library/Application Support/encore/audio.toml`
//! - Windows: `%APPDATA%\encore\audio.toml`

use std::path::PathBuf;

/// Application name used for directory paths.
const APP_NAME: &str = "encore";

/// File name of the audio settings.
pub const SETTINGS_FILE: &str = "audio.toml";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the default path of the audio settings file.
pub fn settings_path() -> PathBuf {
    user_config_dir().join(SETTINGS_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_path_ends_with_app_and_file() {
        let path = settings_path();
        assert!(path.ends_with("encore/audio.toml"), "got {}", path.display());
    }
}
