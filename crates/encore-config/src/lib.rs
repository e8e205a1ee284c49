//! Persisted audio settings for the encore playback engine.
//!
//! Settings live in a small TOML file and are read once at startup. They
//! choose the reverb algorithm, switch effects on, set master volume and
//! override transition durations.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use encore_config::{AudioSettings, paths};
//! use encore_mixer::MemoryBackend;
//!
//! let settings = AudioSettings::load_or_default(paths::settings_path()).unwrap();
//!
//! let backend = Arc::new(MemoryBackend::new());
//! let channel = backend.create_channel(44100, 2, 180.0);
//! let mut mixer = settings.build_mixer(backend);
//! mixer.register_channel(channel, 2);
//! for request in settings.startup_requests(channel) {
//!     mixer.handle(request).unwrap();
//! }
//! ```

mod error;
mod settings;

/// Platform-specific settings location.
pub mod paths;

pub use error::ConfigError;
pub use paths::{settings_path, user_config_dir};
pub use settings::{
    AudioSettings, EffectToggles, MAX_TRANSITION_MS, ReverbSetting, TransitionSettings,
};
