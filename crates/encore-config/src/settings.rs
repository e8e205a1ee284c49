//! Persisted audio settings.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use encore_core::{ReverbVariant, TransitionTimings};
use encore_mixer::{AudioBackend, ChannelId, Mixer, SettingsRequest};

use crate::error::ConfigError;

/// Longest transition accepted from a settings file, in milliseconds.
pub const MAX_TRANSITION_MS: u64 = 60_000;

/// Reverb algorithm as written in the settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReverbSetting {
    /// Freeverb.
    #[default]
    Freeverb,
    /// DirectX reverb.
    DxReverb,
}

impl From<ReverbSetting> for ReverbVariant {
    fn from(setting: ReverbSetting) -> Self {
        match setting {
            ReverbSetting::Freeverb => ReverbVariant::Freeverb,
            ReverbSetting::DxReverb => ReverbVariant::DxReverb,
        }
    }
}

/// Which effects are switched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectToggles {
    /// Song reverb.
    pub reverb: bool,
    /// Compressor.
    pub compressor: bool,
    /// Three-band equalizer.
    pub equalizer: bool,
}

/// Transition durations in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionSettings {
    /// Volume fade.
    pub fade_ms: u64,
    /// Reverb slide in.
    pub reverb_slide_in_ms: u64,
    /// Reverb slide out.
    pub reverb_slide_out_ms: u64,
}

impl Default for TransitionSettings {
    fn default() -> Self {
        let timings = TransitionTimings::default();
        Self {
            fade_ms: timings.fade.as_millis() as u64,
            reverb_slide_in_ms: timings.reverb_slide_in.as_millis() as u64,
            reverb_slide_out_ms: timings.reverb_slide_out.as_millis() as u64,
        }
    }
}

/// Audio settings read at startup.
///
/// # TOML Format
///
/// ```toml
/// master_volume = 0.8
/// reverb_variant = "freeverb"
///
/// [effects]
/// reverb = true
/// compressor = false
/// equalizer = true
///
/// [transitions]
/// fade_ms = 1000
/// reverb_slide_in_ms = 300
/// reverb_slide_out_ms = 500
/// ```
///
/// Every field is optional; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Master volume, `0.0..=1.0`.
    pub master_volume: f32,
    /// Reverb algorithm.
    pub reverb_variant: ReverbSetting,
    /// Effect switches.
    pub effects: EffectToggles,
    /// Transition durations.
    pub transitions: TransitionSettings,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            master_volume: 1.0,
            reverb_variant: ReverbSetting::default(),
            effects: EffectToggles::default(),
            transitions: TransitionSettings::default(),
        }
    }
}

impl AudioSettings {
    /// Load and validate settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load settings, falling back to defaults when the file does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(err) if err.is_not_found() => Ok(Self::default()),
            other => other,
        }
    }

    /// Parse and validate settings from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let settings: AudioSettings = toml::from_str(toml_str)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save the settings to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        self.validate()?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the settings to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.master_volume.is_finite() || !(0.0..=1.0).contains(&self.master_volume) {
            return Err(ConfigError::invalid(
                "master_volume",
                format!("{} is outside 0.0..=1.0", self.master_volume),
            ));
        }
        let durations = [
            ("transitions.fade_ms", self.transitions.fade_ms),
            ("transitions.reverb_slide_in_ms", self.transitions.reverb_slide_in_ms),
            ("transitions.reverb_slide_out_ms", self.transitions.reverb_slide_out_ms),
        ];
        for (field, ms) in durations {
            if ms > MAX_TRANSITION_MS {
                return Err(ConfigError::invalid(
                    field,
                    format!("{ms} ms exceeds the {MAX_TRANSITION_MS} ms limit"),
                ));
            }
        }
        Ok(())
    }

    /// Transition durations as [`TransitionTimings`].
    pub fn timings(&self) -> TransitionTimings {
        TransitionTimings {
            fade: Duration::from_millis(self.transitions.fade_ms),
            reverb_slide_in: Duration::from_millis(self.transitions.reverb_slide_in_ms),
            reverb_slide_out: Duration::from_millis(self.transitions.reverb_slide_out_ms),
        }
    }

    /// Reverb algorithm.
    pub fn reverb(&self) -> ReverbVariant {
        self.reverb_variant.into()
    }

    /// Build a mixer configured with these timings and reverb algorithm.
    pub fn build_mixer(&self, backend: Arc<dyn AudioBackend>) -> Mixer {
        Mixer::new(backend)
            .with_timings(self.timings())
            .with_reverb_variant(self.reverb())
    }

    /// Requests that bring a freshly started `channel` to these settings.
    ///
    /// Master volume comes first; only enabled effects are requested.
    pub fn startup_requests(&self, channel: ChannelId) -> Vec<SettingsRequest> {
        let mut requests = vec![SettingsRequest::SetMasterVolume(self.master_volume)];
        if self.effects.compressor {
            requests.push(SettingsRequest::SetCompressor {
                channel,
                enabled: true,
            });
        }
        if self.effects.equalizer {
            requests.push(SettingsRequest::SetEqualizer {
                channel,
                enabled: true,
            });
        }
        if self.effects.reverb {
            requests.push(SettingsRequest::SetReverb {
                channel,
                enabled: true,
            });
        }
        requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_engine_constants() {
        let settings = AudioSettings::default();
        assert_eq!(settings.master_volume, 1.0);
        assert_eq!(settings.reverb(), ReverbVariant::Freeverb);
        assert_eq!(settings.timings(), TransitionTimings::default());
        assert!(!settings.effects.reverb);
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(AudioSettings::from_toml("").unwrap(), AudioSettings::default());
    }

    #[test]
    fn partial_sections() {
        let settings = AudioSettings::from_toml(
            r#"
            reverb_variant = "dx_reverb"
            [effects]
            reverb = true
            [transitions]
            fade_ms = 250
            "#,
        )
        .unwrap();
        assert_eq!(settings.reverb(), ReverbVariant::DxReverb);
        assert!(settings.effects.reverb);
        assert!(!settings.effects.equalizer);
        assert_eq!(settings.timings().fade, Duration::from_millis(250));
        assert_eq!(settings.timings().reverb_slide_in, Duration::from_millis(300));
    }

    #[test]
    fn rejects_out_of_range_volume() {
        let err = AudioSettings::from_toml("master_volume = 1.5").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSetting { field: "master_volume", .. }));
    }

    #[test]
    fn rejects_negative_duration() {
        let err = AudioSettings::from_toml("[transitions]\nfade_ms = -5").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn rejects_huge_duration() {
        let err =
            AudioSettings::from_toml("[transitions]\nreverb_slide_out_ms = 600000").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidSetting { field: "transitions.reverb_slide_out_ms", .. }
        ));
    }

    #[test]
    fn rejects_unknown_reverb() {
        assert!(AudioSettings::from_toml("reverb_variant = \"plate\"").is_err());
    }

    #[test]
    fn startup_requests_order() {
        let mut settings = AudioSettings::default();
        settings.master_volume = 0.6;
        settings.effects.reverb = true;
        settings.effects.equalizer = true;
        let ch = ChannelId(4);
        assert_eq!(
            settings.startup_requests(ch),
            vec![
                SettingsRequest::SetMasterVolume(0.6),
                SettingsRequest::SetEqualizer { channel: ch, enabled: true },
                SettingsRequest::SetReverb { channel: ch, enabled: true },
            ]
        );
    }

    #[test]
    fn toml_round_trip() {
        let mut settings = AudioSettings::default();
        settings.reverb_variant = ReverbSetting::DxReverb;
        settings.effects.compressor = true;
        let text = settings.to_toml().unwrap();
        assert!(text.contains("reverb_variant = \"dx_reverb\""), "got: {text}");
        assert_eq!(AudioSettings::from_toml(&text).unwrap(), settings);
    }
}
