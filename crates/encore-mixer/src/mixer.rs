//! The control-side facade tying the binder, scheduler and timing together.
//!
//! A [`Mixer`] is owned by the update thread. Settings changes arrive as
//! [`SettingsRequest`] values and are turned into bind, unbind, slide and
//! fade calls; the playback driver calls [`Mixer::advance`] once per frame.
//!
//! | Request | Effect |
//! |---------|--------|
//! | `SetMasterVolume` | stored immediately, heard on the next audio block |
//! | `SetReverb { enabled: true }` | bind silent reverb, slide in over 300 ms |
//! | `SetReverb { enabled: false }` | slide out over 500 ms, then unbind |
//! | `SetCompressor` | bind / unbind the compressor preset |
//! | `SetEqualizer` | bind / unbind all three EQ bands |
//! | `FadeChannel` | fade channel gain over 1000 ms |

use std::sync::Arc;
use std::time::Duration;

use encore_core::{EffectParams, EffectSlot, EqBand, ReverbVariant, TransitionTimings, presets};

use crate::backend::{AudioBackend, ChannelId};
use crate::binder::{Binding, BindingId, EffectBinder};
use crate::channel::{ChannelTable, ChannelTap};
use crate::timing::ChannelTiming;
use crate::transition::{
    AdvanceReport, SlideDirection, TransitionScheduler, TransitionSink, TransitionTarget,
};
use crate::{Error, Result};

/// A settings change coming from the UI or from persisted settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettingsRequest {
    /// Set master volume (`0.0..=1.0`).
    SetMasterVolume(f32),
    /// Enable or disable the reverb on a channel.
    SetReverb {
        /// Target channel.
        channel: ChannelId,
        /// Desired state.
        enabled: bool,
    },
    /// Enable or disable the compressor on a channel.
    SetCompressor {
        /// Target channel.
        channel: ChannelId,
        /// Desired state.
        enabled: bool,
    },
    /// Enable or disable the three-band equalizer on a channel.
    SetEqualizer {
        /// Target channel.
        channel: ChannelId,
        /// Desired state.
        enabled: bool,
    },
    /// Fade a channel's gain to `to`.
    FadeChannel {
        /// Target channel.
        channel: ChannelId,
        /// Final gain.
        to: f32,
    },
}

/// Routes scheduler output to the channel table and effect binder.
struct MixerSink<'a> {
    binder: &'a mut EffectBinder,
    channels: &'a ChannelTable,
}

impl TransitionSink for MixerSink<'_> {
    fn set_gain(&mut self, channel: ChannelId, gain: f32) -> Result<()> {
        self.channels.set_gain(channel, gain)
    }

    fn rebind(&mut self, binding: BindingId, params: EffectParams) -> Result<()> {
        self.binder.rebind(binding, params)
    }

    fn release(&mut self, binding: BindingId) {
        self.binder.unbind(binding);
    }
}

/// Effect chain manager for a set of playback channels.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::time::Duration;
/// use encore_mixer::{MemoryBackend, Mixer, SettingsRequest};
///
/// let backend = Arc::new(MemoryBackend::new());
/// let channel = backend.create_channel(44100, 2, 120.0);
///
/// let mut mixer = Mixer::new(backend.clone());
/// let tap = mixer.register_channel(channel, 2);
/// mixer.handle(SettingsRequest::SetReverb { channel, enabled: true }).unwrap();
/// assert_eq!(backend.effect_count(channel), 1);
///
/// mixer.advance(Duration::from_millis(300));
/// assert!(mixer.scheduler().is_empty());
/// assert!(tap.effective_gain() > 0.0);
/// ```
#[derive(Debug)]
pub struct Mixer {
    binder: EffectBinder,
    scheduler: TransitionScheduler,
    timing: ChannelTiming,
    channels: ChannelTable,
    reverb_variant: ReverbVariant,
}

impl Mixer {
    /// Create a mixer over `backend` with default timings and Freeverb.
    pub fn new(backend: Arc<dyn AudioBackend>) -> Self {
        tracing::debug!(backend = backend.name(), "mixer created");
        Self {
            binder: EffectBinder::new(Arc::clone(&backend)),
            scheduler: TransitionScheduler::new(),
            timing: ChannelTiming::new(backend),
            channels: ChannelTable::default(),
            reverb_variant: ReverbVariant::default(),
        }
    }

    /// Use custom transition durations.
    #[must_use]
    pub fn with_timings(mut self, timings: TransitionTimings) -> Self {
        self.scheduler.set_timings(timings);
        self
    }

    /// Use a different reverb algorithm for newly enabled reverbs.
    #[must_use]
    pub fn with_reverb_variant(mut self, variant: ReverbVariant) -> Self {
        self.reverb_variant = variant;
        self
    }

    /// Reverb algorithm used when reverb is enabled.
    pub fn reverb_variant(&self) -> ReverbVariant {
        self.reverb_variant
    }

    /// Start tracking `channel` and return its audio-thread tap.
    ///
    /// Registering an already known channel returns a tap sharing the
    /// existing gain.
    pub fn register_channel(&mut self, channel: ChannelId, frame_channels: usize) -> ChannelTap {
        tracing::debug!(channel = %channel, frame_channels, "channel registered");
        self.channels.register(channel, frame_channels)
    }

    /// Forget `channel`: cancel its transitions and release its effects.
    ///
    /// Returns the number of effect bindings released.
    pub fn release_channel(&mut self, channel: ChannelId) -> usize {
        let bindings = self.binder.bindings_on(channel);
        self.scheduler.cancel_channel(channel, &bindings);
        let released = self.binder.release_channel(channel);
        self.channels.remove(channel);
        tracing::debug!(channel = %channel, released, "channel released");
        released
    }

    /// Audio-thread tap for a registered channel.
    pub fn tap(&self, channel: ChannelId) -> Option<ChannelTap> {
        self.channels.tap(channel)
    }

    /// Apply a settings request.
    pub fn handle(&mut self, request: SettingsRequest) -> Result<()> {
        tracing::debug!(?request, "settings request");
        match request {
            SettingsRequest::SetMasterVolume(volume) => self.set_master_volume(volume),
            SettingsRequest::SetReverb { channel, enabled } => {
                if enabled {
                    self.enable_reverb(channel).map(|_| ())
                } else {
                    self.disable_reverb(channel)
                }
            }
            SettingsRequest::SetCompressor { channel, enabled } => {
                self.set_compressor(channel, enabled)
            }
            SettingsRequest::SetEqualizer { channel, enabled } => {
                self.set_equalizer(channel, enabled)
            }
            SettingsRequest::FadeChannel { channel, to } => self.fade(channel, to),
        }
    }

    /// Set master volume. Takes effect on the next audio block.
    pub fn set_master_volume(&mut self, volume: f32) -> Result<()> {
        if !volume.is_finite() {
            return Err(Error::InvalidGain(volume));
        }
        self.channels.set_master(volume);
        Ok(())
    }

    /// Current master volume.
    pub fn master_volume(&self) -> f32 {
        self.channels.master()
    }

    /// Gain currently applied to `channel` (before master volume).
    pub fn channel_gain(&self, channel: ChannelId) -> Result<f32> {
        self.channels.gain(channel)
    }

    /// Fade `channel` from its current gain to `to` over the configured fade time.
    pub fn fade(&mut self, channel: ChannelId, to: f32) -> Result<()> {
        if !to.is_finite() || to < 0.0 {
            return Err(Error::InvalidGain(to));
        }
        let from = self.channels.gain(channel)?;
        self.scheduler.fade(channel, from, to);
        Ok(())
    }

    /// Make reverb audible on `channel`, sliding it in.
    ///
    /// A reverb that is already bound with the current variant slides back
    /// in from wherever it is; a reverb of the other variant is replaced.
    pub fn enable_reverb(&mut self, channel: ChannelId) -> Result<BindingId> {
        self.ensure_channel(channel)?;
        let variant = self.reverb_variant;
        let slot = EffectSlot::Reverb(variant);
        let duration = SlideDirection::In.duration(self.scheduler.timings());

        let existing = self
            .binder
            .binding_for(channel, slot)
            .map(|b| (b.id(), b.slot(), *b.params()));

        let (id, from) = match existing {
            Some((id, bound_slot, params)) if bound_slot == slot => (id, params),
            other => {
                if let Some((old, ..)) = other {
                    self.scheduler.cancel(TransitionTarget::Effect(old));
                }
                let silent = variant.silent();
                (self.binder.bind(channel, slot, silent)?, silent)
            }
        };

        self.scheduler.begin_reverb_slide(
            id,
            from,
            variant.preset(),
            duration,
            SlideDirection::In,
        )?;
        Ok(id)
    }

    /// Slide reverb out on `channel` and unbind it once silent.
    ///
    /// No-op when the channel has no reverb.
    pub fn disable_reverb(&mut self, channel: ChannelId) -> Result<()> {
        let Some((id, slot, params)) = self
            .binder
            .binding_for(channel, EffectSlot::Reverb(self.reverb_variant))
            .map(|b| (b.id(), b.slot(), *b.params()))
        else {
            return Ok(());
        };
        let EffectSlot::Reverb(variant) = slot else {
            return Ok(());
        };
        let duration = SlideDirection::Out.duration(self.scheduler.timings());
        self.scheduler
            .begin_reverb_slide_out_and_release(id, params, variant.silent(), duration)
    }

    /// Bind or unbind the compressor preset on `channel`.
    pub fn set_compressor(&mut self, channel: ChannelId, enabled: bool) -> Result<()> {
        self.ensure_channel(channel)?;
        let existing = self
            .binder
            .binding_for(channel, EffectSlot::Compressor)
            .map(Binding::id);
        match (enabled, existing) {
            (true, Some(id)) => self
                .binder
                .rebind(id, EffectParams::Compressor(presets::COMPRESSOR)),
            (true, None) => self
                .binder
                .bind(
                    channel,
                    EffectSlot::Compressor,
                    EffectParams::Compressor(presets::COMPRESSOR),
                )
                .map(|_| ()),
            (false, Some(id)) => {
                self.binder.unbind(id);
                Ok(())
            }
            (false, None) => Ok(()),
        }
    }

    /// Bind or unbind all three EQ bands on `channel`.
    ///
    /// Enabling is all-or-nothing: if any band fails, bands bound by this
    /// call are released again.
    pub fn set_equalizer(&mut self, channel: ChannelId, enabled: bool) -> Result<()> {
        self.ensure_channel(channel)?;
        if !enabled {
            for band in EqBand::ALL {
                if let Some(id) = self
                    .binder
                    .binding_for(channel, EffectSlot::Equalizer(band))
                    .map(Binding::id)
                {
                    self.binder.unbind(id);
                }
            }
            return Ok(());
        }

        let mut bound = Vec::with_capacity(EqBand::ALL.len());
        for band in EqBand::ALL {
            let slot = EffectSlot::Equalizer(band);
            let params = EffectParams::PeakEq(band.preset());
            let result = match self.binder.binding_for(channel, slot).map(Binding::id) {
                Some(id) => self.binder.rebind(id, params),
                None => self.binder.bind(channel, slot, params).map(|id| bound.push(id)),
            };
            if let Err(err) = result {
                for id in bound {
                    self.binder.unbind(id);
                }
                return Err(err);
            }
        }
        Ok(())
    }

    /// Advance all transitions by `delta`. Call once per update frame.
    pub fn advance(&mut self, delta: Duration) -> AdvanceReport {
        let mut sink = MixerSink {
            binder: &mut self.binder,
            channels: &self.channels,
        };
        self.scheduler.advance(delta, &mut sink)
    }

    /// Channel length in seconds.
    pub fn length_seconds(&self, channel: ChannelId) -> Result<f64> {
        self.timing.length_seconds(channel)
    }

    /// Raw playback position in seconds.
    pub fn position_seconds(&self, channel: ChannelId) -> Result<f64> {
        self.timing.position_seconds(channel)
    }

    /// Playback position corrected for the playback buffer.
    pub fn sync_adjusted_position(&self, channel: ChannelId) -> Result<f64> {
        self.timing.sync_adjusted_position(channel)
    }

    /// The effect binder.
    pub fn binder(&self) -> &EffectBinder {
        &self.binder
    }

    /// The transition scheduler.
    pub fn scheduler(&self) -> &TransitionScheduler {
        &self.scheduler
    }

    /// The timing coordinator.
    pub fn timing(&self) -> &ChannelTiming {
        &self.timing
    }

    /// Current reverb parameters on `channel`, if a reverb is bound.
    pub fn reverb_params(&self, channel: ChannelId) -> Option<EffectParams> {
        self.binder
            .binding_for(channel, EffectSlot::Reverb(self.reverb_variant))
            .map(|b| *b.params())
    }

    fn ensure_channel(&self, channel: ChannelId) -> Result<()> {
        if self.channels.contains(channel) {
            Ok(())
        } else {
            Err(Error::UnknownChannel(channel))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryBackend;
    use crate::backend::BackendErrorCode;
    use encore_core::EffectType;

    fn setup() -> (Arc<MemoryBackend>, Mixer, ChannelId) {
        let backend = Arc::new(MemoryBackend::new());
        let channel = backend.create_channel(44_100, 2, 60.0);
        let mut mixer = Mixer::new(backend.clone());
        mixer.register_channel(channel, 2);
        (backend, mixer, channel)
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn reverb_slides_in_from_silence() {
        let (backend, mut mixer, ch) = setup();
        let id = mixer.enable_reverb(ch).unwrap();
        let raw = mixer.binder().binding(id).unwrap().raw_handle();
        assert_eq!(backend.effect_params(raw), Some(ReverbVariant::Freeverb.silent()));

        mixer.advance(ms(150));
        let wet = mixer.reverb_params(ch).unwrap().reverb_wet().unwrap();
        assert!((wet - 0.75).abs() < 1e-5);

        mixer.advance(ms(150));
        assert_eq!(mixer.reverb_params(ch), Some(ReverbVariant::Freeverb.preset()));
        assert!(mixer.scheduler().is_empty());
    }

    #[test]
    fn disabling_reverb_releases_after_slide_out() {
        let (backend, mut mixer, ch) = setup();
        mixer.enable_reverb(ch).unwrap();
        mixer.advance(ms(300));

        mixer.disable_reverb(ch).unwrap();
        mixer.advance(ms(250));
        assert_eq!(backend.effect_count(ch), 1);
        let report = mixer.advance(ms(250));
        assert_eq!(report.completed.len(), 1);
        assert_eq!(backend.effect_count(ch), 0);
        assert!(mixer.binder().is_empty());
    }

    #[test]
    fn reenabling_mid_slide_out_keeps_binding() {
        let (backend, mut mixer, ch) = setup();
        let id = mixer.enable_reverb(ch).unwrap();
        mixer.advance(ms(300));
        mixer.disable_reverb(ch).unwrap();
        mixer.advance(ms(250));

        let again = mixer.enable_reverb(ch).unwrap();
        assert_eq!(again, id);
        mixer.advance(ms(300));
        assert_eq!(backend.effect_count(ch), 1);
        assert_eq!(mixer.reverb_params(ch), Some(ReverbVariant::Freeverb.preset()));
    }

    #[test]
    fn disabling_absent_reverb_is_noop() {
        let (_, mut mixer, ch) = setup();
        mixer.disable_reverb(ch).unwrap();
        assert!(mixer.scheduler().is_empty());
    }

    #[test]
    fn dx_reverb_variant() {
        let backend = Arc::new(MemoryBackend::new());
        let ch = backend.create_channel(44_100, 2, 60.0);
        let mut mixer = Mixer::new(backend.clone()).with_reverb_variant(ReverbVariant::DxReverb);
        mixer.register_channel(ch, 2);
        mixer.enable_reverb(ch).unwrap();
        assert_eq!(backend.effects_on(ch)[0].1, EffectType::DxReverb);
    }

    #[test]
    fn compressor_toggle() {
        let (backend, mut mixer, ch) = setup();
        mixer.set_compressor(ch, true).unwrap();
        mixer.set_compressor(ch, true).unwrap();
        assert_eq!(backend.effect_count(ch), 1);
        mixer.set_compressor(ch, false).unwrap();
        assert_eq!(backend.effect_count(ch), 0);
    }

    #[test]
    fn equalizer_binds_three_bands() {
        let (backend, mut mixer, ch) = setup();
        mixer.set_equalizer(ch, true).unwrap();
        assert_eq!(backend.effect_count(ch), 3);
        mixer.set_equalizer(ch, false).unwrap();
        assert_eq!(backend.effect_count(ch), 0);
    }

    #[test]
    fn equalizer_rolls_back_on_failure() {
        let (backend, mut mixer, ch) = setup();
        backend.fail_parameters_after(2, BackendErrorCode::ILLPARAM);
        let err = mixer.set_equalizer(ch, true).unwrap_err();
        assert!(matches!(err, Error::ParameterApply { .. }));
        assert_eq!(backend.effect_count(ch), 0);
        assert!(mixer.binder().is_empty());
    }

    #[test]
    fn fade_reaches_target_and_tap_follows() {
        let (_, mut mixer, ch) = setup();
        let tap = mixer.tap(ch).unwrap();
        mixer.fade(ch, 0.0).unwrap();
        mixer.advance(ms(500));
        assert!((mixer.channel_gain(ch).unwrap() - 0.5).abs() < 1e-6);
        mixer.advance(ms(500));
        assert_eq!(mixer.channel_gain(ch).unwrap(), 0.0);
        assert_eq!(tap.effective_gain(), 0.0);
    }

    #[test]
    fn handle_routes_requests() {
        let (backend, mut mixer, ch) = setup();
        mixer.handle(SettingsRequest::SetMasterVolume(0.5)).unwrap();
        mixer
            .handle(SettingsRequest::SetCompressor { channel: ch, enabled: true })
            .unwrap();
        mixer
            .handle(SettingsRequest::SetReverb { channel: ch, enabled: true })
            .unwrap();
        mixer
            .handle(SettingsRequest::FadeChannel { channel: ch, to: 0.2 })
            .unwrap();
        assert_eq!(mixer.master_volume(), 0.5);
        assert_eq!(backend.effect_count(ch), 2);
        assert_eq!(mixer.scheduler().len(), 2);
    }

    #[test]
    fn invalid_gain_rejected() {
        let (_, mut mixer, ch) = setup();
        assert!(matches!(mixer.set_master_volume(f32::NAN), Err(Error::InvalidGain(_))));
        assert!(matches!(mixer.fade(ch, -1.0), Err(Error::InvalidGain(_))));
    }

    #[test]
    fn unregistered_channel_rejected() {
        let (backend, mut mixer, _) = setup();
        let other = backend.create_channel(44_100, 2, 10.0);
        assert!(matches!(mixer.enable_reverb(other), Err(Error::UnknownChannel(_))));
        assert!(matches!(mixer.fade(other, 1.0), Err(Error::UnknownChannel(_))));
        assert_eq!(backend.total_effects(), 0);
    }

    #[test]
    fn release_channel_cancels_everything() {
        let (backend, mut mixer, ch) = setup();
        mixer.set_compressor(ch, true).unwrap();
        mixer.enable_reverb(ch).unwrap();
        mixer.fade(ch, 0.0).unwrap();
        assert_eq!(mixer.release_channel(ch), 2);
        assert_eq!(backend.effect_count(ch), 0);
        assert!(mixer.scheduler().is_empty());
        assert!(mixer.tap(ch).is_none());
        let report = mixer.advance(ms(100));
        assert!(report.is_ok());
    }

    #[test]
    fn mixer_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Mixer>();
    }
}
