//! Deterministic in-memory backend.
//!
//! [`MemoryBackend`] implements [`AudioBackend`] without touching any audio
//! hardware. Channels are plain records with a length and a playhead; effect
//! resources live in a table keyed by handle, together with the decoded
//! parameters most recently applied to them. Failures can be injected so the
//! error paths of the binder and scheduler are reachable from tests and from
//! the `encore simulate` command.
//!
//! Samples are modelled as 32-bit float, so one second of audio on a channel
//! is `sample_rate × channels × 4` bytes.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use encore_core::{EffectParams, EffectType, SAMPLE_STRIDE};

use crate::backend::{AudioBackend, BackendErrorCode, ChannelId, RawFxHandle};

/// A channel known to the in-memory backend.
#[derive(Debug, Clone, Copy)]
struct MemoryChannel {
    sample_rate: u32,
    channels: u16,
    /// `None` models a stream whose length the backend cannot report.
    length_bytes: Option<i64>,
    position_bytes: i64,
}

impl MemoryChannel {
    fn bytes_per_second(&self) -> f64 {
        f64::from(self.sample_rate) * f64::from(self.channels) * SAMPLE_STRIDE as f64
    }
}

/// A live effect resource.
#[derive(Debug, Clone, Copy)]
struct MemoryEffect {
    channel: ChannelId,
    effect: EffectType,
    params: Option<EffectParams>,
}

/// Injected failure: succeed `remaining_ok` more times, then fail with `code`.
#[derive(Debug, Clone, Copy)]
struct FailPlan {
    remaining_ok: usize,
    code: BackendErrorCode,
}

impl FailPlan {
    /// Consume one call; returns the error code if this call must fail.
    fn hit(plan: &mut Option<FailPlan>) -> Option<BackendErrorCode> {
        let current = plan.as_mut()?;
        if current.remaining_ok > 0 {
            current.remaining_ok -= 1;
            return None;
        }
        let code = current.code;
        *plan = None;
        Some(code)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    channels: HashMap<ChannelId, MemoryChannel>,
    effects: BTreeMap<RawFxHandle, MemoryEffect>,
    next_channel: u32,
    next_fx: u32,
    last_error: Option<BackendErrorCode>,
    alloc_failure: Option<FailPlan>,
    param_failure: Option<FailPlan>,
}

impl MemoryState {
    fn fail<T>(&mut self, code: BackendErrorCode, value: T) -> T {
        self.last_error = Some(code);
        value
    }
}

/// In-memory [`AudioBackend`] with failure injection.
///
/// # Example
///
/// ```rust
/// use encore_mixer::{AudioBackend, MemoryBackend};
/// use encore_core::EffectType;
///
/// let backend = MemoryBackend::new();
/// let channel = backend.create_channel(44100, 2, 180.0);
/// let fx = backend.channel_set_fx(channel, EffectType::Compressor, 0).unwrap();
/// assert_eq!(backend.effect_count(channel), 1);
/// assert!(backend.channel_remove_fx(channel, fx));
/// assert_eq!(backend.effect_count(channel), 0);
/// ```
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// State guard for a backend call. Each call starts with a clean error code.
    fn call(&self) -> MutexGuard<'_, MemoryState> {
        let mut state = self.state();
        state.last_error = None;
        state
    }

    /// Create a channel of `length_secs` seconds, playhead at zero.
    pub fn create_channel(&self, sample_rate: u32, channels: u16, length_secs: f64) -> ChannelId {
        let mut state = self.state();
        state.next_channel += 1;
        let id = ChannelId(state.next_channel);
        let mut channel = MemoryChannel {
            sample_rate,
            channels,
            length_bytes: None,
            position_bytes: 0,
        };
        channel.length_bytes = Some((length_secs * channel.bytes_per_second()).round() as i64);
        state.channels.insert(id, channel);
        tracing::debug!(
            channel = %id,
            sample_rate,
            channels,
            length_secs,
            "memory channel created"
        );
        id
    }

    /// Destroy a channel and every effect attached to it.
    pub fn free_channel(&self, channel: ChannelId) -> bool {
        let mut state = self.state();
        state.effects.retain(|_, fx| fx.channel != channel);
        state.channels.remove(&channel).is_some()
    }

    /// Move the playhead to `seconds`.
    pub fn set_position_seconds(&self, channel: ChannelId, seconds: f64) {
        let mut state = self.state();
        if let Some(ch) = state.channels.get_mut(&channel) {
            ch.position_bytes = (seconds * ch.bytes_per_second()).round() as i64;
        }
    }

    /// Advance the playhead by `seconds`, stopping at the end of the channel.
    pub fn advance_position(&self, channel: ChannelId, seconds: f64) {
        let mut state = self.state();
        if let Some(ch) = state.channels.get_mut(&channel) {
            let step = (seconds * ch.bytes_per_second()).round() as i64;
            let end = ch.length_bytes.unwrap_or(i64::MAX);
            ch.position_bytes = ch.position_bytes.saturating_add(step).min(end);
        }
    }

    /// Make length queries on `channel` fail, as for an unbounded stream.
    pub fn set_length_unknown(&self, channel: ChannelId) {
        if let Some(ch) = self.state().channels.get_mut(&channel) {
            ch.length_bytes = None;
        }
    }

    /// Fail the next effect allocation with `code`.
    pub fn fail_next_allocation(&self, code: BackendErrorCode) {
        self.state().alloc_failure = Some(FailPlan {
            remaining_ok: 0,
            code,
        });
    }

    /// Let `successes` parameter applications through, then fail one with `code`.
    pub fn fail_parameters_after(&self, successes: usize, code: BackendErrorCode) {
        self.state().param_failure = Some(FailPlan {
            remaining_ok: successes,
            code,
        });
    }

    /// Number of live effect resources on `channel`.
    pub fn effect_count(&self, channel: ChannelId) -> usize {
        self.state()
            .effects
            .values()
            .filter(|fx| fx.channel == channel)
            .count()
    }

    /// Number of live effect resources across all channels.
    pub fn total_effects(&self) -> usize {
        self.state().effects.len()
    }

    /// Parameters most recently applied to `fx`.
    pub fn effect_params(&self, fx: RawFxHandle) -> Option<EffectParams> {
        self.state().effects.get(&fx).and_then(|e| e.params)
    }

    /// Live effects on `channel`, in allocation order.
    pub fn effects_on(&self, channel: ChannelId) -> Vec<(RawFxHandle, EffectType)> {
        self.state()
            .effects
            .iter()
            .filter(|(_, fx)| fx.channel == channel)
            .map(|(handle, fx)| (*handle, fx.effect))
            .collect()
    }
}

impl AudioBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    fn channel_set_fx(
        &self,
        channel: ChannelId,
        effect: EffectType,
        _priority: i32,
    ) -> Option<RawFxHandle> {
        let mut state = self.call();
        if !state.channels.contains_key(&channel) {
            return state.fail(BackendErrorCode::HANDLE, None);
        }
        if let Some(code) = FailPlan::hit(&mut state.alloc_failure) {
            return state.fail(code, None);
        }
        state.next_fx += 1;
        let handle = RawFxHandle(state.next_fx);
        state.effects.insert(
            handle,
            MemoryEffect {
                channel,
                effect,
                params: None,
            },
        );
        Some(handle)
    }

    fn fx_set_parameters(&self, fx: RawFxHandle, params: &[u8]) -> bool {
        let mut state = self.call();
        let Some(effect) = state.effects.get(&fx).map(|e| e.effect) else {
            return state.fail(BackendErrorCode::HANDLE, false);
        };
        let Some(decoded) = EffectParams::decode(effect, params) else {
            return state.fail(BackendErrorCode::ILLPARAM, false);
        };
        if let Some(code) = FailPlan::hit(&mut state.param_failure) {
            return state.fail(code, false);
        }
        if let Some(entry) = state.effects.get_mut(&fx) {
            entry.params = Some(decoded);
        }
        true
    }

    fn channel_remove_fx(&self, channel: ChannelId, fx: RawFxHandle) -> bool {
        let mut state = self.call();
        match state.effects.get(&fx) {
            Some(entry) if entry.channel == channel => {
                state.effects.remove(&fx);
                true
            }
            _ => state.fail(BackendErrorCode::HANDLE, false),
        }
    }

    fn channel_get_length(&self, channel: ChannelId) -> i64 {
        let mut state = self.call();
        match state.channels.get(&channel).map(|ch| ch.length_bytes) {
            Some(Some(len)) => len,
            Some(None) => state.fail(BackendErrorCode::NOTAVAIL, -1),
            None => state.fail(BackendErrorCode::HANDLE, -1),
        }
    }

    fn channel_get_position(&self, channel: ChannelId) -> i64 {
        let mut state = self.call();
        match state.channels.get(&channel) {
            Some(ch) => ch.position_bytes,
            None => state.fail(BackendErrorCode::HANDLE, -1),
        }
    }

    fn channel_bytes_to_seconds(&self, channel: ChannelId, bytes: i64) -> f64 {
        let mut state = self.call();
        match state.channels.get(&channel).copied() {
            Some(_) if bytes < 0 => state.fail(BackendErrorCode::ILLPARAM, -1.0),
            Some(ch) => bytes as f64 / ch.bytes_per_second(),
            None => state.fail(BackendErrorCode::HANDLE, -1.0),
        }
    }

    fn last_error(&self) -> BackendErrorCode {
        self.state().last_error.unwrap_or(BackendErrorCode::OK)
    }
}
