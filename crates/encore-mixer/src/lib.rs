//! Effect chain management for the encore playback engine.
//!
//! This crate sits between a song's playback channels and the external
//! audio library that renders them. It attaches preset effects to channels,
//! drives smooth transitions between effect states, and reports playback
//! timing corrected for output latency.
//!
//! ## Components
//!
//! | Module | Role |
//! |--------|------|
//! | [`backend`] | [`AudioBackend`] trait over the native audio library |
//! | [`memory`] | [`MemoryBackend`], a deterministic in-process backend |
//! | [`binder`] | [`EffectBinder`]: one effect per channel slot, RAII handles |
//! | [`transition`] | [`TransitionScheduler`]: fades and reverb slides |
//! | [`timing`] | [`ChannelTiming`]: length and sync-adjusted position |
//! | [`channel`] | [`ChannelTap`]: lock-free gain for the audio thread |
//! | [`mixer`] | [`Mixer`]: settings requests and the per-frame tick |
//!
//! ## Failure Policy
//!
//! Effects are decoration. When the backend refuses to create or configure
//! an effect the failure is logged and returned, and the channel keeps
//! playing without it. Only timing queries hand their errors straight to
//! the caller, since a wrong position would desynchronize gameplay.

pub mod backend;
pub mod binder;
pub mod channel;
pub mod memory;
pub mod mixer;
pub mod timing;
pub mod transition;

pub use backend::{AudioBackend, BackendErrorCode, ChannelId, RawFxHandle};
pub use binder::{Binding, BindingId, EffectBinder, FxHandle};
pub use channel::ChannelTap;
pub use memory::MemoryBackend;
pub use mixer::{Mixer, SettingsRequest};
pub use timing::ChannelTiming;
pub use transition::{
    AdvanceReport, SlideDirection, TransitionFailure, TransitionScheduler, TransitionSink,
    TransitionTarget,
};

use encore_core::{EffectSlot, EffectType};

/// Errors raised by the effect chain.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The backend could not allocate an effect on a channel.
    #[error("failed to create {effect} on channel {channel}: {code}")]
    EffectAllocation {
        /// Channel the effect was requested on.
        channel: ChannelId,
        /// Requested effect.
        effect: EffectType,
        /// Backend error code.
        code: BackendErrorCode,
    },

    /// The backend rejected a parameter block.
    #[error("failed to apply {effect} parameters: {code}")]
    ParameterApply {
        /// Effect being configured.
        effect: EffectType,
        /// Backend error code.
        code: BackendErrorCode,
    },

    /// A length or position query failed.
    #[error("timing query failed on channel {channel}: {code}")]
    TimingQuery {
        /// Queried channel.
        channel: ChannelId,
        /// Backend error code.
        code: BackendErrorCode,
    },

    /// Parameters do not belong to the slot's effect.
    #[error("{effect} parameters cannot be bound to the {slot} slot")]
    SlotMismatch {
        /// Target slot.
        slot: EffectSlot,
        /// Effect the parameters describe.
        effect: EffectType,
    },

    /// Transition endpoints describe different effects.
    #[error("cannot transition from {from} to {to} parameters")]
    TransitionMismatch {
        /// Start effect.
        from: EffectType,
        /// End effect.
        to: EffectType,
    },

    /// Binding id is not live.
    #[error("unknown binding {0}")]
    UnknownBinding(BindingId),

    /// Channel was never registered with the mixer.
    #[error("unknown channel {0}")]
    UnknownChannel(ChannelId),

    /// Gain or volume is negative or not finite.
    #[error("invalid gain {0}")]
    InvalidGain(f32),
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;
