//! Encore Core - effect parameters and gain primitives for live playback
//!
//! This crate holds the pieces of the encore effect-chain manager that carry no
//! backend state: the typed parameter model for every effect the engine can
//! attach, the process-wide presets, the real-time gain processor, and the
//! timing constants shared by the transition scheduler and sync compensation.
//!
//! # Core Abstractions
//!
//! ## Effect Model
//!
//! - [`EffectType`] - Backend effect kinds (compressor, peaking EQ, reverbs)
//! - [`EffectSlot`] - Per-channel slot an effect occupies (one binding per slot)
//! - [`EffectParams`] - Strongly typed parameter payload, encodable to the backend format
//!
//! ## Presets
//!
//! - [`presets`] - Compressor, low/mid/high EQ bands, Freeverb and DX reverb
//!
//! ## Gain
//!
//! - [`apply_gain`] - In-place scalar multiply of an `f32` buffer
//! - [`apply_gain_raw`] - Same, over a raw little-endian byte buffer
//! - [`AtomicGain`] - Lock-free `f32` cell shared between update and audio threads
//!
//! ## Timing
//!
//! - [`PLAYBACK_BUFFER_DESYNC`] - Sync offset subtracted from reported positions
//! - [`TransitionTimings`] - Fade and reverb slide durations
//!
//! # Example
//!
//! ```rust
//! use encore_core::{apply_gain, presets, EffectParams};
//!
//! let mut buffer = [0.5_f32, -0.25, 1.0, 0.0];
//! apply_gain(&mut buffer, 0.5);
//! assert_eq!(buffer, [0.25, -0.125, 0.5, 0.0]);
//!
//! let params = EffectParams::Compressor(presets::COMPRESSOR);
//! let bytes = params.encode();
//! assert_eq!(EffectParams::decode(params.effect_type(), &bytes), Some(params));
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: the gain path never allocates, locks or blocks
//! - **No raw memory**: parameters cross the backend boundary as explicit bytes
//! - **Closed dispatch**: effect kinds are enums, not runtime type checks

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod effect;
pub mod gain;
pub mod math;
pub mod presets;
pub mod timing;

// Re-export main types at crate root
pub use effect::{
    CompressorParams, DxReverbParams, EffectParams, EffectSlot, EffectType, EqBand,
    FreeverbParams, PeakEqParams, ReverbVariant,
};
pub use gain::{
    AtomicGain, PreconditionViolation, SAMPLE_STRIDE, apply_gain, apply_gain_interleaved,
    apply_gain_raw, validate_gain_buffer,
};
pub use math::{db_to_linear, lerp, linear_to_db, unit_progress};
pub use timing::{
    FADE_TIME, PLAYBACK_BUFFER_DESYNC, PLAYBACK_BUFFER_LENGTH_MS, REVERB_SLIDE_IN_TIME,
    REVERB_SLIDE_OUT_TIME, SONG_VOLUME_MULTIPLIER, TransitionTimings,
};
