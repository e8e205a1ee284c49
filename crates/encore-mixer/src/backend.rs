//! Audio backend abstraction.
//!
//! This module defines the [`AudioBackend`] trait, the seam between the
//! effect-chain manager and the external audio library that owns channels
//! and effect resources. The trait deliberately mirrors the shape of a C
//! audio API:
//!
//! - calls report success with a flag (`bool`, `Option`, or a negative
//!   sentinel) rather than a `Result`
//! - the reason for the most recent failure is read out-of-band through
//!   [`AudioBackend::last_error`]
//!
//! Everything above this trait converts those conventions into typed
//! [`Error`](crate::Error) values at the first opportunity, so sentinels never
//! leak into the rest of the engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────┐
//! │   Mixer (binder, scheduler,      │
//! │   timing coordinator)            │
//! └──────────────┬───────────────────┘
//!                │ uses AudioBackend trait
//!                ▼
//! ┌──────────────────────────────────┐
//! │        AudioBackend trait        │
//! │  set_fx / set_parameters / ...   │
//! └──────────────┬───────────────────┘
//!                │ implemented by
//!        ┌───────┴────────┐
//!        ▼                ▼
//! ┌─────────────┐  ┌─────────────┐
//! │MemoryBackend│  │ native FFI  │
//! │ (tests/sim) │  │  bindings   │
//! └─────────────┘  └─────────────┘
//! ```
//!
//! ## Parameter Blocks
//!
//! Effect parameters cross the boundary as the byte block produced by
//! [`EffectParams::encode`](encore_core::EffectParams::encode). Implementations
//! over a native library copy that block into the library's struct; nothing
//! on this side of the trait ever hands out a pointer to a Rust value.

use core::fmt;
use encore_core::EffectType;

/// Backend channel handle. Owned by the backend; the engine only refers to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(pub u32);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Backend effect resource identifier. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawFxHandle(pub u32);

/// Error code reported by [`AudioBackend::last_error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BackendErrorCode(pub i32);

impl BackendErrorCode {
    /// No error.
    pub const OK: Self = Self(0);
    /// Memory error.
    pub const MEM: Self = Self(1);
    /// Invalid handle.
    pub const HANDLE: Self = Self(5);
    /// Effect type not supported by the channel.
    pub const ILLTYPE: Self = Self(19);
    /// Illegal parameter.
    pub const ILLPARAM: Self = Self(20);
    /// Requested data or resource is not available.
    pub const NOTAVAIL: Self = Self(37);
    /// Unknown failure.
    pub const UNKNOWN: Self = Self(-1);

    /// Symbolic name for known codes.
    pub fn name(self) -> Option<&'static str> {
        Some(match self {
            Self::OK => "OK",
            Self::MEM => "MEM",
            Self::HANDLE => "HANDLE",
            Self::ILLTYPE => "ILLTYPE",
            Self::ILLPARAM => "ILLPARAM",
            Self::NOTAVAIL => "NOTAVAIL",
            Self::UNKNOWN => "UNKNOWN",
            _ => return None,
        })
    }
}

impl fmt::Display for BackendErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} ({})", self.0),
            None => write!(f, "backend error {}", self.0),
        }
    }
}

/// External audio library operations consumed by the engine.
///
/// All methods take `&self`: backends serialize access internally, the same
/// way a native library guards its global state. Calls are expected to be
/// fast and bounded; none of them may block on disk or network I/O.
///
/// ## Object Safety
///
/// The trait is object-safe; the engine holds backends as
/// `Arc<dyn AudioBackend>` so RAII effect handles can release themselves.
pub trait AudioBackend: Send + Sync {
    /// Human-readable backend name (e.g. "memory").
    fn name(&self) -> &str;

    /// Allocate an effect of type `effect` on `channel`.
    ///
    /// Returns `None` on failure; the reason is available from
    /// [`last_error`](Self::last_error).
    fn channel_set_fx(
        &self,
        channel: ChannelId,
        effect: EffectType,
        priority: i32,
    ) -> Option<RawFxHandle>;

    /// Apply an encoded parameter block to an effect. `false` on failure.
    fn fx_set_parameters(&self, fx: RawFxHandle, params: &[u8]) -> bool;

    /// Release an effect resource. `false` if the handle was not live.
    fn channel_remove_fx(&self, channel: ChannelId, fx: RawFxHandle) -> bool;

    /// Channel length in bytes, or `-1` on failure.
    fn channel_get_length(&self, channel: ChannelId) -> i64;

    /// Playback position in bytes, or `-1` on failure.
    fn channel_get_position(&self, channel: ChannelId) -> i64;

    /// Convert a byte count on `channel` to seconds. Negative on failure.
    fn channel_bytes_to_seconds(&self, channel: ChannelId, bytes: i64) -> f64;

    /// Code describing the most recent failed call.
    fn last_error(&self) -> BackendErrorCode;
}
