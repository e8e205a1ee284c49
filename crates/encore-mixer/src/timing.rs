//! Channel length and sync-adjusted playback position.
//!
//! The backend reports how far it has *read* into a channel, which runs
//! ahead of what the listener hears by one playback buffer. Gameplay that
//! must line up with the audio uses [`ChannelTiming::sync_adjusted_position`],
//! which subtracts that buffer length.

use std::sync::Arc;

use encore_core::PLAYBACK_BUFFER_DESYNC;

use crate::backend::{AudioBackend, ChannelId};
use crate::{Error, Result};

/// Converts backend byte positions to seconds and applies the sync offset.
#[derive(Clone)]
pub struct ChannelTiming {
    backend: Arc<dyn AudioBackend>,
    sync_offset: f64,
}

impl ChannelTiming {
    /// Create a coordinator using the standard playback buffer offset.
    pub fn new(backend: Arc<dyn AudioBackend>) -> Self {
        Self {
            backend,
            sync_offset: PLAYBACK_BUFFER_DESYNC,
        }
    }

    /// Seconds subtracted from the raw position.
    pub fn sync_offset(&self) -> f64 {
        self.sync_offset
    }

    /// Total channel length in seconds.
    pub fn length_seconds(&self, channel: ChannelId) -> Result<f64> {
        let bytes = self.backend.channel_get_length(channel);
        self.bytes_to_seconds(channel, bytes, "length")
    }

    /// Raw playback position in seconds.
    pub fn position_seconds(&self, channel: ChannelId) -> Result<f64> {
        let bytes = self.backend.channel_get_position(channel);
        self.bytes_to_seconds(channel, bytes, "position")
    }

    /// Playback position minus the sync offset.
    ///
    /// Not clamped: during the first buffer of playback the result is
    /// slightly negative.
    pub fn sync_adjusted_position(&self, channel: ChannelId) -> Result<f64> {
        Ok(self.position_seconds(channel)? - self.sync_offset)
    }

    fn bytes_to_seconds(&self, channel: ChannelId, bytes: i64, what: &str) -> Result<f64> {
        let seconds = if bytes < 0 {
            None
        } else {
            Some(self.backend.channel_bytes_to_seconds(channel, bytes))
                .filter(|s| s.is_finite() && *s >= 0.0)
        };
        seconds.ok_or_else(|| {
            let code = self.backend.last_error();
            tracing::warn!(channel = %channel, %code, "{what} query failed");
            Error::TimingQuery { channel, code }
        })
    }
}

impl std::fmt::Debug for ChannelTiming {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelTiming")
            .field("backend", &self.backend.name())
            .field("sync_offset", &self.sync_offset)
            .finish()
    }
}
