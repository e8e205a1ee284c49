//! Timing constants for playback sync and parameter transitions.
//!
//! The backend mixes audio one playback buffer ahead of what is audible, so
//! every reported position runs [`PLAYBACK_BUFFER_DESYNC`] seconds early.
//! Subtracting it keeps a song and its separately streamed stems aligned.

use core::time::Duration;

/// Backend playback buffer length in milliseconds.
pub const PLAYBACK_BUFFER_LENGTH_MS: u32 = 75;

/// Sync offset in seconds, derived from the playback buffer length.
pub const PLAYBACK_BUFFER_DESYNC: f64 = PLAYBACK_BUFFER_LENGTH_MS as f64 / 1000.0;

/// Headroom factor applied to song channels on top of the master volume.
pub const SONG_VOLUME_MULTIPLIER: f32 = 0.7;

/// Default volume fade duration.
pub const FADE_TIME: Duration = Duration::from_millis(1000);

/// Default reverb slide-in duration. Entering an effect should feel immediate.
pub const REVERB_SLIDE_IN_TIME: Duration = Duration::from_millis(300);

/// Default reverb slide-out duration. Leaving it should tail off naturally.
pub const REVERB_SLIDE_OUT_TIME: Duration = Duration::from_millis(500);

/// Durations used by the transition scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionTimings {
    /// Volume fade duration.
    pub fade: Duration,
    /// Reverb slide-in duration.
    pub reverb_slide_in: Duration,
    /// Reverb slide-out duration.
    pub reverb_slide_out: Duration,
}

impl Default for TransitionTimings {
    fn default() -> Self {
        Self {
            fade: FADE_TIME,
            reverb_slide_in: REVERB_SLIDE_IN_TIME,
            reverb_slide_out: REVERB_SLIDE_OUT_TIME,
        }
    }
}
