//! Per-channel gain state shared with the audio thread.
//!
//! The control side owns a [`ChannelTable`]; the audio side holds a
//! [`ChannelTap`] per channel. Both point at the same [`AtomicGain`] cells,
//! so fades and master volume changes reach the sample path without locks.
//!
//! ```text
//!  control thread                     audio thread
//!  ──────────────                     ────────────
//!  Mixer::advance ──▶ AtomicGain ◀── ChannelTap::process(&mut [f32])
//!  set_master_volume ─▶ master ◀──┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use encore_core::{AtomicGain, SONG_VOLUME_MULTIPLIER, apply_gain_interleaved};

use crate::backend::ChannelId;
use crate::{Error, Result};

/// Audio-thread view of one channel's gain.
///
/// Cheap to clone. Reads are wait-free.
#[derive(Debug, Clone)]
pub struct ChannelTap {
    channel: ChannelId,
    gain: Arc<AtomicGain>,
    master: Arc<AtomicGain>,
    frame_channels: usize,
}

impl ChannelTap {
    /// Channel this tap belongs to.
    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    /// Samples per interleaved frame.
    pub fn frame_channels(&self) -> usize {
        self.frame_channels
    }

    /// Channel gain × master volume × song volume multiplier.
    pub fn effective_gain(&self) -> f32 {
        self.gain.get() * self.master.get() * SONG_VOLUME_MULTIPLIER
    }

    /// Scale an interleaved block by [`effective_gain`](Self::effective_gain).
    pub fn process(&self, block: &mut [f32]) {
        apply_gain_interleaved(block, self.frame_channels, self.effective_gain());
    }
}

#[derive(Debug)]
struct ChannelState {
    gain: Arc<AtomicGain>,
    frame_channels: usize,
}

/// Control-side registry of channel gains.
#[derive(Debug)]
pub(crate) struct ChannelTable {
    channels: HashMap<ChannelId, ChannelState>,
    master: Arc<AtomicGain>,
}

impl Default for ChannelTable {
    fn default() -> Self {
        Self {
            channels: HashMap::new(),
            master: Arc::new(AtomicGain::new(1.0)),
        }
    }
}

impl ChannelTable {
    pub(crate) fn register(&mut self, channel: ChannelId, frame_channels: usize) -> ChannelTap {
        let frame_channels = frame_channels.max(1);
        let state = self.channels.entry(channel).or_insert_with(|| ChannelState {
            gain: Arc::new(AtomicGain::new(1.0)),
            frame_channels,
        });
        state.frame_channels = frame_channels;
        ChannelTap {
            channel,
            gain: Arc::clone(&state.gain),
            master: Arc::clone(&self.master),
            frame_channels,
        }
    }

    pub(crate) fn remove(&mut self, channel: ChannelId) -> bool {
        self.channels.remove(&channel).is_some()
    }

    pub(crate) fn contains(&self, channel: ChannelId) -> bool {
        self.channels.contains_key(&channel)
    }

    pub(crate) fn tap(&self, channel: ChannelId) -> Option<ChannelTap> {
        self.channels.get(&channel).map(|state| ChannelTap {
            channel,
            gain: Arc::clone(&state.gain),
            master: Arc::clone(&self.master),
            frame_channels: state.frame_channels,
        })
    }

    pub(crate) fn gain(&self, channel: ChannelId) -> Result<f32> {
        self.channels
            .get(&channel)
            .map(|state| state.gain.get())
            .ok_or(Error::UnknownChannel(channel))
    }

    pub(crate) fn set_gain(&self, channel: ChannelId, gain: f32) -> Result<()> {
        let state = self
            .channels
            .get(&channel)
            .ok_or(Error::UnknownChannel(channel))?;
        state.gain.set(gain.max(0.0));
        Ok(())
    }

    pub(crate) fn master(&self) -> f32 {
        self.master.get()
    }

    pub(crate) fn set_master(&self, volume: f32) {
        self.master.set(volume.clamp(0.0, 1.0));
    }
}
