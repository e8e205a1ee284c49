//! Real-time gain processing and the shared gain cell.
//!
//! The backend's streaming callback hands the engine raw interleaved sample
//! data; the functions here scale it in place. They run on the audio thread,
//! so they never allocate, lock or block.
//!
//! # Usage
//!
//! ```rust
//! use encore_core::gain::{AtomicGain, apply_gain};
//!
//! let gain = AtomicGain::new(1.0);
//! gain.set(0.5); // update thread
//!
//! let mut buffer = [1.0_f32, -1.0];
//! apply_gain(&mut buffer, gain.get()); // audio thread
//! assert_eq!(buffer, [0.5, -0.5]);
//! ```
//!
//! # Preconditions
//!
//! Raw byte buffers must hold a whole number of `f32` samples and interleaved
//! buffers a whole number of frames. A violation is a caller bug: it trips a
//! debug assertion rather than returning an error. Callers that cannot
//! guarantee alignment check first with [`validate_gain_buffer`].

use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

/// Width of one sample in a raw buffer (32-bit float).
pub const SAMPLE_STRIDE: usize = core::mem::size_of::<f32>();

/// A buffer descriptor that does not describe whole samples or frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreconditionViolation {
    /// Length of the offending buffer.
    pub len: usize,
    /// Stride it must be a multiple of.
    pub stride: usize,
}

impl fmt::Display for PreconditionViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "buffer length {} is not a multiple of the sample stride {}",
            self.len, self.stride
        )
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PreconditionViolation {}

/// Check that a raw buffer of `len_bytes` holds whole samples.
pub fn validate_gain_buffer(len_bytes: usize) -> Result<(), PreconditionViolation> {
    if len_bytes % SAMPLE_STRIDE == 0 {
        Ok(())
    } else {
        Err(PreconditionViolation {
            len: len_bytes,
            stride: SAMPLE_STRIDE,
        })
    }
}

/// Multiply every sample in `buffer` by `gain`, in place.
///
/// `gain` is expected to be non-negative: above 1 amplifies, below 1
/// attenuates, 0 silences.
#[inline]
pub fn apply_gain(buffer: &mut [f32], gain: f32) {
    debug_assert!(gain >= 0.0, "negative gain {gain}");
    for sample in buffer.iter_mut() {
        *sample *= gain;
    }
}

/// [`apply_gain`] over an interleaved buffer with `channels` samples per frame.
#[inline]
pub fn apply_gain_interleaved(buffer: &mut [f32], channels: usize, gain: f32) {
    debug_assert!(
        channels > 0 && buffer.len() % channels == 0,
        "interleaved buffer of {} samples is not whole {}-channel frames",
        buffer.len(),
        channels
    );
    apply_gain(buffer, gain);
}

/// [`apply_gain`] over raw little-endian `f32` sample bytes.
///
/// `buffer.len()` must be a multiple of [`SAMPLE_STRIDE`].
#[inline]
pub fn apply_gain_raw(buffer: &mut [u8], gain: f32) {
    debug_assert!(
        validate_gain_buffer(buffer.len()).is_ok(),
        "raw buffer of {} bytes is not whole samples",
        buffer.len()
    );
    debug_assert!(gain >= 0.0, "negative gain {gain}");
    for chunk in buffer.chunks_exact_mut(SAMPLE_STRIDE) {
        let mut word = [0u8; SAMPLE_STRIDE];
        word.copy_from_slice(chunk);
        let scaled = f32::from_le_bytes(word) * gain;
        chunk.copy_from_slice(&scaled.to_le_bytes());
    }
}

/// Lock-free `f32` cell using bit-cast storage.
///
/// Update thread writes, audio thread reads. No locks, no allocations.
#[derive(Debug)]
pub struct AtomicGain {
    value: AtomicU32,
}

impl AtomicGain {
    /// Create a cell holding `gain`.
    pub fn new(gain: f32) -> Self {
        Self {
            value: AtomicU32::new(gain.to_bits()),
        }
    }

    /// Store a new gain (update thread).
    #[inline]
    pub fn set(&self, gain: f32) {
        self.value.store(gain.to_bits(), Ordering::Release);
    }

    /// Load the current gain (audio thread).
    #[inline]
    pub fn get(&self) -> f32 {
        f32::from_bits(self.value.load(Ordering::Acquire))
    }
}

impl Default for AtomicGain {
    fn default() -> Self {
        Self::new(1.0)
    }
}
