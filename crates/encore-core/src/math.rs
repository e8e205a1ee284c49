//! Small numeric helpers shared by the gain path and the transition scheduler.

use core::time::Duration;
use libm::{log10f, powf};

/// Linear interpolation from `a` to `b` by `t`.
///
/// Written as `a + (b - a) * t`; callers that need the exact endpoint at
/// `t == 1` must special-case it (the scheduler does).
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Elapsed fraction of a transition, clamped to `[0, 1]`.
///
/// A zero duration is treated as already complete.
#[inline]
pub fn unit_progress(elapsed: Duration, duration: Duration) -> f32 {
    if duration.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f64() / duration.as_secs_f64()).clamp(0.0, 1.0) as f32
}

/// Convert decibels to linear gain.
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    powf(10.0, db / 20.0)
}

/// Convert linear gain to decibels. Silence maps to -100 dB.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 1e-5 {
        -100.0
    } else {
        20.0 * log10f(linear)
    }
}
