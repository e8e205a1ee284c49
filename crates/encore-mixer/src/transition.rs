//! Time-bounded parameter transitions.
//!
//! The [`TransitionScheduler`] turns a requested change (a volume fade, a
//! reverb sliding in or out) into a linear ramp that is re-applied once per
//! frame, so the change is heard as a smooth move rather than a click.
//!
//! # Tick Model
//!
//! The scheduler is not self-scheduling. The playback driver calls
//! [`advance`](TransitionScheduler::advance) once per update frame with the
//! elapsed time; every active job then computes
//! `t = clamp(elapsed / duration, 0, 1)` and pushes the interpolated value
//! through a [`TransitionSink`]. At `t = 1` the exact end value is applied
//! and the job is removed.
//!
//! # Replacement
//!
//! Each target carries at most one job. Starting a job on a busy target
//! cancels the old one and ramps from the value the target currently holds,
//! so a fade reversed halfway never snaps back to its original start.
//!
//! # Failure
//!
//! If applying a value fails, the job is abandoned and the failure is
//! reported in the [`AdvanceReport`]. The target keeps whatever was last
//! applied successfully.

use std::time::Duration;

use encore_core::{EffectParams, TransitionTimings, lerp, unit_progress};

use crate::backend::ChannelId;
use crate::binder::BindingId;
use crate::{Error, Result};

/// What a transition drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionTarget {
    /// A channel's gain.
    ChannelGain(ChannelId),
    /// The parameters of an effect binding.
    Effect(BindingId),
}

/// Direction of a reverb slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideDirection {
    /// Reverb becoming audible.
    In,
    /// Reverb fading away.
    Out,
}

impl SlideDirection {
    /// Configured duration for this direction.
    pub fn duration(self, timings: &TransitionTimings) -> Duration {
        match self {
            SlideDirection::In => timings.reverb_slide_in,
            SlideDirection::Out => timings.reverb_slide_out,
        }
    }
}

/// Receives the values produced by the scheduler.
///
/// Implemented by the mixer over its channel table and effect binder.
pub trait TransitionSink {
    /// Apply a channel gain.
    fn set_gain(&mut self, channel: ChannelId, gain: f32) -> Result<()>;

    /// Apply effect parameters to a binding.
    fn rebind(&mut self, binding: BindingId, params: EffectParams) -> Result<()>;

    /// Release a binding whose slide-out has finished.
    fn release(&mut self, binding: BindingId);
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Value {
    Gain(f32),
    Params(EffectParams),
}

#[derive(Debug)]
struct TransitionJob {
    target: TransitionTarget,
    from: Value,
    to: Value,
    /// Last value pushed to the sink (or `from` before the first tick).
    current: Value,
    duration: Duration,
    elapsed: Duration,
    release_on_complete: bool,
}

impl TransitionJob {
    fn value_at(&self, t: f32) -> Value {
        if t >= 1.0 {
            return self.to;
        }
        match (self.from, self.to) {
            (Value::Gain(a), Value::Gain(b)) => Value::Gain(lerp(a, b, t)),
            (Value::Params(a), Value::Params(b)) => {
                // Endpoints are checked for matching effects when the job is created.
                Value::Params(EffectParams::lerp(&a, &b, t).unwrap_or(b))
            }
            _ => self.to,
        }
    }
}

/// A job that was abandoned because its value could not be applied.
#[derive(Debug)]
pub struct TransitionFailure {
    /// Target of the abandoned job.
    pub target: TransitionTarget,
    /// Why applying failed.
    pub error: Error,
}

/// Outcome of one [`TransitionScheduler::advance`] call.
#[derive(Debug, Default)]
pub struct AdvanceReport {
    /// Targets whose job reached its end value this tick.
    pub completed: Vec<TransitionTarget>,
    /// Jobs abandoned this tick.
    pub failed: Vec<TransitionFailure>,
}

impl AdvanceReport {
    /// Whether every job applied cleanly.
    pub fn is_ok(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Drives gain fades and effect slides.
#[derive(Debug, Default)]
pub struct TransitionScheduler {
    jobs: Vec<TransitionJob>,
    timings: TransitionTimings,
}

impl TransitionScheduler {
    /// Create a scheduler with the default durations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scheduler with custom default durations.
    pub fn with_timings(timings: TransitionTimings) -> Self {
        Self {
            jobs: Vec::new(),
            timings,
        }
    }

    /// Default durations.
    pub fn timings(&self) -> &TransitionTimings {
        &self.timings
    }

    /// Replace the default durations. Running jobs keep theirs.
    pub fn set_timings(&mut self, timings: TransitionTimings) {
        self.timings = timings;
    }

    /// Fade a channel's gain from `from` to `to` over `duration`.
    ///
    /// If the channel is already fading, the new fade starts from the gain
    /// most recently applied by that fade and `from` is ignored.
    pub fn begin_fade(&mut self, channel: ChannelId, from: f32, to: f32, duration: Duration) {
        let target = TransitionTarget::ChannelGain(channel);
        let start = match self.take(target) {
            Some(Value::Gain(current)) => current,
            _ => from,
        };
        tracing::debug!(channel = %channel, from = start, to, ?duration, "fade started");
        self.push(TransitionJob {
            target,
            from: Value::Gain(start),
            to: Value::Gain(to),
            current: Value::Gain(start),
            duration,
            elapsed: Duration::ZERO,
            release_on_complete: false,
        });
    }

    /// [`begin_fade`](Self::begin_fade) with the configured fade duration.
    pub fn fade(&mut self, channel: ChannelId, from: f32, to: f32) {
        let duration = self.timings.fade;
        self.begin_fade(channel, from, to, duration);
    }

    /// Slide an effect binding's parameters from `from` to `to`.
    ///
    /// If the binding is already sliding, the new slide starts from the
    /// parameters most recently applied by that slide. `from` and `to` must
    /// belong to the same effect.
    pub fn begin_reverb_slide(
        &mut self,
        binding: BindingId,
        from: EffectParams,
        to: EffectParams,
        duration: Duration,
        direction: SlideDirection,
    ) -> Result<()> {
        self.begin_slide(binding, from, to, duration, direction, false)
    }

    /// Slide out and release the binding once the end value has been applied.
    pub fn begin_reverb_slide_out_and_release(
        &mut self,
        binding: BindingId,
        from: EffectParams,
        to: EffectParams,
        duration: Duration,
    ) -> Result<()> {
        self.begin_slide(binding, from, to, duration, SlideDirection::Out, true)
    }

    fn begin_slide(
        &mut self,
        binding: BindingId,
        from: EffectParams,
        to: EffectParams,
        duration: Duration,
        direction: SlideDirection,
        release_on_complete: bool,
    ) -> Result<()> {
        if from.effect_type() != to.effect_type() {
            return Err(Error::TransitionMismatch {
                from: from.effect_type(),
                to: to.effect_type(),
            });
        }
        let target = TransitionTarget::Effect(binding);
        let start = match self.take(target) {
            Some(Value::Params(current)) if current.effect_type() == to.effect_type() => current,
            _ => from,
        };
        tracing::debug!(binding = %binding, ?direction, ?duration, "reverb slide started");
        self.push(TransitionJob {
            target,
            from: Value::Params(start),
            to: Value::Params(to),
            current: Value::Params(start),
            duration,
            elapsed: Duration::ZERO,
            release_on_complete,
        });
        Ok(())
    }

    /// Cancel the job on `target`. Returns `true` if one was running.
    ///
    /// The target keeps the last value applied to it.
    pub fn cancel(&mut self, target: TransitionTarget) -> bool {
        self.take(target).is_some()
    }

    /// Cancel every job touching `channel`'s gain or one of `bindings`.
    pub fn cancel_channel(&mut self, channel: ChannelId, bindings: &[BindingId]) {
        self.jobs.retain(|job| match job.target {
            TransitionTarget::ChannelGain(ch) => ch != channel,
            TransitionTarget::Effect(b) => !bindings.contains(&b),
        });
    }

    /// Whether `target` has a running job.
    pub fn is_active(&self, target: TransitionTarget) -> bool {
        self.jobs.iter().any(|job| job.target == target)
    }

    /// Gain most recently applied by a running fade on `channel`.
    pub fn current_gain(&self, channel: ChannelId) -> Option<f32> {
        self.jobs.iter().find_map(|job| match (job.target, job.current) {
            (TransitionTarget::ChannelGain(ch), Value::Gain(g)) if ch == channel => Some(g),
            _ => None,
        })
    }

    /// Number of running jobs.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether no jobs are running.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Advance every job by `delta` and apply the new values through `sink`.
    pub fn advance(&mut self, delta: Duration, sink: &mut dyn TransitionSink) -> AdvanceReport {
        let mut report = AdvanceReport::default();

        self.jobs.retain_mut(|job| {
            job.elapsed = job.elapsed.saturating_add(delta);
            let t = unit_progress(job.elapsed, job.duration);
            let value = job.value_at(t);

            let applied = match (job.target, value) {
                (TransitionTarget::ChannelGain(ch), Value::Gain(g)) => sink.set_gain(ch, g),
                (TransitionTarget::Effect(b), Value::Params(p)) => sink.rebind(b, p),
                (TransitionTarget::ChannelGain(ch), _) => Err(Error::UnknownChannel(ch)),
                (TransitionTarget::Effect(b), _) => Err(Error::UnknownBinding(b)),
            };

            if let Err(error) = applied {
                tracing::warn!(target = ?job.target, "transition abandoned: {error}");
                report.failed.push(TransitionFailure {
                    target: job.target,
                    error,
                });
                return false;
            }

            job.current = value;
            if t < 1.0 {
                return true;
            }

            if job.release_on_complete
                && let TransitionTarget::Effect(binding) = job.target
            {
                sink.release(binding);
            }
            tracing::debug!(target = ?job.target, "transition complete");
            report.completed.push(job.target);
            false
        });

        report
    }

    fn take(&mut self, target: TransitionTarget) -> Option<Value> {
        let index = self.jobs.iter().position(|job| job.target == target)?;
        let job = self.jobs.remove(index);
        tracing::debug!(target = ?target, "transition cancelled");
        Some(job.current)
    }

    fn push(&mut self, job: TransitionJob) {
        self.jobs.push(job);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encore_core::ReverbVariant;
    use std::collections::HashMap;

    /// Records every value the scheduler applies.
    #[derive(Default)]
    struct RecordingSink {
        gains: HashMap<ChannelId, Vec<f32>>,
        params: HashMap<BindingId, Vec<EffectParams>>,
        released: Vec<BindingId>,
        fail_rebinds: bool,
    }

    impl TransitionSink for RecordingSink {
        fn set_gain(&mut self, channel: ChannelId, gain: f32) -> Result<()> {
            self.gains.entry(channel).or_default().push(gain);
            Ok(())
        }

        fn rebind(&mut self, binding: BindingId, params: EffectParams) -> Result<()> {
            if self.fail_rebinds {
                return Err(Error::UnknownBinding(binding));
            }
            self.params.entry(binding).or_default().push(params);
            Ok(())
        }

        fn release(&mut self, binding: BindingId) {
            self.released.push(binding);
        }
    }

    const CH: ChannelId = ChannelId(1);
    const FX: BindingId = BindingId(1);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn fade_is_linear_at_quarter_steps() {
        let mut scheduler = TransitionScheduler::new();
        let mut sink = RecordingSink::default();
        scheduler.begin_fade(CH, 0.0, 1.0, ms(1000));

        scheduler.advance(ms(0), &mut sink);
        for _ in 0..4 {
            scheduler.advance(ms(250), &mut sink);
        }
        assert_eq!(sink.gains[&CH], vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert!(scheduler.is_empty());

        scheduler.advance(ms(250), &mut sink);
        assert_eq!(sink.gains[&CH].len(), 5);
    }

    #[test]
    fn overshooting_tick_lands_exactly_on_target() {
        let mut scheduler = TransitionScheduler::new();
        let mut sink = RecordingSink::default();
        scheduler.begin_fade(CH, 0.3, 0.9, ms(100));
        let report = scheduler.advance(ms(170), &mut sink);
        assert_eq!(report.completed, vec![TransitionTarget::ChannelGain(CH)]);
        assert_eq!(sink.gains[&CH], vec![0.9]);
    }

    #[test]
    fn zero_duration_completes_on_next_tick() {
        let mut scheduler = TransitionScheduler::new();
        let mut sink = RecordingSink::default();
        scheduler.begin_fade(CH, 1.0, 0.0, Duration::ZERO);
        scheduler.advance(ms(0), &mut sink);
        assert_eq!(sink.gains[&CH], vec![0.0]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn replacing_a_fade_starts_from_current_gain() {
        let mut scheduler = TransitionScheduler::new();
        let mut sink = RecordingSink::default();
        scheduler.begin_fade(CH, 0.0, 1.0, ms(1000));
        scheduler.advance(ms(400), &mut sink);
        assert_eq!(scheduler.current_gain(CH), Some(0.4));

        scheduler.begin_fade(CH, 0.0, 0.9, ms(1000));
        assert_eq!(scheduler.len(), 1);
        scheduler.advance(ms(0), &mut sink);
        assert_eq!(*sink.gains[&CH].last().unwrap(), 0.4);

        scheduler.advance(ms(500), &mut sink);
        let g = *sink.gains[&CH].last().unwrap();
        assert!((g - 0.65).abs() < 1e-6, "got {g}");
    }

    #[test]
    fn default_fade_uses_configured_duration() {
        let mut scheduler = TransitionScheduler::new();
        let mut sink = RecordingSink::default();
        scheduler.fade(CH, 0.0, 1.0);
        scheduler.advance(ms(500), &mut sink);
        assert_eq!(sink.gains[&CH], vec![0.5]);
    }

    #[test]
    fn slide_in_uses_default_duration_per_direction() {
        let timings = TransitionTimings::default();
        assert_eq!(SlideDirection::In.duration(&timings), ms(300));
        assert_eq!(SlideDirection::Out.duration(&timings), ms(500));
    }

    #[test]
    fn slide_reaches_exact_preset() {
        let mut scheduler = TransitionScheduler::new();
        let mut sink = RecordingSink::default();
        let from = ReverbVariant::Freeverb.silent();
        let to = ReverbVariant::Freeverb.preset();
        scheduler
            .begin_reverb_slide(FX, from, to, ms(300), SlideDirection::In)
            .unwrap();

        for _ in 0..4 {
            scheduler.advance(ms(100), &mut sink);
        }
        let applied = &sink.params[&FX];
        assert_eq!(applied.len(), 3);
        assert!((applied[0].reverb_wet().unwrap() - 0.5).abs() < 1e-5);
        assert_eq!(applied[2], to);
        assert!(sink.released.is_empty());
    }

    #[test]
    fn slide_out_and_release() {
        let mut scheduler = TransitionScheduler::new();
        let mut sink = RecordingSink::default();
        scheduler
            .begin_reverb_slide_out_and_release(
                FX,
                ReverbVariant::DxReverb.preset(),
                ReverbVariant::DxReverb.silent(),
                ms(500),
            )
            .unwrap();
        scheduler.advance(ms(250), &mut sink);
        assert!(sink.released.is_empty());
        scheduler.advance(ms(250), &mut sink);
        assert_eq!(sink.released, vec![FX]);
        assert_eq!(*sink.params[&FX].last().unwrap(), ReverbVariant::DxReverb.silent());
    }

    #[test]
    fn reversing_a_slide_starts_from_current_params() {
        let mut scheduler = TransitionScheduler::new();
        let mut sink = RecordingSink::default();
        let silent = ReverbVariant::Freeverb.silent();
        let wet = ReverbVariant::Freeverb.preset();
        scheduler
            .begin_reverb_slide(FX, silent, wet, ms(300), SlideDirection::In)
            .unwrap();
        scheduler.advance(ms(150), &mut sink);

        scheduler
            .begin_reverb_slide(FX, wet, silent, ms(500), SlideDirection::Out)
            .unwrap();
        scheduler.advance(ms(0), &mut sink);
        let restart = sink.params[&FX].last().unwrap().reverb_wet().unwrap();
        assert!((restart - 0.75).abs() < 1e-5, "got {restart}");
    }

    #[test]
    fn mismatched_slide_is_rejected() {
        let mut scheduler = TransitionScheduler::new();
        let err = scheduler
            .begin_reverb_slide(
                FX,
                ReverbVariant::Freeverb.silent(),
                ReverbVariant::DxReverb.preset(),
                ms(300),
                SlideDirection::In,
            )
            .unwrap_err();
        assert!(matches!(err, Error::TransitionMismatch { .. }));
        assert!(scheduler.is_empty());
    }

    #[test]
    fn failed_rebind_abandons_job() {
        let mut scheduler = TransitionScheduler::new();
        let mut sink = RecordingSink {
            fail_rebinds: true,
            ..Default::default()
        };
        scheduler
            .begin_reverb_slide(
                FX,
                ReverbVariant::Freeverb.silent(),
                ReverbVariant::Freeverb.preset(),
                ms(300),
                SlideDirection::In,
            )
            .unwrap();
        scheduler.begin_fade(CH, 0.0, 1.0, ms(300));

        let report = scheduler.advance(ms(100), &mut sink);
        assert!(!report.is_ok());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].target, TransitionTarget::Effect(FX));
        assert!(!scheduler.is_active(TransitionTarget::Effect(FX)));
        assert!(scheduler.is_active(TransitionTarget::ChannelGain(CH)));
    }

    #[test]
    fn cancel_keeps_last_value() {
        let mut scheduler = TransitionScheduler::new();
        let mut sink = RecordingSink::default();
        scheduler.begin_fade(CH, 1.0, 0.0, ms(1000));
        scheduler.advance(ms(500), &mut sink);
        assert!(scheduler.cancel(TransitionTarget::ChannelGain(CH)));
        assert!(!scheduler.cancel(TransitionTarget::ChannelGain(CH)));
        scheduler.advance(ms(500), &mut sink);
        assert_eq!(sink.gains[&CH], vec![0.5]);
    }
}
