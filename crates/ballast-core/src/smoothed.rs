//! Sample-accurate parameter ramps.
//!
//! Audio parameters (gain, bias, mix) need smooth transitions to avoid audible
//! "zipper noise" when values change. [`SmoothedValue`] turns a discrete target
//! into a ramp that lands on the target exactly after a fixed number of
//! samples, not asymptotically.
//!
//! ## Ramp Shapes
//!
//! - [`Linear`]: constant increment per sample, good for gains and crossfades
//! - [`Multiplicative`]: constant ratio per sample, for frequencies and other
//!   strictly positive values perceived logarithmically
//!
//! ## Usage
//!
//! ```rust
//! use ballast_core::SmoothedValue;
//!
//! let mut gain = SmoothedValue::<f32>::new(0.0);
//! gain.reset(48000.0, 0.01); // 480-sample ramp
//! gain.set_target_value(1.0);
//!
//! // In the audio callback, exactly one call per sample
//! for _ in 0..480 {
//!     let _g = gain.next_value();
//! }
//! assert_eq!(gain.current_value(), 1.0);
//! assert!(!gain.is_smoothing());
//! ```

use core::marker::PhantomData;

use crate::Sample;

/// Ramp shape used by a [`SmoothedValue`].
pub trait RampShape {
    /// Per-sample step that reaches `target` from `current` in `steps` samples.
    fn step<T: Sample>(current: T, target: T, steps: u32) -> T;

    /// Value `n` steps into a ramp that began at `start`.
    fn advance_by<T: Sample>(start: T, step: T, n: u32) -> T;
}

/// Linear ramp: `start + step * n`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Linear;

impl RampShape for Linear {
    #[inline]
    fn step<T: Sample>(current: T, target: T, steps: u32) -> T {
        (target - current) / T::from_f64(f64::from(steps))
    }

    #[inline]
    fn advance_by<T: Sample>(start: T, step: T, n: u32) -> T {
        start + step * T::from_f64(f64::from(n))
    }
}

/// Multiplicative ramp: `start * step^n`.
///
/// Current and target must be non-zero and share a sign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Multiplicative;

impl RampShape for Multiplicative {
    #[inline]
    fn step<T: Sample>(current: T, target: T, steps: u32) -> T {
        debug_assert!(
            current != T::ZERO && target != T::ZERO && (current > T::ZERO) == (target > T::ZERO),
            "multiplicative ramps need non-zero values of equal sign"
        );
        ((target.abs().ln() - current.abs().ln()) / T::from_f64(f64::from(steps))).exp()
    }

    #[inline]
    fn advance_by<T: Sample>(start: T, step: T, n: u32) -> T {
        start * step.powf(T::from_f64(f64::from(n)))
    }
}

/// A value ramped toward its target over a fixed number of samples.
///
/// Call [`next_value`](Self::next_value) exactly once per processed sample, or
/// [`skip`](Self::skip) for samples that were not processed, so the ramp stays
/// aligned with the signal.
///
/// Intermediate values are computed from the ramp start rather than by
/// accumulating steps, and are clamped to the span between start and target,
/// so a ramp never passes its target at either precision.
#[derive(Debug, Clone)]
pub struct SmoothedValue<T, S = Linear> {
    current: T,
    start: T,
    target: T,
    step: T,
    countdown: u32,
    steps_to_target: u32,
    _shape: PhantomData<S>,
}

impl<T: Sample, S: RampShape> SmoothedValue<T, S> {
    /// Create a value resting at `initial` with ramping disabled.
    pub fn new(initial: T) -> Self {
        Self {
            current: initial,
            start: initial,
            target: initial,
            step: T::ZERO,
            countdown: 0,
            steps_to_target: 0,
            _shape: PhantomData,
        }
    }

    /// Set the ramp length to `round(ramp_seconds * sample_rate)` samples and
    /// snap the current value to the target.
    ///
    /// Negative or non-finite lengths disable ramping.
    pub fn reset(&mut self, sample_rate: f64, ramp_seconds: f64) {
        debug_assert!(sample_rate > 0.0 && ramp_seconds >= 0.0);
        let steps = libm::round(ramp_seconds * sample_rate);
        self.steps_to_target = if steps.is_finite() && steps > 0.0 {
            steps.min(f64::from(u32::MAX)) as u32
        } else {
            0
        };
        self.set_current_and_target_value(self.target);
    }

    /// Start ramping toward `value`.
    ///
    /// With a zero-length ramp the value is applied immediately. Setting the
    /// current target again does not restart the ramp.
    pub fn set_target_value(&mut self, value: T) {
        if value == self.target {
            return;
        }
        if self.steps_to_target == 0 {
            self.set_current_and_target_value(value);
            return;
        }
        self.start = self.current;
        self.target = value;
        self.countdown = self.steps_to_target;
        self.step = S::step(self.start, self.target, self.countdown);
    }

    /// Jump to `value` immediately, cancelling any ramp.
    pub fn set_current_and_target_value(&mut self, value: T) {
        self.current = value;
        self.start = value;
        self.target = value;
        self.countdown = 0;
        self.step = T::ZERO;
    }

    /// Advance one sample and return the new value.
    #[inline]
    pub fn next_value(&mut self) -> T {
        if self.countdown == 0 {
            return self.target;
        }
        self.countdown -= 1;
        if self.countdown == 0 {
            self.current = self.target;
        } else {
            self.current = self.position();
        }
        self.current
    }

    /// Advance `num_samples` without producing output; returns the new value.
    pub fn skip(&mut self, num_samples: usize) -> T {
        if num_samples >= self.countdown as usize {
            self.set_current_and_target_value(self.target);
            return self.target;
        }
        self.countdown -= num_samples as u32;
        self.current = self.position();
        self.current
    }

    /// Ramp value for the current countdown, kept between start and target.
    #[inline]
    fn position(&self) -> T {
        let elapsed = self.steps_to_target - self.countdown;
        let value = S::advance_by(self.start, self.step, elapsed);
        if self.start <= self.target {
            value.clamp(self.start, self.target)
        } else {
            value.clamp(self.target, self.start)
        }
    }

    /// Multiply `buffer` sample-wise by successive ramp values.
    pub fn apply_gain(&mut self, buffer: &mut [T]) {
        if self.is_smoothing() {
            for s in buffer.iter_mut() {
                *s *= self.next_value();
            }
        } else {
            let gain = self.target;
            for s in buffer.iter_mut() {
                *s *= gain;
            }
        }
    }

    /// Value most recently returned by [`next_value`](Self::next_value).
    #[inline]
    pub fn current_value(&self) -> T {
        self.current
    }

    /// Value the ramp is heading toward.
    #[inline]
    pub fn target_value(&self) -> T {
        self.target
    }

    /// True while a ramp is in progress.
    #[inline]
    pub fn is_smoothing(&self) -> bool {
        self.countdown > 0
    }

    /// Samples left until the target is reached.
    #[inline]
    pub fn remaining_samples(&self) -> u32 {
        self.countdown
    }

    /// Configured ramp length in samples.
    #[inline]
    pub fn ramp_length_samples(&self) -> u32 {
        self.steps_to_target
    }
}

impl<T: Sample> Default for SmoothedValue<T, Linear> {
    fn default() -> Self {
        Self::new(T::ZERO)
    }
}

impl<T: Sample> Default for SmoothedValue<T, Multiplicative> {
    fn default() -> Self {
        Self::new(T::ONE)
    }
}
