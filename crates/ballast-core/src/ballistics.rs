//! Attack/release envelope follower ("ballistics").
//!
//! Used for dynamics processing (compressors, gates, ducking) and level
//! metering. Each channel runs an asymmetric one-pole recursion: the attack
//! coefficient applies while the level rises, the release coefficient while it
//! falls.
//!
//! ```text
//! level = |x|            (peak)     or  x²  (RMS)
//! cte   = level > y[n-1] ? attack : release
//! y[n]  = level + cte * (y[n-1] - level)
//! out   = y[n]           (peak)     or  √y[n] (RMS)
//! ```
//!
//! Coefficients are `exp(-1000 / (sample_rate * time_ms))`, so the configured
//! time is the time constant: a step from 0 to 1 reaches 63.2 % after exactly
//! `time_ms`. Times under 1 µs give a coefficient of 0 (instant response).

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

use crate::{ProcessContext, ProcessSpec, Processor, Sample, snap_to_zero};

/// Times shorter than this (in ms) collapse to an instantaneous response.
const MIN_TIME_MS: f64 = 1.0e-3;

/// Level detection used by [`BallisticsFilter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LevelCalculation {
    /// Rectified level, `|x|`.
    #[default]
    Peak,
    /// Mean square `x²`, square-rooted on output.
    Rms,
}

/// Multi-channel attack/release envelope follower.
///
/// # Example
///
/// ```rust
/// use ballast_core::{BallisticsFilter, LevelCalculation, ProcessSpec, Processor};
///
/// let mut env = BallisticsFilter::<f32>::new();
/// env.set_attack_time(10.0);
/// env.set_release_time(100.0);
/// env.set_level_calculation(LevelCalculation::Rms);
/// env.prepare(&ProcessSpec::new(48000.0, 512, 2));
///
/// let level = env.process_sample(0, 0.5);
/// assert!(level > 0.0 && level < 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct BallisticsFilter<T> {
    y_old: Vec<T>,
    sample_rate: f64,
    exp_factor: f64,
    attack_ms: T,
    release_ms: T,
    attack_cte: T,
    release_cte: T,
    level: LevelCalculation,
}

impl<T: Sample> Default for BallisticsFilter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Sample> BallisticsFilter<T> {
    /// Create a peak follower with 1 ms attack and 100 ms release.
    ///
    /// Holds state for two channels until [`prepare`](Processor::prepare).
    pub fn new() -> Self {
        let mut filter = Self {
            y_old: vec![T::ZERO; 2],
            sample_rate: 44100.0,
            exp_factor: -1000.0 / 44100.0,
            attack_ms: T::ONE,
            release_ms: T::from_f64(100.0),
            attack_cte: T::ZERO,
            release_cte: T::ZERO,
            level: LevelCalculation::Peak,
        };
        filter.recalculate_coefficients();
        filter
    }

    /// Set the attack time in milliseconds. Negative values act as 0.
    ///
    /// - Fast (< 5ms): Catch all transients
    /// - Slow (> 20ms): Smooth, lets transients through
    pub fn set_attack_time(&mut self, attack_ms: T) {
        debug_assert!(attack_ms >= T::ZERO, "attack time must be non-negative");
        self.attack_ms = attack_ms.max(T::ZERO);
        self.attack_cte = self.limited_cte(self.attack_ms);
    }

    /// Attack time in milliseconds.
    pub fn attack_time(&self) -> T {
        self.attack_ms
    }

    /// Set the release time in milliseconds. Negative values act as 0.
    pub fn set_release_time(&mut self, release_ms: T) {
        debug_assert!(release_ms >= T::ZERO, "release time must be non-negative");
        self.release_ms = release_ms.max(T::ZERO);
        self.release_cte = self.limited_cte(self.release_ms);
    }

    /// Release time in milliseconds.
    pub fn release_time(&self) -> T {
        self.release_ms
    }

    /// Select peak or RMS detection.
    pub fn set_level_calculation(&mut self, level: LevelCalculation) {
        self.level = level;
        self.reset();
    }

    /// Current detection mode.
    pub fn level_calculation(&self) -> LevelCalculation {
        self.level
    }

    /// Seed every channel's envelope with `initial`.
    ///
    /// Use the expected signal level to avoid a ramp-up transient when starting
    /// mid-signal. In RMS mode the seed is a mean-square value.
    pub fn reset_to(&mut self, initial: T) {
        self.y_old.fill(initial);
    }

    /// Envelope state of `channel` (mean square in RMS mode).
    #[inline]
    pub fn state(&self, channel: usize) -> T {
        self.y_old[channel]
    }

    /// Process one sample of `channel` and return the envelope.
    #[inline]
    pub fn process_sample(&mut self, channel: usize, input: T) -> T {
        let level = match self.level {
            LevelCalculation::Peak => input.abs(),
            LevelCalculation::Rms => input * input,
        };
        let y_old = &mut self.y_old[channel];
        let cte = if level > *y_old {
            self.attack_cte
        } else {
            self.release_cte
        };
        let result = level + cte * (*y_old - level);
        *y_old = result;

        match self.level {
            LevelCalculation::Peak => result,
            LevelCalculation::Rms => result.sqrt(),
        }
    }

    /// Flush subnormal envelope state to zero.
    pub fn snap_to_zero(&mut self) {
        for y in &mut self.y_old {
            snap_to_zero(y);
        }
    }

    fn limited_cte(&self, time_ms: T) -> T {
        let time_ms = time_ms.to_f64();
        if time_ms < MIN_TIME_MS {
            T::ZERO
        } else {
            T::from_f64(libm::exp(self.exp_factor / time_ms))
        }
    }

    fn recalculate_coefficients(&mut self) {
        self.exp_factor = -1000.0 / self.sample_rate;
        self.attack_cte = self.limited_cte(self.attack_ms);
        self.release_cte = self.limited_cte(self.release_ms);
    }
}

impl<T: Sample> Processor<T> for BallisticsFilter<T> {
    fn prepare(&mut self, spec: &ProcessSpec) {
        debug_assert!(spec.sample_rate > 0.0);
        debug_assert!(spec.num_channels > 0);

        self.sample_rate = spec.sample_rate;
        self.y_old.clear();
        self.y_old.resize(spec.num_channels as usize, T::ZERO);
        self.recalculate_coefficients();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            sample_rate = spec.sample_rate,
            channels = spec.num_channels,
            attack_cte = self.attack_cte.to_f64(),
            release_cte = self.release_cte.to_f64(),
            "ballistics_prepare"
        );
    }

    fn process(&mut self, context: &mut ProcessContext<'_, '_, T>) {
        debug_assert!(context.num_channels() <= self.y_old.len());

        if context.is_bypassed {
            context.copy_input_to_output();
            return;
        }

        for ch in 0..context.num_channels() {
            context.map_channel(ch, |x| self.process_sample(ch, x));
        }

        self.snap_to_zero();
    }

    fn reset(&mut self) {
        self.reset_to(T::ZERO);
    }
}
