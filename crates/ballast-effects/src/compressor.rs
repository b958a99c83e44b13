//! Feed-forward dynamics compressor.
//!
//! Reduces the level of signals whose envelope rises above a threshold.
//!
//! # Signal Flow
//!
//! ```text
//! Input → BallisticsFilter (peak) → Gain Computer → × Input → Output
//! ```
//!
//! The gain computer works on the linear envelope:
//! `gain = (env / threshold)^(1/ratio - 1)` above threshold, 1 below. In dB this
//! is `(env_dB - threshold_dB) · (1/ratio - 1)` of gain reduction.
//!
//! # Parameters
//!
//! | Parameter | Range | Description |
//! |-----------|-------|-------------|
//! | Threshold | > -200 dB | Level where compression begins (default -10 dB) |
//! | Ratio | ≥ 1 | Compression strength; 1 is unity gain (default 1) |
//! | Attack | ≥ 0 ms | How fast gain reduction engages (default 1 ms) |
//! | Release | ≥ 0 ms | How fast gain reduction releases (default 100 ms) |
//!
//! # Bypass
//!
//! A bypassed block leaves the envelope frozen: no detection runs, so after
//! re-enabling, gain reduction resumes from the pre-bypass envelope.

use ballast_core::{
    BallisticsFilter, LevelCalculation, ProcessContext, ProcessSpec, Processor, Sample,
    decibels_to_gain, gain_to_decibels,
};

/// Threshold floor in dB.
const THRESHOLD_FLOOR_DB: f64 = -200.0;

/// Dynamics compressor.
///
/// # Example
///
/// ```rust
/// use ballast_core::{ProcessSpec, Processor};
/// use ballast_effects::Compressor;
///
/// let mut comp = Compressor::<f32>::new();
/// comp.set_threshold(-20.0);
/// comp.set_ratio(4.0);
/// comp.set_attack(5.0);
/// comp.set_release(50.0);
/// comp.prepare(&ProcessSpec::new(44100.0, 512, 2));
///
/// let output = comp.process_sample(0, 0.5);
/// assert!(output <= 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct Compressor<T> {
    envelope: BallisticsFilter<T>,
    threshold_db: T,
    threshold: T,
    threshold_inverse: T,
    ratio: T,
    ratio_inverse: T,
    attack_ms: T,
    release_ms: T,
    last_gain: T,
}

impl<T: Sample> Default for Compressor<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Sample> Compressor<T> {
    /// Create a compressor with threshold -10 dB, ratio 1, attack 1 ms and
    /// release 100 ms.
    pub fn new() -> Self {
        let mut envelope = BallisticsFilter::new();
        envelope.set_level_calculation(LevelCalculation::Peak);
        let mut comp = Self {
            envelope,
            threshold_db: T::from_f64(-10.0),
            threshold: T::ONE,
            threshold_inverse: T::ONE,
            ratio: T::ONE,
            ratio_inverse: T::ONE,
            attack_ms: T::ONE,
            release_ms: T::from_f64(100.0),
            last_gain: T::ONE,
        };
        comp.update();
        comp
    }

    /// Set the threshold in dB.
    pub fn set_threshold(&mut self, threshold_db: T) {
        self.threshold_db = threshold_db;
        self.update();
    }

    /// Threshold in dB.
    pub fn threshold(&self) -> T {
        self.threshold_db
    }

    /// Set the compression ratio (≥ 1; smaller values are clamped to 1).
    pub fn set_ratio(&mut self, ratio: T) {
        debug_assert!(ratio >= T::ONE, "ratio must be at least 1");
        self.ratio = ratio.max(T::ONE);
        self.update();
    }

    /// Compression ratio.
    pub fn ratio(&self) -> T {
        self.ratio
    }

    /// Set the attack time in milliseconds.
    pub fn set_attack(&mut self, attack_ms: T) {
        self.attack_ms = attack_ms;
        self.update();
    }

    /// Attack time in milliseconds.
    pub fn attack(&self) -> T {
        self.attack_ms
    }

    /// Set the release time in milliseconds.
    pub fn set_release(&mut self, release_ms: T) {
        self.release_ms = release_ms;
        self.update();
    }

    /// Release time in milliseconds.
    pub fn release(&self) -> T {
        self.release_ms
    }

    /// Gain reduction applied to the most recent sample, in dB (≤ 0).
    pub fn gain_reduction_db(&self) -> T {
        gain_to_decibels(self.last_gain, THRESHOLD_FLOOR_DB)
    }

    /// Envelope state of `channel`.
    pub fn envelope(&self, channel: usize) -> T {
        self.envelope.state(channel)
    }

    /// Compress one sample of `channel`.
    #[inline]
    pub fn process_sample(&mut self, channel: usize, input: T) -> T {
        let env = self.envelope.process_sample(channel, input);
        let gain = if env < self.threshold {
            T::ONE
        } else {
            (env * self.threshold_inverse).powf(self.ratio_inverse - T::ONE)
        };
        self.last_gain = gain;
        gain * input
    }

    fn update(&mut self) {
        let floor = T::from_f64(THRESHOLD_FLOOR_DB + 1.0);
        self.threshold = decibels_to_gain(self.threshold_db.max(floor), THRESHOLD_FLOOR_DB);
        self.threshold_inverse = T::ONE / self.threshold;
        self.ratio_inverse = T::ONE / self.ratio;

        self.envelope.set_attack_time(self.attack_ms);
        self.envelope.set_release_time(self.release_ms);
    }
}

impl<T: Sample> Processor<T> for Compressor<T> {
    fn prepare(&mut self, spec: &ProcessSpec) {
        debug_assert!(spec.sample_rate > 0.0);
        debug_assert!(spec.num_channels > 0);

        self.envelope.prepare(spec);
        self.update();
        self.reset();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            threshold_db = self.threshold_db.to_f64(),
            ratio = self.ratio.to_f64(),
            "compressor_prepare"
        );
    }

    fn process(&mut self, context: &mut ProcessContext<'_, '_, T>) {
        if context.is_bypassed {
            context.copy_input_to_output();
            return;
        }

        for ch in 0..context.num_channels() {
            context.map_channel(ch, |x| self.process_sample(ch, x));
        }

        self.envelope.snap_to_zero();
    }

    fn reset(&mut self) {
        self.envelope.reset();
        self.last_gain = T::ONE;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballast_core::AudioBuffer;

    fn prepared() -> Compressor<f64> {
        let mut comp = Compressor::new();
        comp.prepare(&ProcessSpec::new(48000.0, 512, 1));
        comp
    }

    #[test]
    fn ratio_one_is_identity() {
        let mut comp = prepared();
        comp.set_threshold(-60.0);
        comp.set_ratio(1.0);
        for i in 0..2000 {
            let x = libm::sin(i as f64 * 0.05) * 0.9;
            assert_eq!(comp.process_sample(0, x), x);
        }
    }

    #[test]
    fn steady_state_gain_reduction_matches_ratio() {
        let mut comp = prepared();
        comp.set_threshold(-20.0);
        comp.set_ratio(4.0);
        comp.set_attack(0.0);

        // constant 0 dBFS: 20 dB over, 4:1 leaves 5 dB over → 15 dB reduction
        let mut out = 0.0;
        for _ in 0..100 {
            out = comp.process_sample(0, 1.0);
        }
        assert!((gain_to_decibels(out, -200.0) + 15.0).abs() < 1e-9);
        assert!((comp.gain_reduction_db() + 15.0).abs() < 1e-9);
    }

    #[test]
    fn below_threshold_is_untouched() {
        let mut comp = prepared();
        comp.set_threshold(-6.0);
        comp.set_ratio(10.0);
        for _ in 0..1000 {
            assert_eq!(comp.process_sample(0, 0.25), 0.25);
        }
        assert_eq!(comp.gain_reduction_db(), 0.0);
    }

    #[test]
    fn bypass_freezes_envelope() {
        let mut comp = Compressor::<f32>::new();
        comp.set_threshold(-20.0);
        comp.set_ratio(4.0);
        comp.prepare(&ProcessSpec::new(48000.0, 256, 1));

        let mut loud = AudioBuffer::from_fn(1, 256, |_, _| 1.0_f32);
        comp.process(&mut ProcessContext::replacing(loud.as_block()));
        let before = comp.envelope(0);
        assert!(before > 0.9);

        let mut silence = AudioBuffer::new(1, 256);
        for _ in 0..20 {
            comp.process(&mut ProcessContext::replacing(silence.as_block()).bypassed(true));
        }
        assert_eq!(comp.envelope(0), before);

        // re-enabled: the first sample still sees the pre-bypass envelope
        let out = comp.process_sample(0, 0.1);
        assert!(out < 0.1);
    }

    #[test]
    fn silence_snaps_envelope_to_zero() {
        let mut comp = Compressor::<f32>::new();
        comp.set_release(1.0);
        comp.prepare(&ProcessSpec::new(48000.0, 512, 1));

        let mut loud = AudioBuffer::from_fn(1, 512, |_, _| 1.0_f32);
        comp.process(&mut ProcessContext::replacing(loud.as_block()));
        let mut silence = AudioBuffer::new(1, 512);
        for _ in 0..10 {
            silence.clear();
            comp.process(&mut ProcessContext::replacing(silence.as_block()));
        }
        assert_eq!(comp.envelope(0), 0.0);
    }
}
