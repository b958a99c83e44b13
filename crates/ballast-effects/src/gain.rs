//! Smoothed gain stage.
//!
//! Multiplies every channel by one ramped gain value per sample. Setting a new
//! gain ramps linearly over [`Gain::ramp_duration_seconds`]; a zero ramp
//! applies it at the next sample.
//!
//! # Parameters
//!
//! | Parameter | Range | Description |
//! |-----------|-------|-------------|
//! | Gain | linear ≥ 0, or dB | Output scale (default unity) |
//! | Ramp | ≥ 0 s | Transition time for gain changes (default 0) |

use ballast_core::{
    MINUS_INFINITY_DB, ProcessContext, ProcessSpec, Processor, Sample, SmoothedValue,
    decibels_to_gain, gain_to_decibels,
};

/// Smoothed multiplicative gain.
///
/// # Example
///
/// ```rust
/// use ballast_core::{AudioBuffer, ProcessContext, ProcessSpec, Processor};
/// use ballast_effects::Gain;
///
/// let mut gain = Gain::<f32>::new();
/// gain.set_gain_decibels(-6.0);
/// gain.set_ramp_duration_seconds(0.0);
/// gain.prepare(&ProcessSpec::new(48000.0, 64, 2));
///
/// let mut buffer = AudioBuffer::from_fn(2, 64, |_, _| 1.0);
/// gain.process(&mut ProcessContext::replacing(buffer.as_block()));
/// assert!((buffer.channel(1)[63] - 0.501187).abs() < 1e-5);
/// ```
#[derive(Debug, Clone)]
pub struct Gain<T> {
    gain: SmoothedValue<T>,
    sample_rate: f64,
    ramp_seconds: f64,
}

impl<T: Sample> Default for Gain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Sample> Gain<T> {
    /// Create a unity gain stage with no ramp.
    pub fn new() -> Self {
        Self {
            gain: SmoothedValue::new(T::ONE),
            sample_rate: 44100.0,
            ramp_seconds: 0.0,
        }
    }

    /// Set the gain as a linear factor.
    pub fn set_gain_linear(&mut self, gain: T) {
        self.gain.set_target_value(gain);
    }

    /// Set the gain in decibels (-100 dB and below is silence).
    pub fn set_gain_decibels(&mut self, db: T) {
        self.set_gain_linear(decibels_to_gain(db, MINUS_INFINITY_DB));
    }

    /// Target gain as a linear factor.
    pub fn gain_linear(&self) -> T {
        self.gain.target_value()
    }

    /// Target gain in decibels.
    pub fn gain_decibels(&self) -> T {
        gain_to_decibels(self.gain_linear(), MINUS_INFINITY_DB)
    }

    /// Set how long gain changes take to ramp in.
    ///
    /// Changing the duration snaps any ramp in progress to its target.
    /// Negative durations are treated as zero.
    pub fn set_ramp_duration_seconds(&mut self, seconds: f64) {
        let seconds = seconds.max(0.0);
        if self.ramp_seconds != seconds {
            self.ramp_seconds = seconds;
            self.reset();
        }
    }

    /// Current ramp duration.
    pub fn ramp_duration_seconds(&self) -> f64 {
        self.ramp_seconds
    }

    /// True while a gain change is still ramping.
    pub fn is_smoothing(&self) -> bool {
        self.gain.is_smoothing()
    }

    /// Apply the gain to one sample.
    ///
    /// Advances the ramp; call once per sample frame, not once per channel.
    #[inline]
    pub fn process_sample(&mut self, input: T) -> T {
        input * self.gain.next_value()
    }
}

impl<T: Sample> Processor<T> for Gain<T> {
    fn prepare(&mut self, spec: &ProcessSpec) {
        debug_assert!(spec.sample_rate > 0.0);
        self.sample_rate = spec.sample_rate;
        self.reset();
    }

    fn process(&mut self, context: &mut ProcessContext<'_, '_, T>) {
        let num_samples = context.num_samples();

        if context.is_bypassed {
            self.gain.skip(num_samples);
            context.copy_input_to_output();
            return;
        }

        if !self.gain.is_smoothing() {
            let g = self.gain.target_value();
            for ch in 0..context.num_channels() {
                context.map_channel(ch, |x| x * g);
            }
            return;
        }

        for i in 0..num_samples {
            let g = self.gain.next_value();
            context.map_frame(i, |x| x * g);
        }
    }

    fn reset(&mut self) {
        self.gain.reset(self.sample_rate, self.ramp_seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballast_core::AudioBuffer;

    #[test]
    fn minus_six_db_on_constant_input() {
        for &sr in &[22050.0, 44100.0, 96000.0] {
            let mut gain = Gain::<f64>::new();
            gain.set_gain_decibels(-6.0);
            gain.set_ramp_duration_seconds(0.0);
            gain.prepare(&ProcessSpec::new(sr, 128, 1));

            let mut buffer = AudioBuffer::from_fn(1, 128, |_, _| 1.0);
            gain.process(&mut ProcessContext::replacing(buffer.as_block()));
            let expected = libm::pow(10.0, -6.0 / 20.0);
            assert!(buffer.channel(0).iter().all(|&s| (s - expected).abs() < 1e-12));
        }
    }

    #[test]
    fn ramp_is_shared_across_channels() {
        let mut gain = Gain::<f32>::new();
        gain.set_ramp_duration_seconds(0.004);
        gain.prepare(&ProcessSpec::new(1000.0, 4, 2));
        gain.set_gain_linear(0.0);

        let mut buffer = AudioBuffer::from_fn(2, 4, |_, _| 1.0);
        gain.process(&mut ProcessContext::replacing(buffer.as_block()));
        assert_eq!(buffer.channel(0), &[0.75, 0.5, 0.25, 0.0]);
        assert_eq!(buffer.channel(1), &[0.75, 0.5, 0.25, 0.0]);
        assert!(!gain.is_smoothing());
    }

    #[test]
    fn bypass_keeps_ramp_in_sync() {
        let mut gain = Gain::<f32>::new();
        gain.set_ramp_duration_seconds(0.008);
        gain.prepare(&ProcessSpec::new(1000.0, 4, 1));
        gain.set_gain_linear(0.0);

        let input = AudioBuffer::from_fn(1, 4, |_, _| 1.0_f32);
        let mut output = AudioBuffer::new(1, 4);
        gain.process(
            &mut ProcessContext::non_replacing(input.as_const_block(), output.as_block())
                .bypassed(true),
        );
        assert_eq!(output.channel(0), &[1.0; 4]);

        let mut buffer = AudioBuffer::from_fn(1, 4, |_, _| 1.0);
        gain.process(&mut ProcessContext::replacing(buffer.as_block()));
        assert_eq!(buffer.channel(0), &[0.375, 0.25, 0.125, 0.0]);
    }

    #[test]
    fn non_replacing_leaves_input_intact() {
        let mut gain = Gain::<f32>::new();
        gain.set_gain_linear(2.0);
        gain.prepare(&ProcessSpec::new(48000.0, 3, 1));
        let input = AudioBuffer::from_fn(1, 3, |_, i| i as f32);
        let mut output = AudioBuffer::new(1, 3);
        gain.process(&mut ProcessContext::non_replacing(
            input.as_const_block(),
            output.as_block(),
        ));
        assert_eq!(output.channel(0), &[0.0, 2.0, 4.0]);
        assert_eq!(input.channel(0), &[0.0, 1.0, 2.0]);
    }

    #[test]
    fn unchanged_ramp_duration_keeps_ramp() {
        let mut gain = Gain::<f32>::new();
        gain.set_ramp_duration_seconds(0.004);
        gain.prepare(&ProcessSpec::new(1000.0, 1, 1));
        gain.set_gain_linear(0.0);

        let mut buffer = AudioBuffer::from_fn(1, 1, |_, _| 1.0);
        gain.process(&mut ProcessContext::replacing(buffer.as_block()));
        assert_eq!(buffer.channel(0), &[0.75]);

        gain.set_ramp_duration_seconds(0.004);
        assert!(gain.is_smoothing());
        let mut buffer = AudioBuffer::from_fn(1, 1, |_, _| 1.0);
        gain.process(&mut ProcessContext::replacing(buffer.as_block()));
        assert_eq!(buffer.channel(0), &[0.5]);
    }

    #[test]
    fn negative_ramp_duration_is_zero() {
        let mut gain = Gain::<f32>::new();
        gain.set_ramp_duration_seconds(-1.0);
        assert_eq!(gain.ramp_duration_seconds(), 0.0);
        gain.prepare(&ProcessSpec::new(1000.0, 2, 1));
        gain.set_ramp_duration_seconds(-1.0);
        gain.set_gain_linear(0.5);
        assert!(!gain.is_smoothing());
        assert_eq!(gain.gain_linear(), 0.5);
    }

    #[test]
    fn decibel_accessors() {
        let mut gain = Gain::<f32>::new();
        assert!(gain.gain_decibels().abs() < 1e-6);
        gain.set_gain_decibels(-12.0);
        assert!((gain.gain_decibels() + 12.0).abs() < 1e-4);
        gain.set_gain_decibels(-150.0);
        assert_eq!(gain.gain_linear(), 0.0);
    }
}
