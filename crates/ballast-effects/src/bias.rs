//! Smoothed DC offset stage.
//!
//! Adds one ramped offset per sample to every channel. Useful ahead of
//! asymmetric waveshapers and as the simplest example of the stage contract.

use ballast_core::{ProcessContext, ProcessSpec, Processor, Sample, SmoothedValue};

/// Smoothed additive offset.
///
/// # Example
///
/// ```rust
/// use ballast_core::{AudioBuffer, ProcessContext, ProcessSpec, Processor};
/// use ballast_effects::Bias;
///
/// let mut bias = Bias::<f64>::new();
/// bias.set_bias(0.25);
/// bias.prepare(&ProcessSpec::new(48000.0, 8, 1));
///
/// let mut buffer = AudioBuffer::new(1, 8);
/// bias.process(&mut ProcessContext::replacing(buffer.as_block()));
/// assert_eq!(buffer.channel(0), &[0.25; 8]);
/// ```
#[derive(Debug, Clone)]
pub struct Bias<T> {
    bias: SmoothedValue<T>,
    sample_rate: f64,
    ramp_seconds: f64,
}

impl<T: Sample> Default for Bias<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Sample> Bias<T> {
    /// Create a zero-offset stage with no ramp.
    pub fn new() -> Self {
        Self {
            bias: SmoothedValue::new(T::ZERO),
            sample_rate: 44100.0,
            ramp_seconds: 0.0,
        }
    }

    /// Set the offset added to every sample.
    pub fn set_bias(&mut self, bias: T) {
        self.bias.set_target_value(bias);
    }

    /// Target offset.
    pub fn bias(&self) -> T {
        self.bias.target_value()
    }

    /// Set how long offset changes take to ramp in.
    ///
    /// Negative durations are treated as zero; repeating the current duration
    /// leaves a ramp in progress untouched.
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

    /// True while an offset change is still ramping.
    pub fn is_smoothing(&self) -> bool {
        self.bias.is_smoothing()
    }

    /// Offset one sample, advancing the ramp.
    #[inline]
    pub fn process_sample(&mut self, input: T) -> T {
        input + self.bias.next_value()
    }
}

impl<T: Sample> Processor<T> for Bias<T> {
    fn prepare(&mut self, spec: &ProcessSpec) {
        debug_assert!(spec.sample_rate > 0.0);
        self.sample_rate = spec.sample_rate;
        self.reset();
    }

    fn process(&mut self, context: &mut ProcessContext<'_, '_, T>) {
        let num_samples = context.num_samples();

        if context.is_bypassed {
            self.bias.skip(num_samples);
            context.copy_input_to_output();
            return;
        }

        if !self.bias.is_smoothing() {
            let b = self.bias.target_value();
            for ch in 0..context.num_channels() {
                context.map_channel(ch, |x| x + b);
            }
            return;
        }

        for i in 0..num_samples {
            let b = self.bias.next_value();
            context.map_frame(i, |x| x + b);
        }
    }

    fn reset(&mut self) {
        self.bias.reset(self.sample_rate, self.ramp_seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballast_core::AudioBuffer;

    #[test]
    fn ramped_offset() {
        let mut bias = Bias::<f32>::new();
        bias.set_ramp_duration_seconds(0.002);
        bias.prepare(&ProcessSpec::new(1000.0, 4, 2));
        bias.set_bias(1.0);

        let mut buffer = AudioBuffer::new(2, 4);
        bias.process(&mut ProcessContext::replacing(buffer.as_block()));
        assert_eq!(buffer.channel(0), &[0.5, 1.0, 1.0, 1.0]);
        assert_eq!(buffer.channel(1), &[0.5, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn bypass_skips_ramp() {
        let mut bias = Bias::<f32>::new();
        bias.set_ramp_duration_seconds(0.004);
        bias.prepare(&ProcessSpec::new(1000.0, 2, 1));
        bias.set_bias(1.0);

        let mut buffer = AudioBuffer::new(1, 2);
        bias.process(&mut ProcessContext::replacing(buffer.as_block()).bypassed(true));
        assert_eq!(buffer.channel(0), &[0.0, 0.0]);
        assert!(bias.is_smoothing());

        bias.process(&mut ProcessContext::replacing(buffer.as_block()));
        assert_eq!(buffer.channel(0), &[0.75, 1.0]);
        assert!(!bias.is_smoothing());
    }

    #[test]
    fn repeated_negative_duration_keeps_settings() {
        let mut bias = Bias::<f64>::new();
        bias.set_ramp_duration_seconds(-0.5);
        assert_eq!(bias.ramp_duration_seconds(), 0.0);
        bias.prepare(&ProcessSpec::new(1000.0, 2, 1));
        bias.set_bias(0.2);
        bias.set_ramp_duration_seconds(-0.5);
        assert_eq!(bias.bias(), 0.2);

        let mut buffer = AudioBuffer::new(1, 2);
        bias.process(&mut ProcessContext::replacing(buffer.as_block()));
        assert_eq!(buffer.channel(0), &[0.2, 0.2]);
    }

    #[test]
    fn repeated_duration_keeps_ramp() {
        let mut bias = Bias::<f32>::new();
        bias.set_ramp_duration_seconds(0.004);
        bias.prepare(&ProcessSpec::new(1000.0, 2, 1));
        bias.set_bias(1.0);

        let mut buffer = AudioBuffer::new(1, 2);
        bias.process(&mut ProcessContext::replacing(buffer.as_block()));
        bias.set_ramp_duration_seconds(0.004);
        assert!(bias.is_smoothing());

        let mut buffer = AudioBuffer::new(1, 2);
        bias.process(&mut ProcessContext::replacing(buffer.as_block()));
        assert_eq!(buffer.channel(0), &[0.75, 1.0]);
    }

    #[test]
    fn process_sample_matches_block() {
        let mut a = Bias::<f64>::new();
        let mut b = Bias::<f64>::new();
        for bias in [&mut a, &mut b] {
            bias.set_ramp_duration_seconds(0.01);
            bias.prepare(&ProcessSpec::new(1000.0, 16, 1));
            bias.set_bias(-0.5);
        }
        let mut buffer = AudioBuffer::from_fn(1, 16, |_, i| i as f64 * 0.01);
        let expected: Vec<f64> = buffer.channel(0).iter().map(|&x| a.process_sample(x)).collect();
        b.process(&mut ProcessContext::replacing(buffer.as_block()));
        assert_eq!(buffer.channel(0), expected.as_slice());
    }
}
