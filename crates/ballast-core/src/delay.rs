//! Multi-channel delay line with fractional delay.
//!
//! Used for latency compensation: a dry path delayed by the latency of a
//! parallel wet path stays time-aligned with it.
//!
//! # Memory
//!
//! Each channel's circular buffer is allocated in
//! [`prepare`](Processor::prepare) and never reallocated while processing.

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

use crate::{ProcessContext, ProcessSpec, Processor, Sample};

/// Circular-buffer delay line, one buffer per channel.
///
/// Fractional delays are read with linear interpolation. A delay of zero
/// passes samples through unchanged.
///
/// # Example
///
/// ```rust
/// use ballast_core::{DelayLine, ProcessSpec, Processor};
///
/// let mut delay = DelayLine::<f32>::new(64);
/// delay.prepare(&ProcessSpec::new(48000.0, 128, 1));
/// delay.set_delay(2.0);
///
/// let out: Vec<f32> = [1.0, 0.0, 0.0, 0.0]
///     .iter()
///     .map(|&x| delay.process_sample(0, x))
///     .collect();
/// assert_eq!(out, [0.0, 0.0, 1.0, 0.0]);
/// ```
#[derive(Debug, Clone)]
pub struct DelayLine<T> {
    buffers: Vec<Vec<T>>,
    write_pos: Vec<usize>,
    max_delay: usize,
    delay: T,
    delay_int: usize,
    delay_frac: T,
}

impl<T: Sample> DelayLine<T> {
    /// Create a delay line holding up to `max_delay_samples` of delay.
    pub fn new(max_delay_samples: usize) -> Self {
        let mut line = Self {
            buffers: Vec::new(),
            write_pos: Vec::new(),
            max_delay: max_delay_samples,
            delay: T::ZERO,
            delay_int: 0,
            delay_frac: T::ZERO,
        };
        line.set_delay(T::ZERO);
        line
    }

    /// Maximum delay in samples.
    pub fn maximum_delay(&self) -> usize {
        self.max_delay
    }

    /// Set the delay in samples, clamped to `0..=maximum_delay`.
    pub fn set_delay(&mut self, delay_samples: T) {
        debug_assert!(
            delay_samples >= T::ZERO && delay_samples.to_f64() <= self.max_delay as f64,
            "delay out of range"
        );
        let clamped = delay_samples.to_f64().clamp(0.0, self.max_delay as f64);
        let whole = libm::floor(clamped);
        self.delay = T::from_f64(clamped);
        self.delay_int = whole as usize;
        self.delay_frac = T::from_f64(clamped - whole);
    }

    /// Current delay in samples.
    pub fn delay(&self) -> T {
        self.delay
    }

    /// Write `input` to `channel` and return the sample from `delay` samples ago.
    #[inline]
    pub fn process_sample(&mut self, channel: usize, input: T) -> T {
        let buffer = &mut self.buffers[channel];
        let len = buffer.len();
        let pos = self.write_pos[channel];
        buffer[pos] = input;

        let read = (pos + len - self.delay_int) % len;
        let a = buffer[read];
        let out = if self.delay_frac == T::ZERO {
            a
        } else {
            let b = buffer[(read + len - 1) % len];
            a + (b - a) * self.delay_frac
        };

        self.write_pos[channel] = (pos + 1) % len;
        out
    }
}

impl<T: Sample> Processor<T> for DelayLine<T> {
    fn prepare(&mut self, spec: &ProcessSpec) {
        debug_assert!(spec.num_channels > 0);
        // one slot for the current sample, one for interpolation
        let len = self.max_delay + 2;
        self.buffers = vec![vec![T::ZERO; len]; spec.num_channels as usize];
        self.write_pos = vec![0; spec.num_channels as usize];
    }

    fn process(&mut self, context: &mut ProcessContext<'_, '_, T>) {
        debug_assert!(context.num_channels() <= self.buffers.len());

        if context.is_bypassed {
            context.copy_input_to_output();
            return;
        }

        for ch in 0..context.num_channels() {
            context.map_channel(ch, |x| self.process_sample(ch, x));
        }
    }

    fn reset(&mut self) {
        for buffer in &mut self.buffers {
            buffer.fill(T::ZERO);
        }
        self.write_pos.fill(0);
    }

    fn latency_samples(&self) -> usize {
        self.delay_int
    }
}
