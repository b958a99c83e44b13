//! Latency-compensated dry/wet mixer.
//!
//! Blends an unprocessed (dry) signal with a processed (wet) one. The dry
//! signal is delayed by the wet path's latency so both stay time-aligned, and
//! both gains ramp over 50 ms when the mix changes.
//!
//! # Ordering
//!
//! ```text
//! push_dry_samples(input) → wet processing in place → mix_wet_samples(output)
//! ```
//!
//! Dry samples are buffered in a FIFO sized to the next power of two of the
//! maximum block size, so pushes and mixes may use different sub-block sizes as
//! long as every mixed sample was pushed first. Never pushing leaves only the
//! wet signal; pushing twice per block drifts the dry signal out of alignment.
//!
//! # Mixing Rules
//!
//! | Rule | Dry gain | Wet gain | Centre (mix 0.5) |
//! |------|----------|----------|------------------|
//! | `Linear` | `1 - m` | `m` | -6 dB each |
//! | `Balanced` | `2·min(0.5, 1 - m)` | `2·min(0.5, m)` | 0 dB each |
//! | `Sin3dB` | `sin(π/2·(1 - m))` | `sin(π/2·m)` | -3 dB |
//! | `Sin4p5dB` | `sin(…)^1.5` | `sin(…)^1.5` | -4.5 dB |
//! | `Sin6dB` | `sin(…)^2` | `sin(…)^2` | -6 dB |
//! | `SquareRoot3dB` | `√(1 - m)` | `√m` | -3 dB |
//! | `SquareRoot4p5dB` | `√(1 - m)^1.5` | `√m^1.5` | -4.5 dB |
//!
//! Every rule gives exactly zero gain to the deselected path at `m = 0` and
//! `m = 1`.

use core::f64::consts::FRAC_PI_2;

use ballast_core::{
    AudioBlock, AudioBuffer, ConstAudioBlock, DelayLine, ProcessSpec, Processor, Sample,
    SingleThreadedFifo, SmoothedValue, next_power_of_two,
};

/// Gain ramp length for mix changes.
const MIX_RAMP_SECONDS: f64 = 0.05;

/// Gain law used to map the wet proportion to dry and wet gains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MixingRule {
    /// Straight crossfade; -6 dB at centre.
    #[default]
    Linear,
    /// Each side at full level until the centre, then fades.
    Balanced,
    /// Constant-power sine law.
    Sin3dB,
    /// Sine law raised to 1.5.
    Sin4p5dB,
    /// Sine law squared.
    Sin6dB,
    /// Constant-power square-root law.
    SquareRoot3dB,
    /// Square-root law raised to 1.5.
    SquareRoot4p5dB,
}

impl MixingRule {
    /// All rules, in declaration order.
    pub const ALL: [MixingRule; 7] = [
        MixingRule::Linear,
        MixingRule::Balanced,
        MixingRule::Sin3dB,
        MixingRule::Sin4p5dB,
        MixingRule::Sin6dB,
        MixingRule::SquareRoot3dB,
        MixingRule::SquareRoot4p5dB,
    ];

    /// `(dry, wet)` gains for wet proportion `mix` in `[0, 1]`.
    pub fn gains(self, mix: f64) -> (f64, f64) {
        let dry = 1.0 - mix;
        match self {
            MixingRule::Linear => (dry, mix),
            MixingRule::Balanced => (2.0 * dry.min(0.5), 2.0 * mix.min(0.5)),
            MixingRule::Sin3dB => (libm::sin(FRAC_PI_2 * dry), libm::sin(FRAC_PI_2 * mix)),
            MixingRule::Sin4p5dB => (
                libm::pow(libm::sin(FRAC_PI_2 * dry), 1.5),
                libm::pow(libm::sin(FRAC_PI_2 * mix), 1.5),
            ),
            MixingRule::Sin6dB => (
                libm::pow(libm::sin(FRAC_PI_2 * dry), 2.0),
                libm::pow(libm::sin(FRAC_PI_2 * mix), 2.0),
            ),
            MixingRule::SquareRoot3dB => (libm::sqrt(dry), libm::sqrt(mix)),
            MixingRule::SquareRoot4p5dB => (
                libm::pow(libm::sqrt(dry), 1.5),
                libm::pow(libm::sqrt(mix), 1.5),
            ),
        }
    }
}

/// Dry/wet mixer with dry-path latency compensation.
///
/// # Example
///
/// ```rust
/// use ballast_core::{AudioBuffer, ProcessSpec};
/// use ballast_effects::{DryWetMixer, MixingRule};
///
/// let mut mixer = DryWetMixer::<f32>::new(0);
/// mixer.set_mixing_rule(MixingRule::Linear);
/// mixer.set_wet_mix_proportion(0.5);
/// mixer.prepare(&ProcessSpec::new(48000.0, 64, 1));
///
/// let mut buffer = AudioBuffer::from_fn(1, 64, |_, _| 1.0);
/// mixer.push_dry_samples(buffer.as_const_block());
/// buffer.as_block().fill(0.0); // wet path: silence
/// mixer.mix_wet_samples(buffer.as_block());
/// assert!((buffer.channel(0)[10] - 0.5).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct DryWetMixer<T> {
    dry_volume: SmoothedValue<T>,
    wet_volume: SmoothedValue<T>,
    dry_delay: DelayLine<T>,
    buffer_dry: AudioBuffer<T>,
    fifo: SingleThreadedFifo,
    mix: T,
    rule: MixingRule,
    sample_rate: f64,
    maximum_wet_latency: usize,
}

impl<T: Sample> Default for DryWetMixer<T> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<T: Sample> DryWetMixer<T> {
    /// Create a mixer able to compensate up to `maximum_wet_latency_in_samples`.
    ///
    /// Defaults to the linear rule, fully wet.
    pub fn new(maximum_wet_latency_in_samples: usize) -> Self {
        let mut mixer = Self {
            dry_volume: SmoothedValue::new(T::ZERO),
            wet_volume: SmoothedValue::new(T::ONE),
            dry_delay: DelayLine::new(maximum_wet_latency_in_samples),
            buffer_dry: AudioBuffer::new(0, 0),
            fifo: SingleThreadedFifo::new(0),
            mix: T::ONE,
            rule: MixingRule::Linear,
            sample_rate: 44100.0,
            maximum_wet_latency: maximum_wet_latency_in_samples,
        };
        mixer.update();
        mixer.reset();
        mixer
    }

    /// Select the gain law.
    pub fn set_mixing_rule(&mut self, rule: MixingRule) {
        self.rule = rule;
        self.update();
    }

    /// Current gain law.
    pub fn mixing_rule(&self) -> MixingRule {
        self.rule
    }

    /// Set the wet proportion in `[0, 1]`; values outside are clamped.
    pub fn set_wet_mix_proportion(&mut self, mix: T) {
        debug_assert!(mix >= T::ZERO && mix <= T::ONE, "mix must lie in [0, 1]");
        self.mix = mix.clamp(T::ZERO, T::ONE);
        self.update();
    }

    /// Current wet proportion.
    pub fn wet_mix_proportion(&self) -> T {
        self.mix
    }

    /// Delay the dry path by `latency_samples` to match the wet path.
    ///
    /// Fractional values are interpolated. Limited to the maximum given at
    /// construction.
    pub fn set_wet_latency(&mut self, latency_samples: T) {
        self.dry_delay.set_delay(latency_samples);
    }

    /// Current dry-path delay in samples.
    pub fn wet_latency(&self) -> T {
        self.dry_delay.delay()
    }

    /// Largest supported wet latency in samples.
    pub fn maximum_wet_latency(&self) -> usize {
        self.maximum_wet_latency
    }

    /// Size internal buffers for `spec`. May allocate.
    pub fn prepare(&mut self, spec: &ProcessSpec) {
        debug_assert!(spec.sample_rate > 0.0);
        debug_assert!(spec.num_channels > 0);

        self.sample_rate = spec.sample_rate;
        self.dry_delay.prepare(spec);

        let fifo_size = next_power_of_two(spec.maximum_block_size as usize);
        self.buffer_dry.set_size(spec.num_channels as usize, fifo_size);
        self.fifo = SingleThreadedFifo::new(fifo_size);

        self.update();
        self.reset();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            fifo_size,
            channels = spec.num_channels,
            max_latency = self.maximum_wet_latency,
            "dry_wet_prepare"
        );
    }

    /// Snap gains to their targets and clear buffered dry samples.
    pub fn reset(&mut self) {
        self.dry_volume.reset(self.sample_rate, MIX_RAMP_SECONDS);
        self.wet_volume.reset(self.sample_rate, MIX_RAMP_SECONDS);
        Processor::<T>::reset(&mut self.dry_delay);
        self.fifo.clear();
        self.buffer_dry.clear();
    }

    /// Store dry samples (delayed by the wet latency) for the next mix.
    ///
    /// Call before the wet path processes the same samples.
    pub fn push_dry_samples(&mut self, dry: ConstAudioBlock<'_, T>) {
        debug_assert!(dry.num_channels() <= self.buffer_dry.num_channels());
        debug_assert!(dry.num_samples() <= self.fifo.remaining_space());

        let num_channels = dry.num_channels().min(self.buffer_dry.num_channels());
        let mut offset = 0;

        for range in self.fifo.write(dry.num_samples()) {
            if range.is_empty() {
                continue;
            }
            let len = range.len();
            for ch in 0..num_channels {
                let src = &dry.channel(ch)[offset..offset + len];
                let dst = &mut self.buffer_dry.channel_mut(ch)[range.clone()];
                if self.maximum_wet_latency == 0 {
                    dst.copy_from_slice(src);
                } else {
                    for (d, &s) in dst.iter_mut().zip(src) {
                        *d = self.dry_delay.process_sample(ch, s);
                    }
                }
            }
            offset += len;
        }
    }

    /// Scale `wet` by the wet gain and add the buffered dry samples.
    ///
    /// Call exactly once per pushed block, after wet processing.
    pub fn mix_wet_samples(&mut self, mut wet: AudioBlock<'_, T>) {
        debug_assert!(wet.num_samples() <= self.fifo.num_readable());

        let num_samples = wet.num_samples();
        let num_channels = wet.num_channels().min(self.buffer_dry.num_channels());

        for i in 0..num_samples {
            let g = self.wet_volume.next_value();
            for ch in 0..wet.num_channels() {
                wet.channel_mut(ch)[i] *= g;
            }
        }

        let mut offset = 0;
        for range in self.fifo.read(num_samples) {
            if range.is_empty() {
                continue;
            }
            for (k, src_index) in range.clone().enumerate() {
                let g = self.dry_volume.next_value();
                for ch in 0..num_channels {
                    wet.channel_mut(ch)[offset + k] += self.buffer_dry.channel(ch)[src_index] * g;
                }
            }
            offset += range.len();
        }
    }

    fn update(&mut self) {
        let (dry, wet) = self.rule.gains(self.mix.to_f64());
        self.dry_volume.set_target_value(T::from_f64(dry));
        self.wet_volume.set_target_value(T::from_f64(wet));
    }
}
