//! Linkwitz-Riley 4th-order crossover filter.
//!
//! # Topology
//!
//! Two cascaded Topology-Preserving Transform (TPT) state-variable sections
//! after Zavalishin, "The Art of VA Filter Design" (2012), each tuned to a
//! Butterworth damping of `R2 = √2`. Cascading two Butterworth sections gives
//! the LR4 (-24 dB/oct) alignment.
//!
//! # Crossover Property
//!
//! [`LinkwitzRileyFilter::process_sample_split`] returns the low and high bands
//! from one pass through the ladder. The high band is formed as
//! `allpass - low`, so `low + high` is the first section's all-pass output:
//! flat magnitude at every frequency, for any cutoff and sample rate.
//!
//! # Coefficients
//!
//! `g`, `R2` and `h` are shared across channels and recomputed eagerly in
//! every setter and in `prepare`; only `s1..s4` are per channel.

use core::f64::consts::PI;

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

use crate::{ProcessContext, ProcessSpec, Processor, Sample, snap_to_zero};

/// Highest cutoff as a fraction of the sample rate.
const MAX_CUTOFF_RATIO: f64 = 0.49;

/// Lowest usable cutoff in Hz.
const MIN_CUTOFF_HZ: f64 = 1.0e-3;

/// Which output [`LinkwitzRileyFilter::process_sample`] returns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LinkwitzRileyType {
    /// 4th-order low-pass band.
    #[default]
    Lowpass,
    /// 4th-order high-pass band.
    Highpass,
    /// 2nd-order all-pass: the sum of both bands.
    Allpass,
}

#[derive(Debug, Clone, Copy, Default)]
struct ChannelState<T> {
    s1: T,
    s2: T,
    s3: T,
    s4: T,
}

/// Multi-channel LR4 crossover section.
///
/// # Example
///
/// ```rust
/// use ballast_core::{LinkwitzRileyFilter, ProcessSpec, Processor};
///
/// let mut xover = LinkwitzRileyFilter::<f32>::new();
/// xover.set_cutoff_frequency(800.0);
/// xover.prepare(&ProcessSpec::new(48000.0, 256, 2));
///
/// let (low, high) = xover.process_sample_split(0, 0.5);
/// assert!(low.is_finite() && high.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct LinkwitzRileyFilter<T> {
    state: Vec<ChannelState<T>>,
    g: T,
    r2: T,
    h: T,
    sample_rate: f64,
    cutoff: T,
    filter_type: LinkwitzRileyType,
}

impl<T: Sample> Default for LinkwitzRileyFilter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Sample> LinkwitzRileyFilter<T> {
    /// Create a low-pass section at 2 kHz.
    ///
    /// Holds state for two channels until [`prepare`](Processor::prepare).
    pub fn new() -> Self {
        let mut filter = Self {
            state: vec![ChannelState::default(); 2],
            g: T::ZERO,
            r2: T::from_f64(core::f64::consts::SQRT_2),
            h: T::ZERO,
            sample_rate: 44100.0,
            cutoff: T::from_f64(2000.0),
            filter_type: LinkwitzRileyType::Lowpass,
        };
        filter.update_coefficients();
        filter
    }

    /// Select the output returned by [`process_sample`](Self::process_sample).
    pub fn set_type(&mut self, filter_type: LinkwitzRileyType) {
        self.filter_type = filter_type;
    }

    /// Current output type.
    pub fn filter_type(&self) -> LinkwitzRileyType {
        self.filter_type
    }

    /// Set the crossover frequency in Hz.
    ///
    /// Must be positive. May be set before [`prepare`](Processor::prepare);
    /// the effective cutoff is clamped to `0.49 ×` the prepared sample rate.
    pub fn set_cutoff_frequency(&mut self, freq: T) {
        debug_assert!(freq > T::ZERO, "cutoff must be positive");
        self.cutoff = freq;
        self.update_coefficients();
    }

    /// Requested cutoff in Hz.
    pub fn cutoff_frequency(&self) -> T {
        self.cutoff
    }

    /// Process one sample and return the band selected by the filter type.
    #[inline]
    pub fn process_sample(&mut self, channel: usize, input: T) -> T {
        let (g, r2, h) = (self.g, self.r2, self.h);
        let st = &mut self.state[channel];

        let y_h = (input - (r2 + g) * st.s1 - st.s2) * h;
        let y_b = g * y_h + st.s1;
        st.s1 = g * y_h + y_b;
        let y_l = g * y_b + st.s2;
        st.s2 = g * y_b + y_l;

        if self.filter_type == LinkwitzRileyType::Allpass {
            return y_l - r2 * y_b + y_h;
        }

        let forward = if self.filter_type == LinkwitzRileyType::Highpass {
            y_h
        } else {
            y_l
        };

        let y_h2 = (forward - (r2 + g) * st.s3 - st.s4) * h;
        let y_b2 = g * y_h2 + st.s3;
        st.s3 = g * y_h2 + y_b2;
        let y_l2 = g * y_b2 + st.s4;
        st.s4 = g * y_b2 + y_l2;

        if self.filter_type == LinkwitzRileyType::Highpass {
            y_h2
        } else {
            y_l2
        }
    }

    /// Process one sample and return `(low, high)` together.
    ///
    /// `low + high` equals the 2nd-order all-pass of the input.
    #[inline]
    pub fn process_sample_split(&mut self, channel: usize, input: T) -> (T, T) {
        let (g, r2, h) = (self.g, self.r2, self.h);
        let st = &mut self.state[channel];

        let y_h = (input - (r2 + g) * st.s1 - st.s2) * h;
        let y_b = g * y_h + st.s1;
        st.s1 = g * y_h + y_b;
        let y_l = g * y_b + st.s2;
        st.s2 = g * y_b + y_l;

        let y_h2 = (y_l - (r2 + g) * st.s3 - st.s4) * h;
        let y_b2 = g * y_h2 + st.s3;
        st.s3 = g * y_h2 + y_b2;
        let y_l2 = g * y_b2 + st.s4;
        st.s4 = g * y_b2 + y_l2;

        let allpass = y_l - r2 * y_b + y_h;
        (y_l2, allpass - y_l2)
    }

    /// Flush subnormal state to zero.
    pub fn snap_to_zero(&mut self) {
        for st in &mut self.state {
            snap_to_zero(&mut st.s1);
            snap_to_zero(&mut st.s2);
            snap_to_zero(&mut st.s3);
            snap_to_zero(&mut st.s4);
        }
    }

    fn update_coefficients(&mut self) {
        let fc = self
            .cutoff
            .to_f64()
            .clamp(MIN_CUTOFF_HZ, self.sample_rate * MAX_CUTOFF_RATIO);
        let g = libm::tan(PI * fc / self.sample_rate);
        let r2 = core::f64::consts::SQRT_2;
        self.g = T::from_f64(g);
        self.h = T::from_f64(1.0 / (1.0 + r2 * g + g * g));

        #[cfg(feature = "tracing")]
        tracing::debug!(cutoff = fc, g, "linkwitz_riley_coefficients");
    }
}

impl<T: Sample> Processor<T> for LinkwitzRileyFilter<T> {
    fn prepare(&mut self, spec: &ProcessSpec) {
        debug_assert!(spec.sample_rate > 0.0);
        debug_assert!(spec.num_channels > 0);

        self.sample_rate = spec.sample_rate;
        self.update_coefficients();
        self.state.clear();
        self.state
            .resize(spec.num_channels as usize, ChannelState::default());
    }

    fn process(&mut self, context: &mut ProcessContext<'_, '_, T>) {
        debug_assert!(context.num_channels() <= self.state.len());

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
        self.state.fill(ChannelState::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 48000.0;

    fn sine(freq: f64, n: usize) -> impl Iterator<Item = f64> {
        (0..n).map(move |i| libm::sin(2.0 * PI * freq * i as f64 / SR))
    }

    fn rms(x: &[f64]) -> f64 {
        libm::sqrt(x.iter().map(|v| v * v).sum::<f64>() / x.len() as f64)
    }

    fn filter(kind: LinkwitzRileyType, cutoff: f64) -> LinkwitzRileyFilter<f64> {
        let mut f = LinkwitzRileyFilter::new();
        f.prepare(&ProcessSpec::new(SR, 512, 1));
        f.set_cutoff_frequency(cutoff);
        f.set_type(kind);
        f
    }

    fn gain_db(f: &mut LinkwitzRileyFilter<f64>, freq: f64) -> f64 {
        let out: Vec<f64> = sine(freq, 9600).map(|x| f.process_sample(0, x)).collect();
        20.0 * libm::log10(rms(&out[4800..]) / libm::sqrt(0.5))
    }

    #[test]
    fn lowpass_is_minus_six_db_at_cutoff() {
        let mut f = filter(LinkwitzRileyType::Lowpass, 1000.0);
        let db = gain_db(&mut f, 1000.0);
        assert!((db + 6.02).abs() < 0.3, "LR4 low band at fc: {db:.2} dB");
    }

    #[test]
    fn highpass_is_minus_six_db_at_cutoff() {
        let mut f = filter(LinkwitzRileyType::Highpass, 1000.0);
        let db = gain_db(&mut f, 1000.0);
        assert!((db + 6.02).abs() < 0.3, "LR4 high band at fc: {db:.2} dB");
    }

    #[test]
    fn slopes_are_24_db_per_octave() {
        let mut lp = filter(LinkwitzRileyType::Lowpass, 500.0);
        let stop = gain_db(&mut lp, 4000.0);
        assert!(stop < -60.0, "three octaves up should be far down, got {stop:.1} dB");

        let mut hp = filter(LinkwitzRileyType::Highpass, 4000.0);
        let stop = gain_db(&mut hp, 500.0);
        assert!(stop < -60.0, "three octaves down should be far down, got {stop:.1} dB");
    }

    #[test]
    fn allpass_is_flat() {
        for &freq in &[50.0, 500.0, 2000.0, 12000.0] {
            let mut f = filter(LinkwitzRileyType::Allpass, 1500.0);
            let db = gain_db(&mut f, freq);
            assert!(db.abs() < 0.05, "allpass at {freq} Hz: {db:.3} dB");
        }
    }

    #[test]
    fn split_sum_matches_allpass_exactly() {
        let mut split = filter(LinkwitzRileyType::Lowpass, 700.0);
        let mut ap = filter(LinkwitzRileyType::Allpass, 700.0);
        for x in sine(333.0, 2000) {
            let (low, high) = split.process_sample_split(0, x);
            let reference = ap.process_sample(0, x);
            assert!((low + high - reference).abs() < 1e-12);
        }
    }

    #[test]
    fn split_low_matches_lowpass() {
        let mut split = filter(LinkwitzRileyType::Lowpass, 700.0);
        let mut lp = filter(LinkwitzRileyType::Lowpass, 700.0);
        for x in sine(1234.0, 1000) {
            let (low, _) = split.process_sample_split(0, x);
            assert!((low - lp.process_sample(0, x)).abs() < 1e-12);
        }
    }

    #[test]
    fn cutoff_above_nyquist_is_clamped_after_rate_change() {
        let mut f = LinkwitzRileyFilter::<f32>::new();
        f.set_cutoff_frequency(20000.0);
        f.prepare(&ProcessSpec::new(22050.0, 64, 1));
        for i in 0..1000 {
            let x = if i % 2 == 0 { 1.0 } else { -1.0 };
            assert!(f.process_sample(0, x).is_finite());
        }
        assert_eq!(f.cutoff_frequency(), 20000.0);
    }

    #[test]
    fn cutoff_set_before_prepare_uses_prepared_rate() {
        let mut early = LinkwitzRileyFilter::<f64>::new();
        early.set_type(LinkwitzRileyType::Highpass);
        early.set_cutoff_frequency(30000.0);
        early.prepare(&ProcessSpec::new(96000.0, 256, 1));

        let mut late = LinkwitzRileyFilter::<f64>::new();
        late.set_type(LinkwitzRileyType::Highpass);
        late.prepare(&ProcessSpec::new(96000.0, 256, 1));
        late.set_cutoff_frequency(30000.0);

        for x in sine(5000.0, 256) {
            assert_eq!(early.process_sample(0, x), late.process_sample(0, x));
        }
    }

    #[test]
    fn reset_clears_state() {
        let mut f = filter(LinkwitzRileyType::Lowpass, 1000.0);
        f.process_sample(0, 1.0);
        Processor::reset(&mut f);
        assert_eq!(f.process_sample(0, 0.0), 0.0);
    }
}
