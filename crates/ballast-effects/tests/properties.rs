//! Property-based tests for ballast-effects stages.
//!
//! Checks gain-law bounds, compressor gain limits and dry/wet sample
//! accounting across arbitrary sub-block splits.

use ballast_core::{AudioBuffer, ProcessContext, ProcessSpec, Processor};
use ballast_effects::{Compressor, DryWetMixer, Gain, MixingRule};
use proptest::prelude::*;

fn any_rule() -> impl Strategy<Value = MixingRule> {
    prop::sample::select(MixingRule::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every rule keeps both gains in [0, 1] and moves them in opposite
    /// directions as the mix increases.
    #[test]
    fn mixing_rule_gains_are_bounded_and_monotonic(
        rule in any_rule(),
        a in 0.0f64..=1.0,
        b in 0.0f64..=1.0,
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let (dry_lo, wet_lo) = rule.gains(lo);
        let (dry_hi, wet_hi) = rule.gains(hi);
        for g in [dry_lo, wet_lo, dry_hi, wet_hi] {
            prop_assert!((0.0..=1.0 + 1e-12).contains(&g), "{:?} gain {} out of range", rule, g);
        }
        prop_assert!(dry_hi <= dry_lo + 1e-12);
        prop_assert!(wet_hi >= wet_lo - 1e-12);
    }

    /// Splitting the dry push and the wet mix into arbitrary sub-blocks gives
    /// the same output as processing whole blocks.
    #[test]
    fn mixer_output_is_independent_of_sub_block_split(
        rule in any_rule(),
        mix in 0.0f32..=1.0,
        latency in 0usize..64,
        cuts in prop::collection::vec(1usize..64, 1..16),
    ) {
        let spec = ProcessSpec::new(44100.0, 128, 2);
        let make = || {
            let mut m = DryWetMixer::<f32>::new(64);
            m.set_mixing_rule(rule);
            m.set_wet_mix_proportion(mix);
            m.prepare(&spec);
            m.set_wet_latency(latency as f32);
            m
        };
        let mut whole = make();
        let mut split = make();

        let dry = AudioBuffer::from_fn(2, 128, |ch, i| libm::sinf((i * (ch + 3)) as f32 * 0.1));
        let wet = AudioBuffer::from_fn(2, 128, |ch, i| libm::cosf((i * (ch + 5)) as f32 * 0.07));

        let mut expected = wet.clone();
        whole.push_dry_samples(dry.as_const_block());
        whole.mix_wet_samples(expected.as_block());

        let mut actual = wet.clone();
        let mut start = 0;
        let mut cuts = cuts.into_iter();
        while start < 128 {
            let len = cuts.next().unwrap_or(128).min(128 - start);
            split.push_dry_samples(dry.as_const_block().sub_block(start, len));
            split.mix_wet_samples(actual.as_block().sub_block(start, len));
            start += len;
        }

        for ch in 0..2 {
            for i in 0..128 {
                prop_assert!((expected.channel(ch)[i] - actual.channel(ch)[i]).abs() < 1e-6);
            }
        }
    }

    /// Compression never raises the level or flips polarity.
    #[test]
    fn compressor_gain_is_bounded(
        threshold in -60.0f64..0.0,
        ratio in 1.0f64..50.0,
        input in prop::collection::vec(-1.0f64..=1.0, 1..512),
    ) {
        let mut comp = Compressor::<f64>::new();
        comp.set_threshold(threshold);
        comp.set_ratio(ratio);
        comp.prepare(&ProcessSpec::new(48000.0, 512, 1));

        for &x in &input {
            let y = comp.process_sample(0, x);
            prop_assert!(y.abs() <= x.abs() + 1e-12);
            prop_assert!(y * x >= 0.0);
            let gr = comp.gain_reduction_db();
            prop_assert!(gr <= 1e-9 && gr.is_finite());
        }
    }

    /// A gain ramp shared across channels scales every channel identically.
    #[test]
    fn gain_is_channel_symmetric(
        target_db in -60.0f32..12.0,
        ramp_ms in 0.0f64..20.0,
        channels in 1usize..8,
    ) {
        let mut gain = Gain::<f32>::new();
        gain.set_ramp_duration_seconds(ramp_ms / 1000.0);
        gain.prepare(&ProcessSpec::new(48000.0, 256, channels as u32));
        gain.set_gain_decibels(target_db);

        let mut buffer = AudioBuffer::from_fn(channels, 256, |_, _| 1.0);
        gain.process(&mut ProcessContext::replacing(buffer.as_block()));
        for ch in 1..channels {
            prop_assert_eq!(buffer.channel(ch), buffer.channel(0));
        }
    }
}
