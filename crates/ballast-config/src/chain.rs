//! Runtime chain built from a [`ChainConfig`].
//!
//! # Example
//!
//! ```rust
//! use ballast_config::{ChainConfig, GainConfig, MixConfig, StageConfig};
//! use ballast_core::AudioBuffer;
//!
//! let config = ChainConfig::new("Half")
//!     .with_spec(48000.0, 64, 2)
//!     .with_stage(StageConfig::Gain(GainConfig {
//!         gain_db: -200.0,
//!         ..Default::default()
//!     }))
//!     .with_mix(MixConfig {
//!         wet: 0.5,
//!         ..Default::default()
//!     });
//!
//! let mut chain = config.build::<f32>().unwrap();
//! let mut buffer = AudioBuffer::from_fn(2, 64, |_, _| 1.0);
//! chain.process(buffer.as_block());
//! assert!((buffer.channel(0)[63] - 0.5).abs() < 1e-6);
//! ```

use ballast_core::{
    AudioBlock, BallisticsFilter, LinkwitzRileyFilter, ProcessContext, ProcessSpec, Processor,
    Sample,
};
use ballast_effects::{Bias, Compressor, DryWetMixer, Gain};

use crate::config::{ChainConfig, MixConfig, StageConfig};

/// A stage instance, dispatched statically per variant.
#[derive(Debug, Clone)]
enum Stage<T> {
    Gain(Gain<T>),
    Bias(Bias<T>),
    Compressor(Compressor<T>),
    Ballistics(BallisticsFilter<T>),
    LinkwitzRiley(LinkwitzRileyFilter<T>),
}

impl<T: Sample> Stage<T> {
    /// Build and prepare a stage so it starts at its configured values.
    fn from_config(config: &StageConfig, spec: &ProcessSpec) -> Self {
        let mut stage = match *config {
            StageConfig::Gain(c) => {
                let mut gain = Gain::new();
                gain.set_ramp_duration_seconds(c.ramp_seconds);
                gain.set_gain_decibels(T::from_f64(c.gain_db));
                Stage::Gain(gain)
            }
            StageConfig::Bias(c) => {
                let mut bias = Bias::new();
                bias.set_ramp_duration_seconds(c.ramp_seconds);
                bias.set_bias(T::from_f64(c.bias));
                Stage::Bias(bias)
            }
            StageConfig::Compressor(c) => {
                let mut comp = Compressor::new();
                comp.set_threshold(T::from_f64(c.threshold_db));
                comp.set_ratio(T::from_f64(c.ratio));
                comp.set_attack(T::from_f64(c.attack_ms));
                comp.set_release(T::from_f64(c.release_ms));
                Stage::Compressor(comp)
            }
            StageConfig::Ballistics(c) => {
                let mut env = BallisticsFilter::new();
                env.set_attack_time(T::from_f64(c.attack_ms));
                env.set_release_time(T::from_f64(c.release_ms));
                env.set_level_calculation(c.level.into());
                Stage::Ballistics(env)
            }
            StageConfig::LinkwitzRiley(c) => {
                let mut filter = LinkwitzRileyFilter::new();
                filter.set_type(c.band.into());
                // cutoff is checked against the prepared rate
                filter.prepare(spec);
                filter.set_cutoff_frequency(T::from_f64(c.cutoff_hz));
                Stage::LinkwitzRiley(filter)
            }
        };
        stage.prepare(spec);
        stage
    }
}

impl<T: Sample> Processor<T> for Stage<T> {
    fn prepare(&mut self, spec: &ProcessSpec) {
        match self {
            Stage::Gain(p) => p.prepare(spec),
            Stage::Bias(p) => p.prepare(spec),
            Stage::Compressor(p) => p.prepare(spec),
            Stage::Ballistics(p) => p.prepare(spec),
            Stage::LinkwitzRiley(p) => p.prepare(spec),
        }
    }

    fn process(&mut self, context: &mut ProcessContext<'_, '_, T>) {
        match self {
            Stage::Gain(p) => p.process(context),
            Stage::Bias(p) => p.process(context),
            Stage::Compressor(p) => p.process(context),
            Stage::Ballistics(p) => p.process(context),
            Stage::LinkwitzRiley(p) => p.process(context),
        }
    }

    fn reset(&mut self) {
        match self {
            Stage::Gain(p) => p.reset(),
            Stage::Bias(p) => p.reset(),
            Stage::Compressor(p) => p.reset(),
            Stage::Ballistics(p) => p.reset(),
            Stage::LinkwitzRiley(p) => p.reset(),
        }
    }

    fn latency_samples(&self) -> usize {
        match self {
            Stage::Gain(p) => p.latency_samples(),
            Stage::Bias(p) => p.latency_samples(),
            Stage::Compressor(p) => p.latency_samples(),
            Stage::Ballistics(p) => p.latency_samples(),
            Stage::LinkwitzRiley(p) => p.latency_samples(),
        }
    }
}

/// An entry in the chain.
#[derive(Debug, Clone)]
struct ChainEntry<T> {
    stage: Stage<T>,
    bypassed: bool,
    kind: &'static str,
}

/// A prepared chain of stages with an optional dry/wet blend.
///
/// `process` follows the mixer ordering: the input is pushed as dry signal,
/// every stage runs in place, then the wet result is mixed with the delayed dry
/// signal.
#[derive(Debug, Clone)]
pub struct ConfiguredChain<T> {
    name: String,
    spec: ProcessSpec,
    entries: Vec<ChainEntry<T>>,
    mixer: Option<DryWetMixer<T>>,
    wet_latency: f64,
}

impl<T: Sample> ConfiguredChain<T> {
    /// Build from an already validated config.
    pub(crate) fn from_config(config: &ChainConfig, spec: ProcessSpec) -> Self {
        let entries: Vec<ChainEntry<T>> = config
            .stages
            .iter()
            .map(|c| ChainEntry {
                stage: Stage::from_config(c, &spec),
                bypassed: c.is_bypassed(),
                kind: c.kind(),
            })
            .collect();

        let stage_latency: usize = entries.iter().map(|e| e.stage.latency_samples()).sum();
        let wet_latency = stage_latency as f64 + config.mix.map_or(0.0, |m| m.wet_latency_samples);
        let mixer = config
            .mix
            .map(|mix| Self::build_mixer(&mix, &spec, wet_latency));

        tracing::debug!(
            chain = %config.name,
            stages = ?entries.iter().map(|e| e.kind).collect::<Vec<_>>(),
            wet_latency,
            "chain stages created"
        );

        Self {
            name: config.name.clone(),
            spec,
            entries,
            mixer,
            wet_latency,
        }
    }

    fn build_mixer(mix: &MixConfig, spec: &ProcessSpec, wet_latency: f64) -> DryWetMixer<T> {
        let mut mixer = DryWetMixer::new(wet_latency.ceil() as usize);
        mixer.set_mixing_rule(mix.rule.into());
        mixer.set_wet_mix_proportion(T::from_f64(mix.wet));
        mixer.prepare(spec);
        mixer.set_wet_latency(T::from_f64(wet_latency));
        mixer
    }

    /// Chain name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The spec every stage was prepared with.
    pub fn spec(&self) -> &ProcessSpec {
        &self.spec
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no stages.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stage type names in processing order.
    pub fn stage_types(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.kind).collect()
    }

    /// Bypass or re-enable stage `index`. Returns false if there is no such stage.
    pub fn set_bypassed(&mut self, index: usize, bypassed: bool) -> bool {
        match self.entries.get_mut(index) {
            Some(entry) => {
                entry.bypassed = bypassed;
                true
            }
            None => false,
        }
    }

    /// Whether stage `index` is bypassed.
    pub fn is_bypassed(&self, index: usize) -> Option<bool> {
        self.entries.get(index).map(|e| e.bypassed)
    }

    /// The dry/wet mixer, if configured.
    pub fn mixer(&self) -> Option<&DryWetMixer<T>> {
        self.mixer.as_ref()
    }

    /// The dry/wet mixer, mutably, for runtime mix changes.
    pub fn mixer_mut(&mut self) -> Option<&mut DryWetMixer<T>> {
        self.mixer.as_mut()
    }

    /// Wet-path latency the mixer compensates, in samples.
    pub fn latency_samples(&self) -> f64 {
        self.wet_latency
    }

    /// Process one block in place.
    pub fn process(&mut self, mut block: AudioBlock<'_, T>) {
        debug_assert!(block.num_samples() <= self.spec.maximum_block_size as usize);
        debug_assert!(block.num_channels() <= self.spec.num_channels as usize);

        if let Some(mixer) = &mut self.mixer {
            mixer.push_dry_samples(block.as_const());
        }

        for entry in &mut self.entries {
            entry
                .stage
                .process(&mut ProcessContext::replacing(block.reborrow()).bypassed(entry.bypassed));
        }

        if let Some(mixer) = &mut self.mixer {
            mixer.mix_wet_samples(block);
        }
    }

    /// Clear every stage's state and the mixer's buffered dry signal.
    pub fn reset(&mut self) {
        for entry in &mut self.entries {
            entry.stage.reset();
        }
        if let Some(mixer) = &mut self.mixer {
            mixer.reset();
        }
    }
}
