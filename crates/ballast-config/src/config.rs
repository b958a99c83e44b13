//! Chain file format and operations.

use serde::{Deserialize, Serialize};
use std::path::Path;

use ballast_core::{LevelCalculation, LinkwitzRileyType, ProcessSpec, Sample};
use ballast_effects::MixingRule;

use crate::chain::ConfiguredChain;
use crate::error::ConfigError;
use crate::validation::{ValidationError, validate_chain, validate_spec};

/// Description of a processing chain.
///
/// Stages run in order, in place, on every block. An optional [`MixConfig`]
/// blends the processed signal with the latency-compensated input.
///
/// # TOML Format
///
/// ```toml
/// name = "Bus Glue"
/// sample_rate = 48000.0
/// maximum_block_size = 512
/// num_channels = 2
///
/// [[stages]]
/// type = "compressor"
/// threshold_db = -18.0
/// ratio = 3.0
///
/// [[stages]]
/// type = "gain"
/// gain_db = 4.0
/// ramp_seconds = 0.02
///
/// [mix]
/// rule = "sin3db"
/// wet = 0.6
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChainConfig {
    /// Name of the chain.
    pub name: String,

    /// Sample rate in Hz (defaults to 48000).
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f64,

    /// Largest block the host will pass to `process` (defaults to 512).
    #[serde(default = "default_maximum_block_size")]
    pub maximum_block_size: u32,

    /// Channel count (defaults to 2).
    #[serde(default = "default_num_channels")]
    pub num_channels: u32,

    /// Processing stages, in order.
    #[serde(default)]
    pub stages: Vec<StageConfig>,

    /// Dry/wet blend around the stages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mix: Option<MixConfig>,
}

fn default_sample_rate() -> f64 {
    48000.0
}

fn default_maximum_block_size() -> u32 {
    512
}

fn default_num_channels() -> u32 {
    2
}

impl ChainConfig {
    /// Create an empty chain with the default process spec.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sample_rate: default_sample_rate(),
            maximum_block_size: default_maximum_block_size(),
            num_channels: default_num_channels(),
            stages: Vec::new(),
            mix: None,
        }
    }

    /// Set sample rate, maximum block size and channel count.
    pub fn with_spec(mut self, sample_rate: f64, maximum_block_size: u32, num_channels: u32) -> Self {
        self.sample_rate = sample_rate;
        self.maximum_block_size = maximum_block_size;
        self.num_channels = num_channels;
        self
    }

    /// Append a stage.
    pub fn with_stage(mut self, stage: StageConfig) -> Self {
        self.stages.push(stage);
        self
    }

    /// Append several stages.
    pub fn with_stages(mut self, stages: impl IntoIterator<Item = StageConfig>) -> Self {
        self.stages.extend(stages);
        self
    }

    /// Blend the stages' output with the input.
    pub fn with_mix(mut self, mix: MixConfig) -> Self {
        self.mix = Some(mix);
        self
    }

    /// Load a chain from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: Some(path.to_path_buf()),
            source,
        })?;
        tracing::info!(path = %path.display(), chain = %config.name, stages = config.stages.len(), "chain loaded");
        Ok(config)
    }

    /// Load a chain from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|source| ConfigError::Parse { path: None, source })
    }

    /// Save the chain to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        tracing::debug!(path = %path.display(), chain = %self.name, "chain saved");
        Ok(())
    }

    /// Convert the chain to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|source| ConfigError::Serialize {
            name: self.name.clone(),
            source,
        })
    }

    /// The validated process spec.
    pub fn spec(&self) -> Result<ProcessSpec, ConfigError> {
        ValidationError::from_list(validate_spec(self)).map_err(|e| self.invalid(e))?;
        Ok(ProcessSpec::new(
            self.sample_rate,
            self.maximum_block_size,
            self.num_channels,
        ))
    }

    /// Check every setting, collecting all problems.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_chain(self).map_err(|e| self.invalid(e))
    }

    fn invalid(&self, source: ValidationError) -> ConfigError {
        ConfigError::Invalid {
            name: self.name.clone(),
            source,
        }
    }

    /// Validate, then build and prepare a chain at precision `T`.
    pub fn build<T: Sample>(&self) -> Result<ConfiguredChain<T>, ConfigError> {
        self.validate()?;
        let chain = ConfiguredChain::from_config(self, self.spec()?);
        tracing::info!(
            chain = %self.name,
            stages = self.stages.len(),
            mix = self.mix.is_some(),
            sample_rate = self.sample_rate,
            "chain built"
        );
        Ok(chain)
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// True when there are no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage type names, with a `!` prefix for bypassed stages.
    pub fn stage_types(&self) -> Vec<String> {
        self.stages
            .iter()
            .map(|s| {
                if s.is_bypassed() {
                    format!("!{}", s.kind())
                } else {
                    s.kind().to_string()
                }
            })
            .collect()
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// One processing stage, tagged by `type`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StageConfig {
    /// Smoothed gain.
    Gain(GainConfig),
    /// Smoothed DC offset.
    Bias(BiasConfig),
    /// Dynamics compressor.
    Compressor(CompressorConfig),
    /// Envelope follower; the block is replaced by its envelope.
    Ballistics(BallisticsConfig),
    /// One band of an LR4 crossover.
    LinkwitzRiley(LinkwitzRileyConfig),
}

impl StageConfig {
    /// The `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            StageConfig::Gain(_) => "gain",
            StageConfig::Bias(_) => "bias",
            StageConfig::Compressor(_) => "compressor",
            StageConfig::Ballistics(_) => "ballistics",
            StageConfig::LinkwitzRiley(_) => "linkwitz_riley",
        }
    }

    /// Whether the stage starts bypassed.
    pub fn is_bypassed(&self) -> bool {
        match self {
            StageConfig::Gain(c) => c.bypassed,
            StageConfig::Bias(c) => c.bypassed,
            StageConfig::Compressor(c) => c.bypassed,
            StageConfig::Ballistics(c) => c.bypassed,
            StageConfig::LinkwitzRiley(c) => c.bypassed,
        }
    }
}

/// Settings for a [`Gain`](ballast_effects::Gain) stage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GainConfig {
    /// Gain in dB.
    pub gain_db: f64,
    /// Ramp time for gain changes.
    pub ramp_seconds: f64,
    /// Start bypassed.
    pub bypassed: bool,
}

impl Default for GainConfig {
    fn default() -> Self {
        Self {
            gain_db: 0.0,
            ramp_seconds: 0.0,
            bypassed: false,
        }
    }
}

/// Settings for a [`Bias`](ballast_effects::Bias) stage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BiasConfig {
    /// Offset added to every sample.
    pub bias: f64,
    /// Ramp time for offset changes.
    pub ramp_seconds: f64,
    /// Start bypassed.
    pub bypassed: bool,
}

impl Default for BiasConfig {
    fn default() -> Self {
        Self {
            bias: 0.0,
            ramp_seconds: 0.0,
            bypassed: false,
        }
    }
}

/// Settings for a [`Compressor`](ballast_effects::Compressor) stage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CompressorConfig {
    /// Threshold in dB.
    pub threshold_db: f64,
    /// Compression ratio (≥ 1).
    pub ratio: f64,
    /// Attack time in milliseconds.
    pub attack_ms: f64,
    /// Release time in milliseconds.
    pub release_ms: f64,
    /// Start bypassed.
    pub bypassed: bool,
}

impl Default for CompressorConfig {
    fn default() -> Self {
        Self {
            threshold_db: -10.0,
            ratio: 1.0,
            attack_ms: 1.0,
            release_ms: 100.0,
            bypassed: false,
        }
    }
}

/// Detector law for a ballistics stage.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LevelConfig {
    /// Rectified peak.
    #[default]
    Peak,
    /// Root mean square.
    Rms,
}

impl From<LevelConfig> for LevelCalculation {
    fn from(level: LevelConfig) -> Self {
        match level {
            LevelConfig::Peak => LevelCalculation::Peak,
            LevelConfig::Rms => LevelCalculation::Rms,
        }
    }
}

/// Settings for a [`BallisticsFilter`](ballast_core::BallisticsFilter) stage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BallisticsConfig {
    /// Attack time in milliseconds.
    pub attack_ms: f64,
    /// Release time in milliseconds.
    pub release_ms: f64,
    /// Peak or RMS detection.
    pub level: LevelConfig,
    /// Start bypassed.
    pub bypassed: bool,
}

impl Default for BallisticsConfig {
    fn default() -> Self {
        Self {
            attack_ms: 1.0,
            release_ms: 100.0,
            level: LevelConfig::Peak,
            bypassed: false,
        }
    }
}

/// Output band of a Linkwitz-Riley stage.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BandConfig {
    /// Low band.
    #[default]
    Lowpass,
    /// High band.
    Highpass,
    /// Sum of both bands.
    Allpass,
}

impl From<BandConfig> for LinkwitzRileyType {
    fn from(band: BandConfig) -> Self {
        match band {
            BandConfig::Lowpass => LinkwitzRileyType::Lowpass,
            BandConfig::Highpass => LinkwitzRileyType::Highpass,
            BandConfig::Allpass => LinkwitzRileyType::Allpass,
        }
    }
}

/// Settings for a [`LinkwitzRileyFilter`](ballast_core::LinkwitzRileyFilter) stage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LinkwitzRileyConfig {
    /// Crossover frequency in Hz.
    pub cutoff_hz: f64,
    /// Which band to output.
    pub band: BandConfig,
    /// Start bypassed.
    pub bypassed: bool,
}

impl Default for LinkwitzRileyConfig {
    fn default() -> Self {
        Self {
            cutoff_hz: 2000.0,
            band: BandConfig::Lowpass,
            bypassed: false,
        }
    }
}

/// Dry/wet gain law, by name.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MixRuleConfig {
    /// `linear`
    #[default]
    Linear,
    /// `balanced`
    Balanced,
    /// `sin3db`
    #[serde(rename = "sin3db")]
    Sin3dB,
    /// `sin4p5db`
    #[serde(rename = "sin4p5db")]
    Sin4p5dB,
    /// `sin6db`
    #[serde(rename = "sin6db")]
    Sin6dB,
    /// `square_root3db`
    #[serde(rename = "square_root3db")]
    SquareRoot3dB,
    /// `square_root4p5db`
    #[serde(rename = "square_root4p5db")]
    SquareRoot4p5dB,
}

impl From<MixRuleConfig> for MixingRule {
    fn from(rule: MixRuleConfig) -> Self {
        match rule {
            MixRuleConfig::Linear => MixingRule::Linear,
            MixRuleConfig::Balanced => MixingRule::Balanced,
            MixRuleConfig::Sin3dB => MixingRule::Sin3dB,
            MixRuleConfig::Sin4p5dB => MixingRule::Sin4p5dB,
            MixRuleConfig::Sin6dB => MixingRule::Sin6dB,
            MixRuleConfig::SquareRoot3dB => MixingRule::SquareRoot3dB,
            MixRuleConfig::SquareRoot4p5dB => MixingRule::SquareRoot4p5dB,
        }
    }
}

/// Dry/wet blend settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MixConfig {
    /// Gain law.
    pub rule: MixRuleConfig,
    /// Wet proportion in `[0, 1]`.
    pub wet: f64,
    /// Extra latency of the wet path in samples, on top of the stages' own.
    pub wet_latency_samples: f64,
}

impl Default for MixConfig {
    fn default() -> Self {
        Self {
            rule: MixRuleConfig::Linear,
            wet: 1.0,
            wet_latency_samples: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = ChainConfig::from_toml(r#"name = "Empty""#).unwrap();
        assert_eq!(config, ChainConfig::new("Empty"));
    }

    #[test]
    fn stage_defaults_match_processors() {
        let config = ChainConfig::from_toml(
            r#"
            name = "Defaults"

            [[stages]]
            type = "compressor"

            [[stages]]
            type = "ballistics"

            [[stages]]
            type = "linkwitz_riley"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.stages,
            vec![
                StageConfig::Compressor(CompressorConfig::default()),
                StageConfig::Ballistics(BallisticsConfig::default()),
                StageConfig::LinkwitzRiley(LinkwitzRileyConfig::default()),
            ]
        );
    }

    #[test]
    fn parses_documented_format() {
        let config = ChainConfig::from_toml(
            r#"
            name = "Bus Glue"
            sample_rate = 44100.0
            num_channels = 1

            [[stages]]
            type = "compressor"
            threshold_db = -18.0
            ratio = 3.0

            [[stages]]
            type = "gain"
            gain_db = 4.0
            bypassed = true

            [mix]
            rule = "sin3db"
            wet = 0.6
            "#,
        )
        .unwrap();

        assert_eq!(config.sample_rate, 44100.0);
        assert_eq!(config.maximum_block_size, 512);
        assert_eq!(config.num_channels, 1);
        assert_eq!(config.stage_types(), vec!["compressor", "!gain"]);
        let mix = config.mix.unwrap();
        assert_eq!(MixingRule::from(mix.rule), MixingRule::Sin3dB);
        assert_eq!(mix.wet, 0.6);
        assert_eq!(mix.wet_latency_samples, 0.0);
    }

    #[test]
    fn unknown_stage_type_is_a_parse_error() {
        let err = ChainConfig::from_toml(
            r#"
            name = "Bad"
            [[stages]]
            type = "reverb"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { path: None, .. }));
    }

    #[test]
    fn toml_round_trip_preserves_chain() {
        let config = ChainConfig::new("Round Trip")
            .with_spec(96000.0, 256, 2)
            .with_stages([
                StageConfig::Bias(BiasConfig {
                    bias: 0.1,
                    ..Default::default()
                }),
                StageConfig::LinkwitzRiley(LinkwitzRileyConfig {
                    cutoff_hz: 350.0,
                    band: BandConfig::Highpass,
                    bypassed: false,
                }),
            ])
            .with_mix(MixConfig {
                rule: MixRuleConfig::SquareRoot4p5dB,
                wet: 0.25,
                wet_latency_samples: 12.5,
            });

        let text = config.to_toml().unwrap();
        assert!(text.contains(r#"type = "linkwitz_riley""#), "got: {text}");
        assert!(text.contains(r#"rule = "square_root4p5db""#), "got: {text}");
        assert_eq!(ChainConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn spec_rejects_zero_block_size() {
        let config = ChainConfig::new("c").with_spec(48000.0, 0, 2);
        let err = config.spec().unwrap_err();
        assert!(matches!(err.validation(), Some(ValidationError::InvalidSpec(_))));
        let ok = ChainConfig::new("c").with_spec(44100.0, 64, 1).spec().unwrap();
        assert_eq!(ok, ProcessSpec::new(44100.0, 64, 1));
    }
}
