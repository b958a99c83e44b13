//! Chain configuration validation.
//!
//! Every check runs on the host before any processor is built, so parameter
//! problems surface as errors instead of reaching the `debug_assert!`s and
//! release-mode clamps of the real-time stages.
//!
//! # Example
//!
//! ```rust
//! use ballast_config::{ChainConfig, StageConfig, ValidationError, validate_chain};
//! use ballast_config::CompressorConfig;
//!
//! let config = ChainConfig::new("bad").with_stage(StageConfig::Compressor(CompressorConfig {
//!     ratio: 0.5,
//!     ..Default::default()
//! }));
//!
//! let err = validate_chain(&config).unwrap_err();
//! assert!(matches!(err, ValidationError::OutOfRange { .. }));
//! ```

use thiserror::Error;

use crate::config::{ChainConfig, MixConfig, StageConfig};

/// Lowest accepted sample rate in Hz.
pub const MIN_SAMPLE_RATE: f64 = 1000.0;
/// Highest accepted sample rate in Hz.
pub const MAX_SAMPLE_RATE: f64 = 768_000.0;
/// Largest accepted channel count.
pub const MAX_CHANNELS: u32 = 64;
/// Longest accepted attack, release or ramp time in milliseconds.
pub const MAX_TIME_MS: f64 = 10_000.0;
/// Largest accepted wet latency in samples.
pub const MAX_WET_LATENCY_SAMPLES: f64 = 1_048_576.0;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Parameter value out of range.
    #[error("'{field}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Dotted path of the offending field, e.g. `stages[1].ratio`.
        field: String,
        /// The rejected value.
        value: f64,
        /// Minimum allowed value.
        min: f64,
        /// Maximum allowed value.
        max: f64,
    },

    /// Sample rate, block size or channel count unusable.
    #[error("invalid process spec: {0}")]
    InvalidSpec(String),

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

impl ValidationError {
    /// Collapse a list of problems: none is `Ok`, one is returned as is,
    /// several become [`ValidationError::Multiple`].
    pub fn from_list(mut errors: Vec<ValidationError>) -> ValidationResult<()> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ValidationError::Multiple(errors)),
        }
    }

    /// Number of individual problems this error carries.
    pub fn count(&self) -> usize {
        match self {
            ValidationError::Multiple(errors) => errors.iter().map(Self::count).sum(),
            _ => 1,
        }
    }
}

fn check_range(errors: &mut Vec<ValidationError>, field: String, value: f64, min: f64, max: f64) {
    if !(min..=max).contains(&value) {
        errors.push(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
}

/// Check sample rate, block size and channel count.
pub fn validate_spec(config: &ChainConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&config.sample_rate) {
        errors.push(ValidationError::InvalidSpec(format!(
            "sample_rate {} outside [{MIN_SAMPLE_RATE}, {MAX_SAMPLE_RATE}] Hz",
            config.sample_rate
        )));
    }
    if config.maximum_block_size == 0 {
        errors.push(ValidationError::InvalidSpec(
            "maximum_block_size must be at least 1".into(),
        ));
    }
    if config.num_channels == 0 || config.num_channels > MAX_CHANNELS {
        errors.push(ValidationError::InvalidSpec(format!(
            "num_channels {} outside [1, {MAX_CHANNELS}]",
            config.num_channels
        )));
    }
    errors
}

/// Check one stage's settings against `sample_rate`.
pub fn validate_stage(index: usize, stage: &StageConfig, sample_rate: f64) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let field = |name: &str| format!("stages[{index}].{name}");

    match stage {
        StageConfig::Gain(c) => {
            check_range(&mut errors, field("gain_db"), c.gain_db, -200.0, 48.0);
            check_range(&mut errors, field("ramp_seconds"), c.ramp_seconds, 0.0, MAX_TIME_MS / 1000.0);
        }
        StageConfig::Bias(c) => {
            check_range(&mut errors, field("bias"), c.bias, -1000.0, 1000.0);
            check_range(&mut errors, field("ramp_seconds"), c.ramp_seconds, 0.0, MAX_TIME_MS / 1000.0);
        }
        StageConfig::Compressor(c) => {
            check_range(&mut errors, field("threshold_db"), c.threshold_db, -199.0, 24.0);
            check_range(&mut errors, field("ratio"), c.ratio, 1.0, 1000.0);
            check_range(&mut errors, field("attack_ms"), c.attack_ms, 0.0, MAX_TIME_MS);
            check_range(&mut errors, field("release_ms"), c.release_ms, 0.0, MAX_TIME_MS);
        }
        StageConfig::Ballistics(c) => {
            check_range(&mut errors, field("attack_ms"), c.attack_ms, 0.0, MAX_TIME_MS);
            check_range(&mut errors, field("release_ms"), c.release_ms, 0.0, MAX_TIME_MS);
        }
        StageConfig::LinkwitzRiley(c) => {
            // open interval (0, fs/2): reject the endpoints explicitly
            let nyquist = sample_rate * 0.5;
            if !(c.cutoff_hz > 0.0 && c.cutoff_hz < nyquist) {
                errors.push(ValidationError::OutOfRange {
                    field: field("cutoff_hz"),
                    value: c.cutoff_hz,
                    min: 0.0,
                    max: nyquist,
                });
            }
        }
    }
    errors
}

/// Check the dry/wet settings.
pub fn validate_mix(mix: &MixConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    check_range(&mut errors, "mix.wet".into(), mix.wet, 0.0, 1.0);
    check_range(
        &mut errors,
        "mix.wet_latency_samples".into(),
        mix.wet_latency_samples,
        0.0,
        MAX_WET_LATENCY_SAMPLES,
    );
    errors
}

/// Validate a whole chain, collecting every problem.
pub fn validate_chain(config: &ChainConfig) -> ValidationResult<()> {
    let mut errors = validate_spec(config);
    for (index, stage) in config.stages.iter().enumerate() {
        errors.extend(validate_stage(index, stage, config.sample_rate));
    }
    if let Some(mix) = &config.mix {
        errors.extend(validate_mix(mix));
    }

    let result = ValidationError::from_list(errors);
    if let Err(ref e) = result {
        tracing::warn!(chain = %config.name, problems = e.count(), "{e}");
    }
    result
}
