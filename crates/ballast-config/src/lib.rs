//! Configuration of ballast processing chains.
//!
//! This crate is the host-side companion of the real-time crates: it describes
//! a chain of stages in TOML, validates every setting before anything reaches the
//! audio thread, and builds a prepared [`ConfiguredChain`] at `f32` or `f64`.
//!
//! # Features
//!
//! - **Chain files**: Load and save [`ChainConfig`] as TOML
//! - **Validation**: Range checks that report every problem at once
//! - **Construction**: Stages prepared at their configured values, with an
//!   optional latency-compensated dry/wet blend
//!
//! # Example
//!
//! ```rust,no_run
//! use ballast_config::{ChainConfig, CompressorConfig, MixConfig, MixRuleConfig, StageConfig};
//!
//! // Load a chain from file
//! let config = ChainConfig::load("glue.toml").unwrap();
//!
//! // Or build one programmatically
//! let config = ChainConfig::new("Parallel Squash")
//!     .with_spec(48000.0, 256, 2)
//!     .with_stage(StageConfig::Compressor(CompressorConfig {
//!         threshold_db: -30.0,
//!         ratio: 8.0,
//!         ..Default::default()
//!     }))
//!     .with_mix(MixConfig {
//!         rule: MixRuleConfig::Sin3dB,
//!         wet: 0.4,
//!         ..Default::default()
//!     });
//! config.save("squash.toml").unwrap();
//!
//! let mut chain = config.build::<f32>().unwrap();
//! ```

mod chain;
mod config;
mod error;

/// Chain validation.
pub mod validation;

pub use chain::ConfiguredChain;
pub use config::{
    BallisticsConfig, BandConfig, BiasConfig, ChainConfig, CompressorConfig, GainConfig,
    LevelConfig, LinkwitzRileyConfig, MixConfig, MixRuleConfig, StageConfig,
};
pub use error::{ConfigError, FileOperation};
pub use validation::{
    ValidationError, ValidationResult, validate_chain, validate_mix, validate_spec,
    validate_stage,
};
