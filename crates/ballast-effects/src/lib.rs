//! Ballast Effects - processing stages built on ballast-core
//!
//! Every stage implements [`Processor`](ballast_core::Processor) and is
//! generic over [`Sample`](ballast_core::Sample), so it can run at `f32` or
//! `f64` precision and be chained statically.
//!
//! # Stages
//!
//! - [`Gain`] - Ramped multiplicative gain
//! - [`Bias`] - Ramped DC offset
//! - [`Compressor`] - Feed-forward compressor on a peak ballistics detector
//! - [`DryWetMixer`] - Latency-compensated dry/wet blend with selectable [`MixingRule`]
//!
//! # Example
//!
//! ```rust
//! use ballast_core::{AudioBuffer, ProcessContext, ProcessSpec, Processor, ProcessorExt};
//! use ballast_effects::{Compressor, Gain};
//!
//! let spec = ProcessSpec::new(48000.0, 128, 2);
//!
//! let mut comp = Compressor::<f32>::new();
//! comp.set_threshold(-18.0);
//! comp.set_ratio(3.0);
//!
//! let mut makeup = Gain::new();
//! makeup.set_gain_decibels(6.0);
//!
//! let mut chain = comp.chain(makeup);
//! chain.prepare(&spec);
//!
//! let mut buffer = AudioBuffer::<f32>::new(2, 128);
//! chain.process(&mut ProcessContext::replacing(buffer.as_block()));
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod bias;
pub mod compressor;
pub mod dry_wet;
pub mod gain;

pub use bias::Bias;
pub use compressor::Compressor;
pub use dry_wet::{DryWetMixer, MixingRule};
pub use gain::Gain;
