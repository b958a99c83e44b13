//! Ballast Core - real-time DSP primitives
//!
//! This crate provides the stateful per-sample building blocks of the ballast
//! processing pipeline, designed to run inside a hard real-time audio callback
//! with zero allocation, no locking and bounded per-sample cost.
//!
//! # Core Abstractions
//!
//! ## Stage Lifecycle
//!
//! - [`ProcessSpec`] - Sample rate, maximum block size and channel count
//! - [`ProcessContext`] - One block's buffers (in place or separate) plus bypass flag
//! - [`Processor`] - `prepare` → `process` / `reset` contract shared by every stage
//! - [`Chain`] - Zero-cost static chain of two processors
//!
//! ## Buffers
//!
//! - [`AudioBuffer`] - Owned planar storage
//! - [`AudioBlock`] / [`ConstAudioBlock`] - Non-owning views for one `process` call
//!
//! ## Parameter Smoothing
//!
//! - [`SmoothedValue`] - Sample-accurate ramps that land exactly on target
//!
//! ## Dynamics & Filters
//!
//! - [`BallisticsFilter`] - Attack/release envelope follower (peak or RMS)
//! - [`LinkwitzRileyFilter`] - LR4 crossover with simultaneous low/high outputs
//!
//! ## Utilities
//!
//! - [`DelayLine`] - Multi-channel fractional delay for latency compensation
//! - [`SingleThreadedFifo`] - Ring-buffer bookkeeping
//! - [`decibels_to_gain`], [`gain_to_decibels`], [`snap_to_zero`]
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible (with `alloc`). Disable the default `std`
//! feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! ballast-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use ballast_core::{
//!     AudioBuffer, LinkwitzRileyFilter, LinkwitzRileyType, ProcessContext, ProcessSpec,
//!     Processor, ProcessorExt, BallisticsFilter,
//! };
//!
//! let spec = ProcessSpec::new(48000.0, 256, 2);
//!
//! let mut lowpass = LinkwitzRileyFilter::<f32>::new();
//! lowpass.set_type(LinkwitzRileyType::Lowpass);
//! lowpass.set_cutoff_frequency(200.0);
//!
//! // Envelope of the low band
//! let mut chain = lowpass.chain(BallisticsFilter::<f32>::new());
//! chain.prepare(&spec);
//!
//! let mut buffer = AudioBuffer::<f32>::new(2, 256);
//! chain.process(&mut ProcessContext::replacing(buffer.as_block()));
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: All sizing happens in `prepare`; `process` never allocates
//! - **Generic precision**: Every stage runs on `f32` or `f64` via [`Sample`]
//! - **Denormal safe**: Recursive state is flushed with [`snap_to_zero`] after each block
//! - **Zero-cost abstractions**: Static dispatch chains optimize away

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod ballistics;
pub mod block;
pub mod delay;
pub mod fifo;
pub mod linkwitz_riley;
pub mod math;
pub mod process;
pub mod sample;
pub mod smoothed;

// Re-export main types at crate root
pub use ballistics::{BallisticsFilter, LevelCalculation};
pub use block::{AudioBlock, AudioBuffer, ConstAudioBlock};
pub use delay::DelayLine;
pub use fifo::SingleThreadedFifo;
pub use linkwitz_riley::{LinkwitzRileyFilter, LinkwitzRileyType};
pub use math::{
    MINUS_INFINITY_DB, decibels_to_gain, gain_to_decibels, next_power_of_two, snap_to_zero,
};
pub use process::{Chain, ProcessBuffers, ProcessContext, ProcessSpec, Processor, ProcessorExt};
pub use sample::Sample;
pub use smoothed::{Linear, Multiplicative, RampShape, SmoothedValue};
