//! Audio buffers and non-owning block views.
//!
//! Samples are stored planar: each channel occupies a contiguous run of
//! `channel_stride` samples inside one slice. [`AudioBuffer`] owns that storage;
//! [`AudioBlock`] and [`ConstAudioBlock`] are views over a window of it that live
//! for the duration of a single `process` call.
//!
//! # Example
//!
//! ```rust
//! use ballast_core::AudioBuffer;
//!
//! let mut buffer = AudioBuffer::<f32>::new(2, 64);
//! let mut block = buffer.as_block();
//! block.fill(0.5);
//!
//! let mut head = block.sub_block(0, 16);
//! head.channel_mut(1).fill(0.0);
//!
//! assert_eq!(buffer.channel(0)[0], 0.5);
//! assert_eq!(buffer.channel(1)[0], 0.0);
//! assert_eq!(buffer.channel(1)[16], 0.5);
//! ```

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

use crate::Sample;

/// Owned planar multi-channel sample storage.
///
/// Allocates on construction and [`set_size`](Self::set_size) only; never from
/// block views.
#[derive(Debug, Clone, Default)]
pub struct AudioBuffer<T> {
    data: Vec<T>,
    num_channels: usize,
    num_samples: usize,
}

impl<T: Sample> AudioBuffer<T> {
    /// Allocate a zeroed buffer.
    pub fn new(num_channels: usize, num_samples: usize) -> Self {
        Self {
            data: vec![T::ZERO; num_channels * num_samples],
            num_channels,
            num_samples,
        }
    }

    /// Build a buffer from a per-sample generator `f(channel, index)`.
    pub fn from_fn(num_channels: usize, num_samples: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut buffer = Self::new(num_channels, num_samples);
        for ch in 0..num_channels {
            for (i, s) in buffer.channel_mut(ch).iter_mut().enumerate() {
                *s = f(ch, i);
            }
        }
        buffer
    }

    /// Resize and zero the buffer. Allocates; call off the audio thread.
    pub fn set_size(&mut self, num_channels: usize, num_samples: usize) {
        self.data.clear();
        self.data.resize(num_channels * num_samples, T::ZERO);
        self.num_channels = num_channels;
        self.num_samples = num_samples;
    }

    /// Number of channels.
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Samples per channel.
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// One channel's samples.
    #[inline]
    pub fn channel(&self, channel: usize) -> &[T] {
        let start = channel * self.num_samples;
        &self.data[start..start + self.num_samples]
    }

    /// One channel's samples, mutably.
    #[inline]
    pub fn channel_mut(&mut self, channel: usize) -> &mut [T] {
        let start = channel * self.num_samples;
        &mut self.data[start..start + self.num_samples]
    }

    /// Zero every sample.
    pub fn clear(&mut self) {
        self.data.fill(T::ZERO);
    }

    /// Mutable view over the whole buffer.
    pub fn as_block(&mut self) -> AudioBlock<'_, T> {
        AudioBlock::from_planar(&mut self.data, self.num_channels, self.num_samples)
    }

    /// Read-only view over the whole buffer.
    pub fn as_const_block(&self) -> ConstAudioBlock<'_, T> {
        ConstAudioBlock::from_planar(&self.data, self.num_channels, self.num_samples)
    }
}

/// Mutable, non-owning view over `num_channels × num_samples` planar samples.
#[derive(Debug)]
pub struct AudioBlock<'a, T> {
    data: &'a mut [T],
    num_channels: usize,
    channel_stride: usize,
    start: usize,
    num_samples: usize,
}

impl<'a, T: Sample> AudioBlock<'a, T> {
    /// View `data` as `num_channels` consecutive channels of `num_samples` each.
    ///
    /// # Panics
    ///
    /// Panics if `data` is shorter than `num_channels * num_samples`.
    pub fn from_planar(data: &'a mut [T], num_channels: usize, num_samples: usize) -> Self {
        assert!(
            data.len() >= num_channels * num_samples,
            "planar slice too short for {num_channels} x {num_samples}"
        );
        Self {
            data,
            num_channels,
            channel_stride: num_samples,
            start: 0,
            num_samples,
        }
    }

    /// Single-channel view over a slice.
    pub fn from_mono(data: &'a mut [T]) -> Self {
        let len = data.len();
        Self::from_planar(data, 1, len)
    }

    /// Number of channels.
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Samples per channel.
    #[inline]
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    #[inline]
    fn offset(&self, channel: usize) -> usize {
        debug_assert!(channel < self.num_channels);
        channel * self.channel_stride + self.start
    }

    /// One channel's samples.
    #[inline]
    pub fn channel(&self, channel: usize) -> &[T] {
        let off = self.offset(channel);
        &self.data[off..off + self.num_samples]
    }

    /// One channel's samples, mutably.
    #[inline]
    pub fn channel_mut(&mut self, channel: usize) -> &mut [T] {
        let off = self.offset(channel);
        &mut self.data[off..off + self.num_samples]
    }

    /// Reborrow this view for a shorter lifetime.
    pub fn reborrow(&mut self) -> AudioBlock<'_, T> {
        AudioBlock {
            data: &mut *self.data,
            num_channels: self.num_channels,
            channel_stride: self.channel_stride,
            start: self.start,
            num_samples: self.num_samples,
        }
    }

    /// View of samples `start..start + len` in every channel.
    pub fn sub_block(&mut self, start: usize, len: usize) -> AudioBlock<'_, T> {
        assert!(start + len <= self.num_samples, "sub-block out of range");
        AudioBlock {
            data: &mut *self.data,
            num_channels: self.num_channels,
            channel_stride: self.channel_stride,
            start: self.start + start,
            num_samples: len,
        }
    }

    /// View of the first `num_channels` channels.
    pub fn channel_subset(&mut self, num_channels: usize) -> AudioBlock<'_, T> {
        assert!(num_channels <= self.num_channels, "channel subset out of range");
        AudioBlock {
            data: &mut *self.data,
            num_channels,
            channel_stride: self.channel_stride,
            start: self.start,
            num_samples: self.num_samples,
        }
    }

    /// Read-only view of the same samples.
    pub fn as_const(&self) -> ConstAudioBlock<'_, T> {
        ConstAudioBlock {
            data: &*self.data,
            num_channels: self.num_channels,
            channel_stride: self.channel_stride,
            start: self.start,
            num_samples: self.num_samples,
        }
    }

    /// Set every sample to `value`.
    pub fn fill(&mut self, value: T) {
        for ch in 0..self.num_channels {
            self.channel_mut(ch).fill(value);
        }
    }

    /// Copy `source` into this block. Channel and sample counts must match.
    pub fn copy_from(&mut self, source: &ConstAudioBlock<'_, T>) {
        debug_assert_eq!(self.num_channels, source.num_channels());
        debug_assert_eq!(self.num_samples, source.num_samples());
        for ch in 0..self.num_channels.min(source.num_channels()) {
            let n = self.num_samples.min(source.num_samples());
            self.channel_mut(ch)[..n].copy_from_slice(&source.channel(ch)[..n]);
        }
    }

    /// Add `source` sample-wise into this block.
    pub fn add_from(&mut self, source: &ConstAudioBlock<'_, T>) {
        debug_assert_eq!(self.num_channels, source.num_channels());
        for ch in 0..self.num_channels.min(source.num_channels()) {
            for (d, &s) in self.channel_mut(ch).iter_mut().zip(source.channel(ch)) {
                *d += s;
            }
        }
    }

    /// Multiply every sample by a constant.
    pub fn multiply_by(&mut self, gain: T) {
        for ch in 0..self.num_channels {
            for s in self.channel_mut(ch) {
                *s *= gain;
            }
        }
    }
}

/// Read-only, non-owning view over planar samples.
#[derive(Debug, Clone, Copy)]
pub struct ConstAudioBlock<'a, T> {
    data: &'a [T],
    num_channels: usize,
    channel_stride: usize,
    start: usize,
    num_samples: usize,
}

impl<'a, T: Sample> ConstAudioBlock<'a, T> {
    /// View `data` as `num_channels` consecutive channels of `num_samples` each.
    ///
    /// # Panics
    ///
    /// Panics if `data` is shorter than `num_channels * num_samples`.
    pub fn from_planar(data: &'a [T], num_channels: usize, num_samples: usize) -> Self {
        assert!(
            data.len() >= num_channels * num_samples,
            "planar slice too short for {num_channels} x {num_samples}"
        );
        Self {
            data,
            num_channels,
            channel_stride: num_samples,
            start: 0,
            num_samples,
        }
    }

    /// Single-channel view over a slice.
    pub fn from_mono(data: &'a [T]) -> Self {
        Self::from_planar(data, 1, data.len())
    }

    /// Number of channels.
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Samples per channel.
    #[inline]
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// One channel's samples.
    #[inline]
    pub fn channel(&self, channel: usize) -> &'a [T] {
        debug_assert!(channel < self.num_channels);
        let off = channel * self.channel_stride + self.start;
        &self.data[off..off + self.num_samples]
    }

    /// View of samples `start..start + len` in every channel.
    pub fn sub_block(&self, start: usize, len: usize) -> ConstAudioBlock<'a, T> {
        assert!(start + len <= self.num_samples, "sub-block out of range");
        ConstAudioBlock {
            start: self.start + start,
            num_samples: len,
            ..*self
        }
    }
}
