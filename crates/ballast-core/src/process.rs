//! Stage lifecycle: [`ProcessSpec`], [`ProcessContext`] and the [`Processor`] trait.
//!
//! A host calls [`Processor::prepare`] off the audio thread whenever the sample
//! rate, maximum block size or channel count changes, then
//! [`Processor::process`] once per audio block, and [`Processor::reset`] on
//! transport discontinuities.
//!
//! ## Design Decisions
//!
//! - **Explicit aliasing**: whether input and output share storage is a tag on
//!   the context ([`ProcessBuffers::Replacing`] vs [`ProcessBuffers::NonReplacing`]),
//!   never inferred from pointers.
//!
//! - **Static dispatch**: [`Processor`] is generic over the sample type and
//!   [`Chain`] composes stages without boxing, so the per-sample code inlines.
//!
//! - **No allocations**: nothing reachable from `process` allocates.

use crate::{AudioBlock, ConstAudioBlock, Sample};

/// Playback configuration handed to every stage in `prepare`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessSpec {
    /// Sample rate in Hz.
    pub sample_rate: f64,
    /// Largest block that will be passed to `process`.
    pub maximum_block_size: u32,
    /// Number of channels in every block.
    pub num_channels: u32,
}

impl ProcessSpec {
    /// Create a new spec.
    pub const fn new(sample_rate: f64, maximum_block_size: u32, num_channels: u32) -> Self {
        Self {
            sample_rate,
            maximum_block_size,
            num_channels,
        }
    }
}

impl Default for ProcessSpec {
    fn default() -> Self {
        Self::new(44100.0, 512, 2)
    }
}

/// How a context's input and output relate.
#[derive(Debug)]
pub enum ProcessBuffers<'i, 'o, T> {
    /// Output overwrites input in place.
    Replacing(AudioBlock<'o, T>),
    /// Input and output are distinct buffers.
    NonReplacing {
        /// Source samples.
        input: ConstAudioBlock<'i, T>,
        /// Destination samples.
        output: AudioBlock<'o, T>,
    },
}

/// Buffers plus bypass state for one `process` call.
#[derive(Debug)]
pub struct ProcessContext<'i, 'o, T> {
    buffers: ProcessBuffers<'i, 'o, T>,
    /// When set, stages leave audio untouched (copying input to output if the
    /// buffers are distinct) but keep their parameter ramps in sync.
    pub is_bypassed: bool,
}

impl<'i, 'o, T: Sample> ProcessContext<'i, 'o, T> {
    /// In-place context over a single block.
    pub fn replacing(block: AudioBlock<'o, T>) -> Self {
        Self {
            buffers: ProcessBuffers::Replacing(block),
            is_bypassed: false,
        }
    }

    /// Context reading from `input` and writing to `output`.
    ///
    /// Channel and sample counts must match.
    pub fn non_replacing(input: ConstAudioBlock<'i, T>, output: AudioBlock<'o, T>) -> Self {
        debug_assert_eq!(input.num_channels(), output.num_channels(), "channel count mismatch");
        debug_assert_eq!(input.num_samples(), output.num_samples(), "block length mismatch");
        Self {
            buffers: ProcessBuffers::NonReplacing { input, output },
            is_bypassed: false,
        }
    }

    /// Builder-style bypass flag.
    pub fn bypassed(mut self, is_bypassed: bool) -> Self {
        self.is_bypassed = is_bypassed;
        self
    }

    /// True for [`ProcessBuffers::NonReplacing`].
    #[inline]
    pub fn uses_separate_blocks(&self) -> bool {
        matches!(self.buffers, ProcessBuffers::NonReplacing { .. })
    }

    /// Number of channels in the output block.
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.output().num_channels()
    }

    /// Number of samples in the output block.
    #[inline]
    pub fn num_samples(&self) -> usize {
        self.output().num_samples()
    }

    /// The output block.
    #[inline]
    pub fn output(&self) -> &AudioBlock<'o, T> {
        match &self.buffers {
            ProcessBuffers::Replacing(block) => block,
            ProcessBuffers::NonReplacing { output, .. } => output,
        }
    }

    /// The output block, mutably.
    #[inline]
    pub fn output_mut(&mut self) -> &mut AudioBlock<'o, T> {
        match &mut self.buffers {
            ProcessBuffers::Replacing(block) => block,
            ProcessBuffers::NonReplacing { output, .. } => output,
        }
    }

    /// The input samples (the output block itself when replacing).
    #[inline]
    pub fn input(&self) -> ConstAudioBlock<'_, T> {
        match &self.buffers {
            ProcessBuffers::Replacing(block) => block.as_const(),
            ProcessBuffers::NonReplacing { input, .. } => *input,
        }
    }

    /// Copy input to output when the buffers are distinct; no-op when replacing.
    pub fn copy_input_to_output(&mut self) {
        if let ProcessBuffers::NonReplacing { input, output } = &mut self.buffers {
            output.copy_from(input);
        }
    }

    /// Run `f` over every sample of one channel in index order.
    #[inline]
    pub fn map_channel(&mut self, channel: usize, mut f: impl FnMut(T) -> T) {
        match &mut self.buffers {
            ProcessBuffers::Replacing(block) => {
                for s in block.channel_mut(channel) {
                    *s = f(*s);
                }
            }
            ProcessBuffers::NonReplacing { input, output } => {
                let src = input.channel(channel);
                for (o, &i) in output.channel_mut(channel).iter_mut().zip(src) {
                    *o = f(i);
                }
            }
        }
    }

    /// Run `f` over sample `index` of every channel.
    ///
    /// Used by stages whose per-sample parameter is shared across channels.
    #[inline]
    pub fn map_frame(&mut self, index: usize, mut f: impl FnMut(T) -> T) {
        match &mut self.buffers {
            ProcessBuffers::Replacing(block) => {
                for ch in 0..block.num_channels() {
                    let s = &mut block.channel_mut(ch)[index];
                    *s = f(*s);
                }
            }
            ProcessBuffers::NonReplacing { input, output } => {
                for ch in 0..output.num_channels() {
                    output.channel_mut(ch)[index] = f(input.channel(ch)[index]);
                }
            }
        }
    }

    /// Replacing context over this context's output, keeping the bypass flag.
    ///
    /// Used to run a second stage on the result of the first.
    pub fn as_replacing(&mut self) -> ProcessContext<'_, '_, T> {
        let is_bypassed = self.is_bypassed;
        ProcessContext {
            buffers: ProcessBuffers::Replacing(self.output_mut().reborrow()),
            is_bypassed,
        }
    }
}

/// Lifecycle contract shared by every stage.
///
/// # Example
///
/// ```rust
/// use ballast_core::{AudioBuffer, ProcessContext, ProcessSpec, Processor, Sample};
///
/// struct Invert;
///
/// impl<T: Sample> Processor<T> for Invert {
///     fn prepare(&mut self, _spec: &ProcessSpec) {}
///
///     fn process(&mut self, context: &mut ProcessContext<'_, '_, T>) {
///         if context.is_bypassed {
///             context.copy_input_to_output();
///             return;
///         }
///         for ch in 0..context.num_channels() {
///             context.map_channel(ch, |x| -x);
///         }
///     }
///
///     fn reset(&mut self) {}
/// }
///
/// let mut buffer = AudioBuffer::<f32>::from_fn(1, 4, |_, _| 0.5);
/// Invert.process(&mut ProcessContext::replacing(buffer.as_block()));
/// assert_eq!(buffer.channel(0), &[-0.5; 4]);
/// ```
pub trait Processor<T: Sample> {
    /// Size state and compute coefficients for `spec`. May allocate.
    fn prepare(&mut self, spec: &ProcessSpec);

    /// Process one block. Must not allocate, lock or block.
    fn process(&mut self, context: &mut ProcessContext<'_, '_, T>);

    /// Clear internal state without touching parameters.
    fn reset(&mut self);

    /// Processing latency in samples. Default 0.
    fn latency_samples(&self) -> usize {
        0
    }
}

/// Extension trait for chaining processors.
pub trait ProcessorExt<T: Sample>: Processor<T> + Sized {
    /// Feed this processor's output into `next`.
    fn chain<P: Processor<T>>(self, next: P) -> Chain<Self, P> {
        Chain {
            first: self,
            second: next,
        }
    }
}

impl<T: Sample, P: Processor<T>> ProcessorExt<T> for P {}

/// Two processors in series, created by [`ProcessorExt::chain`].
#[derive(Debug, Clone)]
pub struct Chain<A, B> {
    first: A,
    second: B,
}

impl<T: Sample, A: Processor<T>, B: Processor<T>> Processor<T> for Chain<A, B> {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.first.prepare(spec);
        self.second.prepare(spec);
    }

    fn process(&mut self, context: &mut ProcessContext<'_, '_, T>) {
        self.first.process(context);
        self.second.process(&mut context.as_replacing());
    }

    fn reset(&mut self) {
        self.first.reset();
        self.second.reset();
    }

    fn latency_samples(&self) -> usize {
        self.first.latency_samples() + self.second.latency_samples()
    }
}

impl<A, B> Chain<A, B> {
    /// The first processor.
    pub fn first(&self) -> &A {
        &self.first
    }

    /// The first processor, mutably.
    pub fn first_mut(&mut self) -> &mut A {
        &mut self.first
    }

    /// The second processor.
    pub fn second(&self) -> &B {
        &self.second
    }

    /// The second processor, mutably.
    pub fn second_mut(&mut self) -> &mut B {
        &mut self.second
    }
}
