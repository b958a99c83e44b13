//! Index bookkeeping for a single-threaded ring buffer.
//!
//! [`SingleThreadedFifo`] owns no samples; it hands out the (at most two)
//! contiguous index ranges a write or read of `n` items touches, so callers
//! can copy whole runs into and out of their own storage.

use core::ops::Range;

/// Ring-buffer read/write cursor pair for one thread.
///
/// # Example
///
/// ```rust
/// use ballast_core::SingleThreadedFifo;
///
/// let mut fifo = SingleThreadedFifo::new(8);
/// let _ = fifo.write(6);
/// let _ = fifo.read(6);
/// let [a, b] = fifo.write(4);
/// assert_eq!((a, b), (6..8, 0..2));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SingleThreadedFifo {
    size: usize,
    read_pos: usize,
    write_pos: usize,
    num_readable: usize,
}

impl SingleThreadedFifo {
    /// Create a FIFO over `size` slots.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            read_pos: 0,
            write_pos: 0,
            num_readable: 0,
        }
    }

    /// Total slots.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Slots available for writing.
    pub fn remaining_space(&self) -> usize {
        self.size - self.num_readable
    }

    /// Slots available for reading.
    pub fn num_readable(&self) -> usize {
        self.num_readable
    }

    /// Claim up to `num` slots for writing; returns the ranges in order.
    ///
    /// Requests beyond [`remaining_space`](Self::remaining_space) are truncated.
    pub fn write(&mut self, num: usize) -> [Range<usize>; 2] {
        debug_assert!(num <= self.remaining_space(), "fifo overflow");
        let num = num.min(self.remaining_space());
        let ranges = self.split(self.write_pos, num);
        self.write_pos = (self.write_pos + num) % self.size.max(1);
        self.num_readable += num;
        ranges
    }

    /// Consume up to `num` slots for reading; returns the ranges in order.
    ///
    /// Requests beyond [`num_readable`](Self::num_readable) are truncated.
    pub fn read(&mut self, num: usize) -> [Range<usize>; 2] {
        debug_assert!(num <= self.num_readable, "fifo underflow");
        let num = num.min(self.num_readable);
        let ranges = self.split(self.read_pos, num);
        self.read_pos = (self.read_pos + num) % self.size.max(1);
        self.num_readable -= num;
        ranges
    }

    /// Forget all buffered items.
    pub fn clear(&mut self) {
        self.read_pos = 0;
        self.write_pos = 0;
        self.num_readable = 0;
    }

    fn split(&self, start: usize, num: usize) -> [Range<usize>; 2] {
        let first = num.min(self.size - start.min(self.size));
        [start..start + first, 0..num - first]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_into_two_ranges() {
        let mut fifo = SingleThreadedFifo::new(4);
        assert_eq!(fifo.write(3), [0..3, 0..0]);
        assert_eq!(fifo.read(2), [0..2, 0..0]);
        assert_eq!(fifo.write(3), [3..4, 0..2]);
        assert_eq!(fifo.num_readable(), 4);
        assert_eq!(fifo.remaining_space(), 0);
        assert_eq!(fifo.read(4), [2..4, 0..2]);
        assert_eq!(fifo.num_readable(), 0);
    }

    #[test]
    fn exact_fill_leaves_empty_second_range() {
        let mut fifo = SingleThreadedFifo::new(8);
        assert_eq!(fifo.write(8), [0..8, 0..0]);
        assert_eq!(fifo.read(8), [0..8, 0..0]);
        assert_eq!(fifo.write(1), [0..1, 0..0]);
    }

    #[test]
    fn clear_resets_cursors() {
        let mut fifo = SingleThreadedFifo::new(8);
        let _ = fifo.write(5);
        fifo.clear();
        assert_eq!(fifo.num_readable(), 0);
        assert_eq!(fifo.write(2), [0..2, 0..0]);
    }
}
