//! Size-bucket dispatch across many independent allocator instances.

use crate::allocator::Allocator;
use crate::block::Block;
use crate::error::{ConfigError, Result};

/// Dispatches each request to one of `(max - min) / step` size buckets.
///
/// The serviceable range is half-open: sizes in `[min, max)` map to bucket
/// `(size - min) / step`, anything else is rejected without touching any
/// bucket. Each bucket is an independent allocator built by the caller's
/// factory, which receives the bucket's inclusive bounds and must size the
/// child to serve up to the bucket's upper bound.
pub struct Bucketizer<A> {
    min_size: usize,
    max_size: usize,
    step: usize,
    buckets: Vec<A>,
}

impl<A> Bucketizer<A> {
    /// Builds the bucket array for `[min, max)` with the given `step`.
    ///
    /// `step` must be non-zero and divide `max - min` evenly; the factory is
    /// called once per bucket with that bucket's `[bucket_min, bucket_max]`
    /// serviceable bounds, lowest bucket first.
    pub fn new(
        min_size: usize,
        max_size: usize,
        step: usize,
        mut factory: impl FnMut(usize, usize) -> A,
    ) -> Result<Self> {
        if step == 0 {
            return Err(ConfigError::zero("step"));
        }
        if min_size >= max_size {
            return Err(ConfigError::invalid_size_range(min_size, max_size));
        }
        let span = max_size - min_size;
        if span % step != 0 {
            return Err(ConfigError::uneven_step(span, step));
        }

        let buckets = (0..span / step)
            .map(|index| {
                let bucket_min = min_size + index * step;
                factory(bucket_min, bucket_min + step - 1)
            })
            .collect();
        Ok(Self {
            min_size,
            max_size,
            step,
            buckets,
        })
    }

    /// Number of buckets.
    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// The bucket at `index`, if any.
    #[inline]
    pub fn bucket(&self, index: usize) -> Option<&A> {
        self.buckets.get(index)
    }

    /// Mutable access to the bucket at `index`, if any.
    #[inline]
    pub fn bucket_mut(&mut self, index: usize) -> Option<&mut A> {
        self.buckets.get_mut(index)
    }

    /// The bucket index serving `size`, if the size is in range.
    #[inline]
    fn bucket_index(&self, size: usize) -> Option<usize> {
        if size < self.min_size || size >= self.max_size {
            return None;
        }
        Some((size - self.min_size) / self.step)
    }
}

// SAFETY: the bucket index is a pure function of the size recorded in the
// block, so every block is routed back to the bucket that produced it.
unsafe impl<A: Allocator> Allocator for Bucketizer<A> {
    fn allocate(&mut self, size: usize) -> Block {
        match self.bucket_index(size) {
            Some(index) => self.buckets[index].allocate(size),
            None => Block::NULL,
        }
    }

    unsafe fn deallocate(&mut self, block: &mut Block) {
        if let Some(index) = self.bucket_index(block.size()) {
            // SAFETY: a block of this size can only have come from this
            // bucket.
            unsafe { self.buckets[index].deallocate(block) };
        }
    }

    fn owns(&self, block: &Block) -> bool {
        match self.bucket_index(block.size()) {
            Some(index) => self.buckets[index].owns(block),
            None => false,
        }
    }
}
