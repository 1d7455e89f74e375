//! Size-threshold dispatch between two allocators.

use crate::allocator::Allocator;
use crate::block::Block;

/// Routes requests by size: at or below the threshold to the primary,
/// above it to the secondary.
///
/// The threshold is inclusive to the primary — a request of exactly
/// `threshold` bytes goes to the primary. Deallocation and ownership checks
/// route the same way, keyed on the block's recorded size, so each child
/// only ever sees blocks of sizes it could have produced.
pub struct Segregator<P, S> {
    threshold: usize,
    primary: P,
    secondary: S,
}

impl<P, S> Segregator<P, S> {
    /// Segregates at `threshold` bytes between `primary` (small requests)
    /// and `secondary` (large requests).
    pub fn new(threshold: usize, primary: P, secondary: S) -> Self {
        Self {
            threshold,
            primary,
            secondary,
        }
    }

    /// The segregation threshold in bytes.
    #[inline]
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// The allocator serving sizes at or below the threshold.
    #[inline]
    pub fn primary(&self) -> &P {
        &self.primary
    }

    /// Mutable access to the small-size allocator.
    #[inline]
    pub fn primary_mut(&mut self) -> &mut P {
        &mut self.primary
    }

    /// The allocator serving sizes above the threshold.
    #[inline]
    pub fn secondary(&self) -> &S {
        &self.secondary
    }

    /// Mutable access to the large-size allocator.
    #[inline]
    pub fn secondary_mut(&mut self) -> &mut S {
        &mut self.secondary
    }
}

// SAFETY: routing is a pure function of the size recorded in the block, so
// every block reaches exactly the child that produced it.
unsafe impl<P: Allocator, S: Allocator> Allocator for Segregator<P, S> {
    fn allocate(&mut self, size: usize) -> Block {
        if size <= self.threshold {
            self.primary.allocate(size)
        } else {
            self.secondary.allocate(size)
        }
    }

    unsafe fn deallocate(&mut self, block: &mut Block) {
        if block.size() <= self.threshold {
            // SAFETY: small blocks can only have come from the primary.
            unsafe { self.primary.deallocate(block) };
        } else {
            // SAFETY: large blocks can only have come from the secondary.
            unsafe { self.secondary.deallocate(block) };
        }
    }

    fn owns(&self, block: &Block) -> bool {
        if block.size() <= self.threshold {
            self.primary.owns(block)
        } else {
            self.secondary.owns(block)
        }
    }
}
