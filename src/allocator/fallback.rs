//! Primary-then-secondary fallback composition.

use crate::allocator::{Allocator, NullAllocator};
use crate::block::Block;

/// Tries the primary allocator and falls back to the secondary.
///
/// The secondary defaults to [`NullAllocator`], turning a lone policy into a
/// total one: a failed primary yields the null block instead of needing a
/// real fallback.
pub struct FallbackAllocator<P, S = NullAllocator> {
    primary: P,
    secondary: S,
}

impl<P, S> FallbackAllocator<P, S> {
    /// Composes `primary` over `secondary`.
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }

    /// The primary allocator.
    #[inline]
    pub fn primary(&self) -> &P {
        &self.primary
    }

    /// Mutable access to the primary allocator.
    #[inline]
    pub fn primary_mut(&mut self) -> &mut P {
        &mut self.primary
    }

    /// The secondary allocator.
    #[inline]
    pub fn secondary(&self) -> &S {
        &self.secondary
    }

    /// Mutable access to the secondary allocator.
    #[inline]
    pub fn secondary_mut(&mut self) -> &mut S {
        &mut self.secondary
    }
}

impl<P> FallbackAllocator<P, NullAllocator> {
    /// Composes `primary` over the always-failing terminal.
    pub fn without_secondary(primary: P) -> Self {
        Self::new(primary, NullAllocator)
    }
}

// SAFETY: every block comes from exactly one child and is routed back to
// the child that owns it; the children's contracts carry over unchanged.
unsafe impl<P: Allocator, S: Allocator> Allocator for FallbackAllocator<P, S> {
    fn allocate(&mut self, size: usize) -> Block {
        let block = self.primary.allocate(size);
        if !block.is_null() {
            return block;
        }
        self.secondary.allocate(size)
    }

    unsafe fn deallocate(&mut self, block: &mut Block) {
        if self.primary.owns(block) {
            // SAFETY: the primary recognized the block as its own.
            unsafe { self.primary.deallocate(block) };
        } else if self.secondary.owns(block) {
            // SAFETY: the secondary recognized the block as its own.
            unsafe { self.secondary.deallocate(block) };
        }
    }

    fn owns(&self, block: &Block) -> bool {
        self.primary.owns(block) || self.secondary.owns(block)
    }
}
