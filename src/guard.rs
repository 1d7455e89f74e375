//! RAII ownership of a single allocation.

use core::ops::Deref;

use crate::allocator::Allocator;
use crate::block::Block;

/// Owns one block for the duration of a scope.
///
/// The guard allocates on construction and deallocates on drop, borrowing
/// the allocator mutably for its whole lifetime so the pairing cannot be
/// broken. Allocation failure is not an error: the guard then holds the
/// null block and its drop does nothing, so the result must still be
/// checked before use.
///
/// This is the crate's safe wrapper over the unsafe
/// [`deallocate`](Allocator::deallocate) — the guard is the only holder of
/// the block, so the matched-pair requirement holds by construction.
pub struct BlockGuard<'a, A: Allocator> {
    allocator: &'a mut A,
    block: Block,
}

impl<'a, A: Allocator> BlockGuard<'a, A> {
    /// Allocates `size` bytes from `allocator`, tying the block's lifetime
    /// to the guard's scope.
    pub fn new(allocator: &'a mut A, size: usize) -> Self {
        let block = allocator.allocate(size);
        Self { allocator, block }
    }

    /// The guarded block (the null block if allocation failed).
    #[inline]
    pub fn block(&self) -> Block {
        self.block
    }

    /// Whether the allocation failed.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.block.is_null()
    }
}

impl<A: Allocator> Deref for BlockGuard<'_, A> {
    type Target = Block;

    fn deref(&self) -> &Block {
        &self.block
    }
}

impl<A: Allocator> Drop for BlockGuard<'_, A> {
    fn drop(&mut self) {
        if !self.block.is_null() {
            // SAFETY: the block was produced by this allocator in new() and
            // the guard held it exclusively ever since.
            unsafe { self.allocator.deallocate(&mut self.block) };
        }
    }
}
