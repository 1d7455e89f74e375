//! The always-failing terminal allocator.

use crate::allocator::Allocator;
use crate::block::Block;

/// An allocator capable of allocating only the null block.
///
/// Useful as a safe terminal in combinator chains — it is the default
/// secondary of [`FallbackAllocator`](crate::FallbackAllocator) when no real
/// fallback exists.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAllocator;

// SAFETY: never returns a non-null block, so there is no memory to account
// for; deallocate is a no-op.
unsafe impl Allocator for NullAllocator {
    fn allocate(&mut self, _size: usize) -> Block {
        Block::NULL
    }

    unsafe fn deallocate(&mut self, _block: &mut Block) {}

    fn owns(&self, block: &Block) -> bool {
        *block == Block::NULL
    }
}
