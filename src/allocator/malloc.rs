//! The malloc-backed terminal leaf.

use crate::allocator::Allocator;
use crate::block::Block;

/// An allocator backed by the platform heap through `malloc` and `free`.
///
/// # Ownership caveat
///
/// A raw heap allocator cannot generally distinguish its own allocations
/// from foreign pointers, so [`owns`](Allocator::owns) answers `true` for
/// any non-null address. This is a best-effort approximation; `Mallocator`
/// is meant as a terminal fallback, where the weak check is sufficient
/// because every block that reaches it was rejected by every other layer.
#[derive(Debug, Default, Clone, Copy)]
pub struct Mallocator;

// SAFETY: blocks come straight from malloc with the requested size, so they
// are valid, exclusive, and live until freed.
unsafe impl Allocator for Mallocator {
    fn allocate(&mut self, size: usize) -> Block {
        if size == 0 {
            return Block::NULL;
        }
        // SAFETY: size is non-zero; a null return is mapped to the null
        // block by from_raw_parts.
        let address = unsafe { libc::malloc(size) };
        Block::from_raw_parts(address.cast(), size)
    }

    unsafe fn deallocate(&mut self, block: &mut Block) {
        if block.is_null() {
            return;
        }
        // SAFETY: per the trait contract the address came from a prior
        // allocate on this allocator, i.e. from malloc.
        unsafe { libc::free(block.as_ptr().cast()) };
        *block = Block::NULL;
    }

    fn owns(&self, block: &Block) -> bool {
        !block.is_null()
    }
}
