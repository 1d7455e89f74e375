//! The capability contract every allocator building block satisfies.
//!
//! # Safety
//!
//! [`Allocator`] is an unsafe trait: implementors promise that every
//! non-null block returned by [`allocate`](Allocator::allocate) addresses
//! `size` bytes of memory that are valid for reads and writes and disjoint
//! from every other live allocation of the same tree, and that the block
//! stays valid until it is deallocated or the allocator is dropped,
//! whichever comes first.
//!
//! Misuse — deallocating a block through an allocator that did not produce
//! it, deallocating the same block twice, or handing back an address that
//! does not exactly match a prior allocation — is undefined behavior by
//! contract, not a reported error. Policies insert `owns` guards only where
//! the check is cheap; nothing performs broader validation.

use crate::block::Block;

/// A composable allocation policy.
///
/// Anything implementing this trait can serve as a leaf or as a child of a
/// combinator anywhere in a composition tree. Composition is by value and
/// monomorphized: a combinator owns its children for its entire lifetime and
/// no child is shared between two composites.
///
/// The mutating operations take `&mut self`: no allocator in this crate
/// synchronizes concurrent callers, and exclusive access per instance is the
/// concurrency contract. Callers wanting cross-thread use serialize
/// externally or keep one tree per thread.
///
/// # Safety
///
/// See the [module docs](self) for the implementor contract.
pub unsafe trait Allocator {
    /// Allocates a block of `size` bytes.
    ///
    /// Returns the null block on any failure: a zero-size request, a size
    /// this policy cannot serve, or exhaustion upstream. The two cases are
    /// deliberately indistinguishable; every result must be checked with
    /// [`Block::is_null`].
    fn allocate(&mut self, size: usize) -> Block;

    /// Deallocates `block`, resetting it to [`Block::NULL`] on success.
    ///
    /// Calling this with an already-null block is a no-op. A block the
    /// allocator does not recognize is left untouched where the policy
    /// guards with [`owns`](Allocator::owns); see each policy for its exact
    /// reclamation rules.
    ///
    /// # Safety
    ///
    /// `block` must be the null block, or a block produced by a prior
    /// [`allocate`](Allocator::allocate) on this same instance (or a
    /// descendant of it) that has not yet been deallocated.
    unsafe fn deallocate(&mut self, block: &mut Block);

    /// Whether this allocator recognizes `block` as one it (or a descendant)
    /// produced.
    ///
    /// This is a predicate, not a resource claim; leaves answer from their
    /// own bookkeeping and combinators by delegation.
    fn owns(&self, block: &Block) -> bool;
}

// SAFETY: forwards every call to the underlying allocator, preserving its
// contract; no new unsafe operations are introduced.
unsafe impl<A: Allocator + ?Sized> Allocator for &mut A {
    #[inline]
    fn allocate(&mut self, size: usize) -> Block {
        (**self).allocate(size)
    }

    #[inline]
    unsafe fn deallocate(&mut self, block: &mut Block) {
        // SAFETY: same contract as the underlying deallocate.
        unsafe { (**self).deallocate(block) }
    }

    #[inline]
    fn owns(&self, block: &Block) -> bool {
        (**self).owns(block)
    }
}
