//! Prefix/suffix decoration of every allocation.
//!
//! # Safety
//!
//! Each underlying allocation is laid out as `[prefix][block][suffix]`; the
//! caller only ever sees the interior block, so the affixes cannot be
//! aliased by caller data. Affix values are written and read with unaligned
//! accesses because the underlying allocator makes no alignment promise.

use core::marker::PhantomData;
use core::mem;

use crate::allocator::Allocator;
use crate::block::Block;

/// Attaches fixed-size metadata before and/or after every block.
///
/// An absent affix is `()` — zero bytes, so the decoration disappears
/// entirely. Both affix types must implement [`Default`]: the prefix and
/// suffix are default-constructed as soon as an underlying allocation
/// succeeds. With verification enabled the affix values are dropped in
/// place just before the underlying block is released; without it they are
/// never explicitly destroyed, which restricts affixes to types with
/// trivial drop semantics.
///
/// Typical uses are canaries for overrun detection, tags, and reference
/// counts, none of which touch the allocation call sites.
pub struct AffixAllocator<A, P = (), S = ()> {
    inner: A,
    verify: bool,
    _affixes: PhantomData<(P, S)>,
}

impl<A: Allocator, P: Default, S: Default> AffixAllocator<A, P, S> {
    /// Bytes occupied by the prefix.
    pub const PREFIX_SIZE: usize = mem::size_of::<P>();
    /// Bytes occupied by the suffix.
    pub const SUFFIX_SIZE: usize = mem::size_of::<S>();

    /// Decorates `inner` without affix verification on release.
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            verify: false,
            _affixes: PhantomData,
        }
    }

    /// Decorates `inner` and drops the affix values in place before each
    /// underlying release.
    pub fn with_verification(inner: A) -> Self {
        Self {
            inner,
            verify: true,
            _affixes: PhantomData,
        }
    }

    /// The underlying allocator.
    #[inline]
    pub fn inner(&self) -> &A {
        &self.inner
    }

    /// Mutable access to the underlying allocator.
    #[inline]
    pub fn inner_mut(&mut self) -> &mut A {
        &mut self.inner
    }

    /// Whether affixes are dropped before release.
    #[inline]
    pub fn verifies(&self) -> bool {
        self.verify
    }

    /// Full underlying size for a caller request of `size` bytes.
    #[inline]
    fn decorated_size(size: usize) -> Option<usize> {
        size.checked_add(Self::PREFIX_SIZE)?
            .checked_add(Self::SUFFIX_SIZE)
    }

    /// Reconstructs the full underlying block from a caller-visible block.
    ///
    /// Uses wrapping arithmetic so reconstruction stays harmless for
    /// arbitrary query blocks passed to `owns`.
    #[inline]
    fn original_block(block: &Block) -> Block {
        Block::from_raw_parts(
            block.as_ptr().wrapping_sub(Self::PREFIX_SIZE),
            block.size() + Self::PREFIX_SIZE + Self::SUFFIX_SIZE,
        )
    }
}

// SAFETY: the caller-visible block is the interior of an underlying
// allocation large enough for both affixes; the interior spans of distinct
// allocations are disjoint because the underlying allocations are.
unsafe impl<A: Allocator, P: Default, S: Default> Allocator for AffixAllocator<A, P, S> {
    fn allocate(&mut self, size: usize) -> Block {
        if size == 0 {
            return Block::NULL;
        }
        let Some(total) = Self::decorated_size(size) else {
            return Block::NULL;
        };
        let underlying = self.inner.allocate(total);
        if underlying.is_null() {
            return Block::NULL;
        }

        // SAFETY: underlying spans `total` bytes: the prefix occupies
        // [0, PREFIX_SIZE) and the suffix [PREFIX_SIZE + size, total).
        // Zero-sized affixes write nothing but still run their Default.
        unsafe {
            underlying.as_ptr().cast::<P>().write_unaligned(P::default());
            underlying
                .as_ptr()
                .add(Self::PREFIX_SIZE + size)
                .cast::<S>()
                .write_unaligned(S::default());
            Block::from_raw_parts(underlying.as_ptr().add(Self::PREFIX_SIZE), size)
        }
    }

    unsafe fn deallocate(&mut self, block: &mut Block) {
        if block.is_null() {
            return;
        }
        let mut underlying = Self::original_block(block);
        if !self.inner.owns(&underlying) {
            return;
        }
        if self.verify {
            // SAFETY: both affixes were default-constructed at allocation;
            // reading them out by value runs their drop glue in place of an
            // explicit destructor call.
            unsafe {
                drop(underlying.as_ptr().cast::<P>().read_unaligned());
                drop(
                    underlying
                        .as_ptr()
                        .add(Self::PREFIX_SIZE + block.size())
                        .cast::<S>()
                        .read_unaligned(),
                );
            }
        }
        // SAFETY: the reconstructed block is exactly what the underlying
        // allocator produced for this allocation.
        unsafe { self.inner.deallocate(&mut underlying) };
        if underlying.is_null() {
            *block = Block::NULL;
        }
    }

    fn owns(&self, block: &Block) -> bool {
        self.inner.owns(&Self::original_block(block))
    }
}
