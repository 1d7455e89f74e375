//! A fixed-capacity pool of equal-size slots tracked by a bitmap.
//!
//! # Safety
//!
//! The pool performs a single underlying allocation sized to hold the bitmap
//! area followed by `capacity` slots. Callers only ever receive slot
//! payloads; the bitmap flags themselves are kept in an allocator-owned
//! buffer, so the pool's bookkeeping never shares memory with caller data
//! and deallocation is pure index arithmetic.
//!
//! ## Invariants
//!
//! - Bit *i* is set iff slot *i* is currently allocated.
//! - Slot addresses are `data_start + i * slot_size` with `data_start`
//!   aligned forward from the end of the bitmap area; the alignment slack in
//!   the underlying request guarantees the last slot stays in bounds.
//! - The underlying region is requested at most once; a failed request makes
//!   every later allocation fail.

use crate::allocator::Allocator;
use crate::block::Block;
use crate::error::{ConfigError, Result};
use crate::utils::align_up;

/// A map of bit flags, one per slot, packed eight per byte with the
/// most-significant bit first within each byte.
#[derive(Debug, Clone)]
pub struct Bitmap {
    flags: Box<[u8]>,
    bits: usize,
}

impl Bitmap {
    /// Creates a bitmap of `bits` cleared flags.
    pub fn new(bits: usize) -> Self {
        Self {
            flags: vec![0u8; bits.div_ceil(8)].into_boxed_slice(),
            bits,
        }
    }

    /// Number of flags.
    #[inline]
    pub fn len(&self) -> usize {
        self.bits
    }

    /// Whether the bitmap has no flags at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Number of bytes backing the flags.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.flags.len()
    }

    #[inline]
    fn mask(index: usize) -> u8 {
        0b1000_0000 >> (index % 8)
    }

    /// Sets flag `index`.
    #[inline]
    pub fn set(&mut self, index: usize) {
        self.flags[index / 8] |= Self::mask(index);
    }

    /// Clears flag `index`.
    #[inline]
    pub fn reset(&mut self, index: usize) {
        self.flags[index / 8] &= !Self::mask(index);
    }

    /// Clears every flag.
    pub fn reset_all(&mut self) {
        self.flags.fill(0);
    }

    /// Whether flag `index` is set.
    #[inline]
    pub fn is_set(&self, index: usize) -> bool {
        self.flags[index / 8] & Self::mask(index) != 0
    }

    /// Claims the lowest clear flag: scans byte by byte, then bit by bit
    /// most-significant first, sets the flag found and returns its index.
    ///
    /// The ascending first-fit order is deterministic and part of the
    /// contract — freeing a slot and allocating again reuses that exact
    /// slot.
    pub fn claim(&mut self) -> Option<usize> {
        for byte_index in 0..self.flags.len() {
            let byte = self.flags[byte_index];
            if byte == u8::MAX {
                continue;
            }
            let index = byte_index * 8 + byte.leading_ones() as usize;
            if index >= self.bits {
                return None;
            }
            self.flags[byte_index] |= Self::mask(index);
            return Some(index);
        }
        None
    }
}

/// A contiguous region divided into equal slots with a bitmap tracking
/// availability.
///
/// Serves requests in the inclusive `[min, max]` size range from `capacity`
/// slots of `align_up(max, alignment)` bytes each. Slot claim order is
/// first-fit by ascending index; allocation and deallocation are O(1) apart
/// from the bounded bitmap scan.
pub struct BitmappedBlock<A: Allocator> {
    inner: A,
    min_size: usize,
    max_size: usize,
    capacity: usize,
    alignment: usize,
    slot_size: usize,
    bitmap: Bitmap,
    region: Block,
    data_offset: usize,
    region_requested: bool,
}

impl<A: Allocator> BitmappedBlock<A> {
    /// Creates a pool of `capacity` slots (a power of two) serving requests
    /// in `[min, max]`, each slot aligned to `alignment` (a power of two).
    pub fn new(
        inner: A,
        min_size: usize,
        max_size: usize,
        capacity: usize,
        alignment: usize,
    ) -> Result<Self> {
        if max_size == 0 {
            return Err(ConfigError::zero("max size"));
        }
        if min_size > max_size {
            return Err(ConfigError::invalid_size_range(min_size, max_size));
        }
        if !capacity.is_power_of_two() {
            return Err(ConfigError::not_power_of_two("capacity", capacity));
        }
        if !alignment.is_power_of_two() {
            return Err(ConfigError::not_power_of_two("alignment", alignment));
        }
        Ok(Self {
            inner,
            min_size,
            max_size,
            capacity,
            alignment,
            slot_size: align_up(max_size, alignment),
            bitmap: Bitmap::new(capacity),
            region: Block::NULL,
            data_offset: 0,
            region_requested: false,
        })
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

    /// Number of slots.
    #[inline]
    pub fn slots(&self) -> usize {
        self.capacity
    }

    /// Size of each slot in bytes (the aligned max request size).
    #[inline]
    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    /// Bytes requested from the underlying allocator for the whole pool:
    /// bitmap area, all slots, and alignment slack for the data region.
    fn region_size(&self) -> usize {
        self.bitmap.byte_len() + self.capacity * self.slot_size + (self.alignment - 1)
    }

    #[inline]
    fn data_start(&self) -> usize {
        self.region.addr() + self.data_offset
    }

    #[inline]
    fn data_len(&self) -> usize {
        self.capacity * self.slot_size
    }

    /// Acquires the backing region on first use. A failed request is final:
    /// every subsequent allocation fails without retrying.
    fn ensure_region(&mut self) -> bool {
        if !self.region.is_null() {
            return true;
        }
        if self.region_requested {
            return false;
        }
        self.region_requested = true;

        let region = self.inner.allocate(self.region_size());
        if region.is_null() {
            #[cfg(feature = "logging")]
            log::debug!(
                "bitmapped pool failed to acquire its {}-byte region",
                self.region_size()
            );
            return false;
        }
        let data_start = align_up(region.addr() + self.bitmap.byte_len(), self.alignment);
        self.data_offset = data_start - region.addr();
        self.region = region;
        #[cfg(feature = "logging")]
        log::debug!(
            "bitmapped pool acquired {} slots of {} bytes",
            self.capacity,
            self.slot_size
        );
        true
    }
}

// SAFETY: the region handle is exclusively owned and only mutated through
// &mut self; the &self methods read plain fields only.
unsafe impl<A: Allocator + Send> Send for BitmappedBlock<A> {}
unsafe impl<A: Allocator + Sync> Sync for BitmappedBlock<A> {}

// SAFETY: slots are disjoint spans of the single underlying region; a slot
// is handed out only while its bit is set, so no span is aliased.
unsafe impl<A: Allocator> Allocator for BitmappedBlock<A> {
    fn allocate(&mut self, size: usize) -> Block {
        if size == 0 || size < self.min_size || size > self.max_size {
            return Block::NULL;
        }
        if !self.ensure_region() {
            return Block::NULL;
        }
        let Some(index) = self.bitmap.claim() else {
            return Block::NULL;
        };
        // SAFETY: data_offset + capacity * slot_size <= region size by
        // construction (alignment slack included), so the slot span is in
        // bounds.
        let address = unsafe {
            self.region
                .as_ptr()
                .add(self.data_offset + index * self.slot_size)
        };
        Block::from_raw_parts(address, self.slot_size)
    }

    unsafe fn deallocate(&mut self, block: &mut Block) {
        if block.is_null() || !self.owns(block) {
            return;
        }
        // owns() guarantees the address lies inside the data region, so the
        // computed index is always a valid bitmap position. An address that
        // is not an exact slot start clears its containing slot; the bitmap
        // itself can never be corrupted.
        let index = (block.addr() - self.data_start()) / self.slot_size;
        self.bitmap.reset(index);
        *block = Block::NULL;
    }

    fn owns(&self, block: &Block) -> bool {
        if self.region.is_null() {
            return false;
        }
        let addr = block.addr();
        addr >= self.data_start() && addr < self.data_start() + self.data_len()
    }
}

impl<A: Allocator> Drop for BitmappedBlock<A> {
    fn drop(&mut self) {
        if !self.region.is_null() {
            let mut region = self.region;
            // SAFETY: the region was produced by self.inner.allocate.
            unsafe { self.inner.deallocate(&mut region) };
        }
    }
}
