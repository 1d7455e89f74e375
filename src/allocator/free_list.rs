//! A recycling cache of same-shaped blocks over any underlying allocator.
//!
//! # Safety
//!
//! Every underlying allocation is `max + size_of::<FreeNode>()` bytes: the
//! node header lives at the start and the caller-visible block starts just
//! past it. The header region is never handed to callers, so writing and
//! reading node headers never aliases caller data. Headers are accessed with
//! unaligned reads/writes because the underlying allocator makes no
//! alignment promise.
//!
//! ## Invariants
//!
//! - Each cached node is owned by exactly the list (pushed at most once
//!   between pops); ownership transfers to the caller on pop and back on
//!   deallocate.
//! - `allocations` counts successful underlying allocations and never
//!   decreases; it never exceeds `capacity`.
//! - Nodes are only released through the underlying allocator when the list
//!   itself is dropped.

use core::mem;
use core::ptr;

use crate::allocator::Allocator;
use crate::block::Block;
use crate::error::{ConfigError, Result};

/// Intrusive list entry written at the head of each underlying allocation.
///
/// `block` records the full underlying block so drop can return exactly what
/// was allocated; `next` is an owning link to the next cached node.
#[repr(C)]
#[derive(Clone, Copy)]
struct FreeNode {
    block: Block,
    next: *mut FreeNode,
}

const NODE_SIZE: usize = mem::size_of::<FreeNode>();

/// Recycles fixed-shape blocks instead of returning them upstream.
///
/// Serves requests in the inclusive `[min, max]` size range. Freed blocks
/// are pushed onto a private stack and handed back, warm, to the next
/// request; the underlying allocator is only consulted when the stack is
/// empty, in batches of `batch_size`, and never more than `capacity` times
/// over the list's lifetime. Everything the list ever obtained is released
/// through the underlying allocator when the list is dropped.
pub struct FreeList<A: Allocator> {
    inner: A,
    batch_size: usize,
    min_size: usize,
    max_size: usize,
    capacity: usize,
    head: *mut FreeNode,
    /// Watermark: underlying allocations performed so far.
    allocations: usize,
}

impl<A: Allocator> FreeList<A> {
    /// Creates a free list over `inner`.
    ///
    /// `batch_size` underlying allocations are performed per refill (must be
    /// non-zero), `[min, max]` is the serviceable request range, and
    /// `capacity` bounds the number of underlying allocations the list may
    /// ever perform.
    pub fn new(
        inner: A,
        batch_size: usize,
        min_size: usize,
        max_size: usize,
        capacity: usize,
    ) -> Result<Self> {
        if batch_size == 0 {
            return Err(ConfigError::zero("batch size"));
        }
        if min_size > max_size {
            return Err(ConfigError::invalid_size_range(min_size, max_size));
        }
        Ok(Self {
            inner,
            batch_size,
            min_size,
            max_size,
            capacity,
            head: ptr::null_mut(),
            allocations: 0,
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

    /// Underlying allocations performed so far (bounded by the capacity).
    #[inline]
    pub fn allocations(&self) -> usize {
        self.allocations
    }

    /// Number of blocks currently cached on the list.
    pub fn cached(&self) -> usize {
        let mut count = 0;
        let mut node_ptr = self.head;
        while !node_ptr.is_null() {
            // SAFETY: every pointer on the list addresses a node header this
            // list wrote; the walk is bounded by the watermark capacity.
            let node = unsafe { node_ptr.read_unaligned() };
            node_ptr = node.next;
            count += 1;
        }
        count
    }

    #[inline]
    fn in_range(&self, size: usize) -> bool {
        size >= self.min_size && size <= self.max_size
    }

    /// Bytes requested from the underlying allocator per node.
    #[inline]
    fn node_allocation_size(&self) -> usize {
        self.max_size + NODE_SIZE
    }

    fn push(&mut self, node_ptr: *mut FreeNode, underlying: Block) {
        let node = FreeNode {
            block: underlying,
            next: self.head,
        };
        // SAFETY: node_ptr addresses the header region of an underlying
        // allocation owned by this list; unaligned write because the
        // underlying allocator guarantees no alignment.
        unsafe { node_ptr.write_unaligned(node) };
        self.head = node_ptr;
    }

    fn pop(&mut self) -> Option<Block> {
        if self.head.is_null() {
            return None;
        }
        // SAFETY: head was pushed by this list and addresses a live header.
        let node = unsafe { self.head.read_unaligned() };
        self.head = node.next;
        Some(node.block)
    }

    /// The caller-visible block inside an underlying allocation.
    fn user_block(underlying: Block) -> Block {
        // SAFETY: every underlying block is node_allocation_size() bytes, so
        // the header offset stays in bounds.
        let address = unsafe { underlying.as_ptr().add(NODE_SIZE) };
        Block::from_raw_parts(address, underlying.size() - NODE_SIZE)
    }

    /// Refills the list from the underlying allocator.
    ///
    /// Returns the first freshly obtained underlying block; the rest of the
    /// batch is cached. Stops early at the watermark or on underlying
    /// failure — only successful underlying allocations count.
    fn refill(&mut self) -> Option<Block> {
        let mut first: Option<Block> = None;
        for _ in 0..self.batch_size {
            if self.allocations >= self.capacity {
                break;
            }
            let underlying = self.inner.allocate(self.node_allocation_size());
            if underlying.is_null() {
                break;
            }
            self.allocations += 1;
            if first.is_none() {
                first = Some(underlying);
            } else {
                self.push(underlying.as_ptr().cast(), underlying);
            }
        }
        #[cfg(feature = "logging")]
        if first.is_none() {
            log::trace!(
                "free list refill failed at {}/{} underlying allocations",
                self.allocations,
                self.capacity
            );
        }
        first
    }
}

// SAFETY: the list structure is exclusively owned and only mutated through
// &mut self; owns() reads no list state beyond plain fields.
unsafe impl<A: Allocator + Send> Send for FreeList<A> {}
unsafe impl<A: Allocator + Sync> Sync for FreeList<A> {}

// SAFETY: caller-visible blocks are disjoint interior spans of underlying
// allocations owned by this list; a block is either out with the caller or
// cached, never both.
unsafe impl<A: Allocator> Allocator for FreeList<A> {
    fn allocate(&mut self, size: usize) -> Block {
        if size == 0 || !self.in_range(size) {
            return Block::NULL;
        }
        if let Some(underlying) = self.pop() {
            return Self::user_block(underlying);
        }
        match self.refill() {
            Some(underlying) => Self::user_block(underlying),
            None => Block::NULL,
        }
    }

    unsafe fn deallocate(&mut self, block: &mut Block) {
        if block.is_null() || !self.owns(block) {
            return;
        }
        // SAFETY: owned blocks sit NODE_SIZE past their underlying
        // allocation, whose header region we reuse for the node.
        let node_ptr = unsafe { block.as_ptr().sub(NODE_SIZE) };
        let underlying = Block::from_raw_parts(node_ptr, block.size() + NODE_SIZE);
        self.push(node_ptr.cast(), underlying);
        *block = Block::NULL;
    }

    fn owns(&self, block: &Block) -> bool {
        if !self.in_range(block.size()) {
            return false;
        }
        // Reconstruct the node-adjusted underlying block and let the
        // underlying allocator answer. wrapping_sub keeps the reconstruction
        // harmless for arbitrary query blocks.
        let adjusted = Block::from_raw_parts(
            block.as_ptr().wrapping_sub(NODE_SIZE),
            block.size() + NODE_SIZE,
        );
        self.inner.owns(&adjusted)
    }
}

impl<A: Allocator> Drop for FreeList<A> {
    fn drop(&mut self) {
        while let Some(mut underlying) = self.pop() {
            // SAFETY: cached underlying blocks were produced by self.inner.
            unsafe { self.inner.deallocate(&mut underlying) };
        }
    }
}
