//! Shared test support: a recording allocator wrapper.

// Not every test binary uses every knob.
#![allow(dead_code)]

use core::cell::{Cell, RefCell};

use mosaic_memory::{Allocator, Block};

/// Wraps an allocator and records every call made through it, with knobs to
/// force failures and ownership answers. Stands in for a scriptable child
/// when exercising layered and combinator policies.
pub struct SpyAllocator<A> {
    inner: A,
    /// Sizes passed to `allocate`, in call order.
    pub allocate_calls: Vec<usize>,
    /// Blocks successfully returned by `allocate`, in call order.
    pub allocated: Vec<Block>,
    /// Blocks passed to `deallocate`, captured before the call.
    pub deallocate_calls: Vec<Block>,
    /// Blocks passed to `owns`, captured per call.
    pub owns_seen: RefCell<Vec<Block>>,
    owns_count: Cell<usize>,
    /// When set, every `allocate` fails without touching the inner
    /// allocator.
    pub fail_allocations: bool,
    /// When set, `owns` answers this instead of asking the inner allocator.
    pub owns_override: Option<bool>,
}

impl<A: Allocator> SpyAllocator<A> {
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            allocate_calls: Vec::new(),
            allocated: Vec::new(),
            deallocate_calls: Vec::new(),
            owns_seen: RefCell::new(Vec::new()),
            owns_count: Cell::new(0),
            fail_allocations: false,
            owns_override: None,
        }
    }

    pub fn failing(inner: A) -> Self {
        let mut spy = Self::new(inner);
        spy.fail_allocations = true;
        spy
    }

    pub fn owns_calls(&self) -> usize {
        self.owns_count.get()
    }
}

// SAFETY: pure pass-through to the inner allocator; recording adds no
// memory behavior of its own.
unsafe impl<A: Allocator> Allocator for SpyAllocator<A> {
    fn allocate(&mut self, size: usize) -> Block {
        self.allocate_calls.push(size);
        if self.fail_allocations {
            return Block::NULL;
        }
        let block = self.inner.allocate(size);
        if !block.is_null() {
            self.allocated.push(block);
        }
        block
    }

    unsafe fn deallocate(&mut self, block: &mut Block) {
        self.deallocate_calls.push(*block);
        // SAFETY: same contract as the inner deallocate.
        unsafe { self.inner.deallocate(block) };
    }

    fn owns(&self, block: &Block) -> bool {
        self.owns_count.set(self.owns_count.get() + 1);
        self.owns_seen.borrow_mut().push(*block);
        match self.owns_override {
            Some(answer) => answer,
            None => self.inner.owns(block),
        }
    }
}
