//! Integration tests for the affix decorator.

mod common;

use core::slice;
use core::sync::atomic::{AtomicUsize, Ordering};

use common::SpyAllocator;
use mosaic_memory::{AffixAllocator, Allocator, Block, Mallocator};

/// Five recognizable marker bytes.
#[derive(Debug, PartialEq, Eq)]
struct Canary {
    marker: [u8; 5],
}

impl Default for Canary {
    fn default() -> Self {
        Self {
            marker: [0, 1, 2, 3, 4],
        }
    }
}

#[test]
fn prefix_shifts_the_visible_block_and_is_default_initialized() {
    let mut tree: AffixAllocator<_, Canary> = AffixAllocator::new(SpyAllocator::new(Mallocator));

    let mut block = tree.allocate(16);
    assert!(!block.is_null());
    assert_eq!(block.size(), 16);

    let underlying = tree.inner().allocated[0];
    assert_eq!(tree.inner().allocate_calls, vec![16 + 5]);
    assert_eq!(block.addr(), underlying.addr() + 5);

    // The five bytes ahead of the visible block hold the default canary.
    // SAFETY: the underlying allocation spans the prefix region.
    let prefix = unsafe { slice::from_raw_parts(underlying.as_ptr(), 5) };
    assert_eq!(prefix, &[0, 1, 2, 3, 4]);

    // SAFETY: block came from this tree.
    unsafe { tree.deallocate(&mut block) };
}

#[test]
fn suffix_sits_just_past_the_visible_block() {
    let mut tree: AffixAllocator<_, (), Canary> =
        AffixAllocator::new(SpyAllocator::new(Mallocator));

    let mut block = tree.allocate(16);
    assert!(!block.is_null());
    assert_eq!(block.size(), 16);

    let underlying = tree.inner().allocated[0];
    assert_eq!(tree.inner().allocate_calls, vec![16 + 5]);
    // No prefix: the visible block starts where the allocation does.
    assert_eq!(block.addr(), underlying.addr());

    // SAFETY: the underlying allocation spans the suffix region.
    let suffix = unsafe { slice::from_raw_parts(underlying.as_ptr().add(16), 5) };
    assert_eq!(suffix, &[0, 1, 2, 3, 4]);

    // SAFETY: block came from this tree.
    unsafe { tree.deallocate(&mut block) };
}

#[test]
fn owns_asks_about_the_recomputed_full_block() {
    let mut tree: AffixAllocator<_, Canary> = AffixAllocator::new(SpyAllocator::new(Mallocator));

    let mut block = tree.allocate(16);
    let underlying = tree.inner().allocated[0];

    assert!(tree.owns(&block));
    let seen = tree.inner().owns_seen.borrow().clone();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].addr(), underlying.addr());
    assert_eq!(seen[0].size(), 16 + 5);

    // SAFETY: block came from this tree.
    unsafe { tree.deallocate(&mut block) };
}

#[test]
fn undecorated_owns_passes_the_block_through() {
    let mut tree: AffixAllocator<_> = AffixAllocator::new(SpyAllocator::new(Mallocator));

    let mut block = tree.allocate(16);
    let underlying = tree.inner().allocated[0];
    assert_eq!(block.addr(), underlying.addr());

    assert!(tree.owns(&block));
    let seen = tree.inner().owns_seen.borrow().clone();
    assert_eq!(seen[0].addr(), underlying.addr());
    assert_eq!(seen[0].size(), 16);

    // SAFETY: block came from this tree.
    unsafe { tree.deallocate(&mut block) };
}

#[test]
fn deallocate_releases_the_full_underlying_block() {
    let mut tree: AffixAllocator<_, Canary> = AffixAllocator::new(SpyAllocator::new(Mallocator));

    let mut block = tree.allocate(16);
    let underlying = tree.inner().allocated[0];

    // SAFETY: block came from this tree.
    unsafe { tree.deallocate(&mut block) };
    assert_eq!(block, Block::NULL);

    let released = &tree.inner().deallocate_calls;
    assert_eq!(released.len(), 1);
    assert_eq!(released[0].addr(), underlying.addr());
    assert_eq!(released[0].size(), 16 + 5);
    // The release was guarded by one ownership check.
    assert_eq!(tree.inner().owns_calls(), 1);
}

#[test]
fn unowned_blocks_are_not_released() {
    let mut spy = SpyAllocator::new(Mallocator);
    spy.owns_override = Some(false);
    let mut tree: AffixAllocator<_, Canary> = AffixAllocator::new(spy);

    let mut probe = [0u8; 32];
    let mut block = Block::from_raw_parts(probe.as_mut_ptr().wrapping_add(5), 16);
    let expected = block;
    // SAFETY: the underlying allocator rejects the block, so nothing is
    // freed.
    unsafe { tree.deallocate(&mut block) };
    assert_eq!(block, expected);
    assert!(tree.inner().deallocate_calls.is_empty());
}

#[test]
fn verification_drops_the_affixes_before_release() {
    static CONSTRUCTED: AtomicUsize = AtomicUsize::new(0);
    static DROPPED: AtomicUsize = AtomicUsize::new(0);

    struct Counted;

    impl Default for Counted {
        fn default() -> Self {
            CONSTRUCTED.fetch_add(1, Ordering::Relaxed);
            Counted
        }
    }

    impl Drop for Counted {
        fn drop(&mut self) {
            DROPPED.fetch_add(1, Ordering::Relaxed);
        }
    }

    let mut tree: AffixAllocator<_, Counted> =
        AffixAllocator::with_verification(SpyAllocator::new(Mallocator));
    assert!(tree.verifies());

    let mut block = tree.allocate(16);
    assert_eq!(CONSTRUCTED.load(Ordering::Relaxed), 1);
    assert_eq!(DROPPED.load(Ordering::Relaxed), 0);

    // SAFETY: block came from this tree.
    unsafe { tree.deallocate(&mut block) };
    assert_eq!(block, Block::NULL);
    assert_eq!(CONSTRUCTED.load(Ordering::Relaxed), 1);
    assert_eq!(DROPPED.load(Ordering::Relaxed), 1);
}

#[test]
fn without_verification_the_affixes_are_never_dropped() {
    static DROPPED: AtomicUsize = AtomicUsize::new(0);

    struct Counted;

    impl Default for Counted {
        fn default() -> Self {
            Counted
        }
    }

    impl Drop for Counted {
        fn drop(&mut self) {
            DROPPED.fetch_add(1, Ordering::Relaxed);
        }
    }

    let mut tree: AffixAllocator<_, Counted> =
        AffixAllocator::new(SpyAllocator::new(Mallocator));
    assert!(!tree.verifies());

    let mut block = tree.allocate(16);
    // SAFETY: block came from this tree.
    unsafe { tree.deallocate(&mut block) };
    assert_eq!(DROPPED.load(Ordering::Relaxed), 0);
}
