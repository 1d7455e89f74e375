//! Hot-path comparison of the allocator building blocks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mosaic_memory::prelude::*;

fn bench_mallocator(c: &mut Criterion) {
    c.bench_function("mallocator/alloc_free_64", |b| {
        let mut allocator = Mallocator;
        b.iter(|| {
            let mut block = allocator.allocate(black_box(64));
            // SAFETY: block came from this allocator.
            unsafe { allocator.deallocate(&mut block) };
            block
        })
    });
}

fn bench_stack(c: &mut Criterion) {
    c.bench_function("stack/alloc_free_64", |b| {
        let mut allocator = StackAllocator::with_alignment(1 << 16, 8).expect("allocator");
        b.iter(|| {
            let mut block = allocator.allocate(black_box(64));
            // SAFETY: the block is the most recent allocation.
            unsafe { allocator.deallocate(&mut block) };
            block
        })
    });
}

fn bench_free_list(c: &mut Criterion) {
    c.bench_function("free_list/warm_alloc_free_64", |b| {
        let mut list = FreeList::new(Mallocator, 8, 0, 64, 128).expect("list");
        // Warm the list so iterations measure recycling, not refills.
        let mut warm = list.allocate(64);
        // SAFETY: warm came from this list.
        unsafe { list.deallocate(&mut warm) };

        b.iter(|| {
            let mut block = list.allocate(black_box(64));
            // SAFETY: block came from this list.
            unsafe { list.deallocate(&mut block) };
            block
        })
    });
}

fn bench_composed_tree(c: &mut Criterion) {
    c.bench_function("composed/small_object_alloc_free", |b| {
        let region = StackAllocator::with_alignment(1 << 16, 8).expect("region");
        let mut tree = FallbackAllocator::new(
            FreeList::new(region, 8, 0, 64, 256).expect("free list"),
            Mallocator,
        );

        b.iter(|| {
            let mut block = tree.allocate(black_box(48));
            // SAFETY: block came from this tree.
            unsafe { tree.deallocate(&mut block) };
            block
        })
    });
}

criterion_group!(
    benches,
    bench_mallocator,
    bench_stack,
    bench_free_list,
    bench_composed_tree
);
criterion_main!(benches);
