//! Composable, policy-based memory allocators.
//!
//! This crate provides small allocation building blocks — a bump allocator,
//! a recycling free list, a fixed-slot bitmap pool, a malloc-backed leaf and
//! a null sentinel — that nest and combine by size threshold, fallback
//! chaining, size-bucket dispatch, and prefix/suffix decoration into a
//! custom allocation strategy, without paying for features not used.
//!
//! Every block speaks the same three-operation contract
//! ([`allocate`](Allocator::allocate), [`deallocate`](Allocator::deallocate),
//! [`owns`](Allocator::owns)) over the [`Block`] value type, and composition
//! is fully monomorphized: nesting types builds the dispatch at compile
//! time.
//!
//! # Example
//!
//! A small-object strategy: recycle up to 64-byte blocks carved from a
//! dedicated region, and send everything else to the heap.
//!
//! ```
//! use mosaic_memory::prelude::*;
//!
//! let region = StackAllocator::with_alignment(4096, 8)?;
//! let mut tree = FallbackAllocator::new(
//!     FreeList::new(region, 4, 0, 64, 4096 / 64)?,
//!     Mallocator,
//! );
//!
//! let mut small = tree.allocate(48);
//! let mut large = tree.allocate(4096);
//! assert!(!small.is_null() && !large.is_null());
//!
//! // SAFETY: both blocks came from this tree.
//! unsafe {
//!     tree.deallocate(&mut small);
//!     tree.deallocate(&mut large);
//! }
//! assert!(small.is_null() && large.is_null());
//! # Ok::<(), mosaic_memory::ConfigError>(())
//! ```
//!
//! # Concurrency
//!
//! No allocator here synchronizes concurrent callers: the mutating
//! operations take `&mut self`, making each instance single-writer by
//! construction. Use one tree per thread or wrap a tree in external mutual
//! exclusion.
//!
//! # Features
//!
//! - `logging`: debug/trace events from cold control points through the
//!   [`log`](https://docs.rs/log) facade.

#![warn(missing_docs)]

pub mod allocator;
pub mod block;
pub mod error;
pub mod guard;
pub mod utils;

pub use allocator::{
    AffixAllocator, Allocator, Bitmap, BitmappedBlock, Bucketizer, FallbackAllocator, FreeList,
    Mallocator, NullAllocator, Segregator, StackAllocator,
};
pub use block::Block;
pub use error::{ConfigError, Result};
pub use guard::BlockGuard;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Convenience re-exports for assembling allocator trees.
pub mod prelude {
    pub use crate::allocator::{
        AffixAllocator, Allocator, BitmappedBlock, Bucketizer, FallbackAllocator, FreeList,
        Mallocator, NullAllocator, Segregator, StackAllocator,
    };
    pub use crate::block::Block;
    pub use crate::guard::BlockGuard;
}
