#![no_std]

//! sfmalloc: a segregated-fit bucketed heap allocator.
//!
//! One [`Arena`] owns a single contiguous pre-reserved region and serves
//! variable-sized requests from six power-of-two size classes. Each class
//! keeps a sorted, run-length-encoded free list in a tracker array at the
//! front of the region; releases coalesce with both neighbors in O(log n).
//!
//! # Usage
//!
//! ```ignore
//! let mut arena = sfmalloc::Arena::with_capacity(64 << 20)?;
//! let p = arena.alloc(40, sfmalloc::HINT_NONE, 4, 0);
//! assert!(unsafe { arena.release(p) });
//! ```
//!
//! The [`heap`] module exposes the legacy id-indexed surface (a fixed table
//! of process-lifetime arenas); [`scope::ScopedAlloc`] releases everything it
//! handed out when it goes out of scope.

#[cfg(any(test, feature = "std"))]
extern crate std;
#[cfg(test)]
extern crate alloc;

pub mod arena;
pub mod config;
pub mod header;
pub mod heap;
pub mod layout;
pub mod platform;
#[cfg(feature = "std")]
pub mod report;
pub mod scope;
pub mod size_class;
#[cfg(feature = "stats")]
pub mod stats;
pub mod sync;
pub mod tracker;

mod macros;

pub use arena::{Arena, InitError, QueryResult};
pub use arena::{STATUS_EXCESS_FRAGMENTATION, STATUS_NO_FREE_SPACE, STATUS_SUCCESS};
pub use layout::LayoutError;
pub use scope::ScopedAlloc;
pub use size_class::{
    CLASS_32, CLASS_64, CLASS_128, CLASS_256, CLASS_512, CLASS_1024, HINT_NONE, HINT_STRICT_SIZE,
};
