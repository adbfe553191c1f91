//! Allocation statistics counters.
//!
//! All counters use `Relaxed` ordering — they are observational only and
//! never used for synchronization; per-arena ordering comes from the
//! single-threaded contract. Counters are global across arenas.
//!
//! Obtain a [`Snapshot`] with [`snapshot()`]. Individual loads are each
//! atomic but the snapshot as a whole is not globally consistent.

use core::sync::atomic::{AtomicU64, Ordering};

pub(crate) struct Stats {
    /// Successful allocations.
    pub alloc_count: AtomicU64,
    /// Sum of requested byte sizes over successful allocations.
    pub alloc_bytes: AtomicU64,
    /// Non-null releases.
    pub release_count: AtomicU64,
    /// Queries rejected for insufficient free bins (oversize included).
    pub no_space_count: AtomicU64,
    /// Queries that passed the occupancy check but found no fitting extent.
    pub fragmentation_count: AtomicU64,
    /// Times a free extent was shrunk in place by a carve.
    pub extent_splits: AtomicU64,
    /// Times a release merged with one or both neighbors.
    pub extent_merges: AtomicU64,
    /// Total bins handed out by carves.
    pub bins_carved: AtomicU64,
    /// Scoped allocations refused because the scope stack was full.
    pub scope_overflows: AtomicU64,
}

impl Stats {
    const fn new() -> Self {
        Self {
            alloc_count: AtomicU64::new(0),
            alloc_bytes: AtomicU64::new(0),
            release_count: AtomicU64::new(0),
            no_space_count: AtomicU64::new(0),
            fragmentation_count: AtomicU64::new(0),
            extent_splits: AtomicU64::new(0),
            extent_merges: AtomicU64::new(0),
            bins_carved: AtomicU64::new(0),
            scope_overflows: AtomicU64::new(0),
        }
    }
}

pub(crate) static STATS: Stats = Stats::new();

/// A point-in-time snapshot of all counters.
#[derive(Clone, Copy, Debug, Default)]
pub struct Snapshot {
    /// Successful allocations.
    pub alloc_count: u64,
    /// Sum of requested byte sizes over successful allocations.
    pub alloc_bytes: u64,
    /// Non-null releases.
    pub release_count: u64,
    /// Queries rejected for insufficient free bins (oversize included).
    pub no_space_count: u64,
    /// Queries that passed the occupancy check but found no fitting extent.
    pub fragmentation_count: u64,
    /// Times a free extent was shrunk in place by a carve.
    pub extent_splits: u64,
    /// Times a release merged with one or both neighbors.
    pub extent_merges: u64,
    /// Total bins handed out by carves.
    pub bins_carved: u64,
    /// Scoped allocations refused because the scope stack was full.
    pub scope_overflows: u64,
}

/// Load all counters with `Relaxed` ordering and return a [`Snapshot`].
pub fn snapshot() -> Snapshot {
    let s = &STATS;
    Snapshot {
        alloc_count: s.alloc_count.load(Ordering::Relaxed),
        alloc_bytes: s.alloc_bytes.load(Ordering::Relaxed),
        release_count: s.release_count.load(Ordering::Relaxed),
        no_space_count: s.no_space_count.load(Ordering::Relaxed),
        fragmentation_count: s.fragmentation_count.load(Ordering::Relaxed),
        extent_splits: s.extent_splits.load(Ordering::Relaxed),
        extent_merges: s.extent_merges.load(Ordering::Relaxed),
        bins_carved: s.bins_carved.load(Ordering::Relaxed),
        scope_overflows: s.scope_overflows.load(Ordering::Relaxed),
    }
}
