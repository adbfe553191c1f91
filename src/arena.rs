//! Arena state: one backing region, its layout, and the per-class trackers.
//!
//! All structural references are bin indices relative to a class region;
//! raw addresses exist only at the API edge (the returned payload pointer
//! and the header read on release). That keeps every tracker operation
//! bounds-checkable and the whole arena relocatable.

use core::fmt;
use core::ptr;
use core::slice;

use crate::config::{DEFAULT_ARENA_SIZE, NUM_CLASSES};
use crate::header::{BlockHeader, HEADER_SIZE};
use crate::layout::{ArenaLayout, LayoutError, Partition};
use crate::platform;
use crate::size_class::{self, aligned_request, align_up, class_bit, class_of_size};
use crate::tracker::{self, TrackerMeta};
use crate::{stat_add, stat_inc};

/// Query status flag: a fitting extent was found.
pub const STATUS_SUCCESS: u32 = 0x1;
/// Query status flag: the class cannot cover the request.
pub const STATUS_NO_FREE_SPACE: u32 = 0x2;
/// Query status flag: enough free bins exist, but no single extent fits.
pub const STATUS_EXCESS_FRAGMENTATION: u32 = 0x4;

const STATUS_FLAG_MASK: u32 = 0x7;

/// Outcome of a placement query.
///
/// `status` carries the flags in its low bits and the chosen class's bin
/// size in the upper bits; the two ranges are disjoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueryResult {
    /// Bins the request needs in the chosen class.
    pub alloc_bins: u32,
    /// Status flags ORed with the class bin size.
    pub status: u32,
    /// Tracker index of the first-fit extent (valid on success).
    pub tracker_index: u32,
}

impl QueryResult {
    #[inline]
    pub fn is_success(&self) -> bool {
        self.status & STATUS_SUCCESS != 0
    }

    #[inline]
    pub fn no_free_space(&self) -> bool {
        self.status & STATUS_NO_FREE_SPACE != 0
    }

    #[inline]
    pub fn excess_fragmentation(&self) -> bool {
        self.status & STATUS_EXCESS_FRAGMENTATION != 0
    }

    /// Bin size of the class the query resolved to.
    #[inline]
    pub fn class_size(&self) -> u32 {
        self.status & !STATUS_FLAG_MASK
    }
}

/// Why an arena could not be brought up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitError {
    /// The layout calculator rejected the target size.
    Layout(LayoutError),
    /// The platform returned no backing region.
    Backing,
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitError::Layout(e) => write!(f, "layout error: {}", e),
            InitError::Backing => write!(f, "backing region unavailable"),
        }
    }
}

impl From<LayoutError> for InitError {
    fn from(e: LayoutError) -> Self {
        InitError::Layout(e)
    }
}

/// One allocator state: a zero-initialized backing region laid out as
/// `[tracker array][class regions...]`, plus per-class free-list metadata.
pub struct Arena {
    base: *mut u8,
    layout: ArenaLayout,
    trackers: [TrackerMeta; NUM_CLASSES],
}

// SAFETY: the backing region is owned exclusively by this Arena; no pointer
// into it is shared except payload pointers handed to the caller, which the
// caller must not use across threads concurrently with the arena.
unsafe impl Send for Arena {}

impl Arena {
    /// Reserve and lay out an arena of roughly `target_size` bytes.
    /// `target_size == 0` selects the configured default (500 MiB).
    pub fn with_capacity(target_size: u32) -> Result<Self, InitError> {
        let target = if target_size == 0 {
            DEFAULT_ARENA_SIZE
        } else {
            target_size
        };
        let layout = ArenaLayout::compute(target)?;

        let base = unsafe { platform::region_alloc(layout.total_size as usize) };
        if base.is_null() {
            return Err(InitError::Backing);
        }

        let mut arena = Self {
            base,
            layout,
            trackers: [TrackerMeta::default(); NUM_CLASSES],
        };
        for k in 0..NUM_CLASSES {
            let bin_count = arena.layout.partitions[k].bin_count;
            if bin_count == 0 {
                continue;
            }
            // One extent covering the whole class region.
            arena.tracker_region_mut(k)[0] = BlockHeader::new(0, k, bin_count);
            arena.trackers[k] = TrackerMeta {
                tracked_count: 1,
                bin_occupancy: bin_count,
            };
        }
        Ok(arena)
    }

    /// Whether the arena holds a live backing region.
    #[inline]
    pub fn is_valid(&self) -> bool {
        !self.base.is_null()
    }

    #[inline]
    pub fn layout(&self) -> &ArenaLayout {
        &self.layout
    }

    #[inline]
    pub fn partition(&self, class: usize) -> &Partition {
        &self.layout.partitions[class]
    }

    /// Total bins in `class`'s region.
    #[inline]
    pub fn bin_count(&self, class: usize) -> u32 {
        self.layout.partitions[class].bin_count
    }

    /// Free bins currently tracked for `class`.
    #[inline]
    pub fn free_bins(&self, class: usize) -> u32 {
        self.trackers[class].bin_occupancy
    }

    /// Live free-extent records for `class`.
    #[inline]
    pub fn tracked_extents(&self, class: usize) -> u32 {
        self.trackers[class].tracked_count
    }

    /// `(start_bin, run_length)` for each free extent of `class`, in order.
    pub fn free_extents(&self, class: usize) -> impl Iterator<Item = (u32, u32)> + '_ {
        let meta = &self.trackers[class];
        self.tracker_region(class)[..meta.tracked_count as usize]
            .iter()
            .map(|e| (e.bin_index(), e.run_length))
    }

    /// Base address of `class`'s payload region.
    #[inline]
    pub fn class_region_base(&self, class: usize) -> *mut u8 {
        unsafe { self.base.add(self.layout.partitions[class].region_offset as usize) }
    }

    /// Locate space for `byte_count` bytes under `hints` without allocating.
    ///
    /// Requests beyond the largest class report `NO_FREE_SPACE` against it.
    pub fn query(&self, byte_count: u32, hints: u32) -> QueryResult {
        let aligned = aligned_request(byte_count);

        let class = size_class::select_class(aligned, hints);
        let k = match class {
            Some(k) => k,
            None => {
                stat_inc!(no_space_count);
                let k = NUM_CLASSES - 1;
                return QueryResult {
                    alloc_bins: size_class::bins_needed(aligned, k),
                    status: STATUS_NO_FREE_SPACE | class_bit(k),
                    tracker_index: 0,
                };
            }
        };

        let bins = size_class::bins_needed(aligned, k);
        let bits = class_bit(k);

        if self.trackers[k].bin_occupancy < bins {
            stat_inc!(no_space_count);
            return QueryResult {
                alloc_bins: bins,
                status: STATUS_NO_FREE_SPACE | bits,
                tracker_index: 0,
            };
        }

        match tracker::first_fit(self.tracker_region(k), &self.trackers[k], bins) {
            Some(i) => QueryResult {
                alloc_bins: bins,
                status: STATUS_SUCCESS | bits,
                tracker_index: i,
            },
            None => {
                stat_inc!(fragmentation_count);
                QueryResult {
                    alloc_bins: bins,
                    status: STATUS_NO_FREE_SPACE | STATUS_EXCESS_FRAGMENTATION | bits,
                    tracker_index: 0,
                }
            }
        }
    }

    /// Allocate `byte_count` bytes, rounded up to `align`, under `hints`.
    ///
    /// Returns null for a zero-byte request or when no placement exists.
    /// `align` must be a positive multiple of 4. `tag` is recorded in the
    /// payload header when the `debug-tag` feature is on, and ignored
    /// otherwise.
    pub fn alloc(&mut self, byte_count: u32, hints: u32, align: u32, tag: u64) -> *mut u8 {
        assert!(
            align > 0 && align % 4 == 0,
            "payload alignment {} is not a positive multiple of 4",
            align
        );
        #[cfg(not(feature = "debug-tag"))]
        let _ = tag;

        if byte_count == 0 {
            return ptr::null_mut();
        }

        let effective = align_up(byte_count as u64, align as u64) as u32;
        let result = self.query(effective, hints);
        if !result.is_success() {
            return ptr::null_mut();
        }

        let k = class_of_size(result.class_size()).expect("query reported an unknown class");
        let bins = result.alloc_bins;

        let meta = &mut self.trackers[k];
        let partition = self.layout.partitions[k];
        // SAFETY: tracker region k is in bounds of the owned backing region.
        let region = unsafe {
            slice::from_raw_parts_mut(
                self.base
                    .add(partition.tracker_offset as usize * HEADER_SIZE as usize)
                    .cast::<BlockHeader>(),
                partition.bin_count as usize,
            )
        };
        let start = tracker::carve(region, meta, result.tracker_index, bins, k);

        let mut header = BlockHeader::new(start, k, bins);
        #[cfg(feature = "debug-tag")]
        {
            header.tag = tag;
        }

        let offset = partition.region_offset + partition.bin_width as u64 * start as u64;
        // SAFETY: `start + bins <= bin_count`, so the header and payload lie
        // inside class k's region.
        let header_ptr = unsafe { self.base.add(offset as usize) };
        unsafe { header_ptr.cast::<BlockHeader>().write(header) };

        stat_inc!(alloc_count);
        stat_add!(alloc_bytes, byte_count);
        unsafe { header_ptr.add(HEADER_SIZE as usize) }
    }

    /// Return an allocation to its class's free list, coalescing with any
    /// adjacent free extents. Returns `false` only for a null pointer.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a pointer returned by `alloc` on this arena
    /// that has not been released since.
    pub unsafe fn release(&mut self, ptr: *mut u8) -> bool {
        if ptr.is_null() {
            return false;
        }

        // SAFETY: a live payload pointer sits one header past its bin start.
        let header = unsafe { ptr.sub(HEADER_SIZE as usize).cast::<BlockHeader>().read() };
        let k = header.class();
        let start = header.bin_index();
        let len = header.run_length;
        debug_assert!(k < NUM_CLASSES, "released header names class {}", k);

        let partition = self.layout.partitions[k];
        let meta = &mut self.trackers[k];
        // SAFETY: as in `alloc`.
        let region = unsafe {
            slice::from_raw_parts_mut(
                self.base
                    .add(partition.tracker_offset as usize * HEADER_SIZE as usize)
                    .cast::<BlockHeader>(),
                partition.bin_count as usize,
            )
        };

        #[cfg(feature = "audit")]
        tracker::audit_insert(region, meta, start, len, partition.bin_count);

        tracker::insert_free(region, meta, start, len, k);
        stat_inc!(release_count);
        true
    }

    /// Verify every class's free list: sorted, non-touching, in bounds, and
    /// consistent with the occupancy counter.
    pub fn check_consistency(&self) -> bool {
        for k in 0..NUM_CLASSES {
            let meta = &self.trackers[k];
            let region = self.tracker_region(k);
            let live = &region[..meta.tracked_count as usize];

            let mut sum = 0u64;
            for e in live {
                if e.end_index() > self.bin_count(k) {
                    return false;
                }
                sum += e.run_length as u64;
            }
            if sum != meta.bin_occupancy as u64 {
                return false;
            }
            for w in live.windows(2) {
                if w[0].end_index() >= w[1].bin_index() {
                    return false;
                }
            }
        }
        true
    }

    fn tracker_region(&self, class: usize) -> &[BlockHeader] {
        let partition = &self.layout.partitions[class];
        // SAFETY: tracker region `class` is in bounds of the owned region.
        unsafe {
            slice::from_raw_parts(
                self.base
                    .add(partition.tracker_offset as usize * HEADER_SIZE as usize)
                    .cast::<BlockHeader>(),
                partition.bin_count as usize,
            )
        }
    }

    fn tracker_region_mut(&mut self, class: usize) -> &mut [BlockHeader] {
        let partition = &self.layout.partitions[class];
        // SAFETY: as above, and `&mut self` gives exclusive access.
        unsafe {
            slice::from_raw_parts_mut(
                self.base
                    .add(partition.tracker_offset as usize * HEADER_SIZE as usize)
                    .cast::<BlockHeader>(),
                partition.bin_count as usize,
            )
        }
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        // SAFETY: `base` came from `region_alloc` with this exact size.
        unsafe { platform::region_dealloc(self.base, self.layout.total_size as usize) };
    }
}
