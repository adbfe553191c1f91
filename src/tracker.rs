//! Free-list tracker: run-length-encoded free extents for one size class.
//!
//! A class's tracker region is a slice of `BlockHeader` slots at the front
//! of the arena, one slot per bin, of which the first `tracked_count` are
//! live. Live entries are sorted strictly by start bin and never touch:
//! adjacent runs are merged on insert. Everything here is index arithmetic
//! over that slice; no pointers are stored.

use crate::header::BlockHeader;
use crate::{stat_add, stat_inc};

/// Per-class bookkeeping alongside the tracker region.
#[derive(Clone, Copy, Debug, Default)]
pub struct TrackerMeta {
    /// Live entries in the region.
    pub tracked_count: u32,
    /// Total free bins: the sum of `run_length` over live entries.
    pub bin_occupancy: u32,
}

/// First live entry with at least `bins` free bins, scanning in start order.
pub fn first_fit(region: &[BlockHeader], meta: &TrackerMeta, bins: u32) -> Option<u32> {
    region[..meta.tracked_count as usize]
        .iter()
        .position(|e| e.run_length >= bins)
        .map(|i| i as u32)
}

/// Carve `bins` bins from the front of the extent at `index`.
///
/// Returns the first carved bin. The extent shrinks in place, or is removed
/// when consumed whole: the last live slot is zeroed, interior slots are
/// closed over by shifting the tail left.
pub fn carve(
    region: &mut [BlockHeader],
    meta: &mut TrackerMeta,
    index: u32,
    bins: u32,
    class: usize,
) -> u32 {
    let i = index as usize;
    let entry = region[i];
    let start = entry.bin_index();
    debug_assert!(entry.run_length >= bins);

    if entry.run_length > bins {
        region[i] = BlockHeader::new(start + bins, class, entry.run_length - bins);
        stat_inc!(extent_splits);
    } else {
        let count = meta.tracked_count as usize;
        if i + 1 == count || count == 1 {
            region[i] = BlockHeader::empty();
        } else {
            region.copy_within(i + 1..count, i);
        }
        meta.tracked_count -= 1;
    }

    meta.bin_occupancy -= bins;
    stat_add!(bins_carved, bins);
    start
}

/// Insert a freed run of `bins` bins at `start`, preserving the sorted and
/// coalesced shape of the region.
///
/// The caller guarantees the run is disjoint from every live entry (it was
/// a live allocation of this class).
pub fn insert_free(
    region: &mut [BlockHeader],
    meta: &mut TrackerMeta,
    start: u32,
    len: u32,
    class: usize,
) {
    match meta.tracked_count {
        0 => {
            region[0] = BlockHeader::new(start, class, len);
            meta.tracked_count = 1;
        }
        1 => insert_single(region, meta, start, len, class),
        _ => insert_search(region, meta, start, len, class),
    }
    meta.bin_occupancy += len;
}

/// One live entry: the freed run merges with it or lands on either side.
fn insert_single(
    region: &mut [BlockHeader],
    meta: &mut TrackerMeta,
    start: u32,
    len: u32,
    class: usize,
) {
    let cur = region[0];
    let head_gap = cur.bin_index() as i64 - (start + len) as i64;
    let tail_gap = start as i64 - cur.end_index() as i64;

    if head_gap == 0 || tail_gap == 0 {
        let merged_start = cur.bin_index().min(start);
        region[0] = BlockHeader::new(merged_start, class, cur.run_length + len);
        stat_inc!(extent_merges);
    } else if head_gap > 0 {
        region[1] = cur;
        region[0] = BlockHeader::new(start, class, len);
        meta.tracked_count = 2;
    } else {
        region[1] = BlockHeader::new(start, class, len);
        meta.tracked_count = 2;
    }
}

/// Two or more live entries: binary-search adjacent pairs for the gap the
/// freed run falls into, then merge or insert.
fn insert_search(
    region: &mut [BlockHeader],
    meta: &mut TrackerMeta,
    start: u32,
    len: u32,
    class: usize,
) {
    let count = meta.tracked_count as usize;
    let end = start + len;

    let mut head = 0usize;
    let mut tail = count - 1;
    while head < tail {
        let pivot = head + (tail - head) / 2;
        let left = region[pivot];
        let right = region[pivot + 1];
        let left_dist = start as i64 - left.end_index() as i64;
        let right_dist = right.bin_index() as i64 - end as i64;

        if left_dist >= 0 && right_dist >= 0 {
            place_between(
                region,
                meta,
                pivot,
                start,
                len,
                class,
                left_dist == 0,
                right_dist == 0,
            );
            return;
        }
        if left_dist >= 0 {
            // Freed run lies past this pair's gap.
            head = pivot + 1;
        } else {
            tail = pivot;
        }
    }

    // The search only runs out at the region's edges.
    if head == 0 {
        let first = region[0];
        if end == first.bin_index() {
            region[0] = BlockHeader::new(start, class, first.run_length + len);
            stat_inc!(extent_merges);
        } else {
            region.copy_within(0..count, 1);
            region[0] = BlockHeader::new(start, class, len);
            meta.tracked_count += 1;
        }
    } else {
        let last = region[count - 1];
        if last.end_index() == start {
            region[count - 1] = BlockHeader::new(last.bin_index(), class, last.run_length + len);
            stat_inc!(extent_merges);
        } else {
            region[count] = BlockHeader::new(start, class, len);
            meta.tracked_count += 1;
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn place_between(
    region: &mut [BlockHeader],
    meta: &mut TrackerMeta,
    pivot: usize,
    start: u32,
    len: u32,
    class: usize,
    touch_left: bool,
    touch_right: bool,
) {
    let count = meta.tracked_count as usize;
    let left = region[pivot];
    let right = region[pivot + 1];

    if touch_left && touch_right {
        // The freed run bridges both neighbors into one extent.
        let merged = left.run_length + len + right.run_length;
        region[pivot] = BlockHeader::new(left.bin_index(), class, merged);
        region.copy_within(pivot + 2..count, pivot + 1);
        meta.tracked_count -= 1;
        stat_inc!(extent_merges);
    } else if touch_left {
        region[pivot] = BlockHeader::new(left.bin_index(), class, left.run_length + len);
        stat_inc!(extent_merges);
    } else if touch_right {
        region[pivot + 1] = BlockHeader::new(start, class, right.run_length + len);
        stat_inc!(extent_merges);
    } else {
        region.copy_within(pivot + 1..count, pivot + 2);
        region[pivot + 1] = BlockHeader::new(start, class, len);
        meta.tracked_count += 1;
    }
}

/// Panic unless the freed run is in bounds and disjoint from every live
/// extent. Wired into release when the `audit` feature is on.
#[cfg(any(test, feature = "audit"))]
pub fn audit_insert(
    region: &[BlockHeader],
    meta: &TrackerMeta,
    start: u32,
    len: u32,
    bin_count: u32,
) {
    assert!(len > 0, "released extent has zero length");
    assert!(
        start < bin_count && start + len <= bin_count,
        "released extent [{}, {}) outside class bins [0, {})",
        start,
        start + len,
        bin_count
    );
    for e in &region[..meta.tracked_count as usize] {
        let overlap = start < e.end_index() && e.bin_index() < start + len;
        assert!(
            !overlap,
            "released extent [{}, {}) overlaps free extent [{}, {})",
            start,
            start + len,
            e.bin_index(),
            e.end_index()
        );
    }
}
