//! Arena layout calculator.
//!
//! Partitions one backing region as `[tracker array][class-0 region]..
//! [class-N region]`. Each class's share of the target size is converted to
//! a bin count; the `+ HEADER_SIZE` in the divisor reserves one tracker slot
//! per bin, so a fully fragmented class can still describe every bin as its
//! own singleton extent.

use core::fmt;

use crate::config::{BASE_ALIGN, CLASS_SHARES, CLASS_SIZES, NUM_CLASSES};
use crate::header::{HEADER_SIZE, MAX_BIN_INDEX};
use crate::size_class::align_up;

/// Why a layout could not be computed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutError {
    /// The computed backing size exceeds the 32-bit address budget.
    AddressBudget,
    /// A class's bin count does not fit the header's 28-bit index field.
    BinIndexOverflow,
    /// The region walk did not land on the computed arena end.
    RegionMismatch,
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::AddressBudget => write!(f, "arena exceeds the 32-bit address budget"),
            LayoutError::BinIndexOverflow => write!(f, "class bin count exceeds the index field"),
            LayoutError::RegionMismatch => write!(f, "partition walk does not match arena end"),
        }
    }
}

/// Placement of one size class within the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Partition {
    /// Payload bytes per bin.
    pub bin_size: u32,
    /// Bin stride: `bin_size + HEADER_SIZE`.
    pub bin_width: u32,
    /// Number of bins in this class's region.
    pub bin_count: u32,
    /// Bytes of payload region: `bin_count * bin_width`.
    pub region_size: u64,
    /// Byte offset of the payload region from the arena base.
    pub region_offset: u64,
    /// Slot offset of this class's tracker region in the tracker array.
    pub tracker_offset: u32,
}

/// The computed shape of one arena.
#[derive(Clone, Copy, Debug)]
pub struct ArenaLayout {
    pub partitions: [Partition; NUM_CLASSES],
    /// Total tracker slots (one per bin, all classes).
    pub tracker_slots: u32,
    /// Bytes occupied by the tracker array at the front of the arena.
    pub tracker_bytes: u64,
    /// Backing request, aligned up to `BASE_ALIGN`.
    pub total_size: u64,
}

impl ArenaLayout {
    /// Compute the layout for a `target_size`-byte arena.
    pub fn compute(target_size: u32) -> Result<Self, LayoutError> {
        let header = HEADER_SIZE as u64;
        let mut partitions = [Partition {
            bin_size: 0,
            bin_width: 0,
            bin_count: 0,
            region_size: 0,
            region_offset: 0,
            tracker_offset: 0,
        }; NUM_CLASSES];

        let mut total_bins: u64 = 0;
        let mut total_region: u64 = 0;
        for k in 0..NUM_CLASSES {
            let raw_share = align_up(
                (target_size as f64 * CLASS_SHARES[k]) as u64,
                BASE_ALIGN as u64,
            );
            let bin_width = CLASS_SIZES[k] as u64 + header;
            // One tracker slot is budgeted alongside every bin.
            let bin_count = raw_share / (bin_width + header);
            if bin_count > MAX_BIN_INDEX as u64 + 1 {
                return Err(LayoutError::BinIndexOverflow);
            }

            partitions[k].bin_size = CLASS_SIZES[k];
            partitions[k].bin_width = bin_width as u32;
            partitions[k].bin_count = bin_count as u32;
            partitions[k].region_size = bin_count * bin_width;
            partitions[k].tracker_offset = total_bins as u32;

            total_bins += bin_count;
            total_region += partitions[k].region_size;
        }

        let tracker_bytes = header * total_bins;
        let total_size = align_up(tracker_bytes + total_region, BASE_ALIGN as u64);
        if total_size > u32::MAX as u64 {
            return Err(LayoutError::AddressBudget);
        }

        // Walk the regions the way the allocator will address them and
        // check the walk lands on the arena end.
        let mut cursor = tracker_bytes;
        for p in partitions.iter_mut() {
            p.region_offset = cursor;
            cursor += p.region_size;
        }
        if cursor != tracker_bytes + total_region {
            return Err(LayoutError::RegionMismatch);
        }

        Ok(Self {
            partitions,
            tracker_slots: total_bins as u32,
            tracker_bytes,
            total_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_MIB: u32 = 1 << 20;

    #[test]
    fn test_bin_counts_match_share_formula() {
        let layout = ArenaLayout::compute(ONE_MIB).unwrap();
        for k in 0..NUM_CLASSES {
            let raw = align_up(
                (ONE_MIB as f64 * CLASS_SHARES[k]) as u64,
                BASE_ALIGN as u64,
            );
            let width = CLASS_SIZES[k] as u64 + HEADER_SIZE as u64;
            assert_eq!(
                layout.partitions[k].bin_count as u64,
                raw / (width + HEADER_SIZE as u64),
                "class {}",
                k
            );
            assert!(layout.partitions[k].bin_count > 0, "class {} empty", k);
        }
    }

    #[test]
    fn test_regions_are_contiguous() {
        let layout = ArenaLayout::compute(ONE_MIB).unwrap();
        assert_eq!(layout.partitions[0].region_offset, layout.tracker_bytes);
        for k in 1..NUM_CLASSES {
            let prev = &layout.partitions[k - 1];
            assert_eq!(
                layout.partitions[k].region_offset,
                prev.region_offset + prev.region_size
            );
        }
        let last = &layout.partitions[NUM_CLASSES - 1];
        let end = last.region_offset + last.region_size;
        assert!(end <= layout.total_size);
        assert!(layout.total_size - end < BASE_ALIGN as u64);
    }

    #[test]
    fn test_tracker_array_has_one_slot_per_bin() {
        let layout = ArenaLayout::compute(ONE_MIB).unwrap();
        let bins: u64 = layout
            .partitions
            .iter()
            .map(|p| p.bin_count as u64)
            .sum();
        assert_eq!(layout.tracker_slots as u64, bins);
        assert_eq!(layout.tracker_bytes, bins * HEADER_SIZE as u64);
        for k in 1..NUM_CLASSES {
            assert_eq!(
                layout.partitions[k].tracker_offset,
                layout.partitions[k - 1].tracker_offset + layout.partitions[k - 1].bin_count
            );
        }
    }

    #[test]
    fn test_total_is_aligned_and_within_budget() {
        for target in [ONE_MIB, 16 * ONE_MIB, crate::config::DEFAULT_ARENA_SIZE] {
            let layout = ArenaLayout::compute(target).unwrap();
            assert_eq!(layout.total_size % BASE_ALIGN as u64, 0);
            assert!(layout.total_size <= u32::MAX as u64);
            // Per-class bin counts round down and tracker slots come out of
            // the share, so the request stays at the target give or take
            // per-class alignment slack.
            let slack = (BASE_ALIGN as u64) * (NUM_CLASSES as u64 + 1);
            assert!(layout.total_size <= target as u64 + slack);
        }
    }
}
