//! Human-readable arena status dump.
//!
//! Renders the layout totals, each partition's geometry, and every free
//! extent, with a bar per class showing how much of it is allocated.

extern crate std;

use std::println;
use std::string::String;

use crate::arena::Arena;
use crate::config::NUM_CLASSES;
use crate::header::HEADER_SIZE;

struct ByteFormat {
    value: f64,
    unit: &'static str,
}

fn format_bytes(size: f64) -> ByteFormat {
    const KIB: f64 = 1024.0;
    const MIB: f64 = 1024.0 * 1024.0;
    if size >= MIB {
        ByteFormat {
            value: size / MIB,
            unit: "mB",
        }
    } else if size >= KIB {
        ByteFormat {
            value: size / KIB,
            unit: "kB",
        }
    } else {
        ByteFormat {
            value: size,
            unit: "B",
        }
    }
}

/// Print the arena's layout and free-list state to stdout.
pub fn print_status(arena: &Arena) {
    let layout = arena.layout();

    let total = format_bytes(layout.total_size as f64);
    println!("o Total allocated heap memory : {:10.3} {:>2}", total.value, total.unit);
    let regions = format_bytes((layout.total_size - layout.tracker_bytes) as f64);
    println!("  - Total partition sizes     : {:10.3} {:>2}", regions.value, regions.unit);
    let tracker = format_bytes(layout.tracker_bytes as f64);
    println!("  - Tracker list size         : {:10.3} {:>2}", tracker.value, tracker.unit);

    println!("o Partition Data:");
    for k in 0..NUM_CLASSES {
        let p = arena.partition(k);
        let bin = format_bytes(p.bin_size as f64);
        let region = format_bytes(p.region_size as f64);
        println!(
            "  - Partition {} : {:10.3} {:>2} (bin size + {} B), {:10} (bin count), {:10.3} {:>2} (partition size)",
            k, bin.value, bin.unit, HEADER_SIZE, p.bin_count, region.value, region.unit
        );
    }

    println!("o Tracker Data:");
    for k in 0..NUM_CLASSES {
        println!("  - Partition {}:", k);

        let bin_count = arena.bin_count(k);
        let allocated = if bin_count == 0 {
            0.0
        } else {
            1.0 - arena.free_bins(k) as f64 / bin_count as f64
        };
        let ticks = (20.0 * allocated).round() as usize;
        let mut bar = String::new();
        for i in 0..20 {
            bar.push(if i < ticks { 'x' } else { ' ' });
        }
        println!("    [{}] ({:.3}% allocated)", bar, allocated * 100.0);

        for (start, len) in arena.free_extents(k) {
            let run = format_bytes(len as f64 * arena.partition(k).bin_size as f64);
            println!(
                "    | {} (bin index), {} (coalesced bins), {:10.3} {:>2}",
                start, len, run.value, run.unit
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes_picks_units() {
        assert_eq!(format_bytes(100.0).unit, "B");
        assert_eq!(format_bytes(2048.0).unit, "kB");
        assert_eq!(format_bytes(3.0 * 1024.0 * 1024.0).unit, "mB");
        assert!((format_bytes(2048.0).value - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_print_status_runs_on_churned_arena() {
        let mut a = Arena::with_capacity(1 << 20).unwrap();
        let p = a.alloc(100, crate::size_class::HINT_NONE, 4, 0);
        print_status(&a);
        unsafe { a.release(p) };
    }
}
