//! Walkthrough of the id-indexed heap surface.
//!
//! Run with: cargo run --example demo --features std

use sfmalloc::{CLASS_32, CLASS_256, HINT_NONE, HINT_STRICT_SIZE, heap};

fn main() {
    println!("sfmalloc demo");
    println!("=============\n");

    heap::init(0, 16 << 20).expect("arena init failed");
    println!("arena 0 up: {}\n", heap::is_initialized(0));

    // Best-fit allocation: 40 bytes promotes to the 64-byte class.
    let r = heap::query(40, HINT_NONE, 0);
    println!(
        "query(40): class size {}, bins {}, success {}",
        r.class_size(),
        r.alloc_bins,
        r.is_success()
    );
    let p = heap::alloc(40, HINT_NONE, 4, 0xFEED, 0);
    println!("alloc(40) -> {:p}", p);

    // Strict placement: the same request forced into the 256-byte class.
    let q = heap::alloc(40, HINT_STRICT_SIZE | CLASS_256, 4, 0, 0);
    println!("alloc(40, strict 256) -> {:p}", q);

    // A multi-bin run in the smallest class.
    let r = heap::query(200, HINT_STRICT_SIZE | CLASS_32, 0);
    println!(
        "query(200, strict 32): {} bins of 32 bytes",
        r.alloc_bins
    );
    let m = heap::alloc(200, HINT_STRICT_SIZE | CLASS_32, 4, 0, 0);

    // Typed allocation.
    let nums: *mut u64 = heap::alloc_t(16, 0, 0);
    unsafe {
        for i in 0..16 {
            *nums.add(i) = (i * i) as u64;
        }
        println!("alloc_t::<u64>(16) -> {:p}, nums[15] = {}", nums, *nums.add(15));
    }

    println!("\nstatus after four allocations:");
    heap::print_status(0);

    unsafe {
        heap::free(p, 0);
        heap::free(q, 0);
        heap::free(m, 0);
        heap::free(nums.cast(), 0);
    }

    println!("\nstatus after release (every class back to one extent):");
    heap::print_status(0);
}
