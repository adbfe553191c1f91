//! Stress tests with fill-pattern corruption detection.
//!
//! Allocate, fill each payload with a pattern derived from its address and
//! size, churn the free lists with interleaved releases, and verify the
//! pattern before every release. Any overlap between allocations or between
//! an allocation and a free extent shows up as a pattern mismatch.

use sfmalloc::{Arena, CLASS_32, CLASS_512, HINT_NONE, HINT_STRICT_SIZE};

const ARENA_SIZE: u32 = 1 << 20;
const NUM_CLASSES: usize = 6;

fn fill_pattern(ptr: *mut u8, size: usize) {
    let seed = ptr as usize ^ size;
    for i in 0..size {
        unsafe {
            *ptr.add(i) = ((seed.wrapping_add(i).wrapping_mul(0x9E37_79B9)) & 0xFF) as u8;
        }
    }
}

fn check_pattern(ptr: *mut u8, size: usize) -> bool {
    let seed = ptr as usize ^ size;
    for i in 0..size {
        let expected = ((seed.wrapping_add(i).wrapping_mul(0x9E37_79B9)) & 0xFF) as u8;
        if unsafe { *ptr.add(i) } != expected {
            return false;
        }
    }
    true
}

struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }
}

fn assert_fully_free(a: &Arena) {
    assert!(a.check_consistency());
    for k in 0..NUM_CLASSES {
        assert_eq!(a.free_bins(k), a.bin_count(k));
        assert_eq!(a.tracked_extents(k), 1);
    }
}

#[test]
fn stress_fill_pattern_churn() {
    let mut a = Arena::with_capacity(ARENA_SIZE).unwrap();
    let sizes: &[u32] = &[8, 16, 32, 48, 64, 120, 128, 256, 500, 512, 1000, 1024];
    let rounds = 50;

    let mut live: Vec<(*mut u8, usize)> = Vec::new();

    for round in 0..rounds {
        for &size in sizes {
            let ptr = a.alloc(size, HINT_NONE, 4, 0);
            assert!(!ptr.is_null(), "alloc failed for size {size}");
            fill_pattern(ptr, size as usize);
            live.push((ptr, size as usize));
        }
        assert!(a.check_consistency());

        for &(ptr, size) in &live {
            assert!(
                check_pattern(ptr, size),
                "corruption detected at round {round}, size {size}"
            );
        }

        // Free half, picked from the middle to churn extent ordering.
        let drain_count = live.len() / 2;
        for _ in 0..drain_count {
            let idx = (round * 7 + 3) % live.len();
            let (ptr, size) = live.swap_remove(idx);
            assert!(check_pattern(ptr, size), "corruption before free at round {round}");
            assert!(unsafe { a.release(ptr) });
        }
        assert!(a.check_consistency());
    }

    for (ptr, size) in live.drain(..) {
        assert!(check_pattern(ptr, size));
        assert!(unsafe { a.release(ptr) });
    }
    assert_fully_free(&a);
}

#[test]
fn stress_random_sizes_random_free_order() {
    let mut a = Arena::with_capacity(ARENA_SIZE).unwrap();
    let mut rng = XorShift(0x9E37_79B9_7F4A_7C15);

    let mut live: Vec<(*mut u8, usize)> = Vec::new();
    for _ in 0..500 {
        let size = (rng.next() % 1500) as u32 + 1;
        let ptr = a.alloc(size, HINT_NONE, 4, 0);
        // Sizes beyond the largest class are refused; everything else must
        // land while the arena has room.
        if size > 1024 {
            assert!(ptr.is_null());
            continue;
        }
        assert!(!ptr.is_null(), "alloc failed for size {size}");
        fill_pattern(ptr, size as usize);
        live.push((ptr, size as usize));
    }
    assert!(a.check_consistency());

    // Release in a shuffled order.
    for i in (1..live.len()).rev() {
        let j = (rng.next() % (i as u64 + 1)) as usize;
        live.swap(i, j);
    }
    for (ptr, size) in live.drain(..) {
        assert!(check_pattern(ptr, size), "corruption in shuffled drain");
        assert!(unsafe { a.release(ptr) });
        assert!(a.check_consistency());
    }
    assert_fully_free(&a);
}

#[test]
fn stress_strict_multi_bin_runs() {
    let mut a = Arena::with_capacity(ARENA_SIZE).unwrap();
    let mut rng = XorShift(0x2545_F491_4F6C_DD1D);

    // Multi-bin runs in the smallest class exercise carve and coalesce on
    // extents longer than one bin.
    let mut live: Vec<(*mut u8, usize)> = Vec::new();
    for round in 0..200 {
        let size = ((rng.next() % 8) as u32 + 1) * 32;
        let ptr = a.alloc(size, HINT_STRICT_SIZE | CLASS_32, 4, 0);
        assert!(!ptr.is_null(), "round {round}: alloc({size}) failed");
        fill_pattern(ptr, size as usize);
        live.push((ptr, size as usize));

        if live.len() > 16 {
            for _ in 0..8 {
                let idx = (rng.next() % live.len() as u64) as usize;
                let (ptr, size) = live.swap_remove(idx);
                assert!(check_pattern(ptr, size), "round {round}: corruption");
                assert!(unsafe { a.release(ptr) });
            }
            assert!(a.check_consistency());
        }
    }

    for (ptr, size) in live.drain(..) {
        assert!(check_pattern(ptr, size));
        assert!(unsafe { a.release(ptr) });
    }
    assert_fully_free(&a);
}

#[test]
fn stress_two_classes_stay_disjoint() {
    let mut a = Arena::with_capacity(ARENA_SIZE).unwrap();

    // Saturate two classes in lockstep and verify payload bytes never bleed
    // across class regions.
    let mut small = Vec::new();
    let mut large = Vec::new();
    for _ in 0..64 {
        let p = a.alloc(32, HINT_STRICT_SIZE | CLASS_32, 4, 0);
        assert!(!p.is_null());
        fill_pattern(p, 32);
        small.push(p);

        let p = a.alloc(512, HINT_STRICT_SIZE | CLASS_512, 4, 0);
        assert!(!p.is_null());
        fill_pattern(p, 512);
        large.push(p);
    }

    for &p in &small {
        assert!(check_pattern(p, 32));
    }
    for &p in &large {
        assert!(check_pattern(p, 512));
    }

    for p in small.into_iter().chain(large) {
        assert!(unsafe { a.release(p) });
    }
    assert_fully_free(&a);
}
