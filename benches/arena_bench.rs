//! Arena micro-benchmarks: alloc/release pairs per class, churn, and
//! first-fit under heavy fragmentation.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

use sfmalloc::{Arena, CLASS_32, HINT_NONE, HINT_STRICT_SIZE};

const ARENA_SIZE: u32 = 16 << 20;

fn bench_alloc_release_pair(c: &mut Criterion) {
    let mut group = c.benchmark_group("alloc_release_pair");
    for size in [32u32, 64, 128, 256, 512, 1024] {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let mut arena = Arena::with_capacity(ARENA_SIZE).unwrap();
            b.iter(|| {
                let p = arena.alloc(black_box(size), HINT_NONE, 4, 0);
                assert!(!p.is_null());
                unsafe { arena.release(p) };
            });
        });
    }
    group.finish();
}

fn bench_churn(c: &mut Criterion) {
    c.bench_function("churn_100_live", |b| {
        let mut arena = Arena::with_capacity(ARENA_SIZE).unwrap();
        let mut live: Vec<*mut u8> = Vec::with_capacity(128);
        let sizes = [16u32, 48, 100, 200, 400, 800];
        let mut i = 0usize;
        b.iter(|| {
            let p = arena.alloc(sizes[i % sizes.len()], HINT_NONE, 4, 0);
            assert!(!p.is_null());
            live.push(p);
            if live.len() > 100 {
                // Free from the middle to keep the free lists ragged.
                let victim = live.swap_remove(i % live.len());
                unsafe { arena.release(victim) };
            }
            i += 1;
        });
        for p in live.drain(..) {
            unsafe { arena.release(p) };
        }
    });
}

fn bench_strict_multi_bin(c: &mut Criterion) {
    c.bench_function("strict_multi_bin_256_in_32", |b| {
        let mut arena = Arena::with_capacity(ARENA_SIZE).unwrap();
        b.iter(|| {
            let p = arena.alloc(black_box(256), HINT_STRICT_SIZE | CLASS_32, 4, 0);
            assert!(!p.is_null());
            unsafe { arena.release(p) };
        });
    });
}

fn bench_fragmented_first_fit(c: &mut Criterion) {
    c.bench_function("first_fit_fragmented_class", |b| {
        let mut arena = Arena::with_capacity(ARENA_SIZE).unwrap();
        // Leave only odd bins live so the class 0 free list is a long run
        // of singleton extents.
        let mut ptrs = Vec::new();
        loop {
            let p = arena.alloc(32, HINT_STRICT_SIZE | CLASS_32, 4, 0);
            if p.is_null() {
                break;
            }
            ptrs.push(p);
        }
        for p in ptrs.iter().step_by(2) {
            unsafe { arena.release(*p) };
        }

        b.iter(|| {
            let r = arena.query(black_box(64), HINT_STRICT_SIZE | CLASS_32);
            assert!(r.excess_fragmentation());
            black_box(r);
        });

        for p in ptrs.iter().skip(1).step_by(2) {
            unsafe { arena.release(*p) };
        }
    });
}

criterion_group!(
    benches,
    bench_alloc_release_pair,
    bench_churn,
    bench_strict_multi_bin,
    bench_fragmented_first_fit
);
criterion_main!(benches);
