//! The id-indexed heap surface: a fixed table of process-lifetime arenas.
//!
//! This mirrors the classic per-thread-id C API. Each slot is an
//! independent allocator state; the spin lock only serializes slot handout,
//! and callers are expected to keep each id on a single thread. New code
//! should prefer owning an [`Arena`] directly.

use core::ptr;

use crate::arena::{Arena, InitError, QueryResult, STATUS_NO_FREE_SPACE};
use crate::config::MAX_ARENAS;
use crate::sync::SpinMutex;

static ARENAS: [SpinMutex<Option<Arena>>; MAX_ARENAS] =
    [const { SpinMutex::new(None) }; MAX_ARENAS];

fn slot(arena_id: usize) -> &'static SpinMutex<Option<Arena>> {
    assert!(arena_id < MAX_ARENAS, "arena id {} out of range", arena_id);
    &ARENAS[arena_id]
}

/// Bring up arena `arena_id` with roughly `target_size` bytes of backing
/// (0 selects the configured default). Replaces any previous arena in the
/// slot, releasing its region.
pub fn init(arena_id: usize, target_size: u32) -> Result<(), InitError> {
    let arena = Arena::with_capacity(target_size)?;
    *slot(arena_id).lock() = Some(arena);
    Ok(())
}

/// Whether slot `arena_id` holds a live arena.
pub fn is_initialized(arena_id: usize) -> bool {
    slot(arena_id)
        .lock()
        .as_ref()
        .is_some_and(|a| a.is_valid())
}

/// Allocate from arena `arena_id`. Null when the slot is uninitialized or
/// the arena has no placement for the request.
pub fn alloc(byte_count: u32, hints: u32, align: u32, tag: u64, arena_id: usize) -> *mut u8 {
    match slot(arena_id).lock().as_mut() {
        Some(arena) => arena.alloc(byte_count, hints, align, tag),
        None => ptr::null_mut(),
    }
}

/// Typed convenience: room for `count` values of `T`, at `T`'s alignment
/// (rounded up to the minimum the allocator accepts).
pub fn alloc_t<T>(count: u32, tag: u64, arena_id: usize) -> *mut T {
    let bytes = size_of::<T>() as u64 * count as u64;
    if bytes > u32::MAX as u64 {
        return ptr::null_mut();
    }
    let align = (align_of::<T>() as u32).max(4);
    alloc(bytes as u32, crate::size_class::HINT_NONE, align, tag, arena_id).cast()
}

/// Release an allocation back to arena `arena_id`. Returns `false` for a
/// null pointer or an uninitialized slot.
///
/// # Safety
///
/// `ptr` must be null or a live allocation from this arena slot.
pub unsafe fn free(ptr: *mut u8, arena_id: usize) -> bool {
    match slot(arena_id).lock().as_mut() {
        Some(arena) => unsafe { arena.release(ptr) },
        None => false,
    }
}

/// Query placement in arena `arena_id` without allocating. An
/// uninitialized slot reports `NO_FREE_SPACE` with no class encoded.
pub fn query(byte_count: u32, hints: u32, arena_id: usize) -> QueryResult {
    match slot(arena_id).lock().as_ref() {
        Some(arena) => arena.query(byte_count, hints),
        None => QueryResult {
            alloc_bins: 0,
            status: STATUS_NO_FREE_SPACE,
            tracker_index: 0,
        },
    }
}

/// Dump arena `arena_id`'s layout and free lists to stdout.
#[cfg(feature = "std")]
pub fn print_status(arena_id: usize) {
    match slot(arena_id).lock().as_ref() {
        Some(arena) => crate::report::print_status(arena),
        None => std::println!("arena {}: uninitialized", arena_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::size_class::HINT_NONE;

    // Each test uses its own slot: the table is shared process state.

    #[test]
    fn test_init_and_round_trip() {
        init(4, 1 << 20).unwrap();
        assert!(is_initialized(4));

        let p = alloc(100, HINT_NONE, 4, 0, 4);
        assert!(!p.is_null());
        assert!(unsafe { free(p, 4) });
        assert!(!unsafe { free(ptr::null_mut(), 4) });
    }

    #[test]
    fn test_uninitialized_slot_is_inert() {
        assert!(!is_initialized(5));
        assert!(alloc(64, HINT_NONE, 4, 0, 5).is_null());
        assert!(!unsafe { free(ptr::null_mut(), 5) });
        let r = query(64, HINT_NONE, 5);
        assert!(r.no_free_space());
        assert_eq!(r.class_size(), 0);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_out_of_range_id_panics() {
        is_initialized(MAX_ARENAS);
    }

    #[test]
    fn test_alloc_t_respects_type_size() {
        init(6, 1 << 20).unwrap();
        let p: *mut u64 = alloc_t(8, 0, 6);
        assert!(!p.is_null());
        // 64 bytes fits class 1 exactly; the header confirms the promotion.
        let r = query(64, HINT_NONE, 6);
        assert_eq!(r.class_size(), 64);
        assert!(unsafe { free(p.cast(), 6) });
    }
}
