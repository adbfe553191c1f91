//! Miri-compatible shim backed by the system allocator.
//!
//! Miri can't execute real OS syscalls (mmap/VirtualAlloc), so the region
//! comes from `alloc_zeroed`. This lets Miri check all the unsafe pointer
//! logic in the arena internals.

extern crate alloc;

use core::alloc::Layout;

use crate::config::BASE_ALIGN;

pub unsafe fn region_alloc(size: usize) -> *mut u8 {
    let layout = Layout::from_size_align(size, BASE_ALIGN as usize).unwrap();
    unsafe { alloc::alloc::alloc_zeroed(layout) }
}

pub unsafe fn region_dealloc(ptr: *mut u8, size: usize) {
    let layout = Layout::from_size_align(size, BASE_ALIGN as usize).unwrap();
    unsafe { alloc::alloc::dealloc(ptr, layout) };
}
