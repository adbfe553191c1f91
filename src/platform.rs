//! OS abstraction for the backing byte region.
//!
//! One call reserves the whole arena as a single zero-initialized
//! contiguous region (mmap on Unix, VirtualAlloc on Windows, the system
//! allocator under Miri); one call returns it. The arena never grows and
//! never gives pages back while alive.

cfg_if::cfg_if! {
    if #[cfg(miri)] {
        mod miri;
        use miri as imp;
    } else if #[cfg(unix)] {
        mod unix;
        use unix as imp;
    } else if #[cfg(windows)] {
        mod windows;
        use windows as imp;
    }
}

/// Reserve `size` bytes of zero-initialized memory, aligned to at least
/// `BASE_ALIGN`. Returns null on failure.
///
/// # Safety
///
/// The caller must eventually pass the returned pointer and the same `size`
/// to [`region_dealloc`].
#[inline]
pub unsafe fn region_alloc(size: usize) -> *mut u8 {
    unsafe { imp::region_alloc(size) }
}

/// Release a region previously obtained from [`region_alloc`].
///
/// # Safety
///
/// `ptr` must come from [`region_alloc`] with this exact `size`, and no
/// reference into the region may outlive this call.
#[inline]
pub unsafe fn region_dealloc(ptr: *mut u8, size: usize) {
    unsafe { imp::region_dealloc(ptr, size) }
}
