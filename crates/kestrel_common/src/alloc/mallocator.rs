use core::{alloc::Layout, ptr::NonNull};

use super::Allocator;

/// Allocator calling directly to the system allocator
/// 
/// Mallocator uses rust's global allocator to retrieve memory
pub struct Mallocator;

impl Allocator for Mallocator {
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        debug_assert!(layout.size() != 0, "The global allocator does not support zero-sized allocations");
        // SAFETY: `layout` has a non-zero size
        NonNull::new(unsafe { std::alloc::alloc(layout) })
    }

    unsafe fn free(&self, ptr: NonNull<u8>, layout: Layout) {
        std::alloc::dealloc(ptr.as_ptr(), layout)
    }
}
