//! Element lifecycle primitives over raw, possibly uninitialized, memory.
//!
//! Every move is a bitwise relocation, after which the source slots are treated as uninitialized.

use core::{mem, ptr};

/// Destruct `count` live elements starting at `ptr`.
/// 
/// Does nothing for types that don't need to be dropped.
/// 
/// # Safety
/// 
/// `[ptr, ptr + count)` must contain initialized elements, which are uninitialized afterwards.
#[inline]
pub(crate) unsafe fn destruct_range<T>(ptr: *mut T, count: usize) {
    if mem::needs_drop::<T>() && count != 0 {
        ptr::drop_in_place(ptr::slice_from_raw_parts_mut(ptr, count));
    }
}

/// Relocate `count` elements from `src` into the uninitialized, non-overlapping memory at `dst`.
/// 
/// # Safety
/// 
/// Both ranges must be valid for `count` elements and may not overlap.
#[inline]
pub(crate) unsafe fn move_emplace<T>(dst: *mut T, src: *const T, count: usize) {
    if count != 0 {
        ptr::copy_nonoverlapping(src, dst, count);
    }
}

/// Relocate `count` elements towards a lower address, the ranges may overlap.
/// 
/// The result is the same as moving the elements one by one, from the first to the last.
/// 
/// # Safety
/// 
/// Both ranges must be valid for `count` elements.
#[inline]
pub(crate) unsafe fn memmove_backwards<T>(dst: *mut T, src: *const T, count: usize) {
    debug_assert!(dst as *const T <= src, "backwards move to a higher address");
    if count != 0 && dst as *const T != src {
        ptr::copy(src, dst, count);
    }
}

/// Relocate `count` elements towards a higher address, the ranges may overlap.
/// 
/// The result is the same as moving the elements one by one, from the last to the first.
/// 
/// # Safety
/// 
/// Both ranges must be valid for `count` elements.
#[inline]
pub(crate) unsafe fn memmove_forward<T>(dst: *mut T, src: *const T, count: usize) {
    debug_assert!(dst as *const T >= src, "forward move to a lower address");
    if count != 0 && dst as *const T != src {
        ptr::copy(src, dst, count);
    }
}
