//! The global allocation routine every kestrel container builds on.
//!
//! Containers never take an allocator parameter, all memory goes through [`allocate`] and [`free`],
//! which forward to [`Mallocator`].

use core::{alloc::Layout, ptr::NonNull};

use kestrel_logging::{log_severe, LogCategory};

use crate::collections::TryReserveError;

mod mallocator;

pub use mallocator::Mallocator;

pub(crate) const LOG_CAT : LogCategory = LogCategory::new("Memory");

/// Allocator interface.
pub trait Allocator {
    /// Allocate a block of memory for the given layout.
    /// 
    /// Returns `None` when the memory could not be allocated.
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>>;

    /// Free a block of memory.
    /// 
    /// # Safety
    /// 
    /// `ptr` must have been returned by `allocate` on this allocator with the same `layout`.
    unsafe fn free(&self, ptr: NonNull<u8>, layout: Layout);
}

/// Allocate memory for `layout`.
/// 
/// A zero-sized layout returns a dangling pointer aligned to the layout, without allocating.
/// 
/// # Aborts
/// 
/// Aborts when the memory cannot be allocated, after logging the failed request.
pub fn allocate(layout: Layout) -> NonNull<u8> {
    if layout.size() == 0 {
        return dangling(layout);
    }

    match Mallocator.allocate(layout) {
        Some(ptr) => {
            memory_tracking::on_allocate(layout.size());
            ptr
        },
        None => {
            log_severe!(LOG_CAT, "Failed to allocate {} bytes (alignment: {})", layout.size(), layout.align());
            std::alloc::handle_alloc_error(layout)
        },
    }
}

/// Free memory returned by [`allocate`].
/// 
/// Freeing a zero-sized layout does nothing.
/// 
/// # Safety
/// 
/// `ptr` must have been returned by [`allocate`] with the same `layout`, and may not have been freed before.
pub unsafe fn free(ptr: NonNull<u8>, layout: Layout) {
    if layout.size() == 0 {
        return;
    }

    memory_tracking::on_free(layout.size());
    Mallocator.free(ptr, layout);
}

/// Get the layout of an array of `count` elements of `T`.
/// 
/// # Errors
/// 
/// Returns `TryReserveError::CapacityOverflow` when the size in bytes would exceed `isize::MAX`.
pub fn array_layout<T>(count: usize) -> Result<Layout, TryReserveError> {
    Layout::array::<T>(count).map_err(|_| TryReserveError::CapacityOverflow)
}

fn dangling(layout: Layout) -> NonNull<u8> {
    // SAFETY: An alignment is never 0
    unsafe { NonNull::new_unchecked(layout.align() as *mut u8) }
}

//------------------------------------------------------------------------------------------------------------------------------

/// Allocation counters of the current thread.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct MemoryStats {
    /// Number of allocations that have not been freed yet
    pub live_allocations  : usize,
    /// Number of bytes that have not been freed yet
    pub live_bytes        : usize,
    /// Total number of allocations
    pub total_allocations : usize,
    /// Total number of frees
    pub total_frees       : usize,
}

impl MemoryStats {
    pub const fn new() -> Self {
        Self { live_allocations: 0, live_bytes: 0, total_allocations: 0, total_frees: 0 }
    }
}

/// Get the allocation counters of the current thread.
/// 
/// Always returns zeroes when the `memory_tracking` feature is disabled.
pub fn memory_stats() -> MemoryStats {
    memory_tracking::stats()
}

cfg_if::cfg_if! {
    if #[cfg(feature = "memory_tracking")] {
        mod memory_tracking {
            use core::cell::Cell;
            use super::MemoryStats;

            thread_local! {
                static STATS : Cell<MemoryStats> = const { Cell::new(MemoryStats::new()) };
            }

            pub(super) fn on_allocate(size: usize) {
                STATS.with(|stats| {
                    let mut cur = stats.get();
                    cur.live_allocations += 1;
                    cur.live_bytes += size;
                    cur.total_allocations += 1;
                    stats.set(cur);
                });
            }

            pub(super) fn on_free(size: usize) {
                STATS.with(|stats| {
                    let mut cur = stats.get();
                    debug_assert!(cur.live_allocations > 0, "Freeing more allocations than were made on this thread");
                    cur.live_allocations = cur.live_allocations.saturating_sub(1);
                    cur.live_bytes = cur.live_bytes.saturating_sub(size);
                    cur.total_frees += 1;
                    stats.set(cur);
                });
            }

            pub(super) fn stats() -> MemoryStats {
                STATS.with(Cell::get)
            }
        }
    } else {
        mod memory_tracking {
            use super::MemoryStats;

            #[inline(always)]
            pub(super) fn on_allocate(_size: usize) {}

            #[inline(always)]
            pub(super) fn on_free(_size: usize) {}

            pub(super) fn stats() -> MemoryStats {
                MemoryStats::new()
            }
        }
    }
}
