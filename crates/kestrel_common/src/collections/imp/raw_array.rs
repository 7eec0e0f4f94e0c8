use core::{
    alloc::Layout,
    marker::PhantomData,
    mem,
    ptr::NonNull,
};

use crate::{
    alloc::{self, array_layout},
    collections::TryReserveError,
};

use super::elements;

/// Low level utility for allocating, reallocating, and deallocating a buffer of elements,
/// without having to worry about all the corner cases involved.
/// In particular:
/// 
/// - Uses a dangling pointer for zero-length buffers and zero-sized types, which are never allocated or freed.
/// - Catches all overflows in capacity computations (promotes them to "capacity overflow" errors).
/// 
/// This type does not in any way inspect the memory it manages. When dropped it *will* free its memory, but it *won't* try to drop its contents.
/// It is up to the user of `RawArray` to handle the actual things *stored* inside of `RawArray`.
pub(crate) struct RawArray<T> {
    ptr:      NonNull<T>,
    cap:      usize,
    _phantom: PhantomData<T>,
}

// SAFETY: `RawArray` uniquely owns its buffer
unsafe impl<T: Send> Send for RawArray<T> {}
unsafe impl<T: Sync> Sync for RawArray<T> {}

impl<T> RawArray<T> {
    /// Creates an empty `RawArray` without allocating.
    pub(crate) const fn new() -> Self {
        Self { ptr: NonNull::dangling(), cap: 0, _phantom: PhantomData }
    }

    /// Creates a `RawArray` with exactly the capacity and alignment requirements for a `[T; capacity]`.
    /// 
    /// # Panics
    /// 
    /// Panics if the requested capacity exceed `isize::MAX` bytes.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        match Self::try_with_capacity(capacity) {
            Ok(arr) => arr,
            Err(err) => handle_reserve_error(err),
        }
    }

    pub(crate) fn try_with_capacity(capacity: usize) -> Result<Self, TryReserveError> {
        if capacity == 0 {
            return Ok(Self::new());
        }

        log_allocation::<T>(0, capacity);
        Self::allocate_buffer(capacity)
    }

    fn allocate_buffer(capacity: usize) -> Result<Self, TryReserveError> {
        if capacity == 0 {
            return Ok(Self::new());
        }

        let layout = array_layout::<T>(capacity)?;
        let ptr = alloc::allocate(layout).cast();
        Ok(Self { ptr, cap: capacity, _phantom: PhantomData })
    }

    /// Get the capacity of the allocation.
    #[inline]
    pub(crate) const fn capacity(&self) -> usize {
        self.cap
    }

    #[inline]
    pub(crate) const fn ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Reallocate the buffer to exactly `new_cap` elements, relocating the first `len` elements.
    /// 
    /// # Safety
    /// 
    /// The first `len` elements must be initialized, and `len` may not exceed `new_cap`.
    pub(crate) unsafe fn try_realloc(&mut self, new_cap: usize, len: usize) -> Result<(), TryReserveError> {
        debug_assert!(len <= new_cap && len <= self.cap);
        if new_cap == self.cap {
            return Ok(());
        }

        let new_buf = Self::allocate_buffer(new_cap)?;
        log_allocation::<T>(self.cap, new_cap);
        elements::move_emplace(new_buf.ptr(), self.ptr(), len);
        // The old buffer is freed once `new_buf` is dropped
        mem::drop(mem::replace(self, new_buf));
        Ok(())
    }

    /// Reallocate the buffer to exactly `new_cap` elements, relocating the first `len` elements.
    /// 
    /// # Safety
    /// 
    /// See [`RawArray::try_realloc`]
    pub(crate) unsafe fn realloc(&mut self, new_cap: usize, len: usize) {
        if let Err(err) = self.try_realloc(new_cap, len) {
            handle_reserve_error(err);
        }
    }

    fn layout(&self) -> Layout {
        // SAFETY: The same layout was successfully created when allocating
        unsafe { Layout::from_size_align_unchecked(mem::size_of::<T>() * self.cap, mem::align_of::<T>()) }
    }
}

impl<T> Drop for RawArray<T> {
    fn drop(&mut self) {
        if self.cap != 0 {
            // SAFETY: `ptr` was allocated with this layout, a zero-sized layout is ignored by `free`
            unsafe { alloc::free(self.ptr.cast(), self.layout()) };
        }
    }
}

//--------------------------------------------------------------

#[cold]
#[track_caller]
pub(crate) fn handle_reserve_error(err: TryReserveError) -> ! {
    match err {
        TryReserveError::CapacityOverflow => capacity_overflow(),
        TryReserveError::AllocError { layout } => std::alloc::handle_alloc_error(layout),
    }
}

#[cold]
#[track_caller]
pub(crate) fn capacity_overflow() -> ! {
    panic!("capacity overflow");
}

cfg_if::cfg_if! {
    if #[cfg(feature = "alloc_logging")] {
        fn log_allocation<T>(old_cap: usize, new_cap: usize) {
            if old_cap != 0 {
                kestrel_logging::log_debug!(alloc::LOG_CAT, "Reallocating [{}] buffer: {old_cap} -> {new_cap} elements", core::any::type_name::<T>());
            } else {
                kestrel_logging::log_debug!(alloc::LOG_CAT, "Allocating [{}] buffer: {new_cap} elements", core::any::type_name::<T>());
            }
        }
    } else {
        #[inline(always)]
        fn log_allocation<T>(_old_cap: usize, _new_cap: usize) {}
    }
}
