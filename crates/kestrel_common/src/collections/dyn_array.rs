use core::{
    borrow::{Borrow, BorrowMut},
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    iter,
    marker::PhantomData,
    mem::{self, ManuallyDrop},
    ops::{Bound, Deref, DerefMut, Index, IndexMut, Range, RangeBounds},
    ptr,
    slice::{self, SliceIndex},
};

use super::{
    imp::{elements, raw_array::{capacity_overflow, handle_reserve_error, RawArray}},
    impl_slice_partial_eq_generic,
    HalfCapacityReserveStrategy,
    ReserveStrategy,
    TryReserveError,
};

mod into_iter;

#[cfg(test)]
mod tests;

pub use into_iter::IntoIter;

/// A contiguous growable array type, also known as a dynamic array.
///
/// Dynamic arrays have *O*(1) indexing, amortized *O*(1) push (to the end), and *O*(1) pop (from the back).
///
/// The first `len` slots of the buffer hold live elements, the remaining slots up to the capacity are uninitialized.
/// Memory is only ever requested through [`crate::alloc::allocate`], and the growth of the buffer is decided by the reserve strategy `R`.
///
/// # Examples
///
/// ```
/// use kestrel_common::{collections::DynArray, dynarray};
///
/// let mut arr = DynArray::<i32>::new();
/// arr.push(1);
/// arr.push(2);
///
/// assert_eq!(arr.len(), 2);
/// assert_eq!(arr[0], 1);
///
/// arr[0] = 7;
/// assert_eq!(arr[0], 7);
///
/// arr.extend([1, 2, 3]);
/// assert_eq!(arr, [7, 2, 1, 2, 3]);
///
/// let pos = arr.insert(1, 9);
/// assert_eq!(arr, [7, 9, 2, 1, 2, 3]);
/// arr.erase(pos);
/// assert_eq!(arr, dynarray![7, 2, 1, 2, 3]);
/// ```
///
/// # Capacity and reallocation
///
/// The capacity of a dynamic array is the amount of space allocated for any future elements that will be added onto the array.
/// If the length of the array would exceed its capacity, a new buffer is allocated with the capacity returned by the reserve strategy,
/// and the elements are moved into it.
///
/// Unlike [`Vec::reserve`], [`DynArray::reserve`] sets the capacity to *exactly* the requested value, which also means it can shrink the array.
///
/// # Positions
///
/// Insertions and erasures return an index into the array, which is invalidated by any operation that reallocates the buffer.
pub struct DynArray<T, R: ReserveStrategy = HalfCapacityReserveStrategy> {
    buf:      RawArray<T>,
    len:      usize,
    _phantom: PhantomData<fn() -> R>,
}

static_assertions::assert_impl_all!(DynArray<u32>: Send, Sync, Default, Clone);
static_assertions::assert_not_impl_any!(DynArray<std::rc::Rc<u32>>: Send, Sync);

impl<T, R: ReserveStrategy> DynArray<T, R> {
    /// Constructs a new, empty `DynArray`.
    ///
    /// The array will not allocate until elements are pushed onto it.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { buf: RawArray::new(), len: 0, _phantom: PhantomData }
    }

    /// Constructs a new, empty `DynArray` with exactly the given capacity.
    ///
    /// # Panics
    ///
    /// Panics if the new capacity exceeds `isize::MAX` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: RawArray::with_capacity(capacity), len: 0, _phantom: PhantomData }
    }

    /// Constructs a `DynArray` with `len` default constructed elements.
    #[must_use]
    pub fn with_len(len: usize) -> Self where
        T: Default
    {
        let mut arr = Self::with_capacity(len);
        arr.extend_with(len, T::default);
        arr
    }

    /// Constructs a `DynArray` with `count` copies of `value`.
    #[must_use]
    pub fn from_elem(value: T, count: usize) -> Self where
        T: Clone
    {
        let mut arr = Self::with_capacity(count);
        arr.extend_with_elem(count, value);
        arr
    }

    /// Constructs a `DynArray` by cloning all elements of a slice.
    #[must_use]
    pub fn from_slice(slice: &[T]) -> Self where
        T: Clone
    {
        let mut arr = Self::with_capacity(slice.len());
        arr.extend_from_slice(slice);
        arr
    }

    /// Constructs a `DynArray` by bitwise copying all elements of a slice.
    #[must_use]
    pub fn from_copied(slice: &[T]) -> Self where
        T: Copy
    {
        let mut arr = Self::with_capacity(slice.len());
        arr.extend_from_copied(slice);
        arr
    }

    /// Move the content out of the array, leaving an empty array without an allocation behind.
    #[must_use]
    pub fn take(&mut self) -> Self {
        mem::replace(self, Self::new())
    }

    //--------------------------------------------------------------

    /// Returns the number of elements in the array.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the array contains no elements.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of elements the array can hold without reallocating.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Returns the size in bytes of the live elements.
    #[inline]
    pub const fn size_in_bytes(&self) -> usize {
        self.len * mem::size_of::<T>()
    }

    /// Returns the size in bytes of the allocated buffer.
    #[inline]
    pub const fn capacity_in_bytes(&self) -> usize {
        self.buf.capacity() * mem::size_of::<T>()
    }

    #[inline]
    pub const fn as_ptr(&self) -> *const T {
        self.buf.ptr()
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.buf.ptr()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: The first `len` elements are initialized, and the pointer is non-null and aligned
        unsafe { slice::from_raw_parts(self.buf.ptr(), self.len) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: The first `len` elements are initialized, and the pointer is non-null and aligned
        unsafe { slice::from_raw_parts_mut(self.buf.ptr(), self.len) }
    }

    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    #[inline]
    pub fn iter_mut(&mut self) -> slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }

    /// Iterate over the elements, starting from the back.
    #[inline]
    pub fn rev_iter(&self) -> iter::Rev<slice::Iter<'_, T>> {
        self.iter().rev()
    }

    /// Mutably iterate over the elements, starting from the back.
    #[inline]
    pub fn rev_iter_mut(&mut self) -> iter::Rev<slice::IterMut<'_, T>> {
        self.iter_mut().rev()
    }

    //--------------------------------------------------------------

    /// Get a reference to the first element.
    ///
    /// # Panics
    ///
    /// Panics if the array is empty.
    #[track_caller]
    pub fn front(&self) -> &T {
        if self.len == 0 {
            empty_access("front");
        }
        self.at(0)
    }

    /// Get a mutable reference to the first element.
    ///
    /// # Panics
    ///
    /// Panics if the array is empty.
    #[track_caller]
    pub fn front_mut(&mut self) -> &mut T {
        if self.len == 0 {
            empty_access("front_mut");
        }
        self.at_mut(0)
    }

    /// Get a reference to the last element.
    ///
    /// # Panics
    ///
    /// Panics if the array is empty.
    #[track_caller]
    pub fn back(&self) -> &T {
        if self.len == 0 {
            empty_access("back");
        }
        self.at(self.len - 1)
    }

    /// Get a mutable reference to the last element.
    ///
    /// # Panics
    ///
    /// Panics if the array is empty.
    #[track_caller]
    pub fn back_mut(&mut self) -> &mut T {
        if self.len == 0 {
            empty_access("back_mut");
        }
        let index = self.len - 1;
        self.at_mut(index)
    }

    /// Get a reference to the element at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[track_caller]
    pub fn at(&self, index: usize) -> &T {
        if index >= self.len {
            index_out_of_bounds(index, self.len);
        }
        // SAFETY: `index` is in bounds
        unsafe { &*self.buf.ptr().add(index) }
    }

    /// Get a mutable reference to the element at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[track_caller]
    pub fn at_mut(&mut self, index: usize) -> &mut T {
        if index >= self.len {
            index_out_of_bounds(index, self.len);
        }
        // SAFETY: `index` is in bounds
        unsafe { &mut *self.buf.ptr().add(index) }
    }

    //--------------------------------------------------------------

    /// Set the capacity of the array to exactly `capacity`.
    ///
    /// When `capacity` is smaller than the length of the array, the elements past `capacity` are dropped.
    /// Reserving a capacity of 0 will free the buffer.
    ///
    /// # Panics
    ///
    /// Panics if the new capacity exceeds `isize::MAX` bytes.
    pub fn reserve(&mut self, capacity: usize) {
        if let Err(err) = self.try_reserve(capacity) {
            handle_reserve_error(err);
        }
    }

    /// Tries to set the capacity of the array to exactly `capacity`.
    ///
    /// When `capacity` is smaller than the length of the array, the elements past `capacity` are dropped.
    ///
    /// # Errors
    ///
    /// If the capacity overflows, or the allocator reports a failure, an error is returned.
    pub fn try_reserve(&mut self, capacity: usize) -> Result<(), TryReserveError> {
        if capacity == self.capacity() {
            return Ok(());
        }

        self.truncate(capacity);
        // SAFETY: The first `len` elements are initialized, and `len <= capacity`
        unsafe { self.buf.try_realloc(capacity, self.len) }
    }

    /// Shrink the capacity of the array to its length.
    pub fn shrink_to_fit(&mut self) {
        if self.capacity() != self.len {
            // SAFETY: The first `len` elements are initialized
            unsafe { self.buf.realloc(self.len, self.len) };
        }
    }

    /// Shortens the array, keeping the first `len` elements and dropping the rest.
    ///
    /// Does nothing when `len` is greater or equal to the current length.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }

        let old_len = self.len;
        // Update the length first, so a panicking destructor can't cause a double drop
        self.len = len;
        // SAFETY: The elements in `[len, old_len)` are initialized and no longer reachable
        unsafe { elements::destruct_range(self.buf.ptr().add(len), old_len - len) };
    }

    /// Drops all elements, keeping the capacity.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    //--------------------------------------------------------------

    /// Replace the content of the array with `len` default constructed elements.
    pub fn assign_len(&mut self, len: usize) where
        T: Default
    {
        self.clear();
        self.resize_default(len);
    }

    /// Replace the content of the array with `count` copies of `value`.
    pub fn assign_elem(&mut self, count: usize, value: T) where
        T: Clone
    {
        self.clear();
        self.resize(count, value);
    }

    /// Replace the content of the array with clones of the elements in `slice`.
    pub fn assign_slice(&mut self, slice: &[T]) where
        T: Clone
    {
        self.clear();
        self.extend_from_slice(slice);
    }

    /// Replace the content of the array with the elements of an iterator.
    pub fn assign_iter<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.clear();
        self.extend(iter);
    }

    /// Replace the content of the array with the elements of an array.
    pub fn assign_array<const N: usize>(&mut self, array: [T; N]) {
        self.clear();
        let len = self.len;
        self.insert_array(len, array);
    }

    /// Overwrite every element with a clone of `value`, the last element receives `value` itself.
    pub fn fill(&mut self, value: T) where
        T: Clone
    {
        if let Some((last, rest)) = self.as_mut_slice().split_last_mut() {
            for elem in rest {
                elem.clone_from(&value);
            }
            *last = value;
        }
    }

    /// Overwrite every element with the result of calling `f`.
    pub fn fill_with<F: FnMut() -> T>(&mut self, mut f: F) {
        for elem in self.iter_mut() {
            *elem = f();
        }
    }

    /// Resize the array to `new_len` elements, new elements are default constructed.
    pub fn resize_default(&mut self, new_len: usize) where
        T: Default
    {
        self.resize_with(new_len, T::default);
    }

    /// Resize the array to `new_len` elements, new elements are clones of `value`.
    pub fn resize(&mut self, new_len: usize, value: T) where
        T: Clone
    {
        if new_len > self.len {
            self.reserve_exact_for(new_len);
            self.extend_with_elem(new_len - self.len, value);
        } else {
            self.truncate(new_len);
        }
    }

    /// Resize the array to `new_len` elements, new elements are created by calling `f`.
    pub fn resize_with<F: FnMut() -> T>(&mut self, new_len: usize, f: F) {
        if new_len > self.len {
            self.reserve_exact_for(new_len);
            self.extend_with(new_len - self.len, f);
        } else {
            self.truncate(new_len);
        }
    }

    //--------------------------------------------------------------

    /// Appends an element to the back of the array, and returns a reference to it.
    ///
    /// # Panics
    ///
    /// Panics if the new capacity exceeds `isize::MAX` bytes.
    pub fn push(&mut self, value: T) -> &mut T {
        if self.len == self.capacity() {
            self.grow_for(1);
        }

        // SAFETY: There is at least 1 uninitialized slot after the live elements
        unsafe {
            let slot = self.buf.ptr().add(self.len);
            ptr::write(slot, value);
            self.len += 1;
            &mut *slot
        }
    }

    /// Appends the element created by `f` to the back of the array, and returns a reference to it.
    pub fn emplace_back<F: FnOnce() -> T>(&mut self, f: F) -> &mut T {
        self.push(f())
    }

    /// Inserts an element at `index`, shifting all elements after it to the back.
    ///
    /// Returns the index of the inserted element.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    #[track_caller]
    pub fn insert(&mut self, index: usize, value: T) -> usize {
        self.check_insert_index(index);
        let mut gap = self.open_gap(index, 1);
        gap.push(value);
        index
    }

    /// Inserts the element created by `f` at `index`, shifting all elements after it to the back.
    ///
    /// Returns the index of the inserted element.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    #[track_caller]
    pub fn emplace<F: FnOnce() -> T>(&mut self, index: usize, f: F) -> usize {
        self.check_insert_index(index);
        let mut gap = self.open_gap(index, 1);
        gap.push(f());
        index
    }

    /// Inserts all elements of an array at `index`.
    ///
    /// Returns the index of the first inserted element.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    #[track_caller]
    pub fn insert_array<const N: usize>(&mut self, index: usize, array: [T; N]) -> usize {
        self.check_insert_index(index);
        let mut gap = self.open_gap(index, N);
        let array = ManuallyDrop::new(array);
        // SAFETY: The gap has space for exactly `N` elements, ownership is transferred out of `array`
        unsafe { gap.move_from(array.as_ptr(), N) };
        index
    }

    /// Inserts clones of all elements in `slice` at `index`.
    ///
    /// Returns the index of the first inserted element.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    #[track_caller]
    pub fn insert_slice(&mut self, index: usize, slice: &[T]) -> usize where
        T: Clone
    {
        self.check_insert_index(index);
        let mut gap = self.open_gap(index, slice.len());
        for elem in slice {
            gap.push(elem.clone());
        }
        index
    }

    /// Inserts bitwise copies of all elements in `slice` at `index`.
    ///
    /// Returns the index of the first inserted element.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    #[track_caller]
    pub fn insert_copied(&mut self, index: usize, slice: &[T]) -> usize where
        T: Copy
    {
        self.check_insert_index(index);
        let mut gap = self.open_gap(index, slice.len());
        // SAFETY: `T` is `Copy`, so the source stays valid, and the gap has space for the whole slice
        unsafe { gap.move_from(slice.as_ptr(), slice.len()) };
        index
    }

    /// Inserts all elements of an iterator at `index`.
    ///
    /// The gap is sized by the length reported by the iterator; if the iterator ends early, the unused part of the gap is closed again.
    ///
    /// Returns the index of the first inserted element.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    #[track_caller]
    pub fn insert_iter<I>(&mut self, index: usize, iter: I) -> usize where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        self.check_insert_index(index);
        let iter = iter.into_iter();
        let count = iter.len();
        let mut gap = self.open_gap(index, count);
        for elem in iter.take(count) {
            gap.push(elem);
        }
        index
    }

    /// Appends clones of all elements in `slice`.
    pub fn extend_from_slice(&mut self, slice: &[T]) where
        T: Clone
    {
        let len = self.len;
        self.insert_slice(len, slice);
    }

    /// Appends bitwise copies of all elements in `slice`.
    pub fn extend_from_copied(&mut self, slice: &[T]) where
        T: Copy
    {
        let len = self.len;
        self.insert_copied(len, slice);
    }

    //--------------------------------------------------------------

    /// Removes the last element and returns it, or `None` if the array is empty.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            None
        } else {
            self.len -= 1;
            // SAFETY: The element was initialized and is no longer reachable
            unsafe { Some(ptr::read(self.buf.ptr().add(self.len))) }
        }
    }

    /// Drops the last element.
    ///
    /// # Panics
    ///
    /// Panics if the array is empty.
    #[track_caller]
    pub fn pop_back(&mut self) {
        if self.len == 0 {
            empty_access("pop_back");
        }
        self.truncate(self.len - 1);
    }

    /// Removes the element at `index` and returns it, shifting all elements after it to the front.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    #[track_caller]
    pub fn remove(&mut self, index: usize) -> T {
        #[cold]
        #[track_caller]
        fn assert_failed(index: usize, len: usize) -> ! {
            panic!("removal index (is {index}) should be < len (is {len})");
        }

        let len = self.len;
        if index >= len {
            assert_failed(index, len);
        }

        // SAFETY: `index` is in bounds, and the tail is moved over the removed element
        unsafe {
            let ptr = self.buf.ptr().add(index);
            let value = ptr::read(ptr);
            elements::memmove_backwards(ptr, ptr.add(1), len - index - 1);
            self.len = len - 1;
            value
        }
    }

    /// Removes the element at `index` and returns it, replacing it by the last element.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    #[track_caller]
    pub fn swap_remove(&mut self, index: usize) -> T {
        #[cold]
        #[track_caller]
        fn assert_failed(index: usize, len: usize) -> ! {
            panic!("swap_remove index (is {index}) should be < len (is {len})");
        }

        let len = self.len;
        if index >= len {
            assert_failed(index, len);
        }

        // SAFETY: `index` is in bounds, the last element is moved into its slot
        unsafe {
            let base = self.buf.ptr();
            let value = ptr::read(base.add(index));
            ptr::copy(base.add(len - 1), base.add(index), 1);
            self.len = len - 1;
            value
        }
    }

    /// Drops the element at `index`, shifting all elements after it to the front.
    ///
    /// Returns the index of the element now occupying the erased slot.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    #[track_caller]
    pub fn erase(&mut self, index: usize) -> usize {
        mem::drop(self.remove(index));
        index
    }

    /// Drops all elements in `range`, shifting all elements after it to the front.
    ///
    /// Returns the index of the element now occupying the first erased slot.
    ///
    /// # Panics
    ///
    /// Panics if the range is empty, inverted, or out of bounds.
    #[track_caller]
    pub fn erase_range<B: RangeBounds<usize>>(&mut self, range: B) -> usize {
        #[cold]
        #[track_caller]
        fn assert_failed(start: usize, end: usize, len: usize) -> ! {
            panic!("erase range (is {start}..{end}) should be non-empty and end <= len (is {len})");
        }

        let len = self.len;
        let Range { start, end } = to_range(range, len);
        if start >= end || end > len {
            assert_failed(start, end, len);
        }

        let base = self.buf.ptr();
        let tail = len - end;
        self.len = start;

        let len = &mut self.len;
        // The tail is moved even when a destructor panics
        defer! {
            // SAFETY: The tail elements are initialized, and the erased slots are uninitialized after destruction
            unsafe { elements::memmove_backwards(base.add(start), base.add(end), tail) };
            *len = start + tail;
        }
        // SAFETY: The elements in `[start, end)` are initialized and no longer reachable
        unsafe { elements::destruct_range(base.add(start), end - start) };
        start
    }

    /// Exchange the content of 2 arrays.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(&mut self.buf, &mut other.buf);
        mem::swap(&mut self.len, &mut other.len);
    }

    //--------------------------------------------------------------

    #[track_caller]
    fn check_insert_index(&self, index: usize) {
        #[cold]
        #[track_caller]
        fn assert_failed(index: usize, len: usize) -> ! {
            panic!("insertion index (is {index}) should be <= len (is {len})");
        }

        if index > self.len {
            assert_failed(index, self.len);
        }
    }

    /// Get the capacity to grow to when `count` elements are added, resulting in a length of `required`.
    ///
    /// Growing by more than 1 element anchors the strategy one slot past the new length.
    fn grow_capacity(&self, required: usize, count: usize) -> usize {
        let min_capacity = if count > 1 {
            match required.checked_add(1) {
                Some(min_capacity) => min_capacity,
                None => capacity_overflow(),
            }
        } else {
            required
        };

        let capacity = match R::calculate(self.capacity(), min_capacity) {
            Ok(capacity) => capacity,
            Err(err) => handle_reserve_error(err),
        };
        debug_assert!(capacity >= min_capacity, "reserve strategy returned a capacity ({capacity}) smaller than the required capacity ({min_capacity})");
        capacity
    }

    /// Reallocate to exactly `new_len` elements when the current capacity is too small.
    fn reserve_exact_for(&mut self, new_len: usize) {
        if new_len > self.capacity() {
            // SAFETY: The first `len` elements are initialized, and `len < new_len`
            unsafe { self.buf.realloc(new_len, self.len) };
        }
    }

    fn grow_for(&mut self, additional: usize) {
        let required = match self.len.checked_add(additional) {
            Some(required) => required,
            None => capacity_overflow(),
        };
        let capacity = self.grow_capacity(required, additional);
        // SAFETY: The first `len` elements are initialized, and `len <= capacity`
        unsafe { self.buf.realloc(capacity, self.len) };
    }

    /// Open a gap of `count` uninitialized slots at `index`.
    ///
    /// When the array needs to grow, the elements are placed around the gap directly in the new buffer.
    /// Otherwise the elements after `index` are moved back to make space.
    fn open_gap(&mut self, index: usize, count: usize) -> InsertGap<'_, T, R> {
        let len = self.len;
        debug_assert!(index <= len);

        let new_len = match len.checked_add(count) {
            Some(new_len) => new_len,
            None => capacity_overflow(),
        };

        // SAFETY: All moves stay within the live elements and the allocated capacity
        unsafe {
            if new_len > self.capacity() {
                let new_buf = RawArray::<T>::with_capacity(self.grow_capacity(new_len, count));
                elements::move_emplace(new_buf.ptr(), self.buf.ptr(), index);
                elements::move_emplace(new_buf.ptr().add(index + count), self.buf.ptr().add(index), len - index);
                // Only frees the old buffer, its elements were moved out
                self.buf = new_buf;
            } else {
                let base = self.buf.ptr();
                elements::memmove_forward(base.add(index + count), base.add(index), len - index);
            }
        }

        self.len = index;
        InsertGap { arr: self, index, count, filled: 0, tail: len - index }
    }

    fn extend_with<F: FnMut() -> T>(&mut self, count: usize, mut f: F) {
        let len = self.len;
        let mut gap = self.open_gap(len, count);
        for _ in 0..count {
            gap.push(f());
        }
    }

    fn extend_with_elem(&mut self, count: usize, value: T) where
        T: Clone
    {
        if count == 0 {
            return;
        }

        let len = self.len;
        let mut gap = self.open_gap(len, count);
        for _ in 1..count {
            gap.push(value.clone());
        }
        gap.push(value);
    }
}

//--------------------------------------------------------------

/// Uninitialized gap inside of an array, elements written so far are kept, the rest of the gap is closed when dropped.
///
/// While the gap is open, the length of the array only covers the elements in front of the gap,
/// so a panic while filling the gap can't expose uninitialized memory.
struct InsertGap<'a, T, R: ReserveStrategy> {
    arr:    &'a mut DynArray<T, R>,
    index:  usize,
    count:  usize,
    filled: usize,
    tail:   usize,
}

impl<T, R: ReserveStrategy> InsertGap<'_, T, R> {
    fn push(&mut self, value: T) {
        debug_assert!(self.filled < self.count, "writing past the end of an insertion gap");
        // SAFETY: The slot is inside of the gap, so it is allocated and uninitialized
        unsafe { ptr::write(self.arr.buf.ptr().add(self.index + self.filled), value) };
        self.filled += 1;
    }

    /// # Safety
    ///
    /// `src` must be valid for `count` reads and the caller must give up ownership of the source elements.
    unsafe fn move_from(&mut self, src: *const T, count: usize) {
        debug_assert!(count <= self.count - self.filled, "writing past the end of an insertion gap");
        elements::move_emplace(self.arr.buf.ptr().add(self.index + self.filled), src, count);
        self.filled += count;
    }
}

impl<T, R: ReserveStrategy> Drop for InsertGap<'_, T, R> {
    fn drop(&mut self) {
        // SAFETY: The tail is initialized and located directly after the gap
        unsafe {
            if self.filled != self.count {
                let base = self.arr.buf.ptr();
                elements::memmove_backwards(base.add(self.index + self.filled), base.add(self.index + self.count), self.tail);
            }
        }
        self.arr.len = self.index + self.filled + self.tail;
    }
}

//--------------------------------------------------------------

#[cold]
#[track_caller]
fn index_out_of_bounds(index: usize, len: usize) -> ! {
    panic!("index (is {index}) should be < len (is {len})");
}

#[cold]
#[track_caller]
fn empty_access(op: &str) -> ! {
    panic!("`{op}` called on an empty array");
}

fn to_range<B: RangeBounds<usize>>(range: B, len: usize) -> Range<usize> {
    let start = match range.start_bound() {
        Bound::Included(&start) => start,
        Bound::Excluded(&start) => start.checked_add(1).unwrap_or(usize::MAX),
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&end) => end.checked_add(1).unwrap_or(usize::MAX),
        Bound::Excluded(&end) => end,
        Bound::Unbounded => len,
    };
    start..end
}

//--------------------------------------------------------------

impl<T, R: ReserveStrategy> Drop for DynArray<T, R> {
    fn drop(&mut self) {
        // SAFETY: The first `len` elements are initialized, the buffer itself is freed by `RawArray`
        unsafe { elements::destruct_range(self.buf.ptr(), self.len) };
    }
}

impl<T, R: ReserveStrategy> Default for DynArray<T, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone, R: ReserveStrategy> Clone for DynArray<T, R> {
    fn clone(&self) -> Self {
        Self::from_slice(self)
    }

    fn clone_from(&mut self, source: &Self) {
        if source.len > self.capacity() {
            *self = source.clone();
            return;
        }

        self.truncate(source.len);
        let (init, tail) = source.split_at(self.len);
        self.as_mut_slice().clone_from_slice(init);
        self.extend_from_slice(tail);
    }
}

impl<T, R: ReserveStrategy> Deref for DynArray<T, R> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, R: ReserveStrategy> DerefMut for DynArray<T, R> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T, R: ReserveStrategy, I: SliceIndex<[T]>> Index<I> for DynArray<T, R> {
    type Output = I::Output;

    #[inline]
    #[track_caller]
    fn index(&self, index: I) -> &Self::Output {
        Index::index(self.as_slice(), index)
    }
}

impl<T, R: ReserveStrategy, I: SliceIndex<[T]>> IndexMut<I> for DynArray<T, R> {
    #[inline]
    #[track_caller]
    fn index_mut(&mut self, index: I) -> &mut Self::Output {
        IndexMut::index_mut(self.as_mut_slice(), index)
    }
}

impl<T: fmt::Debug, R: ReserveStrategy> fmt::Debug for DynArray<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_slice(), f)
    }
}

impl<T: Hash, R: ReserveStrategy> Hash for DynArray<T, R> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        Hash::hash(self.as_slice(), state)
    }
}

impl_slice_partial_eq_generic!{ [R0: ReserveStrategy, R1: ReserveStrategy] DynArray<T, R0>, DynArray<U, R1> }
impl_slice_partial_eq_generic!{ [R: ReserveStrategy] DynArray<T, R>, [U] }
impl_slice_partial_eq_generic!{ [R: ReserveStrategy] DynArray<T, R>, &[U] }
impl_slice_partial_eq_generic!{ [R: ReserveStrategy] DynArray<T, R>, &mut [U] }
impl_slice_partial_eq_generic!{ [R: ReserveStrategy, const N: usize] DynArray<T, R>, [U; N] }
impl_slice_partial_eq_generic!{ [R: ReserveStrategy, const N: usize] DynArray<T, R>, &[U; N] }
impl_slice_partial_eq_generic!{ [R: ReserveStrategy] [T], DynArray<U, R> }
impl_slice_partial_eq_generic!{ [R: ReserveStrategy] &[T], DynArray<U, R> }
impl_slice_partial_eq_generic!{ [R: ReserveStrategy] Vec<T>, DynArray<U, R> }

impl<T: Eq, R: ReserveStrategy> Eq for DynArray<T, R> {}

impl<T: PartialOrd, R: ReserveStrategy> PartialOrd for DynArray<T, R> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        PartialOrd::partial_cmp(self.as_slice(), other.as_slice())
    }
}

impl<T: Ord, R: ReserveStrategy> Ord for DynArray<T, R> {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        Ord::cmp(self.as_slice(), other.as_slice())
    }
}

impl<T, R: ReserveStrategy> AsRef<[T]> for DynArray<T, R> {
    fn as_ref(&self) -> &[T] {
        self
    }
}

impl<T, R: ReserveStrategy> AsMut<[T]> for DynArray<T, R> {
    fn as_mut(&mut self) -> &mut [T] {
        self
    }
}

impl<T, R: ReserveStrategy> Borrow<[T]> for DynArray<T, R> {
    fn borrow(&self) -> &[T] {
        self
    }
}

impl<T, R: ReserveStrategy> BorrowMut<[T]> for DynArray<T, R> {
    fn borrow_mut(&mut self) -> &mut [T] {
        self
    }
}

impl<T, R: ReserveStrategy, const N: usize> From<[T; N]> for DynArray<T, R> {
    fn from(array: [T; N]) -> Self {
        let mut arr = Self::with_capacity(N);
        arr.insert_array(0, array);
        arr
    }
}

impl<T: Clone, R: ReserveStrategy> From<&[T]> for DynArray<T, R> {
    fn from(slice: &[T]) -> Self {
        Self::from_slice(slice)
    }
}

impl<T, R: ReserveStrategy> FromIterator<T> for DynArray<T, R> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut arr = Self::new();
        arr.extend(iter);
        arr
    }
}

impl<T, R: ReserveStrategy> Extend<T> for DynArray<T, R> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        if lower > self.capacity() - self.len {
            self.grow_for(lower);
        }
        for elem in iter {
            self.push(elem);
        }
    }
}

impl<'a, T: Copy + 'a, R: ReserveStrategy> Extend<&'a T> for DynArray<T, R> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied())
    }
}

impl<T, R: ReserveStrategy> IntoIterator for DynArray<T, R> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        let me = ManuallyDrop::new(self);
        // SAFETY: `me` is never used or dropped again, so the buffer is owned by the iterator from here on
        let buf = unsafe { ptr::read(&me.buf) };
        IntoIter::new(buf, me.len)
    }
}

impl<'a, T, R: ReserveStrategy> IntoIterator for &'a DynArray<T, R> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, R: ReserveStrategy> IntoIterator for &'a mut DynArray<T, R> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// Creates a [`DynArray`] containing the arguments.
///
/// - Create a [`DynArray`] containing a given list of elements:
/// ```
/// use kestrel_common::dynarray;
///
/// let arr = dynarray![1, 2, 3];
/// assert_eq!(arr[0], 1);
/// ```
/// - Create a [`DynArray`] from a given element and size:
/// ```
/// use kestrel_common::dynarray;
///
/// let arr = dynarray![1; 3];
/// assert_eq!(arr, [1, 1, 1]);
/// ```
#[macro_export]
macro_rules! dynarray {
    () => {
        $crate::collections::DynArray::<_>::new()
    };
    ($elem:expr; $n:expr) => {
        $crate::collections::DynArray::<_>::from_elem($elem, $n)
    };
    ($($x:expr),+ $(,)?) => {
        <$crate::collections::DynArray::<_>>::from([$($x),+])
    };
}
