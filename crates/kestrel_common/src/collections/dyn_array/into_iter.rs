use core::{
    fmt,
    iter::FusedIterator,
    ptr,
    slice,
};

use crate::collections::imp::{elements, raw_array::RawArray};

/// An iterator that moves out of a dynamic array.
///
/// This `struct` is created by the `into_iter` method on [`DynArray`](super::DynArray).
/// Elements that were not consumed are dropped together with the iterator.
pub struct IntoIter<T> {
    buf:   RawArray<T>,
    start: usize,
    end:   usize,
}

impl<T> IntoIter<T> {
    pub(super) fn new(buf: RawArray<T>, len: usize) -> Self {
        Self { buf, start: 0, end: len }
    }

    /// Returns the remaining items of this iterator as a slice.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: The elements in `[start, end)` are still initialized
        unsafe { slice::from_raw_parts(self.buf.ptr().add(self.start), self.end - self.start) }
    }

    /// Returns the remaining items of this iterator as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: The elements in `[start, end)` are still initialized
        unsafe { slice::from_raw_parts_mut(self.buf.ptr().add(self.start), self.end - self.start) }
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        if self.start == self.end {
            None
        } else {
            let index = self.start;
            self.start += 1;
            // SAFETY: The element is initialized and will not be read again
            unsafe { Some(ptr::read(self.buf.ptr().add(index))) }
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.end - self.start;
        (len, Some(len))
    }

    #[inline]
    fn count(self) -> usize {
        self.len()
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    #[inline]
    fn next_back(&mut self) -> Option<T> {
        if self.start == self.end {
            None
        } else {
            self.end -= 1;
            // SAFETY: The element is initialized and will not be read again
            unsafe { Some(ptr::read(self.buf.ptr().add(self.end))) }
        }
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> FusedIterator for IntoIter<T> {}

impl<T: fmt::Debug> fmt::Debug for IntoIter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.as_slice()).finish()
    }
}

impl<T> Drop for IntoIter<T> {
    fn drop(&mut self) {
        // SAFETY: Only the unconsumed elements are still initialized, the buffer itself is freed by `RawArray`
        unsafe { elements::destruct_range(self.buf.ptr().add(self.start), self.end - self.start) };
    }
}
