use core::ptr;

/// A callable taking its arguments as a tuple.
///
/// Implemented for every `FnMut` with up to 8 arguments, and for the member function binders.
pub trait Invocable<A> {
    type Output;

    /// Invoke the callable with the arguments packed in a tuple.
    fn invoke(&mut self, args: A) -> Self::Output;
}

/// Type-erased functor interface stored by a [`Function`](super::Function).
///
/// Destroying a functor is done through its drop glue, via `ptr::drop_in_place` on the trait object.
pub trait Functor<A, R> {
    /// Invoke the functor.
    fn invoke(&mut self, args: A) -> R;

    /// Write a clone of the functor into `memory`.
    ///
    /// # Safety
    ///
    /// `memory` must be valid for writes and suitably aligned for the concrete functor type, and may not contain a live value.
    unsafe fn clone_to(&self, memory: *mut u8);

    /// Relocate the functor into `memory`.
    ///
    /// # Safety
    ///
    /// `memory` must be valid for writes and suitably aligned for the concrete functor type, and may not contain a live value.
    /// The functor is moved out of `self`, so it may not be used or dropped afterwards.
    unsafe fn move_to(&mut self, memory: *mut u8);
}

impl<A, F> Functor<A, F::Output> for F where
    F: Invocable<A> + Clone + 'static
{
    #[inline]
    fn invoke(&mut self, args: A) -> F::Output {
        Invocable::invoke(self, args)
    }

    unsafe fn clone_to(&self, memory: *mut u8) {
        debug_assert!(memory as usize % core::mem::align_of::<F>() == 0, "misaligned functor memory");
        ptr::write(memory.cast::<F>(), self.clone());
    }

    unsafe fn move_to(&mut self, memory: *mut u8) {
        debug_assert!(memory as usize % core::mem::align_of::<F>() == 0, "misaligned functor memory");
        ptr::copy_nonoverlapping(self as *const F, memory.cast::<F>(), 1);
    }
}
