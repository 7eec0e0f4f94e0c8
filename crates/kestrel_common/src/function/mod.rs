//! Type-erased callable with small-buffer storage.
//!
//! A [`Function`] owns a single functor, either inside of its inline buffer or in a heap block.
//! Small callables (up to [`INLINE_SIZE`] bytes with at most word alignment) never allocate.

use core::{
    alloc::Layout,
    fmt,
    marker::PhantomData,
    mem::{self, MaybeUninit},
    ptr::{self, NonNull},
};

use crate::alloc;

mod functor;
mod member;


pub use functor::{Functor, Invocable};
pub use member::{bind_const_member, bind_member, ConstMemberFunction, MemberFunction};

const INLINE_WORDS : usize = 4;

type InlineBuffer = MaybeUninit<[usize; INLINE_WORDS]>;

/// Size in bytes of the inline buffer of a [`Function`].
pub const INLINE_SIZE : usize = mem::size_of::<InlineBuffer>();

/// Alignment of the inline buffer of a [`Function`].
pub const INLINE_ALIGN : usize = mem::align_of::<InlineBuffer>();

static_assertions::const_assert_eq!(INLINE_SIZE, 4 * mem::size_of::<usize>());
static_assertions::const_assert_eq!(INLINE_ALIGN, mem::align_of::<usize>());

/// Check if a functor of type `F` is stored inline.
pub const fn fits_inline<F>() -> bool {
    mem::size_of::<F>() <= INLINE_SIZE && mem::align_of::<F>() <= INLINE_ALIGN
}

#[derive(Clone, Copy)]
struct HeapBlock {
    ptr:    NonNull<u8>,
    layout: Layout,
}

union FunctionStorage {
    inline: InlineBuffer,
    heap:   HeapBlock,
}

/// Rebuilds the trait object from a pointer to the functor's memory.
type EraseFn<A, R> = unsafe fn(*mut u8) -> *mut dyn Functor<A, R>;

unsafe fn erase<A, R, F: Functor<A, R> + 'static>(memory: *mut u8) -> *mut dyn Functor<A, R> {
    memory.cast::<F>() as *mut dyn Functor<A, R>
}

/// Type-erased callable, taking the arguments `A` as a tuple and returning `R`.
///
/// A `Function` is either empty or holds exactly one functor.
/// The functor is placed in the inline buffer when both its size and its alignment fit, otherwise it is placed in a heap block of exactly its layout.
///
/// # Example
///
/// ```
/// use kestrel_common::function::Function;
///
/// let mut total = 0;
/// let mut add = Function::<(i32, i32), i32>::from_fn(|a: i32, b: i32| a + b);
/// total += add.call(1, 2);
/// total += add.invoke((3, 4));
/// assert_eq!(total, 10);
///
/// let mut copy = add.clone();
/// assert_eq!(copy.call(5, 5), 10);
///
/// add.reset();
/// assert!(!add.is_bound());
/// ```
pub struct Function<A, R> {
    storage:   FunctionStorage,
    is_inline: bool,
    // `None` when no functor is bound
    erase:     Option<EraseFn<A, R>>,
    _phantom:  PhantomData<fn(A) -> R>,
}

static_assertions::assert_not_impl_any!(Function<(), ()>: Send, Sync);

impl<A, R> Function<A, R> {
    /// Create an empty function.
    pub const fn new() -> Self {
        Self {
            storage: FunctionStorage { inline: MaybeUninit::uninit() },
            is_inline: true,
            erase: None,
            _phantom: PhantomData,
        }
    }

    /// Create a function bound to `f`.
    pub fn from_fn<F>(f: F) -> Self where
        F: Invocable<A, Output = R> + Clone + 'static
    {
        let mut func = Self::new();
        func.emplace(f);
        func
    }

    /// Bind a new functor, the old functor is destroyed first.
    pub fn assign<F>(&mut self, f: F) where
        F: Invocable<A, Output = R> + Clone + 'static
    {
        self.reset();
        self.emplace(f);
    }

    /// Destroy the bound functor, leaving the function empty.
    pub fn reset(&mut self) {
        let Some(erase) = self.erase.take() else {
            return;
        };

        let heap = if self.is_inline {
            None
        } else {
            // SAFETY: `is_inline` is false, so the heap block is active
            Some(unsafe { self.storage.heap })
        };
        let memory = self.memory_mut();
        self.is_inline = true;

        // The heap block is freed, even when the functor's destructor panics
        let _free_heap = scopeguard::guard(heap, |heap| if let Some(block) = heap {
            // SAFETY: The block was allocated with this layout, and its functor was destroyed
            unsafe { alloc::free(block.ptr, block.layout) };
        });
        // SAFETY: `memory` contains a live functor of the type `erase` was created for
        unsafe { ptr::drop_in_place(erase(memory)) };
    }

    /// Check if a functor is bound.
    #[inline]
    pub fn is_bound(&self) -> bool {
        self.erase.is_some()
    }

    /// Check if the bound functor is stored in the inline buffer, returns `false` when no functor is bound.
    #[inline]
    pub fn is_inline(&self) -> bool {
        self.erase.is_some() && self.is_inline
    }

    /// Invoke the bound functor.
    ///
    /// # Panics
    ///
    /// Panics if no functor is bound.
    #[track_caller]
    pub fn invoke(&mut self, args: A) -> R {
        #[cold]
        #[track_caller]
        fn assert_failed() -> ! {
            panic!("invoking an unbound `Function`");
        }

        match self.erase {
            // SAFETY: The memory contains a live functor of the type `erase` was created for
            Some(erase) => unsafe { Functor::invoke(&mut *erase(self.memory_mut()), args) },
            None => assert_failed(),
        }
    }

    /// Exchange the functors of 2 functions.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Move the functor out of this function, leaving it empty.
    pub fn take(&mut self) -> Self {
        let mut result = Self::new();
        let Some(erase) = self.erase.take() else {
            return result;
        };

        // SAFETY: The memory contains a live functor of the type `erase` was created for, which is moved out exactly once
        unsafe {
            if self.is_inline {
                let functor = erase(self.memory_mut());
                (*functor).move_to(result.memory_mut());
            } else {
                result.storage.heap = self.storage.heap;
            }
        }
        result.is_inline = self.is_inline;
        result.erase = Some(erase);
        self.is_inline = true;
        result
    }

    fn emplace<F: Functor<A, R> + 'static>(&mut self, f: F) {
        debug_assert!(self.erase.is_none(), "emplacing into a bound `Function`");

        if fits_inline::<F>() {
            // SAFETY: The inline buffer is large and aligned enough for `F`
            unsafe { ptr::write(self.memory_mut().cast::<F>(), f) };
            self.is_inline = true;
        } else {
            let layout = Layout::new::<F>();
            let ptr = alloc::allocate(layout);
            // SAFETY: The block was allocated with the layout of `F`
            unsafe { ptr::write(ptr.as_ptr().cast::<F>(), f) };
            self.storage.heap = HeapBlock { ptr, layout };
            self.is_inline = false;
        }
        self.erase = Some(erase::<A, R, F>);
    }

    fn memory_mut(&mut self) -> *mut u8 {
        if self.is_inline {
            ptr::addr_of_mut!(self.storage.inline).cast()
        } else {
            // SAFETY: `is_inline` is false, so the heap block is active
            unsafe { self.storage.heap.ptr.as_ptr() }
        }
    }

    fn memory(&self) -> *const u8 {
        if self.is_inline {
            ptr::addr_of!(self.storage.inline).cast()
        } else {
            // SAFETY: `is_inline` is false, so the heap block is active
            unsafe { self.storage.heap.ptr.as_ptr() }
        }
    }
}

impl<A, R> Drop for Function<A, R> {
    fn drop(&mut self) {
        self.reset();
    }
}

impl<A, R> Default for Function<A, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, R> Clone for Function<A, R> {
    /// Clone the bound functor into the new function's own storage, using a heap block only when the source functor lives on the heap.
    fn clone(&self) -> Self {
        let mut result = Self::new();
        let Some(erase) = self.erase else {
            return result;
        };

        // SAFETY: The memory contains a live functor of the type `erase` was created for, and is only read
        let functor = unsafe { &*erase(self.memory() as *mut u8) };
        if self.is_inline {
            // SAFETY: The inline buffer fits the functor, as it fits in the source's inline buffer
            unsafe { functor.clone_to(result.memory_mut()) };
        } else {
            // SAFETY: `is_inline` is false, so the heap block is active
            let layout = unsafe { self.storage.heap.layout };
            let block = scopeguard::guard(alloc::allocate(layout), |ptr| {
                // SAFETY: Only reached when cloning panicked, so the block holds no functor
                unsafe { alloc::free(ptr, layout) };
            });
            // SAFETY: The block was allocated with the functor's layout
            unsafe { functor.clone_to(block.as_ptr()) };
            result.storage.heap = HeapBlock { ptr: scopeguard::ScopeGuard::into_inner(block), layout };
            result.is_inline = false;
        }
        result.erase = Some(erase);
        result
    }
}

impl<A, R> fmt::Debug for Function<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("bound", &self.is_bound())
            .field("inline", &self.is_inline())
            .finish()
    }
}

//--------------------------------------------------------------

macro_rules! impl_for_arities {
    // Stopper
    () => {
        impl<Func, Ret> Invocable<()> for Func where
            Func: FnMut() -> Ret
        {
            type Output = Ret;

            #[inline]
            fn invoke(&mut self, _args: ()) -> Ret {
                (*self)()
            }
        }

        impl<T, Func, Ret> Invocable<()> for MemberFunction<T, Func> where
            Func: FnMut(&mut T) -> Ret
        {
            type Output = Ret;

            fn invoke(&mut self, _args: ()) -> Ret {
                let mut receiver = self.receiver.borrow_mut();
                (self.method)(&mut *receiver)
            }
        }

        impl<T, Func, Ret> Invocable<()> for ConstMemberFunction<T, Func> where
            Func: FnMut(&T) -> Ret
        {
            type Output = Ret;

            fn invoke(&mut self, _args: ()) -> Ret {
                (self.method)(&*self.receiver)
            }
        }

        impl<Ret> Function<(), Ret> {
            /// Invoke the bound functor.
            ///
            /// # Panics
            ///
            /// Panics if no functor is bound.
            #[track_caller]
            pub fn call(&mut self) -> Ret {
                self.invoke(())
            }
        }
    };
    ($first:ident $(, $rest:ident)*) => {
        impl<Func, Ret, $first, $($rest,)*> Invocable<($first, $($rest,)*)> for Func where
            Func: FnMut($first, $($rest,)*) -> Ret
        {
            type Output = Ret;

            #[inline]
            #[allow(non_snake_case)]
            fn invoke(&mut self, ($first, $($rest,)*): ($first, $($rest,)*)) -> Ret {
                (*self)($first, $($rest,)*)
            }
        }

        impl<T, Func, Ret, $first, $($rest,)*> Invocable<($first, $($rest,)*)> for MemberFunction<T, Func> where
            Func: FnMut(&mut T, $first, $($rest,)*) -> Ret
        {
            type Output = Ret;

            #[allow(non_snake_case)]
            fn invoke(&mut self, ($first, $($rest,)*): ($first, $($rest,)*)) -> Ret {
                let mut receiver = self.receiver.borrow_mut();
                (self.method)(&mut *receiver, $first, $($rest,)*)
            }
        }

        impl<T, Func, Ret, $first, $($rest,)*> Invocable<($first, $($rest,)*)> for ConstMemberFunction<T, Func> where
            Func: FnMut(&T, $first, $($rest,)*) -> Ret
        {
            type Output = Ret;

            #[allow(non_snake_case)]
            fn invoke(&mut self, ($first, $($rest,)*): ($first, $($rest,)*)) -> Ret {
                (self.method)(&*self.receiver, $first, $($rest,)*)
            }
        }

        impl<Ret, $first, $($rest,)*> Function<($first, $($rest,)*), Ret> {
            /// Invoke the bound functor.
            ///
            /// # Panics
            ///
            /// Panics if no functor is bound.
            #[track_caller]
            #[allow(non_snake_case)]
            pub fn call(&mut self, $first: $first, $($rest: $rest,)*) -> Ret {
                self.invoke(($first, $($rest,)*))
            }
        }

        impl_for_arities!($($rest),*);
    };
}
impl_for_arities!(A0, A1, A2, A3, A4, A5, A6, A7);
