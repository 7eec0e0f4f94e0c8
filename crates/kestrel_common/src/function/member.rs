use std::{cell::RefCell, fmt, rc::Rc};

/// Binds a method taking `&mut T` to a shared receiver.
///
/// Clones of the binder refer to the same receiver.
pub struct MemberFunction<T, F> {
    pub(super) receiver : Rc<RefCell<T>>,
    pub(super) method   : F,
}

impl<T, F: Clone> Clone for MemberFunction<T, F> {
    fn clone(&self) -> Self {
        Self { receiver: self.receiver.clone(), method: self.method.clone() }
    }
}

impl<T, F> fmt::Debug for MemberFunction<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberFunction")
            .field("receiver", &Rc::as_ptr(&self.receiver))
            .field("method", &core::any::type_name::<F>())
            .finish()
    }
}

/// Binds a method taking `&T` to a shared receiver.
///
/// Clones of the binder refer to the same receiver.
pub struct ConstMemberFunction<T, F> {
    pub(super) receiver : Rc<T>,
    pub(super) method   : F,
}

impl<T, F: Clone> Clone for ConstMemberFunction<T, F> {
    fn clone(&self) -> Self {
        Self { receiver: self.receiver.clone(), method: self.method.clone() }
    }
}

impl<T, F> fmt::Debug for ConstMemberFunction<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstMemberFunction")
            .field("receiver", &Rc::as_ptr(&self.receiver))
            .field("method", &core::any::type_name::<F>())
            .finish()
    }
}

/// Bind `method` to `receiver`, the receiver is mutably borrowed for the duration of each call.
///
/// # Example
///
/// ```
/// use std::{cell::RefCell, rc::Rc};
/// use kestrel_common::function::{bind_member, Function};
///
/// struct Counter { count: u32 }
///
/// impl Counter {
///     fn add(&mut self, val: u32) -> u32 {
///         self.count += val;
///         self.count
///     }
/// }
///
/// let counter = Rc::new(RefCell::new(Counter { count: 0 }));
/// let mut func = Function::<(u32,), u32>::from_fn(bind_member(&counter, Counter::add));
/// assert_eq!(func.call(2), 2);
/// assert_eq!(counter.borrow().count, 2);
/// ```
pub fn bind_member<T, F>(receiver: &Rc<RefCell<T>>, method: F) -> MemberFunction<T, F> {
    MemberFunction { receiver: receiver.clone(), method }
}

/// Bind `method` to `receiver`.
pub fn bind_const_member<T, F>(receiver: &Rc<T>, method: F) -> ConstMemberFunction<T, F> {
    ConstMemberFunction { receiver: receiver.clone(), method }
}
