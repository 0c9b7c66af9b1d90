//! Forwarding shims for instance-bound operations.
//!
//! A bound operation `fn(&T, A) -> R` cannot be stored in a table shared by
//! every implementation of an interface, because its first parameter names
//! `T`. The trampoline keeps the original function pointer type-erased and
//! pairs it with a shim monomorphized for `T`. The shim restores the erased
//! [`Handle`] to `&T`, `&mut T` or a clone of `T`, forwards the remaining
//! arguments untouched and returns the result untouched.
//!
//! ```text
//! face.op(a, b) -> Slot::invoke(handle, (a, b))
//!               -> shim::<T>(target, handle, (a, b))
//!               -> target(&*handle as &T, (a, b))
//! ```

use std::marker::PhantomData;
use std::mem;
use std::ptr::NonNull;

use crate::signature::Access;

/// Opaque, non-owning handle to the instance behind a facade.
///
/// A handle is only ever created from an exclusive borrow, and it is only
/// restored by the shim of a table bound for the same type.
#[derive(Clone, Copy)]
pub struct Handle<'a> {
    ptr: NonNull<()>,
    _borrow: PhantomData<&'a mut ()>,
}

impl<'a> Handle<'a> {
    pub(crate) fn new<T>(instance: &'a mut T) -> Self {
        Self {
            ptr: NonNull::from(instance).cast(),
            _borrow: PhantomData,
        }
    }

    /// Address of the instance, for identity checks.
    pub fn as_ptr(&self) -> *const () {
        self.ptr.as_ptr()
    }

    /// # Safety
    ///
    /// The handle must have been created from a live `T`, and no exclusive
    /// reference to it may be in use.
    unsafe fn restore_ref<T>(self) -> &'a T {
        unsafe { self.ptr.cast::<T>().as_ref() }
    }

    /// # Safety
    ///
    /// The handle must have been created from a live `T`, and no other
    /// reference to it may be in use.
    unsafe fn restore_mut<T>(self) -> &'a mut T {
        unsafe { self.ptr.cast::<T>().as_mut() }
    }
}

impl std::fmt::Debug for Handle<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Handle").field(&self.ptr).finish()
    }
}

/// Type-erased address of the original operation.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) struct Target(*const ());

// SAFETY: a code address; no data is reachable through it.
unsafe impl Send for Target {}
unsafe impl Sync for Target {}

type Shim<A, R> = unsafe fn(Target, Handle<'_>, A) -> R;

/// An erased operation plus the shim that knows how to call it.
pub(crate) struct Trampoline<A, R> {
    target: Target,
    shim: Shim<A, R>,
    access: Access,
}

impl<A, R> Clone for Trampoline<A, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A, R> Copy for Trampoline<A, R> {}

impl<A: 'static, R: 'static> Trampoline<A, R> {
    /// Wrap an operation taking `&self`.
    pub(crate) fn shared<T: 'static>(op: fn(&T, A) -> R) -> Self {
        Self {
            target: Target(op as *const ()),
            shim: forward_shared::<T, A, R>,
            access: Access::Shared,
        }
    }

    /// Wrap an operation taking `&mut self`.
    pub(crate) fn exclusive<T: 'static>(op: fn(&mut T, A) -> R) -> Self {
        Self {
            target: Target(op as *const ()),
            shim: forward_exclusive::<T, A, R>,
            access: Access::Exclusive,
        }
    }

    /// Wrap an operation taking `self`. The instance is cloned for each call.
    pub(crate) fn by_value<T: Clone + 'static>(op: fn(T, A) -> R) -> Self {
        Self {
            target: Target(op as *const ()),
            shim: forward_value::<T, A, R>,
            access: Access::Value,
        }
    }
}

impl<A, R> Trampoline<A, R> {
    pub(crate) fn access(&self) -> Access {
        self.access
    }

    /// Addresses of the original operation and of the shim.
    pub(crate) fn addresses(&self) -> (usize, usize) {
        (self.target.0 as usize, self.shim as usize)
    }

    /// # Safety
    ///
    /// `handle` must point to a live instance of the type this trampoline was
    /// built for. For `Access::Exclusive` the caller must also hold the only
    /// access path to that instance for the duration of the call.
    pub(crate) unsafe fn call(&self, handle: Handle<'_>, args: A) -> R {
        unsafe { (self.shim)(self.target, handle, args) }
    }
}

unsafe fn forward_shared<T: 'static, A, R>(target: Target, handle: Handle<'_>, args: A) -> R {
    // SAFETY: `target` came from this exact pointer type in `Trampoline::shared`.
    let op = unsafe { mem::transmute::<*const (), fn(&T, A) -> R>(target.0) };
    op(unsafe { handle.restore_ref::<T>() }, args)
}

unsafe fn forward_exclusive<T: 'static, A, R>(target: Target, handle: Handle<'_>, args: A) -> R {
    // SAFETY: `target` came from this exact pointer type in `Trampoline::exclusive`.
    let op = unsafe { mem::transmute::<*const (), fn(&mut T, A) -> R>(target.0) };
    op(unsafe { handle.restore_mut::<T>() }, args)
}

unsafe fn forward_value<T: Clone + 'static, A, R>(
    target: Target,
    handle: Handle<'_>,
    args: A,
) -> R {
    // SAFETY: `target` came from this exact pointer type in `Trampoline::by_value`.
    let op = unsafe { mem::transmute::<*const (), fn(T, A) -> R>(target.0) };
    let instance = unsafe { handle.restore_ref::<T>() }.clone();
    op(instance, args)
}
