//! Facades: an operation table paired with the instance it dispatches to.
//!
//! [`Interface::make`] borrows an instance and yields a [`Facade`];
//! [`StaticInterface::make`] yields an instance-free [`StaticFacade`]. Calls go
//! through the `<Name>Face` trait that [`interface!`](crate::interface)
//! generates for every interface, which is implemented for both facade kinds.

use std::fmt;
use std::marker::PhantomData;

use crate::binder::Binder;
use crate::conformance::Policy;
use crate::error::BindResult;
use crate::interface::InterfaceDef;
use crate::operation::Implementation;
use crate::signature::TypeRef;
use crate::trampoline::Handle;

mod sealed {
    pub trait Sealed {}
}

/// Access to a facade's table and instance handle.
///
/// Implemented only by [`Facade`] and [`StaticFacade`], so a handle handed to a
/// slot always belongs to the table it was bound with.
pub trait Face: sealed::Sealed {
    type Interface: InterfaceDef;

    fn funcs(&self) -> &'static <Self::Interface as InterfaceDef>::Table;

    /// The instance handle; `None` for static facades.
    fn inner(&self) -> Option<Handle<'_>>;
}

/// A view of one instance through interface `I`.
///
/// The facade holds the instance's exclusive borrow for `'a`. Operations that
/// take `&mut self` need `&mut` access to the facade.
pub struct Facade<'a, I: InterfaceDef> {
    table: &'static I::Table,
    handle: Handle<'a>,
    implementation: TypeRef,
}

impl<I: InterfaceDef> sealed::Sealed for Facade<'_, I> {}

impl<I: InterfaceDef> Face for Facade<'_, I> {
    type Interface = I;

    fn funcs(&self) -> &'static I::Table {
        self.table
    }

    fn inner(&self) -> Option<Handle<'_>> {
        Some(self.handle)
    }
}

impl<I: InterfaceDef> fmt::Debug for Facade<'_, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Facade")
            .field("interface", &I::name())
            .field("implementation", &self.implementation)
            .field("table", &(self.table as *const I::Table))
            .field("handle", &self.handle)
            .finish()
    }
}

/// A view of an implementation type's free operations through `I`.
pub struct StaticFacade<I: InterfaceDef> {
    table: &'static I::Table,
    implementation: TypeRef,
}

impl<I: InterfaceDef> Clone for StaticFacade<I> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<I: InterfaceDef> Copy for StaticFacade<I> {}

impl<I: InterfaceDef> sealed::Sealed for StaticFacade<I> {}

impl<I: InterfaceDef> Face for StaticFacade<I> {
    type Interface = I;

    fn funcs(&self) -> &'static I::Table {
        self.table
    }

    fn inner(&self) -> Option<Handle<'_>> {
        None
    }
}

impl<I: InterfaceDef> fmt::Debug for StaticFacade<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticFacade")
            .field("interface", &I::name())
            .field("implementation", &self.implementation)
            .field("table", &(self.table as *const I::Table))
            .finish()
    }
}

/// Constructors and accessors for instance facades of `I`.
pub struct Interface<I>(PhantomData<fn() -> I>);

impl<I: InterfaceDef> Interface<I> {
    /// Bind `T` to `I` (once per process) and borrow `instance` behind it.
    ///
    /// Free and bound candidate operations are both accepted.
    pub fn make<T: Implementation>(instance: &mut T) -> BindResult<Facade<'_, I>> {
        Self::make_in(Binder::global(), instance)
    }

    /// Like [`make`](Self::make), using `binder`'s table store and settings.
    pub fn make_in<'a, T: Implementation>(
        binder: &Binder,
        instance: &'a mut T,
    ) -> BindResult<Facade<'a, I>> {
        let table = binder.table::<T, I>(Policy::Any)?;
        Ok(Facade {
            table,
            handle: Handle::new(instance),
            implementation: TypeRef::of::<T>(),
        })
    }

    /// The facade's operation table.
    pub fn funcs(facade: &Facade<'_, I>) -> &'static I::Table {
        facade.table
    }

    /// The facade's instance handle.
    pub fn inner<'f>(facade: &'f Facade<'_, I>) -> Handle<'f> {
        facade.handle
    }

    /// A shorter-lived facade over the same instance.
    pub fn reborrow<'f>(facade: &'f mut Facade<'_, I>) -> Facade<'f, I> {
        Facade {
            table: facade.table,
            handle: facade.handle,
            implementation: facade.implementation,
        }
    }

    /// The concrete type behind the facade.
    pub fn implementation(facade: &Facade<'_, I>) -> TypeRef {
        facade.implementation
    }
}

/// Constructors and accessors for static facades of `I`.
pub struct StaticInterface<I>(PhantomData<fn() -> I>);

impl<I: InterfaceDef> StaticInterface<I> {
    /// Bind `T`'s free operations to `I` (once per process).
    ///
    /// Fails if any requirement is only met by an operation that needs an
    /// instance.
    pub fn make<T: Implementation>() -> BindResult<StaticFacade<I>> {
        Self::make_in::<T>(Binder::global())
    }

    pub fn make_in<T: Implementation>(binder: &Binder) -> BindResult<StaticFacade<I>> {
        let table = binder.table::<T, I>(Policy::FreeOnly)?;
        Ok(StaticFacade {
            table,
            implementation: TypeRef::of::<T>(),
        })
    }

    pub fn funcs(facade: &StaticFacade<I>) -> &'static I::Table {
        facade.table
    }

    pub fn implementation(facade: &StaticFacade<I>) -> TypeRef {
        facade.implementation
    }
}
