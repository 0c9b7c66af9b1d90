//! Operation descriptors for both sides of a binding.
//!
//! An interface lists [`Requirement`]s; a candidate implementation lists
//! [`Operation`]s. Both carry a [`Signature`]. An operation additionally
//! carries its entry point, already packaged as a typed table slot, so that
//! binding never has to synthesize code at run time.

use std::any::Any;
use std::fmt;

use serde::Serialize;

use crate::signature::{Access, ParamList, Signature};
use crate::slot::Slot;
use crate::trampoline::Trampoline;

/// How a candidate operation is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallShape {
    /// No receiver; stored directly in the table.
    Free,
    /// Takes the instance; stored behind a trampoline.
    Bound(Access),
}

/// A named operation exposed by a candidate implementation.
pub struct Operation {
    name: &'static str,
    signature: Signature,
    shape: CallShape,
    /// A `Slot<A, R>` for this operation's argument tuple and return type.
    entry: Box<dyn Any + Send + Sync>,
}

impl Operation {
    /// An operation without a receiver.
    pub fn free<A: ParamList, R: 'static>(name: &'static str, op: fn(A) -> R) -> Self {
        Self {
            name,
            signature: Signature::free::<A, R>(),
            shape: CallShape::Free,
            entry: Box::new(Slot::free(op)),
        }
    }

    /// An operation taking `&self`.
    pub fn shared<T: 'static, A: ParamList, R: 'static>(
        name: &'static str,
        op: fn(&T, A) -> R,
    ) -> Self {
        Self::bound::<T, A, R>(name, Access::Shared, Trampoline::shared(op))
    }

    /// An operation taking `&mut self`.
    pub fn exclusive<T: 'static, A: ParamList, R: 'static>(
        name: &'static str,
        op: fn(&mut T, A) -> R,
    ) -> Self {
        Self::bound::<T, A, R>(name, Access::Exclusive, Trampoline::exclusive(op))
    }

    /// An operation taking `self`. Dispatch through a facade calls it on a
    /// clone of the instance.
    pub fn by_value<T: Clone + 'static, A: ParamList, R: 'static>(
        name: &'static str,
        op: fn(T, A) -> R,
    ) -> Self {
        Self::bound::<T, A, R>(name, Access::Value, Trampoline::by_value(op))
    }

    fn bound<T: 'static, A: ParamList, R: 'static>(
        name: &'static str,
        access: Access,
        trampoline: Trampoline<A, R>,
    ) -> Self {
        Self {
            name,
            signature: Signature::method::<T, A, R>(access),
            shape: CallShape::Bound(access),
            entry: Box::new(Slot::bound(trampoline)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The signature as declared on the implementation type.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn shape(&self) -> CallShape {
        self.shape
    }

    pub(crate) fn into_entry(self) -> Box<dyn Any + Send + Sync> {
        self.entry
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .field("shape", &self.shape)
            .finish_non_exhaustive()
    }
}

/// A named operation an interface expects.
///
/// The receiver, if any, names the interface's own marker type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    name: &'static str,
    signature: Signature,
}

impl Requirement {
    pub fn new(name: &'static str, signature: Signature) -> Self {
        Self { name, signature }
    }

    /// A requirement without a receiver.
    pub fn free<A: ParamList, R: 'static>(name: &'static str) -> Self {
        Self::new(name, Signature::free::<A, R>())
    }

    /// A requirement whose receiver is the interface `I`.
    pub fn method<I: ?Sized + 'static, A: ParamList, R: 'static>(
        name: &'static str,
        access: Access,
    ) -> Self {
        Self::new(name, Signature::method::<I, A, R>(access))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

/// A type that can be checked against, and bound to, interfaces.
///
/// Usually implemented by [`implement!`](crate::implement).
pub trait Implementation: Sized + 'static {
    /// Every operation the type exposes, in declaration order.
    fn operations() -> Vec<Operation>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Widget {
        size: u32,
    }

    #[test]
    fn test_operation_shapes() {
        let free = Operation::free::<(), u32>("zero", |()| 0);
        let shared = Operation::shared::<Widget, (), u32>("size", |w, ()| w.size);
        let exclusive = Operation::exclusive::<Widget, (u32,), ()>("grow", |w, (by,)| w.size += by);

        assert_eq!(free.shape(), CallShape::Free);
        assert_eq!(shared.shape(), CallShape::Bound(Access::Shared));
        assert_eq!(exclusive.shape(), CallShape::Bound(Access::Exclusive));
        assert!(free.signature().is_selfless());
        assert_eq!(shared.signature().to_string(), "fn(&Widget) -> u32");
        assert_eq!(exclusive.signature().to_string(), "fn(&mut Widget, u32)");
    }

    #[test]
    fn test_entry_holds_matching_slot() {
        let op = Operation::shared::<Widget, (), u32>("size", |w, ()| w.size);
        let entry = op.into_entry();
        assert!(entry.downcast_ref::<Slot<(), u32>>().is_some());
        assert!(entry.downcast_ref::<Slot<(), i32>>().is_none());
    }
}
