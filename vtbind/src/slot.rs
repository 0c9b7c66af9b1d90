//! Typed operation-table entries.

use std::any::{self, Any};
use std::fmt;

use rustc_hash::FxHashMap;

use crate::error::{BindError, BindResult};
use crate::operation::CallShape;
use crate::signature::short_type_name;
use crate::trampoline::{Handle, Trampoline};

/// One entry of an operation table: a call taking the argument tuple `A` and
/// returning `R`.
///
/// A slot is either free (a plain function pointer) or bound (a trampoline
/// that needs the facade's instance handle).
pub struct Slot<A, R> {
    call: Call<A, R>,
}

enum Call<A, R> {
    Free(fn(A) -> R),
    Bound(Trampoline<A, R>),
}

impl<A, R> Clone for Call<A, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A, R> Copy for Call<A, R> {}

impl<A, R> Clone for Slot<A, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A, R> Copy for Slot<A, R> {}

impl<A: 'static, R: 'static> Slot<A, R> {
    pub(crate) fn free(op: fn(A) -> R) -> Self {
        Self { call: Call::Free(op) }
    }

    pub(crate) fn bound(trampoline: Trampoline<A, R>) -> Self {
        Self {
            call: Call::Bound(trampoline),
        }
    }
}

impl<A, R> Slot<A, R> {
    pub fn shape(&self) -> CallShape {
        match &self.call {
            Call::Free(_) => CallShape::Free,
            Call::Bound(trampoline) => CallShape::Bound(trampoline.access()),
        }
    }

    pub fn is_free(&self) -> bool {
        matches!(self.call, Call::Free(_))
    }

    /// Call the bound operation.
    ///
    /// Generated face methods are the only intended callers.
    ///
    /// # Safety
    ///
    /// For bound slots `handle` must come from the same facade this slot's
    /// table was reached through; that facade's table was bound for the
    /// handle's concrete type. Slots of `&mut self` operations must only be
    /// invoked while the facade is exclusively borrowed.
    #[doc(hidden)]
    pub unsafe fn invoke(&self, handle: Option<Handle<'_>>, args: A) -> R {
        match &self.call {
            Call::Free(op) => op(args),
            Call::Bound(trampoline) => match handle {
                Some(handle) => unsafe { trampoline.call(handle, args) },
                // Static facades are bound with `Policy::FreeOnly`.
                None => unreachable!("bound slot dispatched without an instance handle"),
            },
        }
    }
}

impl<A, R> PartialEq for Slot<A, R> {
    fn eq(&self, other: &Self) -> bool {
        match (&self.call, &other.call) {
            (Call::Free(a), Call::Free(b)) => *a as usize == *b as usize,
            (Call::Bound(a), Call::Bound(b)) => {
                a.access() == b.access() && a.addresses() == b.addresses()
            }
            _ => false,
        }
    }
}

impl<A, R> Eq for Slot<A, R> {}

impl<A, R> fmt::Debug for Slot<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.call {
            Call::Free(op) => write!(f, "Slot::Free({:#x})", *op as usize),
            Call::Bound(trampoline) => {
                let (target, shim) = trampoline.addresses();
                write!(
                    f,
                    "Slot::Bound({:?}, target: {:#x}, shim: {:#x})",
                    trampoline.access(),
                    target,
                    shim
                )
            }
        }
    }
}

/// Entries selected for one binding, keyed by operation name.
///
/// Handed to [`OperationTable::assemble`](crate::OperationTable::assemble),
/// which moves each entry into its slot.
pub struct SlotSource {
    interface: &'static str,
    entries: FxHashMap<&'static str, Box<dyn Any + Send + Sync>>,
}

impl SlotSource {
    pub(crate) fn new(interface: &'static str) -> Self {
        Self {
            interface,
            entries: FxHashMap::default(),
        }
    }

    pub(crate) fn insert(&mut self, operation: &'static str, entry: Box<dyn Any + Send + Sync>) {
        self.entries.insert(operation, entry);
    }

    /// Move out the entry for `operation` as the slot named `slot`.
    ///
    /// Fails when no requirement supplied the entry, or when the slot's
    /// declared type disagrees with the requirement's signature.
    pub fn take<A: 'static, R: 'static>(
        &mut self,
        operation: &'static str,
        slot: &'static str,
    ) -> BindResult<Slot<A, R>> {
        let entry = self.entries.remove(operation).ok_or_else(|| BindError::UnboundSlot {
            interface: self.interface.to_string(),
            slot: slot.to_string(),
        })?;

        entry
            .downcast::<Slot<A, R>>()
            .map(|slot| *slot)
            .map_err(|_| BindError::SlotType {
                interface: self.interface.to_string(),
                slot: slot.to_string(),
                declared: format!(
                    "fn{} -> {}",
                    short_type_name(any::type_name::<A>()),
                    short_type_name(any::type_name::<R>())
                ),
            })
    }

    /// Entries no slot has taken yet.
    pub fn remaining(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::Operation;
    use crate::signature::Access;

    struct Widget {
        size: u32,
    }

    fn answer((): ()) -> u32 {
        42
    }

    #[test]
    fn test_free_slot_invokes_without_handle() {
        let slot = Slot::free(answer);
        assert!(slot.is_free());
        assert_eq!(unsafe { slot.invoke(None, ()) }, 42);
    }

    #[test]
    fn test_slot_equality_follows_addresses() {
        assert_eq!(Slot::free(answer), Slot::free(answer));
        assert_ne!(Slot::<(), u32>::free(answer), Slot::<(), u32>::free(|()| 7));
    }

    #[test]
    fn test_take_moves_entry_out() {
        let op = Operation::shared::<Widget, (), u32>("size", |w, ()| w.size);
        let mut source = SlotSource::new("Sized");
        source.insert(op.name(), op.into_entry());

        let slot: Slot<(), u32> = source.take("size", "size_fn").expect("slot");
        assert_eq!(slot.shape(), CallShape::Bound(Access::Shared));
        assert_eq!(source.remaining(), 0);

        let again = source.take::<(), u32>("size", "size_fn");
        assert!(matches!(again, Err(BindError::UnboundSlot { .. })));
    }

    #[test]
    fn test_take_rejects_inconsistent_slot_type() {
        let op = Operation::free::<(u8,), u8>("echo", |(b,)| b);
        let mut source = SlotSource::new("Echo");
        source.insert(op.name(), op.into_entry());

        match source.take::<(u16,), u8>("echo", "echo_fn") {
            Err(BindError::SlotType { slot, declared, .. }) => {
                assert_eq!(slot, "echo_fn");
                assert_eq!(declared, "fn(u16,) -> u8");
            }
            other => panic!("expected SlotType, got {:?}", other.map(|_| ())),
        }
    }
}
