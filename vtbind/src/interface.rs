//! Interface descriptors and their operation tables.
//!
//! An interface is a marker type implementing [`InterfaceDef`]. It names its
//! [`Requirement`]s and an [`OperationTable`] type with one slot per
//! requirement. Slots are linked to requirements by name: the operation `X`
//! lives in the slot `X_fn`. Both traits are normally implemented by
//! [`interface!`](crate::interface); hand-written implementations are checked
//! by the binder like generated ones.

use crate::error::BindResult;
use crate::operation::Requirement;
use crate::slot::SlotSource;

/// Suffix appended to an operation name to form its slot name.
pub const SLOT_SUFFIX: &str = "_fn";

/// The slot name for `operation`.
pub fn slot_name(operation: &str) -> String {
    format!("{operation}{SLOT_SUFFIX}")
}

/// A type-level interface description.
pub trait InterfaceDef: 'static {
    /// The operation table bound for each implementation.
    type Table: OperationTable;

    /// Name used in diagnostics.
    fn name() -> &'static str;

    /// Every required operation, in declaration order.
    fn requirements() -> Vec<Requirement>;
}

/// A fixed record of slots, one per requirement of an interface.
///
/// Tables are built once per pairing and never mutated afterwards.
pub trait OperationTable: Sized + Send + Sync + 'static {
    /// Names of every slot, in field order.
    fn slot_names() -> &'static [&'static str];

    /// Populate every slot from `source` via [`SlotSource::take`].
    fn assemble(source: &mut SlotSource) -> BindResult<Self>;
}
