//! Verified dynamic dispatch through bound operation tables.
//!
//! An *interface* declares named operations with signatures. A candidate type
//! is checked against it structurally, without any trait relationship between
//! the two. A conforming pairing is bound once into an operation table. A
//! *facade* pairs that table with an instance, and calls on the facade
//! dispatch through the table.
//!
//! # Pipeline
//!
//! 1. **Descriptors** - [`interface!`] and [`implement!`] record each side's
//!    operations as [`Requirement`]s and [`Operation`]s.
//! 2. **Conformance** - [`Checker`] compares them after [`remap`]ping the
//!    receivers, producing a [`ConformanceReport`] that lists every missing
//!    and mismatched operation.
//! 3. **Binding** - [`Binder`] moves each satisfying operation into the
//!    table slot named `<op>_fn`. Operations that take the instance are
//!    stored behind a trampoline that restores the concrete receiver type.
//! 4. **Facades** - [`Interface::make`] and [`StaticInterface::make`] build
//!    [`Facade`]s and [`StaticFacade`]s over the memoized tables.
//!
//! # Example
//!
//! ```
//! use vtbind::{implement, interface, Interface, StaticInterface};
//!
//! interface! {
//!     pub interface Shape {
//!         fn area(&self) -> f64;
//!         fn scale(&mut self, factor: f64);
//!     }
//! }
//!
//! struct Square {
//!     side: f64,
//! }
//!
//! implement! {
//!     impl Square {
//!         fn area(&self) -> f64 {
//!             self.side * self.side
//!         }
//!
//!         fn scale(&mut self, factor: f64) {
//!             self.side *= factor;
//!         }
//!     }
//! }
//!
//! let mut square = Square { side: 2.0 };
//! let mut shape = Interface::<Shape>::make(&mut square)?;
//! shape.scale(1.5);
//! assert_eq!(shape.area(), 9.0);
//!
//! // `area` needs an instance, so there is no static facade.
//! assert!(StaticInterface::<Shape>::make::<Square>().is_err());
//! # Ok::<(), vtbind::BindError>(())
//! ```

pub mod binder;
pub mod config;
pub mod conformance;
pub mod error;
pub mod facade;
pub mod interface;
pub mod operation;
pub mod signature;
pub mod slot;
pub mod trampoline;

mod macros;

pub use binder::{bind, Binder};
pub use config::BindConfig;
pub use conformance::{implements, Checker, ConformanceReport, MatchedForm, Mismatch, Policy};
pub use error::{BindError, BindResult, ConfigError};
pub use facade::{Face, Facade, Interface, StaticFacade, StaticInterface};
pub use interface::{slot_name, InterfaceDef, OperationTable, SLOT_SUFFIX};
pub use operation::{CallShape, Implementation, Operation, Requirement};
pub use signature::{remap, Access, ParamList, Receiver, Signature, TypeRef};
pub use slot::{Slot, SlotSource};
pub use trampoline::Handle;

#[doc(hidden)]
pub mod __private {
    pub use paste::paste;
}
