//! Table binding.
//!
//! The binder turns a conforming `(implementation, interface)` pairing into a
//! populated operation table:
//!
//! 1. Check conformance; a non-conforming pairing fails with the full report.
//! 2. Verify every requirement `X` has a slot `X_fn` in the table type.
//! 3. Hand each satisfying operation's entry to the table, which moves it into
//!    the matching slot. Bound entries already carry their trampoline; free
//!    entries are plain function pointers.
//!
//! [`Binder::table`] memoizes the result per pairing and policy. The first
//! successful binding is moved into `'static` storage, and every later request
//! for the same pairing returns that same table.

use std::any::{Any, TypeId};
use std::sync::OnceLock;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::config::BindConfig;
use crate::conformance::{Checker, Policy};
use crate::error::{BindError, BindResult};
use crate::interface::{slot_name, InterfaceDef, OperationTable};
use crate::operation::Implementation;
use crate::signature::TypeRef;
use crate::slot::SlotSource;

/// Store key: one table per pairing and policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Pairing {
    implementation: TypeId,
    interface: TypeId,
    policy: Policy,
}

impl Pairing {
    fn of<T: 'static, I: 'static>(policy: Policy) -> Self {
        Self {
            implementation: TypeId::of::<T>(),
            interface: TypeId::of::<I>(),
            policy,
        }
    }
}

/// Binds pairings and keeps the resulting tables.
pub struct Binder {
    config: BindConfig,
    tables: RwLock<FxHashMap<Pairing, &'static (dyn Any + Send + Sync)>>,
}

impl Binder {
    pub fn new(config: BindConfig) -> Self {
        Self {
            config,
            tables: RwLock::new(FxHashMap::default()),
        }
    }

    /// The process-wide binder used by the facade constructors.
    pub fn global() -> &'static Binder {
        static GLOBAL: OnceLock<Binder> = OnceLock::new();
        GLOBAL.get_or_init(|| Binder::new(BindConfig::default()))
    }

    pub fn config(&self) -> &BindConfig {
        &self.config
    }

    /// A checker configured like this binder.
    pub fn checker(&self, policy: Policy) -> Checker {
        Checker::with_config(policy, &self.config)
    }

    /// Build a fresh table for `T` behind `I`. Nothing is cached.
    pub fn bind<T: Implementation, I: InterfaceDef>(&self, policy: Policy) -> BindResult<I::Table> {
        let operations = T::operations();
        let requirements = I::requirements();
        let report = self.checker(policy).check_parts(
            TypeRef::of::<T>(),
            &operations,
            TypeRef::of::<I>(),
            I::name(),
            &requirements,
        );

        if !report.is_conformant() {
            debug!(
                implementation = %report.implementation,
                interface = I::name(),
                missing = report.missing.len(),
                mismatched = report.mismatched.len(),
                "pairing does not conform"
            );
            return Err(BindError::NonConformant(Box::new(report)));
        }

        let slots = <I::Table as OperationTable>::slot_names();
        for requirement in &requirements {
            let slot = slot_name(requirement.name());
            if !slots.iter().any(|declared| *declared == slot) {
                return Err(BindError::MissingSlot {
                    interface: I::name().to_string(),
                    operation: requirement.name().to_string(),
                    slot,
                });
            }
        }

        let mut source = SlotSource::new(I::name());
        for operation in operations {
            let Some(form) = report.satisfied.get(operation.name()) else {
                continue;
            };
            if self.config.trace_slots {
                trace!(
                    interface = I::name(),
                    slot = %slot_name(operation.name()),
                    shape = ?operation.shape(),
                    ?form,
                    "populating slot"
                );
            }
            source.insert(operation.name(), operation.into_entry());
        }

        let table = <I::Table as OperationTable>::assemble(&mut source)?;
        debug!(
            implementation = %report.implementation,
            interface = I::name(),
            ?policy,
            "bound operation table"
        );
        Ok(table)
    }

    /// The shared table for `T` behind `I`, binding it on first request.
    ///
    /// Failed bindings are not cached; they fail the same way every time.
    pub fn table<T: Implementation, I: InterfaceDef>(
        &self,
        policy: Policy,
    ) -> BindResult<&'static I::Table> {
        let key = Pairing::of::<T, I>(policy);

        if let Some(table) = self.lookup::<I>(&key) {
            trace!(interface = I::name(), ?policy, "reusing bound table");
            return Ok(table);
        }

        let table = self.bind::<T, I>(policy)?;
        // A concurrent first bind may have won the race; keep its table.
        let stored = *self.tables.write().entry(key).or_insert_with(|| {
            let leaked: &'static (dyn Any + Send + Sync) = Box::leak(Box::new(table));
            leaked
        });

        match stored.downcast_ref::<I::Table>() {
            Some(table) => Ok(table),
            None => unreachable!("table store is keyed by interface type"),
        }
    }

    fn lookup<I: InterfaceDef>(&self, key: &Pairing) -> Option<&'static I::Table> {
        let stored: &'static (dyn Any + Send + Sync) = *self.tables.read().get(key)?;
        stored.downcast_ref::<I::Table>()
    }

    /// Number of tables bound so far.
    pub fn len(&self) -> usize {
        self.tables.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Binder {
    fn default() -> Self {
        Self::new(BindConfig::default())
    }
}

impl std::fmt::Debug for Binder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binder")
            .field("config", &self.config)
            .field("tables", &self.len())
            .finish()
    }
}

/// Build a fresh table for `T` behind `I` with the global binder's settings.
pub fn bind<T: Implementation, I: InterfaceDef>() -> BindResult<I::Table> {
    Binder::global().bind::<T, I>(Policy::Any)
}
