//! Structural conformance checking.
//!
//! The checker decides whether a candidate implementation provides every
//! operation an interface requires, without binding anything.
//!
//! # Algorithm
//!
//! For each requirement, in declaration order:
//! 1. Look up the candidate operation with the same name; record it as
//!    missing if there is none.
//! 2. Erase the candidate's own receiver to the opaque `Self` type.
//! 3. Compare against the requirement's erased form (receiver kept, access
//!    preserved) and its self-less form (receiver removed).
//! 4. Accept a match against either, subject to the [`Policy`]; otherwise
//!    record a [`Mismatch`] listing every accepted form. The erased form only
//!    matches when both receivers were actually erased, so an operation on
//!    some third type never binds.

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use tracing::trace;

use crate::config::BindConfig;
use crate::interface::InterfaceDef;
use crate::operation::{CallShape, Implementation, Operation, Requirement};
use crate::signature::{remap, Signature, TypeRef};

/// Which candidate shapes may satisfy a requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Bound and free operations are both accepted. Used by instance facades.
    Any,
    /// Only free operations are accepted. Used by static facades, which have
    /// no instance to pass.
    FreeOnly,
}

/// The expected form a candidate operation matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchedForm {
    /// The requirement's erased form; the operation takes the instance.
    Erased,
    /// The requirement's self-less form; the operation is free.
    Selfless,
}

/// A required operation whose candidate signature matches no accepted form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    pub name: String,
    /// Every accepted form, erased form first.
    pub expected: Vec<Signature>,
    /// The candidate's signature with its receiver erased.
    pub found: Signature,
}

/// Outcome of checking one candidate against one interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConformanceReport {
    pub implementation: String,
    pub interface: String,
    pub conformant: bool,
    pub missing: IndexSet<String>,
    pub mismatched: Vec<Mismatch>,
    /// Requirements that were satisfied, with the form each one matched.
    pub satisfied: IndexMap<String, MatchedForm>,
}

impl ConformanceReport {
    pub fn is_conformant(&self) -> bool {
        self.conformant
    }

    /// Pretty-printed JSON, for tooling.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conformant {
            return write!(
                f,
                "`{}` implements interface `{}`",
                self.implementation, self.interface
            );
        }

        writeln!(
            f,
            "`{}` does not implement interface `{}`",
            self.implementation, self.interface
        )?;

        if !self.missing.is_empty() {
            writeln!(f)?;
            writeln!(f, "missing operations:")?;
            for name in &self.missing {
                writeln!(f, "  - {}", name)?;
            }
        }

        if !self.mismatched.is_empty() {
            writeln!(f)?;
            writeln!(f, "mismatched operations:")?;
            for mismatch in &self.mismatched {
                writeln!(f, "  - {}", mismatch.name)?;
                let mut expected = mismatch.expected.iter();
                match expected.next() {
                    Some(first) => writeln!(f, "      expected: {}", first)?,
                    None => writeln!(f, "      expected: no accepted form")?,
                }
                for other in expected {
                    writeln!(f, "            or: {}", other)?;
                }
                writeln!(f, "         found: {}", mismatch.found)?;
            }
        }

        writeln!(f)?;
        write!(
            f,
            "help: every operation of `{}` must exist on `{}` with a matching signature",
            self.interface, self.implementation
        )
    }
}

/// Conformance checker.
#[derive(Debug, Clone, Copy)]
pub struct Checker {
    policy: Policy,
    allow_free_for_bound: bool,
}

impl Checker {
    /// A checker with the default configuration.
    pub fn new(policy: Policy) -> Self {
        Self::with_config(policy, &BindConfig::default())
    }

    pub fn with_config(policy: Policy, config: &BindConfig) -> Self {
        Self {
            policy,
            allow_free_for_bound: config.allow_free_for_bound,
        }
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Check `T` against `I`.
    pub fn check<T: Implementation, I: InterfaceDef>(&self) -> ConformanceReport {
        self.check_parts(
            TypeRef::of::<T>(),
            &T::operations(),
            TypeRef::of::<I>(),
            I::name(),
            &I::requirements(),
        )
    }

    /// Check explicit descriptor lists.
    ///
    /// `candidate` and `interface` are the receiver types the operations and
    /// requirements were declared with.
    pub fn check_parts(
        &self,
        candidate: TypeRef,
        operations: &[Operation],
        interface: TypeRef,
        interface_name: &str,
        requirements: &[Requirement],
    ) -> ConformanceReport {
        let by_name: IndexMap<&str, &Operation> =
            operations.iter().map(|op| (op.name(), op)).collect();

        let mut missing = IndexSet::new();
        let mut mismatched = Vec::new();
        let mut satisfied = IndexMap::new();

        for requirement in requirements {
            let Some(operation) = by_name.get(requirement.name()) else {
                trace!(operation = requirement.name(), "missing");
                missing.insert(requirement.name().to_string());
                continue;
            };

            let found = remap(operation.signature(), candidate, Some(TypeRef::erased()));
            let erased = remap(requirement.signature(), interface, Some(TypeRef::erased()));
            let selfless = remap(requirement.signature(), interface, None);

            match self.classify(requirement, operation, &found, &erased, &selfless) {
                Some(form) => {
                    trace!(operation = requirement.name(), ?form, "satisfied");
                    satisfied.insert(requirement.name().to_string(), form);
                }
                None => {
                    trace!(operation = requirement.name(), %found, "mismatched");
                    mismatched.push(Mismatch {
                        name: requirement.name().to_string(),
                        expected: self.expected_forms(requirement, erased, selfless),
                        found,
                    });
                }
            }
        }

        ConformanceReport {
            implementation: candidate.short_name(),
            interface: interface_name.to_string(),
            conformant: missing.is_empty() && mismatched.is_empty(),
            missing,
            mismatched,
            satisfied,
        }
    }

    fn classify(
        &self,
        requirement: &Requirement,
        operation: &Operation,
        found: &Signature,
        erased: &Signature,
        selfless: &Signature,
    ) -> Option<MatchedForm> {
        let is_free = operation.shape() == CallShape::Free;
        let free_allowed = self.allow_free_for_bound || requirement.signature().is_selfless();

        // Both receivers must have been erased: the candidate's was the
        // candidate type and the requirement's was the interface marker. Any
        // other receiver type is foreign and never dispatchable.
        // A requirement without a receiver has identical erased and self-less
        // forms; that tie always resolves to `Selfless`, since only a free
        // operation can match it.
        if self.policy == Policy::Any
            && receives_erased(erased)
            && receives_erased(found)
            && found == erased
        {
            return Some(MatchedForm::Erased);
        }
        if is_free && free_allowed && found == selfless {
            return Some(MatchedForm::Selfless);
        }
        None
    }

    fn expected_forms(
        &self,
        requirement: &Requirement,
        erased: Signature,
        selfless: Signature,
    ) -> Vec<Signature> {
        let mut expected = Vec::with_capacity(2);
        if self.policy == Policy::Any && !erased.is_selfless() {
            expected.push(erased);
        }
        if self.allow_free_for_bound || requirement.signature().is_selfless() {
            expected.push(selfless);
        }
        expected
    }
}

fn receives_erased(signature: &Signature) -> bool {
    signature
        .receiver()
        .is_some_and(|receiver| receiver.ty.is_erased())
}

/// Check whether `T` conforms to `I`, accepting bound and free operations.
///
/// Pure query: nothing is bound and nothing is cached.
pub fn implements<T: Implementation, I: InterfaceDef>() -> ConformanceReport {
    Checker::new(Policy::Any).check::<T, I>()
}
