//! Canonical operation signatures and receiver remapping.
//!
//! Every operation, whether an interface requires it or a candidate
//! implementation exposes it, is described by a [`Signature`]: an optional
//! receiver, the remaining parameter types and the return type. Signatures
//! are compared structurally after [`remap`] has rewritten the receiver.
//!
//! # Derived shapes
//!
//! | Shape | Produced by |
//! |-------|-------------|
//! | implementation, erased | `remap(sig, TypeRef::of::<T>(), Some(TypeRef::erased()))` |
//! | interface, erased | `remap(sig, TypeRef::of::<I>(), Some(TypeRef::erased()))` |
//! | interface, self-less | `remap(sig, TypeRef::of::<I>(), None)` |
//!
//! An implementation conforms to a requirement when its erased shape equals
//! one of the two interface shapes.

use std::any::{self, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Serialize, Serializer};

/// Receiver type of an erased signature. Uninhabited and crate-private, so no
/// user-declared parameter can ever collide with it.
pub(crate) enum Erased {}

/// Identity of a `'static` Rust type together with a readable name.
///
/// Equality and hashing only look at the [`TypeId`].
#[derive(Clone, Copy)]
pub struct TypeRef {
    id: TypeId,
    name: &'static str,
}

impl TypeRef {
    /// Describe `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: any::type_name::<T>(),
        }
    }

    /// The opaque receiver type used by erased signatures. Renders as `Self`.
    pub fn erased() -> Self {
        Self {
            id: TypeId::of::<Erased>(),
            name: "Self",
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified name as reported by [`std::any::type_name`].
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Name with every module path stripped, e.g. `Option<String>`.
    pub fn short_name(&self) -> String {
        short_type_name(self.name)
    }

    pub fn is_erased(&self) -> bool {
        self.id == TypeId::of::<Erased>()
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeRef {}

impl Hash for TypeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({})", self.short_name())
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name())
    }
}

/// Strip module paths from a `type_name` string.
///
/// `core::option::Option<alloc::string::String>` becomes `Option<String>`.
pub(crate) fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    // Start of the path segment currently being written into `out`.
    let mut segment_start = 0;
    let mut chars = full.chars().peekable();

    while let Some(c) = chars.next() {
        if c == ':' && chars.peek() == Some(&':') {
            chars.next();
            out.truncate(segment_start);
            continue;
        }
        out.push(c);
        if !(c.is_alphanumeric() || c == '_') {
            segment_start = out.len();
        }
    }

    out
}

/// How a receiver is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    /// `self`
    Value,
    /// `&self`
    Shared,
    /// `&mut self`
    Exclusive,
}

impl Access {
    fn prefix(self) -> &'static str {
        match self {
            Access::Value => "",
            Access::Shared => "&",
            Access::Exclusive => "&mut ",
        }
    }
}

/// The receiver position of a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Receiver {
    pub access: Access,
    pub ty: TypeRef,
}

impl fmt::Display for Receiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.access.prefix(), self.ty)
    }
}

/// A parameter list that can be described type by type.
///
/// Implemented for tuples of up to eight `'static` elements. Operations take
/// their non-receiver arguments as one such tuple, so any other shape is
/// rejected by the compiler.
pub trait ParamList: 'static {
    fn describe() -> Vec<TypeRef>;
}

macro_rules! impl_param_list {
    ($($name:ident),*) => {
        impl<$($name: 'static),*> ParamList for ($($name,)*) {
            fn describe() -> Vec<TypeRef> {
                vec![$(TypeRef::of::<$name>()),*]
            }
        }
    };
}

impl_param_list!();
impl_param_list!(A);
impl_param_list!(A, B);
impl_param_list!(A, B, C);
impl_param_list!(A, B, C, D);
impl_param_list!(A, B, C, D, E);
impl_param_list!(A, B, C, D, E, F);
impl_param_list!(A, B, C, D, E, F, G);
impl_param_list!(A, B, C, D, E, F, G, H);

/// Structural description of one operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    receiver: Option<Receiver>,
    params: Vec<TypeRef>,
    ret: TypeRef,
}

impl Signature {
    /// A signature with no receiver.
    pub fn free<A: ParamList, R: 'static>() -> Self {
        Self {
            receiver: None,
            params: A::describe(),
            ret: TypeRef::of::<R>(),
        }
    }

    /// A signature whose receiver is `S`, taken with `access`.
    pub fn method<S: ?Sized + 'static, A: ParamList, R: 'static>(access: Access) -> Self {
        Self {
            receiver: Some(Receiver {
                access,
                ty: TypeRef::of::<S>(),
            }),
            params: A::describe(),
            ret: TypeRef::of::<R>(),
        }
    }

    pub fn receiver(&self) -> Option<Receiver> {
        self.receiver
    }

    /// Parameters after the receiver.
    pub fn params(&self) -> &[TypeRef] {
        &self.params
    }

    pub fn ret(&self) -> TypeRef {
        self.ret
    }

    pub fn is_selfless(&self) -> bool {
        self.receiver.is_none()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn(")?;
        let mut first = true;
        if let Some(receiver) = &self.receiver {
            write!(f, "{}", receiver)?;
            first = false;
        }
        for param in &self.params {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}", param)?;
            first = false;
        }
        write!(f, ")")?;
        if self.ret != TypeRef::of::<()>() {
            write!(f, " -> {}", self.ret)?;
        }
        Ok(())
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Rewrite the receiver of `signature`.
///
/// The receiver matches when its type is `replace`, whatever its access.
/// A match is replaced by `substitute` with the same access, or dropped when
/// `substitute` is `None`. Any other receiver, and every parameter after it,
/// passes through unchanged.
pub fn remap(signature: &Signature, replace: TypeRef, substitute: Option<TypeRef>) -> Signature {
    let receiver = match signature.receiver {
        Some(receiver) if receiver.ty == replace => substitute.map(|ty| Receiver {
            access: receiver.access,
            ty,
        }),
        other => other,
    };

    Signature {
        receiver,
        params: signature.params.clone(),
        ret: signature.ret,
    }
}
