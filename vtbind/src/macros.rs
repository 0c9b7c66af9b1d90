//! Declaration macros.
//!
//! [`interface!`] declares an interface: a marker type, its operation table
//! and a `<Name>Face` trait with one forwarding method per operation.
//! [`implement!`] declares an inherent impl block and records its methods as
//! the type's [`Operation`](crate::Operation)s.
//!
//! Parameters are written `name: Type` and must be owned `'static` types.
//! Receivers may be `&self`, `&mut self`, `self` or absent.

/// Declare an interface.
///
/// ```
/// use vtbind::{implement, interface, Interface};
///
/// interface! {
///     pub interface Greeter {
///         fn greet(&self, name: String) -> String;
///         fn language() -> &'static str;
///     }
/// }
///
/// struct English;
///
/// implement! {
///     impl English {
///         fn greet(&self, name: String) -> String {
///             format!("Hello, {name}")
///         }
///
///         fn language() -> &'static str {
///             "en"
///         }
///     }
/// }
///
/// let mut english = English;
/// let facade = Interface::<Greeter>::make(&mut english).unwrap();
/// assert_eq!(facade.greet("Ada".to_string()), "Hello, Ada");
/// assert_eq!(facade.language(), "en");
/// ```
///
/// For `interface Greeter` this emits:
///
/// - `enum Greeter {}`, the marker implementing [`InterfaceDef`](crate::InterfaceDef);
/// - `struct GreeterTable` with a public [`Slot`](crate::Slot) field
///   `<op>_fn` per operation;
/// - `trait GreeterFace`, implemented for every facade of `Greeter`. Methods
///   declared `&mut self` take `&mut self`; all others take `&self`.
#[macro_export]
macro_rules! interface {
    (@ret) => { () };
    (@ret $ret:ty) => { $ret };

    (@args [&mut self $(, $arg:ident : $ty:ty)* $(,)?]) => { ($($ty,)*) };
    (@args [&self $(, $arg:ident : $ty:ty)* $(,)?]) => { ($($ty,)*) };
    (@args [self $(, $arg:ident : $ty:ty)* $(,)?]) => { ($($ty,)*) };
    (@args [$($arg:ident : $ty:ty),* $(,)?]) => { ($($ty,)*) };

    (@requirement $name:ident $op:ident [&mut self $($rest:tt)*] [$($ret:ty)?]) => {
        $crate::Requirement::method::<
            $name,
            $crate::interface!(@args [&mut self $($rest)*]),
            $crate::interface!(@ret $($ret)?),
        >(stringify!($op), $crate::Access::Exclusive)
    };
    (@requirement $name:ident $op:ident [&self $($rest:tt)*] [$($ret:ty)?]) => {
        $crate::Requirement::method::<
            $name,
            $crate::interface!(@args [&self $($rest)*]),
            $crate::interface!(@ret $($ret)?),
        >(stringify!($op), $crate::Access::Shared)
    };
    (@requirement $name:ident $op:ident [self $($rest:tt)*] [$($ret:ty)?]) => {
        $crate::Requirement::method::<
            $name,
            $crate::interface!(@args [self $($rest)*]),
            $crate::interface!(@ret $($ret)?),
        >(stringify!($op), $crate::Access::Value)
    };
    (@requirement $name:ident $op:ident [$($params:tt)*] [$($ret:ty)?]) => {
        $crate::Requirement::free::<
            $crate::interface!(@args [$($params)*]),
            $crate::interface!(@ret $($ret)?),
        >(stringify!($op))
    };

    (
        @face [$($attr:tt)*] $op:ident $slot:ident
        [&mut self $(, $arg:ident : $ty:ty)* $(,)?] [$($ret:ty)?]
    ) => {
        $($attr)*
        fn $op(&mut self $(, $arg: $ty)*) -> $crate::interface!(@ret $($ret)?) {
            let funcs = $crate::Face::funcs(&*self);
            // SAFETY: table and handle come from the same facade, which is
            // exclusively borrowed for the call.
            unsafe { funcs.$slot.invoke($crate::Face::inner(&*self), ($($arg,)*)) }
        }
    };
    (
        @face [$($attr:tt)*] $op:ident $slot:ident
        [&self $(, $arg:ident : $ty:ty)* $(,)?] [$($ret:ty)?]
    ) => {
        $($attr)*
        fn $op(&self $(, $arg: $ty)*) -> $crate::interface!(@ret $($ret)?) {
            let funcs = $crate::Face::funcs(self);
            // SAFETY: table and handle come from the same facade.
            unsafe { funcs.$slot.invoke($crate::Face::inner(self), ($($arg,)*)) }
        }
    };
    (
        @face [$($attr:tt)*] $op:ident $slot:ident
        [self $(, $arg:ident : $ty:ty)* $(,)?] [$($ret:ty)?]
    ) => {
        $($attr)*
        fn $op(&self $(, $arg: $ty)*) -> $crate::interface!(@ret $($ret)?) {
            let funcs = $crate::Face::funcs(self);
            // SAFETY: table and handle come from the same facade.
            unsafe { funcs.$slot.invoke($crate::Face::inner(self), ($($arg,)*)) }
        }
    };
    (
        @face [$($attr:tt)*] $op:ident $slot:ident
        [$($arg:ident : $ty:ty),* $(,)?] [$($ret:ty)?]
    ) => {
        $($attr)*
        fn $op(&self $(, $arg: $ty)*) -> $crate::interface!(@ret $($ret)?) {
            let funcs = $crate::Face::funcs(self);
            // SAFETY: free slots ignore the handle; bound slots get the
            // facade's own handle.
            unsafe { funcs.$slot.invoke($crate::Face::inner(self), ($($arg,)*)) }
        }
    };

    (
        $(#[$meta:meta])*
        $vis:vis interface $name:ident {
            $(
                $(#[$fmeta:meta])*
                fn $op:ident ( $($params:tt)* ) $(-> $ret:ty)? ;
            )*
        }
    ) => {
        $crate::__private::paste! {
            $(#[$meta])*
            $vis enum $name {}

            #[doc = "Operation table of [`" $name "`]."]
            $vis struct [<$name Table>] {
                $(
                    pub [<$op _fn>]: $crate::Slot<
                        $crate::interface!(@args [$($params)*]),
                        $crate::interface!(@ret $($ret)?),
                    >,
                )*
            }

            impl $crate::InterfaceDef for $name {
                type Table = [<$name Table>];

                fn name() -> &'static str {
                    stringify!($name)
                }

                fn requirements() -> ::std::vec::Vec<$crate::Requirement> {
                    ::std::vec![
                        $( $crate::interface!(@requirement $name $op [$($params)*] [$($ret)?]) ),*
                    ]
                }
            }

            impl $crate::OperationTable for [<$name Table>] {
                fn slot_names() -> &'static [&'static str] {
                    &[$(stringify!([<$op _fn>])),*]
                }

                fn assemble(
                    source: &mut $crate::SlotSource,
                ) -> $crate::BindResult<Self> {
                    ::std::result::Result::Ok(Self {
                        $( [<$op _fn>]: source.take(stringify!($op), stringify!([<$op _fn>]))?, )*
                    })
                }
            }

            impl ::std::fmt::Debug for [<$name Table>] {
                fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                    f.debug_struct(stringify!([<$name Table>]))
                        $( .field(stringify!([<$op _fn>]), &self.[<$op _fn>]) )*
                        .finish()
                }
            }

            #[doc = "Calls through a facade of [`" $name "`]."]
            $vis trait [<$name Face>]: $crate::Face<Interface = $name> {
                $(
                    $crate::interface!(
                        @face [$(#[$fmeta])*] $op [<$op _fn>] [$($params)*] [$($ret)?]
                    );
                )*
            }

            impl<F: $crate::Face<Interface = $name>> [<$name Face>] for F {}
        }
    };
}

/// Declare an inherent impl block and record it as the type's operations.
///
/// Every method becomes an [`Operation`](crate::Operation) named after the
/// method. `self` receivers are dispatched on a clone, so they need the type
/// to be `Clone`.
///
/// ```
/// use vtbind::{implement, Implementation};
///
/// struct Counter {
///     count: u32,
/// }
///
/// implement! {
///     impl Counter {
///         pub fn bump(&mut self, by: u32) -> u32 {
///             self.count += by;
///             self.count
///         }
///
///         fn zero() -> u32 {
///             0
///         }
///     }
/// }
///
/// let names: Vec<_> = Counter::operations().iter().map(|op| op.name()).collect();
/// assert_eq!(names, ["bump", "zero"]);
/// ```
#[macro_export]
macro_rules! implement {
    (@ret) => { () };
    (@ret $ret:ty) => { $ret };

    (@operation $op:ident [&mut self $(, $arg:ident : $ty:ty)* $(,)?] [$($ret:ty)?]) => {
        $crate::Operation::exclusive::<Self, ($($ty,)*), $crate::implement!(@ret $($ret)?)>(
            stringify!($op),
            |this, ($($arg,)*)| Self::$op(this $(, $arg)*),
        )
    };
    (@operation $op:ident [&self $(, $arg:ident : $ty:ty)* $(,)?] [$($ret:ty)?]) => {
        $crate::Operation::shared::<Self, ($($ty,)*), $crate::implement!(@ret $($ret)?)>(
            stringify!($op),
            |this, ($($arg,)*)| Self::$op(this $(, $arg)*),
        )
    };
    (@operation $op:ident [self $(, $arg:ident : $ty:ty)* $(,)?] [$($ret:ty)?]) => {
        $crate::Operation::by_value::<Self, ($($ty,)*), $crate::implement!(@ret $($ret)?)>(
            stringify!($op),
            |this, ($($arg,)*)| Self::$op(this $(, $arg)*),
        )
    };
    (@operation $op:ident [$($arg:ident : $ty:ty),* $(,)?] [$($ret:ty)?]) => {
        $crate::Operation::free::<($($ty,)*), $crate::implement!(@ret $($ret)?)>(
            stringify!($op),
            |($($arg,)*)| Self::$op($($arg),*),
        )
    };

    (
        $(#[$meta:meta])*
        impl $ty:ty {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis fn $op:ident ( $($params:tt)* ) $(-> $ret:ty)? $body:block
            )*
        }
    ) => {
        $(#[$meta])*
        impl $ty {
            $(
                $(#[$fmeta])*
                $fvis fn $op ( $($params)* ) $(-> $ret)? $body
            )*
        }

        impl $crate::Implementation for $ty {
            fn operations() -> ::std::vec::Vec<$crate::Operation> {
                ::std::vec![
                    $( $crate::implement!(@operation $op [$($params)*] [$($ret)?]) ),*
                ]
            }
        }
    };
}
