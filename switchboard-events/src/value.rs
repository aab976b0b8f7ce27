//! Type-erased event arguments

use crate::error::ConversionError;
use std::any::{type_name, Any};
use std::fmt;

/// A single published argument with its dynamic type erased.
///
/// The concrete type is recovered with a checked downcast at invocation
/// time. No coercion is ever attempted: an `i32` never extracts as `i64`.
pub struct Value {
    inner: Box<dyn Any>,
    type_name: &'static str,
}

impl Value {
    /// Wrap a value
    pub fn new<T: Any>(value: T) -> Self {
        Self {
            inner: Box::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// Name of the stored type, for diagnostics only
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Check whether the stored value is exactly a `T`
    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Borrow the stored value as `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Clone the stored value out as `T`.
    ///
    /// `index` is the argument position, carried into the error.
    pub fn extract<T: Any + Clone>(&self, index: usize) -> Result<T, ConversionError> {
        self.downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| ConversionError {
                index,
                expected: type_name::<T>(),
                found: self.type_name,
            })
    }

    /// Take ownership of the stored value, handing `self` back on mismatch
    pub fn into_inner<T: Any>(self) -> Result<T, Self> {
        let type_name = self.type_name;
        match self.inner.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(inner) => Err(Self { inner, type_name }),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Value").field(&self.type_name).finish()
    }
}

/// Conversion into an ordered argument sequence for publishing.
///
/// Implemented for `()`, tuples up to twelve elements and `Vec<Value>`.
pub trait IntoArgs {
    fn into_args(self) -> Vec<Value>;
}

impl IntoArgs for Vec<Value> {
    fn into_args(self) -> Vec<Value> {
        self
    }
}

impl IntoArgs for () {
    fn into_args(self) -> Vec<Value> {
        Vec::new()
    }
}

macro_rules! impl_into_args {
    ($($ty:ident),+) => {
        impl<$($ty: Any),+> IntoArgs for ($($ty,)+) {
            #[allow(non_snake_case)]
            fn into_args(self) -> Vec<Value> {
                let ($($ty,)+) = self;
                vec![$(Value::new($ty)),+]
            }
        }
    };
}

impl_into_args!(A);
impl_into_args!(A, B);
impl_into_args!(A, B, C);
impl_into_args!(A, B, C, D);
impl_into_args!(A, B, C, D, E);
impl_into_args!(A, B, C, D, E, F);
impl_into_args!(A, B, C, D, E, F, G);
impl_into_args!(A, B, C, D, E, F, G, H);
impl_into_args!(A, B, C, D, E, F, G, H, I);
impl_into_args!(A, B, C, D, E, F, G, H, I, J);
impl_into_args!(A, B, C, D, E, F, G, H, I, J, K);
impl_into_args!(A, B, C, D, E, F, G, H, I, J, K, L);

/// Build a `Vec<Value>` from a list of expressions.
///
/// ```rust
/// use switchboard_events::args;
///
/// let args = args![42, String::from("saved"), true];
/// assert_eq!(args.len(), 3);
/// assert!(args[0].is::<i32>());
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::new($arg)),+]
    };
}
