//! Handler definitions and traits
//!
//! A handler is a callback with a fixed argument tuple. The tuple type is
//! inferred from the closure at the `attach` call site and erased behind
//! [`DynHandler`], so handlers with unrelated signatures can share one
//! registry entry.

use crate::config::MismatchPolicy;
use crate::error::{ConversionError, SkipReason};
use crate::value::Value;
use std::any::{type_name, Any};
use std::fmt;
use std::marker::PhantomData;

/// Typed arguments recovered from a published argument list
#[derive(Debug)]
pub struct Extracted<T> {
    /// Converted values, default-filled where a conversion failed
    pub values: T,

    /// Positions whose published value had the wrong type
    pub mismatches: Vec<ConversionError>,
}

/// An argument tuple that can be rebuilt from type-erased values.
///
/// Implemented for `()` and tuples of up to twelve elements whose members
/// are `Clone + Default + 'static`.
pub trait ArgList: Sized + 'static {
    /// Number of arguments a handler with this signature consumes
    const ARITY: usize;

    /// Convert the first `ARITY` values. Extra trailing values are ignored.
    fn extract(args: &[Value], policy: MismatchPolicy) -> Result<Extracted<Self>, SkipReason>;
}

fn check_arity(args: &[Value], expected: usize) -> Result<(), SkipReason> {
    if args.len() < expected {
        return Err(SkipReason::InsufficientArguments {
            expected,
            provided: args.len(),
        });
    }
    Ok(())
}

fn convert<T: Any + Clone + Default>(
    value: &Value,
    index: usize,
    mismatches: &mut Vec<ConversionError>,
) -> T {
    value.extract(index).unwrap_or_else(|err| {
        mismatches.push(err);
        T::default()
    })
}

fn finish<T>(
    values: T,
    mismatches: Vec<ConversionError>,
    policy: MismatchPolicy,
) -> Result<Extracted<T>, SkipReason> {
    if !mismatches.is_empty() && policy == MismatchPolicy::Skip {
        return Err(SkipReason::TypeMismatch(mismatches));
    }
    Ok(Extracted { values, mismatches })
}

impl ArgList for () {
    const ARITY: usize = 0;

    fn extract(_args: &[Value], _policy: MismatchPolicy) -> Result<Extracted<Self>, SkipReason> {
        Ok(Extracted {
            values: (),
            mismatches: Vec::new(),
        })
    }
}

macro_rules! impl_arg_list {
    ($arity:literal; $($ty:ident $idx:tt),+) => {
        impl<$($ty),+> ArgList for ($($ty,)+)
        where
            $($ty: Any + Clone + Default,)+
        {
            const ARITY: usize = $arity;

            fn extract(
                args: &[Value],
                policy: MismatchPolicy,
            ) -> Result<Extracted<Self>, SkipReason> {
                check_arity(args, Self::ARITY)?;

                let mut mismatches = Vec::new();
                let values = ($(convert::<$ty>(&args[$idx], $idx, &mut mismatches),)+);
                finish(values, mismatches, policy)
            }
        }
    };
}

impl_arg_list!(1; A 0);
impl_arg_list!(2; A 0, B 1);
impl_arg_list!(3; A 0, B 1, C 2);
impl_arg_list!(4; A 0, B 1, C 2, D 3);
impl_arg_list!(5; A 0, B 1, C 2, D 3, E 4);
impl_arg_list!(6; A 0, B 1, C 2, D 3, E 4, F 5);
impl_arg_list!(7; A 0, B 1, C 2, D 3, E 4, F 5, G 6);
impl_arg_list!(8; A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);
impl_arg_list!(9; A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8);
impl_arg_list!(10; A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8, J 9);
impl_arg_list!(11; A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8, J 9, K 10);
impl_arg_list!(12; A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8, J 9, K 10, L 11);

/// A strongly-typed callback taking `Args` as individual parameters.
///
/// Implemented for every `Fn(A, B, ..) + Send + Sync + 'static`, which lets
/// `attach` infer the argument tuple from an annotated closure:
///
/// ```rust
/// use switchboard_events::EventBus;
///
/// let bus = EventBus::new();
/// bus.attach("resize", |width: u32, height: u32| {
///     assert!(width > 0 && height > 0);
/// });
/// ```
pub trait Callback<Args>: Send + Sync + 'static {
    fn call(&self, args: Args);
}

impl<Func> Callback<()> for Func
where
    Func: Fn() + Send + Sync + 'static,
{
    fn call(&self, _args: ()) {
        (self)()
    }
}

macro_rules! impl_callback {
    ($($ty:ident),+) => {
        impl<Func, $($ty),+> Callback<($($ty,)+)> for Func
        where
            Func: Fn($($ty),+) + Send + Sync + 'static,
        {
            #[allow(non_snake_case)]
            fn call(&self, args: ($($ty,)+)) {
                let ($($ty,)+) = args;
                (self)($($ty),+)
            }
        }
    };
}

impl_callback!(A);
impl_callback!(A, B);
impl_callback!(A, B, C);
impl_callback!(A, B, C, D);
impl_callback!(A, B, C, D, E);
impl_callback!(A, B, C, D, E, F);
impl_callback!(A, B, C, D, E, F, G);
impl_callback!(A, B, C, D, E, F, G, H);
impl_callback!(A, B, C, D, E, F, G, H, I);
impl_callback!(A, B, C, D, E, F, G, H, I, J);
impl_callback!(A, B, C, D, E, F, G, H, I, J, K);
impl_callback!(A, B, C, D, E, F, G, H, I, J, K, L);

/// Outcome of invoking one handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// The callback ran. Non-empty `mismatches` means some positions were
    /// default-filled.
    Called { mismatches: Vec<ConversionError> },

    /// The callback did not run
    Skipped(SkipReason),
}

impl Invocation {
    pub fn is_called(&self) -> bool {
        matches!(self, Invocation::Called { .. })
    }

    /// Called with at least one default-filled argument
    pub fn is_degraded(&self) -> bool {
        matches!(self, Invocation::Called { mismatches } if !mismatches.is_empty())
    }

    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match self {
            Invocation::Skipped(reason) => Some(reason),
            Invocation::Called { .. } => None,
        }
    }
}

/// Type-erased handler
pub trait DynHandler: Send + Sync {
    /// Number of arguments the callback consumes
    fn arity(&self) -> usize;

    /// Type name of the argument tuple
    fn signature(&self) -> &'static str;

    /// Convert `args` and call the callback according to `policy`
    fn invoke(&self, args: &[Value], policy: MismatchPolicy) -> Invocation;
}

/// Wrapper for typed callbacks
pub struct TypedHandler<F, Args> {
    callback: F,
    _args: PhantomData<fn(Args)>,
}

impl<F, Args> TypedHandler<F, Args>
where
    F: Callback<Args>,
    Args: ArgList,
{
    pub fn new(callback: F) -> Self {
        Self {
            callback,
            _args: PhantomData,
        }
    }
}

impl<F, Args> DynHandler for TypedHandler<F, Args>
where
    F: Callback<Args>,
    Args: ArgList,
{
    fn arity(&self) -> usize {
        Args::ARITY
    }

    fn signature(&self) -> &'static str {
        type_name::<Args>()
    }

    fn invoke(&self, args: &[Value], policy: MismatchPolicy) -> Invocation {
        match Args::extract(args, policy) {
            Ok(Extracted { values, mismatches }) => {
                self.callback.call(values);
                Invocation::Called { mismatches }
            }
            Err(reason) => Invocation::Skipped(reason),
        }
    }
}

impl<F, Args> fmt::Debug for TypedHandler<F, Args>
where
    F: Callback<Args>,
    Args: ArgList,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedHandler")
            .field("signature", &self.signature())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use std::sync::{Arc, Mutex};

    fn recorder<T: Send + 'static>() -> (Arc<Mutex<Vec<T>>>, Arc<Mutex<Vec<T>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        (seen.clone(), seen)
    }

    #[test]
    fn test_arity() {
        let zero = TypedHandler::new(|| {});
        let two = TypedHandler::new(|_: i32, _: String| {});

        assert_eq!(zero.arity(), 0);
        assert_eq!(two.arity(), 2);
        assert!(two.signature().contains("String"));
    }

    #[test]
    fn test_invoke_with_matching_args() {
        let (seen, sink) = recorder();
        let handler = TypedHandler::new(move |id: u64, name: String| {
            sink.lock().unwrap().push((id, name));
        });

        let outcome = handler.invoke(&args![7u64, String::from("alice")], MismatchPolicy::Degrade);

        assert_eq!(outcome, Invocation::Called { mismatches: vec![] });
        assert_eq!(*seen.lock().unwrap(), vec![(7, "alice".to_string())]);
    }

    #[test]
    fn test_insufficient_args_skips_call() {
        let (seen, sink) = recorder();
        let handler = TypedHandler::new(move |a: i32, b: i32| {
            sink.lock().unwrap().push(a + b);
        });

        let outcome = handler.invoke(&args![1], MismatchPolicy::Degrade);

        assert_eq!(
            outcome.skip_reason(),
            Some(&SkipReason::InsufficientArguments {
                expected: 2,
                provided: 1
            })
        );
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_mismatch_degrades_to_default() {
        let (seen, sink) = recorder();
        let handler = TypedHandler::new(move |a: i32, b: String, c: bool| {
            sink.lock().unwrap().push((a, b, c));
        });

        let outcome = handler.invoke(&args![5, 9.5f64, true], MismatchPolicy::Degrade);

        assert!(outcome.is_called());
        assert!(outcome.is_degraded());
        assert_eq!(
            outcome,
            Invocation::Called {
                mismatches: vec![ConversionError {
                    index: 1,
                    expected: type_name::<String>(),
                    found: "f64",
                }]
            }
        );
        assert_eq!(*seen.lock().unwrap(), vec![(5, String::new(), true)]);
    }

    #[test]
    fn test_mismatch_skips_under_strict_policy() {
        let (seen, sink) = recorder();
        let handler = TypedHandler::new(move |a: i32, b: i32| {
            sink.lock().unwrap().push(a + b);
        });

        let outcome = handler.invoke(&args![1u8, 2i64], MismatchPolicy::Skip);

        match outcome {
            Invocation::Skipped(SkipReason::TypeMismatch(errors)) => {
                let positions: Vec<usize> = errors.iter().map(|e| e.index).collect();
                assert_eq!(positions, vec![0, 1]);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_extra_args_are_ignored() {
        let (seen, sink) = recorder();
        let handler = TypedHandler::new(move |a: i32| {
            sink.lock().unwrap().push(a);
        });

        let outcome = handler.invoke(&args![3, "extra", 4.0f32], MismatchPolicy::Skip);

        assert_eq!(outcome, Invocation::Called { mismatches: vec![] });
        assert_eq!(*seen.lock().unwrap(), vec![3]);
    }

    #[test]
    fn test_zero_arity_always_called() {
        let (seen, sink) = recorder();
        let handler = TypedHandler::new(move || {
            sink.lock().unwrap().push(());
        });

        handler.invoke(&[], MismatchPolicy::Skip);
        handler.invoke(&args![1, 2], MismatchPolicy::Skip);

        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_twelve_arguments() {
        let (seen, sink) = recorder();
        let handler = TypedHandler::new(
            move |a: u8, b: u8, c: u8, d: u8, e: u8, f: u8, g: u8, h: u8, i: u8, j: u8, k: u8, l: u8| {
                let all = [a, b, c, d, e, f, g, h, i, j, k, l];
                sink.lock().unwrap().push(all.iter().map(|&x| u32::from(x)).sum::<u32>());
            },
        );

        let values: Vec<Value> = (1u8..=12).map(Value::new).collect();
        handler.invoke(&values, MismatchPolicy::Degrade);

        assert_eq!(handler.arity(), 12);
        assert_eq!(*seen.lock().unwrap(), vec![78]);
    }
}
