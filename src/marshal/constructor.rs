//! Native factories used as class constructors.

use std::marker::PhantomData;

use super::args::{ArgCursor, FromParam};
use crate::context::Ctx;
use crate::core::{BindingError, BindingResult};
use crate::raw::RawValue;

/// Something that builds a `T` from script arguments.
///
/// Implemented for `Fn(A, B, ..) -> T` and `Fn(A, B, ..) -> Result<T, E>`.
pub trait Constructor<T, Marker>: 'static {
    /// Minimum number of arguments; fewer is an arity error.
    const LENGTH: usize;

    fn construct(&self, ctx: &Ctx, args: &[RawValue]) -> BindingResult<T>;
}

/// Marker for infallible factories.
pub struct Plain<Sig>(PhantomData<Sig>);

/// Marker for factories returning `Result`.
pub struct Fallible<Sig>(PhantomData<Sig>);

macro_rules! impl_constructor {
    ($($param:ident $arg:ident),*) => {
        impl<T, Func, $($param,)*> Constructor<T, Plain<fn($($param,)*) -> T>> for Func
        where
            Func: Fn($($param),*) -> T + 'static,
            $($param: FromParam,)*
        {
            const LENGTH: usize = 0 $(+ <$param as FromParam>::ARITY)*;

            #[allow(unused_variables, unused_mut)]
            fn construct(&self, ctx: &Ctx, args: &[RawValue]) -> BindingResult<T> {
                let mut cursor = ArgCursor::new(args);
                $(let $arg = <$param as FromParam>::from_param(ctx, &mut cursor)?;)*
                Ok((self)($($arg),*))
            }
        }

        impl<T, Failure, Func, $($param,)*> Constructor<T, Fallible<fn($($param,)*) -> Result<T, Failure>>> for Func
        where
            Func: Fn($($param),*) -> Result<T, Failure> + 'static,
            Failure: Into<BindingError>,
            $($param: FromParam,)*
        {
            const LENGTH: usize = 0 $(+ <$param as FromParam>::ARITY)*;

            #[allow(unused_variables, unused_mut)]
            fn construct(&self, ctx: &Ctx, args: &[RawValue]) -> BindingResult<T> {
                let mut cursor = ArgCursor::new(args);
                $(let $arg = <$param as FromParam>::from_param(ctx, &mut cursor)?;)*
                (self)($($arg),*).map_err(Into::into)
            }
        }
    };
}

impl_constructor!();
impl_constructor!(A a);
impl_constructor!(A a, B b);
impl_constructor!(A a, B b, C c);
impl_constructor!(A a, B b, C c, D d);
impl_constructor!(A a, B b, C c, D d, E e);
impl_constructor!(A a, B b, C c, D d, E e, F f);
impl_constructor!(A a, B b, C c, D d, E e, F f, G g);
