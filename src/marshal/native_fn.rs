//! Free functions: any `Fn(A, B, ..) -> R` whose parameters convert from the
//! engine and whose result converts back.

use super::args::{ArgCursor, FromParam, IntoJsResult};
use crate::context::Ctx;
use crate::core::BindingResult;
use crate::raw::RawValue;

/// A native callable that can be exported to scripts.
///
/// `Marker` is the callable's signature as a function-pointer type; it only
/// exists so that closures of different arities get distinct impls.
pub trait NativeFunction<Marker>: 'static {
    /// Declared `length`; trailing [`Rest`](crate::Rest) parameters are excluded.
    const LENGTH: usize;

    fn invoke(&self, ctx: &Ctx, args: &[RawValue]) -> BindingResult<RawValue>;
}

macro_rules! impl_native_function {
    ($($param:ident $arg:ident),*) => {
        impl<Func, Ret, $($param,)*> NativeFunction<fn($($param,)*) -> Ret> for Func
        where
            Func: Fn($($param),*) -> Ret + 'static,
            Ret: IntoJsResult,
            $($param: FromParam,)*
        {
            const LENGTH: usize = 0 $(+ <$param as FromParam>::ARITY)*;

            #[allow(unused_variables, unused_mut)]
            fn invoke(&self, ctx: &Ctx, args: &[RawValue]) -> BindingResult<RawValue> {
                let mut cursor = ArgCursor::new(args);
                $(let $arg = <$param as FromParam>::from_param(ctx, &mut cursor)?;)*
                (self)($($arg),*).into_js_result(ctx)
            }
        }
    };
}

impl_native_function!();
impl_native_function!(A a);
impl_native_function!(A a, B b);
impl_native_function!(A a, B b, C c);
impl_native_function!(A a, B b, C c, D d);
impl_native_function!(A a, B b, C c, D d, E e);
impl_native_function!(A a, B b, C c, D d, E e, F f);
impl_native_function!(A a, B b, C c, D d, E e, F f, G g);
impl_native_function!(A a, B b, C c, D d, E e, F f, G g, H h);
