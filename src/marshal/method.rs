//! Member bindings: methods taking `&T` / `&mut T`, and the compile-time
//! dispatch between methods and properties.

use std::marker::PhantomData;

use super::args::{ArgCursor, FromParam, IntoJsResult};
use crate::class::{ClassBuilder, InstanceCell};
use crate::context::Ctx;
use crate::core::BindingResult;
use crate::raw::RawValue;

/// Anything [`ClassBuilder::function`] can bind under a name.
///
/// Closures and functions whose first parameter is `&T` or `&mut T` bind as
/// prototype methods; a [`Field`](super::Field) binds as a getter/setter pair.
/// Which one applies is decided by trait resolution, never at runtime.
pub trait ClassMember<T, Marker> {
    fn bind(self, builder: &mut ClassBuilder<'_, T>, name: &str) -> BindingResult<()>;
}

/// Marker for methods with a shared receiver.
pub struct RefMethod<Sig>(PhantomData<Sig>);

/// Marker for methods with an exclusive receiver.
pub struct MutMethod<Sig>(PhantomData<Sig>);

macro_rules! impl_method {
    ($($param:ident $arg:ident),*) => {
        impl<T, Func, Ret, $($param,)*> ClassMember<T, RefMethod<fn(&T, $($param,)*) -> Ret>> for Func
        where
            T: 'static,
            Func: Fn(&T, $($param),*) -> Ret + 'static,
            Ret: IntoJsResult,
            $($param: FromParam + 'static,)*
        {
            #[allow(unused_variables, unused_mut)]
            fn bind(self, builder: &mut ClassBuilder<'_, T>, name: &str) -> BindingResult<()> {
                let length = 0 $(+ <$param as FromParam>::ARITY)*;
                builder.define_method(name, length, Box::new(move |ctx: &Ctx, this: RawValue, args: &[RawValue]| {
                    let cell = unsafe { InstanceCell::<T>::receiver(this) }?;
                    let mut cursor = ArgCursor::new(args);
                    $(let $arg = <$param as FromParam>::from_param(ctx, &mut cursor)?;)*
                    let result = {
                        let receiver = cell.borrow()?;
                        (self)(&*receiver, $($arg),*)
                    };
                    result.into_js_result(ctx)
                }))
            }
        }

        impl<T, Func, Ret, $($param,)*> ClassMember<T, MutMethod<fn(&mut T, $($param,)*) -> Ret>> for Func
        where
            T: 'static,
            Func: Fn(&mut T, $($param),*) -> Ret + 'static,
            Ret: IntoJsResult,
            $($param: FromParam + 'static,)*
        {
            #[allow(unused_variables, unused_mut)]
            fn bind(self, builder: &mut ClassBuilder<'_, T>, name: &str) -> BindingResult<()> {
                let length = 0 $(+ <$param as FromParam>::ARITY)*;
                builder.define_method(name, length, Box::new(move |ctx: &Ctx, this: RawValue, args: &[RawValue]| {
                    let cell = unsafe { InstanceCell::<T>::receiver(this) }?;
                    let mut cursor = ArgCursor::new(args);
                    $(let $arg = <$param as FromParam>::from_param(ctx, &mut cursor)?;)*
                    let result = {
                        let mut receiver = cell.borrow_mut()?;
                        (self)(&mut *receiver, $($arg),*)
                    };
                    result.into_js_result(ctx)
                }))
            }
        }
    };
}

impl_method!();
impl_method!(A a);
impl_method!(A a, B b);
impl_method!(A a, B b, C c);
impl_method!(A a, B b, C c, D d);
impl_method!(A a, B b, C c, D d, E e);
impl_method!(A a, B b, C c, D d, E e, F f);
impl_method!(A a, B b, C c, D d, E e, F f, G g);
