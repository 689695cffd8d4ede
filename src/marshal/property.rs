//! Property accessors over native instances.

use super::args::IntoJsResult;
use super::callback::NativeCallback;
use super::method::ClassMember;
use crate::class::{ClassBuilder, InstanceCell};
use crate::context::Ctx;
use crate::convert::{FromJs, ToJs};
use crate::core::{BindingError, BindingResult};
use crate::raw::{self, RawValue};

/// A data member exposed as a getter/setter pair. Build it with [`field!`](crate::field).
pub struct Field<T, V> {
    get: fn(&T) -> &V,
    get_mut: fn(&mut T) -> &mut V,
}

impl<T, V> Field<T, V> {
    pub fn new(get: fn(&T) -> &V, get_mut: fn(&mut T) -> &mut V) -> Self {
        Self { get, get_mut }
    }
}

impl<T, V> Clone for Field<T, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, V> Copy for Field<T, V> {}

/// Marker for data members.
pub struct FieldMember;

impl<T, V> ClassMember<T, FieldMember> for Field<T, V>
where
    T: 'static,
    V: ToJs + FromJs + 'static,
{
    fn bind(self, builder: &mut ClassBuilder<'_, T>, name: &str) -> BindingResult<()> {
        let field = self;
        let get: Box<NativeCallback> =
            Box::new(move |ctx: &Ctx, this: RawValue, _args: &[RawValue]| {
                let Some(cell) = (unsafe { InstanceCell::<T>::from_value(this) }) else {
                    return Ok(raw::undefined());
                };
                let receiver = cell.borrow()?;
                (field.get)(&*receiver).to_js(ctx)
            });
        let set = setter(move |this: &mut T, value: V| {
            *(field.get_mut)(this) = value;
        });
        builder.define_accessor(name, get, Some(set))
    }
}

/// Wraps a getter. A dead receiver reads as `undefined`.
pub(crate) fn getter<T, G, R>(get: G) -> Box<NativeCallback>
where
    T: 'static,
    G: Fn(&T) -> R + 'static,
    R: IntoJsResult,
{
    Box::new(move |ctx: &Ctx, this: RawValue, _args: &[RawValue]| {
        let Some(cell) = (unsafe { InstanceCell::<T>::from_value(this) }) else {
            return Ok(raw::undefined());
        };
        let value = {
            let receiver = cell.borrow()?;
            get(&*receiver)
        };
        value.into_js_result(ctx)
    })
}

/// Wraps a setter. A dead receiver is an error.
pub(crate) fn setter<T, S, V, R>(set: S) -> Box<NativeCallback>
where
    T: 'static,
    S: Fn(&mut T, V) -> R + 'static,
    V: FromJs,
    R: IntoJsResult,
{
    Box::new(move |ctx: &Ctx, this: RawValue, args: &[RawValue]| {
        let cell = unsafe { InstanceCell::<T>::receiver(this) }.map_err(|_| {
            BindingError::Receiver("cannot set a property on a released instance".to_string())
        })?;
        let value = V::from_js(ctx, args.first().copied().unwrap_or_else(raw::undefined))?;
        let result = {
            let mut receiver = cell.borrow_mut()?;
            set(&mut *receiver, value)
        };
        let discarded = result.into_js_result(ctx)?;
        unsafe { raw::free(ctx.as_ptr(), discarded) };
        Ok(raw::undefined())
    })
}
