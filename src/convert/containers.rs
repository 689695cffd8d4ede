use super::{FromJs, ToJs};
use crate::context::Ctx;
use crate::core::BindingResult;
use crate::raw::{self, qjs, RawValue};
use crate::value::Value;

/// Length of an array-like value; missing or unusable lengths count as zero.
fn sequence_length(ctx: &Ctx, value: RawValue) -> BindingResult<u32> {
    if raw::is_nullish(value) {
        return Ok(0);
    }
    let length = unsafe { qjs::JS_GetPropertyStr(ctx.as_ptr(), value, c"length".as_ptr()) };
    if raw::is_exception(length) {
        return Err(ctx.catch_exception());
    }
    if raw::is_nullish(length) {
        return Ok(0);
    }
    let mut out: i64 = 0;
    let status = unsafe { qjs::JS_ToInt64(ctx.as_ptr(), &mut out, length) };
    unsafe { raw::free(ctx.as_ptr(), length) };
    if status < 0 {
        return Err(ctx.catch_exception());
    }
    Ok(out.clamp(0, i64::from(u32::MAX)) as u32)
}

impl<T: ToJs> ToJs for [T] {
    fn to_js(&self, ctx: &Ctx) -> BindingResult<RawValue> {
        let array = ctx.check(unsafe { qjs::JS_NewArray(ctx.as_ptr()) })?;
        for (index, item) in self.iter().enumerate() {
            let element = item.to_js(ctx)?;
            let status = unsafe {
                qjs::JS_SetPropertyUint32(ctx.as_ptr(), array.as_raw(), index as u32, element)
            };
            if status < 0 {
                return Err(ctx.catch_exception());
            }
        }
        Ok(array.into_raw())
    }
}

impl<T: ToJs> ToJs for Vec<T> {
    fn to_js(&self, ctx: &Ctx) -> BindingResult<RawValue> {
        self.as_slice().to_js(ctx)
    }
}

impl<T: ToJs, const N: usize> ToJs for [T; N] {
    fn to_js(&self, ctx: &Ctx) -> BindingResult<RawValue> {
        self.as_slice().to_js(ctx)
    }
}

impl<T: FromJs> FromJs for Vec<T> {
    fn from_js(ctx: &Ctx, value: RawValue) -> BindingResult<Self> {
        let len = sequence_length(ctx, value)?;
        let mut out = Vec::with_capacity(len.min(1024) as usize);
        for index in 0..len {
            let element = unsafe { qjs::JS_GetPropertyUint32(ctx.as_ptr(), value, index) };
            let element = ctx.check(element)?;
            out.push(T::from_js(ctx, element.as_raw())?);
        }
        Ok(out)
    }
}

impl<T: ToJs> ToJs for Option<T> {
    fn to_js(&self, ctx: &Ctx) -> BindingResult<RawValue> {
        match self {
            Some(inner) => inner.to_js(ctx),
            None => Ok(raw::null()),
        }
    }
}

impl<T: FromJs> FromJs for Option<T> {
    fn from_js(ctx: &Ctx, value: RawValue) -> BindingResult<Self> {
        if raw::is_nullish(value) {
            return Ok(None);
        }
        T::from_js(ctx, value).map(Some)
    }
}

impl ToJs for Value {
    fn to_js(&self, ctx: &Ctx) -> BindingResult<RawValue> {
        if self.is_valid() {
            Ok(unsafe { raw::dup(ctx.as_ptr(), self.as_raw()) })
        } else {
            Ok(raw::undefined())
        }
    }
}

impl FromJs for Value {
    fn from_js(ctx: &Ctx, value: RawValue) -> BindingResult<Self> {
        Ok(unsafe { Value::from_borrowed(ctx.clone(), value) })
    }
}
