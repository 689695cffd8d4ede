use super::{FromJs, ToJs};
use crate::context::Ctx;
use crate::core::{BindingError, BindingResult};
use crate::raw::{self, qjs, RawValue};

fn int_value(ctx: &Ctx, value: i64) -> RawValue {
    match i32::try_from(value) {
        Ok(small) => qjs::JS_MKVAL(qjs::JS_TAG_INT, small),
        Err(_) => qjs::JS_NewFloat64(value as f64),
    }
}

/// Rejects inputs whose numeric coercion is meaningless (NaN from a
/// non-number) or throws.
fn numeric_input(ctx: &Ctx, value: RawValue, expected: &'static str) -> BindingResult<()> {
    if matches!(raw::tag(value), raw::TAG_INT | raw::TAG_FLOAT64 | raw::TAG_BOOL) {
        return Ok(());
    }
    let mut coerced = 0.0;
    if unsafe { qjs::JS_ToFloat64(ctx.as_ptr(), &mut coerced, value) } < 0 {
        let cause = ctx.catch_exception();
        return Err(BindingError::conversion(expected, cause.to_string()));
    }
    if coerced.is_nan() {
        let shown = unsafe { raw::to_rust_string(ctx.as_ptr(), value) }
            .unwrap_or_else(|| "<unprintable>".to_string());
        return Err(BindingError::conversion(expected, format!("got {shown:?}")));
    }
    Ok(())
}

#[cfg(not(feature = "lenient-conversions"))]
fn numeric_failure<T: Default>(err: BindingError) -> BindingResult<T> {
    Err(err)
}

#[cfg(feature = "lenient-conversions")]
fn numeric_failure<T: Default>(err: BindingError) -> BindingResult<T> {
    crate::js_error!("{err}; substituting default value");
    Ok(T::default())
}

fn read_i32(ctx: &Ctx, value: RawValue, expected: &'static str) -> BindingResult<i32> {
    if let Err(err) = numeric_input(ctx, value, expected) {
        return numeric_failure(err);
    }
    let mut out = 0;
    if unsafe { qjs::JS_ToInt32(ctx.as_ptr(), &mut out, value) } < 0 {
        return numeric_failure(BindingError::conversion(expected, ctx.catch_exception().to_string()));
    }
    Ok(out)
}

fn read_i64(ctx: &Ctx, value: RawValue, expected: &'static str) -> BindingResult<i64> {
    if let Err(err) = numeric_input(ctx, value, expected) {
        return numeric_failure(err);
    }
    let mut out = 0;
    if unsafe { qjs::JS_ToInt64(ctx.as_ptr(), &mut out, value) } < 0 {
        return numeric_failure(BindingError::conversion(expected, ctx.catch_exception().to_string()));
    }
    Ok(out)
}

fn read_f64(ctx: &Ctx, value: RawValue, expected: &'static str) -> BindingResult<f64> {
    if let Err(err) = numeric_input(ctx, value, expected) {
        return numeric_failure(err);
    }
    let mut out = 0.0;
    if unsafe { qjs::JS_ToFloat64(ctx.as_ptr(), &mut out, value) } < 0 {
        return numeric_failure(BindingError::conversion(expected, ctx.catch_exception().to_string()));
    }
    Ok(out)
}

// Narrow integers follow the engine's ToInt32 and then truncate, like a C cast.
macro_rules! int32_conversions {
    ($($ty:ty),*) => {$(
        impl ToJs for $ty {
            fn to_js(&self, ctx: &Ctx) -> BindingResult<RawValue> {
                Ok(qjs::JS_MKVAL(qjs::JS_TAG_INT, *self as i32))
            }
        }

        impl FromJs for $ty {
            fn from_js(ctx: &Ctx, value: RawValue) -> BindingResult<Self> {
                read_i32(ctx, value, stringify!($ty)).map(|v| v as $ty)
            }
        }
    )*};
}

int32_conversions!(i8, i16, i32, u8, u16);

impl ToJs for u32 {
    fn to_js(&self, ctx: &Ctx) -> BindingResult<RawValue> {
        Ok(int_value(ctx, i64::from(*self)))
    }
}

impl FromJs for u32 {
    fn from_js(ctx: &Ctx, value: RawValue) -> BindingResult<Self> {
        read_i64(ctx, value, "u32").map(|v| v as u32)
    }
}

macro_rules! int64_conversions {
    ($($ty:ty),*) => {$(
        impl ToJs for $ty {
            fn to_js(&self, ctx: &Ctx) -> BindingResult<RawValue> {
                match i64::try_from(*self) {
                    Ok(v) => Ok(int_value(ctx, v)),
                    Err(_) => Ok(qjs::JS_NewFloat64(*self as f64)),
                }
            }
        }

        impl FromJs for $ty {
            fn from_js(ctx: &Ctx, value: RawValue) -> BindingResult<Self> {
                read_i64(ctx, value, stringify!($ty)).map(|v| v as $ty)
            }
        }
    )*};
}

int64_conversions!(i64, isize, u64, usize);

impl ToJs for f64 {
    fn to_js(&self, ctx: &Ctx) -> BindingResult<RawValue> {
        Ok(qjs::JS_NewFloat64(*self))
    }
}

impl FromJs for f64 {
    fn from_js(ctx: &Ctx, value: RawValue) -> BindingResult<Self> {
        read_f64(ctx, value, "f64")
    }
}

impl ToJs for f32 {
    fn to_js(&self, ctx: &Ctx) -> BindingResult<RawValue> {
        Ok(qjs::JS_NewFloat64(f64::from(*self)))
    }
}

impl FromJs for f32 {
    fn from_js(ctx: &Ctx, value: RawValue) -> BindingResult<Self> {
        read_f64(ctx, value, "f32").map(|v| v as f32)
    }
}

impl ToJs for bool {
    fn to_js(&self, ctx: &Ctx) -> BindingResult<RawValue> {
        Ok(qjs::JS_MKVAL(qjs::JS_TAG_BOOL, *self as i32))
    }
}

impl FromJs for bool {
    fn from_js(ctx: &Ctx, value: RawValue) -> BindingResult<Self> {
        match unsafe { qjs::JS_ToBool(ctx.as_ptr(), value) } {
            status if status < 0 => Err(BindingError::conversion(
                "bool",
                ctx.catch_exception().to_string(),
            )),
            status => Ok(status != 0),
        }
    }
}
