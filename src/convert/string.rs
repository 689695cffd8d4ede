use std::borrow::Cow;
use std::ffi::{c_char, CStr, CString};

use super::{FromJs, ToJs};
use crate::context::Ctx;
use crate::core::{BindingError, BindingResult};
use crate::raw::{self, qjs, RawValue};

/// An engine-owned UTF-8 buffer, released when dropped.
pub struct JsCString {
    ctx: *mut qjs::JSContext,
    ptr: *const c_char,
    len: usize,
}

impl JsCString {
    /// Coerces `value` to a string the way `String(value)` does.
    ///
    /// Returns `None` when the coercion throws; the exception stays pending.
    ///
    /// # Safety
    /// `ctx` must be live for the lifetime of the returned buffer.
    pub unsafe fn new(ctx: *mut qjs::JSContext, value: RawValue) -> Option<Self> {
        let mut len = 0;
        let ptr = qjs::JS_ToCStringLen2(ctx, &mut len, value, 0);
        if ptr.is_null() {
            return None;
        }
        Some(Self {
            ctx,
            ptr,
            len: len as usize,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr as *const u8, self.len) }
    }

    /// Lone surrogates are replaced with U+FFFD.
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }

    pub fn as_c_str(&self) -> &CStr {
        unsafe { CStr::from_ptr(self.ptr) }
    }
}

impl Drop for JsCString {
    fn drop(&mut self) {
        unsafe { qjs::JS_FreeCString(self.ctx, self.ptr) };
    }
}

impl ToJs for str {
    fn to_js(&self, ctx: &Ctx) -> BindingResult<RawValue> {
        let value = unsafe { raw::new_string(ctx.as_ptr(), self) };
        if raw::is_exception(value) {
            return Err(ctx.catch_exception());
        }
        Ok(value)
    }
}

impl ToJs for String {
    fn to_js(&self, ctx: &Ctx) -> BindingResult<RawValue> {
        self.as_str().to_js(ctx)
    }
}

impl ToJs for Cow<'_, str> {
    fn to_js(&self, ctx: &Ctx) -> BindingResult<RawValue> {
        self.as_ref().to_js(ctx)
    }
}

impl ToJs for CStr {
    fn to_js(&self, ctx: &Ctx) -> BindingResult<RawValue> {
        self.to_string_lossy().to_js(ctx)
    }
}

impl ToJs for CString {
    fn to_js(&self, ctx: &Ctx) -> BindingResult<RawValue> {
        self.as_c_str().to_js(ctx)
    }
}

impl ToJs for char {
    fn to_js(&self, ctx: &Ctx) -> BindingResult<RawValue> {
        let mut buf = [0u8; 4];
        (*self.encode_utf8(&mut buf)).to_js(ctx)
    }
}

impl FromJs for String {
    fn from_js(ctx: &Ctx, value: RawValue) -> BindingResult<Self> {
        match unsafe { JsCString::new(ctx.as_ptr(), value) } {
            Some(text) => Ok(text.to_string_lossy().into_owned()),
            None => Err(BindingError::conversion(
                "string",
                ctx.catch_exception().to_string(),
            )),
        }
    }
}

impl FromJs for Box<str> {
    fn from_js(ctx: &Ctx, value: RawValue) -> BindingResult<Self> {
        String::from_js(ctx, value).map(String::into_boxed_str)
    }
}

impl FromJs for CString {
    fn from_js(ctx: &Ctx, value: RawValue) -> BindingResult<Self> {
        match unsafe { JsCString::new(ctx.as_ptr(), value) } {
            Some(text) => Ok(text.as_c_str().to_owned()),
            None => Err(BindingError::conversion(
                "C string",
                ctx.catch_exception().to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::test_support::context;
    use crate::value::Value;

    #[test]
    fn test_string_round_trip_with_unicode() {
        let (_rt, context) = context();
        let ctx = context.ctx().unwrap();
        let raw = "héllo, 世界".to_js(ctx).unwrap();
        let value = unsafe { Value::from_owned(ctx.clone(), raw) };
        assert_eq!(value.to_rust::<String>().unwrap(), "héllo, 世界");
        assert_eq!(value.get("length").to_i32().unwrap(), 9);
    }

    #[test]
    fn test_embedded_nul_survives() {
        let (_rt, context) = context();
        let ctx = context.ctx().unwrap();
        let raw = "a\0b".to_js(ctx).unwrap();
        let value = unsafe { Value::from_owned(ctx.clone(), raw) };
        assert_eq!(value.to_rust::<String>().unwrap(), "a\0b");
        assert_eq!(value.to_rust::<CString>().unwrap().as_bytes(), b"a");
    }

    #[test]
    fn test_non_strings_are_coerced() {
        let (_rt, context) = context();
        let value = context.eval_global("[1, [2, 3]]").unwrap();
        assert_eq!(value.to_rust::<String>().unwrap(), "1,2,3");
        let value = context.eval_global("null").unwrap();
        assert_eq!(value.to_rust::<Box<str>>().unwrap().as_ref(), "null");
    }

    #[test]
    fn test_symbol_to_string_fails() {
        let (_rt, context) = context();
        let value = context.eval_global("Symbol('s')").unwrap();
        assert!(matches!(
            value.to_rust::<String>(),
            Err(BindingError::Conversion { .. })
        ));
    }

    #[test]
    fn test_char_to_js() {
        let (_rt, context) = context();
        let global = context.global().unwrap();
        global.set("letter", &'λ').unwrap();
        assert_eq!(
            context.eval_global("letter").unwrap().to_js_string().unwrap(),
            "λ"
        );
    }
}
