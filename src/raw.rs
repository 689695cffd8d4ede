//! Thin helpers over the engine's C API.
//!
//! Everything here operates on raw `JSValue`s and follows the engine's own
//! ownership rules: functions documented as "borrowed" never free their
//! argument, functions returning a value hand back an owned reference.

use std::ffi::{c_int, CString};

pub use rquickjs::qjs;

use crate::convert::JsCString;

/// An engine value as it crosses the C boundary.
pub type RawValue = qjs::JSValue;

pub(crate) const TAG_INT: i32 = qjs::JS_TAG_INT as i32;
pub(crate) const TAG_BOOL: i32 = qjs::JS_TAG_BOOL as i32;
pub(crate) const TAG_NULL: i32 = qjs::JS_TAG_NULL as i32;
pub(crate) const TAG_UNDEFINED: i32 = qjs::JS_TAG_UNDEFINED as i32;
pub(crate) const TAG_FLOAT64: i32 = qjs::JS_TAG_FLOAT64 as i32;
pub(crate) const TAG_STRING: i32 = qjs::JS_TAG_STRING as i32;
pub(crate) const TAG_OBJECT: i32 = qjs::JS_TAG_OBJECT as i32;
pub(crate) const TAG_EXCEPTION: i32 = qjs::JS_TAG_EXCEPTION as i32;

pub(crate) const PROP_CONFIGURABLE: c_int = 1 << 0;
pub(crate) const PROP_WRITABLE: c_int = 1 << 1;
pub(crate) const PROP_ENUMERABLE: c_int = 1 << 2;

pub(crate) fn tag(value: RawValue) -> i32 {
    unsafe { qjs::JS_VALUE_GET_NORM_TAG(value) as i32 }
}

pub(crate) fn is_exception(value: RawValue) -> bool {
    tag(value) == TAG_EXCEPTION
}

pub(crate) fn is_nullish(value: RawValue) -> bool {
    matches!(tag(value), TAG_NULL | TAG_UNDEFINED)
}

pub(crate) fn is_object(value: RawValue) -> bool {
    tag(value) == TAG_OBJECT
}

pub(crate) fn is_number(value: RawValue) -> bool {
    matches!(tag(value), TAG_INT | TAG_FLOAT64)
}

pub(crate) fn undefined() -> RawValue {
    qjs::JS_UNDEFINED
}

pub(crate) fn null() -> RawValue {
    qjs::JS_NULL
}

/// # Safety
/// `ctx` must be a live context and `value` an owned reference.
pub(crate) unsafe fn free(ctx: *mut qjs::JSContext, value: RawValue) {
    qjs::JS_FreeValue(ctx, value);
}

/// # Safety
/// `ctx` must be a live context and `value` a valid reference.
pub(crate) unsafe fn dup(ctx: *mut qjs::JSContext, value: RawValue) -> RawValue {
    let _ = ctx;
    qjs::JS_DupValue(value)
}

/// Converts a Rust name to a C string, rejecting interior NULs.
pub(crate) fn c_name(name: &str) -> crate::BindingResult<CString> {
    CString::new(name).map_err(|_| {
        crate::BindingError::Registration(format!("name {name:?} contains a NUL byte"))
    })
}

/// Reads a borrowed value's string form with the engine's coercion.
///
/// Returns `None` if the coercion throws; the pending exception is left in place.
///
/// # Safety
/// `ctx` must be a live context.
pub(crate) unsafe fn to_rust_string(ctx: *mut qjs::JSContext, value: RawValue) -> Option<String> {
    JsCString::new(ctx, value).map(|text| text.to_string_lossy().into_owned())
}

/// Reads a named property of a borrowed object as a string, if present.
///
/// # Safety
/// `ctx` must be a live context.
pub(crate) unsafe fn string_property(
    ctx: *mut qjs::JSContext,
    object: RawValue,
    name: &std::ffi::CStr,
) -> Option<String> {
    if !is_object(object) {
        return None;
    }
    let prop = qjs::JS_GetPropertyStr(ctx, object, name.as_ptr());
    if is_exception(prop) {
        free(ctx, qjs::JS_GetException(ctx));
        return None;
    }
    let out = if is_nullish(prop) {
        None
    } else {
        to_rust_string(ctx, prop)
    };
    free(ctx, prop);
    out
}

/// Builds an engine string from UTF-8 bytes.
///
/// # Safety
/// `ctx` must be a live context.
pub(crate) unsafe fn new_string(ctx: *mut qjs::JSContext, text: &str) -> RawValue {
    qjs::JS_NewStringLen(ctx, text.as_ptr() as *const _, text.len() as _)
}
