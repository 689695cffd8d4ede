//! Reference-counted handle to an engine value.
//!
//! Cloning duplicates the engine reference, dropping releases it, moving
//! transfers it. An empty handle (no context) stands in for failed lookups.

use std::cell::{Ref, RefMut};
use std::fmt;

use crate::class::InstanceCell;
use crate::context::Ctx;
use crate::convert::{FromJs, ToJs};
use crate::core::{BindingError, BindingResult};
use crate::function::{IntoJsArgs, JsFunction};
use crate::raw::{self, qjs, RawValue};
use crate::js_warn;

pub struct Value {
    ctx: Option<Ctx>,
    raw: RawValue,
}

impl Value {
    /// A handle that references nothing.
    pub fn empty() -> Self {
        Self {
            ctx: None,
            raw: raw::undefined(),
        }
    }

    /// Adopts an owned engine reference.
    ///
    /// # Safety
    /// `raw` must be an owned reference belonging to `ctx`.
    pub unsafe fn from_owned(ctx: Ctx, raw: RawValue) -> Self {
        Self {
            ctx: Some(ctx),
            raw,
        }
    }

    /// Duplicates a borrowed engine reference.
    ///
    /// # Safety
    /// `raw` must be a valid reference belonging to `ctx`.
    pub unsafe fn from_borrowed(ctx: Ctx, raw: RawValue) -> Self {
        let raw = raw::dup(ctx.as_ptr(), raw);
        Self::from_owned(ctx, raw)
    }

    /// Releases ownership of the engine reference to the caller.
    ///
    /// The context handle is dropped here; only the engine reference moves.
    pub fn into_raw(mut self) -> RawValue {
        self.ctx = None;
        self.raw
    }

    /// Borrowed view of the engine reference.
    pub fn as_raw(&self) -> RawValue {
        self.raw
    }

    pub fn ctx(&self) -> Option<&Ctx> {
        self.ctx.as_ref()
    }

    fn require_ctx(&self) -> BindingResult<&Ctx> {
        self.ctx.as_ref().ok_or_else(|| {
            BindingError::Lifecycle("value is empty".to_string())
        })
    }

    pub fn swap(&mut self, other: &mut Value) {
        std::mem::swap(self, other);
    }

    pub fn is_valid(&self) -> bool {
        self.ctx.is_some()
    }

    /// Valid, and neither `null` nor `undefined`.
    pub fn is_present(&self) -> bool {
        self.is_valid() && !raw::is_nullish(self.raw)
    }

    pub fn is_undefined(&self) -> bool {
        raw::tag(self.raw) == raw::TAG_UNDEFINED
    }

    pub fn is_null(&self) -> bool {
        raw::tag(self.raw) == raw::TAG_NULL
    }

    pub fn is_number(&self) -> bool {
        raw::is_number(self.raw)
    }

    pub fn is_string(&self) -> bool {
        raw::tag(self.raw) == raw::TAG_STRING
    }

    pub fn is_object(&self) -> bool {
        raw::is_object(self.raw)
    }

    pub fn is_function(&self) -> bool {
        self.ctx
            .as_ref()
            .is_some_and(|ctx| unsafe { qjs::JS_IsFunction(ctx.as_ptr(), self.raw) } != 0)
    }

    pub fn is_array(&self) -> bool {
        self.ctx
            .as_ref()
            .is_some_and(|ctx| unsafe { qjs::JS_IsArray(ctx.as_ptr(), self.raw) } > 0)
    }

    pub fn is_error(&self) -> bool {
        self.ctx
            .as_ref()
            .is_some_and(|ctx| unsafe { qjs::JS_IsError(ctx.as_ptr(), self.raw) } != 0)
    }

    /// Looks up a named property; failures degrade to an empty handle.
    pub fn get(&self, name: &str) -> Value {
        let Some(ctx) = self.ctx.as_ref() else {
            js_warn!("Failed to get property {name}: value is empty");
            return Value::empty();
        };
        let Ok(prop) = raw::c_name(name) else {
            js_warn!("Failed to get property {name:?}: invalid name");
            return Value::empty();
        };
        let result = unsafe { qjs::JS_GetPropertyStr(ctx.as_ptr(), self.raw, prop.as_ptr()) };
        match ctx.check(result) {
            Ok(value) => value,
            Err(err) => {
                js_warn!("Failed to get property {name}: {err}");
                Value::empty()
            }
        }
    }

    /// Reads an array element; non-arrays degrade to an empty handle.
    pub fn index(&self, index: u32) -> Value {
        if !self.is_array() {
            js_warn!("Attempted to index non-array value at {index}");
            return Value::empty();
        }
        let Some(ctx) = self.ctx.as_ref() else {
            return Value::empty();
        };
        let result = unsafe { qjs::JS_GetPropertyUint32(ctx.as_ptr(), self.raw, index) };
        match ctx.check(result) {
            Ok(value) => value,
            Err(err) => {
                js_warn!("Failed to read index {index}: {err}");
                Value::empty()
            }
        }
    }

    pub fn set<T: ToJs + ?Sized>(&self, name: &str, value: &T) -> BindingResult<()> {
        let ctx = self.require_ctx()?;
        let prop = raw::c_name(name)?;
        let raw_value = value.to_js(ctx)?;
        let status =
            unsafe { qjs::JS_SetPropertyStr(ctx.as_ptr(), self.raw, prop.as_ptr(), raw_value) };
        if status < 0 {
            return Err(ctx.catch_exception());
        }
        Ok(())
    }

    /// Converts with the strict native-argument rules.
    pub fn to_rust<T: FromJs>(&self) -> BindingResult<T> {
        T::from_js(self.require_ctx()?, self.raw)
    }

    pub fn to_i32(&self) -> BindingResult<i32> {
        let ctx = self.require_ctx()?;
        let mut out = 0;
        if unsafe { qjs::JS_ToInt32(ctx.as_ptr(), &mut out, self.raw) } < 0 {
            return Err(ctx.catch_exception());
        }
        Ok(out)
    }

    pub fn to_i64(&self) -> BindingResult<i64> {
        let ctx = self.require_ctx()?;
        let mut out = 0;
        if unsafe { qjs::JS_ToInt64(ctx.as_ptr(), &mut out, self.raw) } < 0 {
            return Err(ctx.catch_exception());
        }
        Ok(out)
    }

    pub fn to_f64(&self) -> BindingResult<f64> {
        let ctx = self.require_ctx()?;
        let mut out = 0.0;
        if unsafe { qjs::JS_ToFloat64(ctx.as_ptr(), &mut out, self.raw) } < 0 {
            return Err(ctx.catch_exception());
        }
        Ok(out)
    }

    /// Truthiness as the engine defines it; empty handles are false.
    pub fn to_bool(&self) -> bool {
        match self.ctx.as_ref() {
            Some(ctx) => unsafe { qjs::JS_ToBool(ctx.as_ptr(), self.raw) > 0 },
            None => false,
        }
    }

    /// String coercion (`String(value)`).
    pub fn to_js_string(&self) -> BindingResult<String> {
        let ctx = self.require_ctx()?;
        unsafe { raw::to_rust_string(ctx.as_ptr(), self.raw) }.ok_or_else(|| ctx.catch_exception())
    }

    /// `JSON.stringify(value)`; `None` when the value has no JSON form.
    pub fn to_json(&self) -> BindingResult<Option<String>> {
        let ctx = self.require_ctx()?;
        let text = unsafe {
            qjs::JS_JSONStringify(ctx.as_ptr(), self.raw, raw::undefined(), raw::undefined())
        };
        let text = ctx.check(text)?;
        if text.is_undefined() {
            return Ok(None);
        }
        text.to_js_string().map(Some)
    }

    pub fn call(&self, args: &[Value]) -> BindingResult<Value> {
        self.call_raw(raw::undefined(), args)
    }

    pub fn call_with_this(&self, this: &Value, args: &[Value]) -> BindingResult<Value> {
        self.call_raw(this.raw, args)
    }

    fn call_raw(&self, this: RawValue, args: &[Value]) -> BindingResult<Value> {
        let ctx = self.require_ctx()?;
        let mut argv: Vec<RawValue> = args.iter().map(Value::as_raw).collect();
        let result = unsafe {
            qjs::JS_Call(
                ctx.as_ptr(),
                self.raw,
                this,
                argv.len() as _,
                argv.as_mut_ptr(),
            )
        };
        ctx.check(result)
    }

    /// Wraps a callable value in a native callable with a fixed signature.
    pub fn into_function<Args: IntoJsArgs, R: FromJs>(self) -> BindingResult<JsFunction<Args, R>> {
        if !self.is_function() {
            return Err(BindingError::conversion("function", "value is not callable"));
        }
        Ok(JsFunction::new(self))
    }

    /// Borrows the native instance behind an object of a bound class.
    pub fn with_instance<T: 'static, R>(&self, f: impl FnOnce(&T) -> R) -> BindingResult<R> {
        let cell = unsafe { InstanceCell::<T>::receiver(self.raw) }?;
        let guard: Ref<'_, T> = cell.borrow()?;
        Ok(f(&guard))
    }

    /// Mutably borrows the native instance behind an object of a bound class.
    pub fn with_instance_mut<T: 'static, R>(
        &self,
        f: impl FnOnce(&mut T) -> R,
    ) -> BindingResult<R> {
        let cell = unsafe { InstanceCell::<T>::receiver(self.raw) }?;
        let mut guard: RefMut<'_, T> = cell.borrow_mut()?;
        Ok(f(&mut guard))
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::empty()
    }
}

impl Clone for Value {
    fn clone(&self) -> Self {
        match &self.ctx {
            Some(ctx) => unsafe { Self::from_borrowed(ctx.clone(), self.raw) },
            None => Self::empty(),
        }
    }
}

impl Drop for Value {
    fn drop(&mut self) {
        if let Some(ctx) = &self.ctx {
            unsafe { raw::free(ctx.as_ptr(), self.raw) };
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            return f.write_str("Value(<empty>)");
        }
        match self.to_js_string() {
            Ok(text) => write!(f, "Value({text})"),
            Err(_) => write!(f, "Value(<tag {}>)", raw::tag(self.raw)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Context, Runtime};

    fn setup() -> (Runtime, Context) {
        let runtime = Runtime::new().unwrap();
        let context = Context::new(&runtime).unwrap();
        (runtime, context)
    }

    #[test]
    fn test_property_access() {
        let (_rt, context) = setup();
        let obj = context.eval_global("({ a: 1, b: 'two' })").unwrap();
        assert_eq!(obj.get("a").to_i32().unwrap(), 1);
        assert_eq!(obj.get("b").to_js_string().unwrap(), "two");
        assert!(obj.get("missing").is_undefined());
        assert!(!obj.get("missing").is_present());
    }

    #[test]
    fn test_index_on_non_array_is_empty() {
        let (_rt, context) = setup();
        let obj = context.eval_global("({ 0: 'x' })").unwrap();
        let item = obj.index(0);
        assert!(!item.is_valid());

        let arr = context.eval_global("[10, 20, 30]").unwrap();
        assert_eq!(arr.index(2).to_i32().unwrap(), 30);
        assert!(arr.index(7).is_undefined());
    }

    #[test]
    fn test_property_on_undefined_is_empty() {
        let (_rt, context) = setup();
        let nothing = context.eval_global("undefined").unwrap();
        assert!(!nothing.get("x").is_valid());
        // The failed lookup must not leave an exception behind.
        assert_eq!(context.eval_global("1").unwrap().to_i32().unwrap(), 1);
    }

    #[test]
    fn test_clone_and_move() {
        let (_rt, context) = setup();
        let a = context.eval_global("({ n: 5 })").unwrap();
        let b = a.clone();
        drop(a);
        assert_eq!(b.get("n").to_i32().unwrap(), 5);

        let mut c = Value::empty();
        let mut d = b;
        c.swap(&mut d);
        assert!(c.is_object());
        assert!(!d.is_valid());
    }

    #[test]
    fn test_coercions() {
        let (_rt, context) = setup();
        assert_eq!(context.eval_global("'12'").unwrap().to_i32().unwrap(), 12);
        assert!(context.eval_global("'x'").unwrap().to_f64().unwrap().is_nan());
        assert!(!context.eval_global("0").unwrap().to_bool());
        assert_eq!(context.eval_global("[1,2]").unwrap().to_js_string().unwrap(), "1,2");
        assert!(!Value::empty().to_bool());
    }

    #[test]
    fn test_call_and_call_with_this() {
        let (_rt, context) = setup();
        let func = context.eval_global("(function (x) { return this.base + x; })").unwrap();
        let this = context.eval_global("({ base: 40 })").unwrap();
        let arg = context.eval_global("2").unwrap();
        let result = func.call_with_this(&this, &[arg]).unwrap();
        assert_eq!(result.to_i32().unwrap(), 42);

        let thrower = context.eval_global("(function () { throw new Error('bad'); })").unwrap();
        let err = thrower.call(&[]).unwrap_err();
        assert!(matches!(err, BindingError::Exception { .. }));
    }

    #[test]
    fn test_json_round_trip() {
        let (_rt, context) = setup();
        let value = context.parse_json(r#"{"k":[1,2,3]}"#).unwrap();
        assert!(value.get("k").is_array());
        assert_eq!(value.to_json().unwrap().unwrap(), r#"{"k":[1,2,3]}"#);
        assert_eq!(
            context.eval_global("undefined").unwrap().to_json().unwrap(),
            None
        );
    }

    #[test]
    fn test_set_property() {
        let (_rt, context) = setup();
        let global = context.global().unwrap();
        global.set("fromNative", "hi").unwrap();
        assert_eq!(
            context.eval_global("fromNative + '!'").unwrap().to_js_string().unwrap(),
            "hi!"
        );
    }
}
