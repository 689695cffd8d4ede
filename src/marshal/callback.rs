//! The single C entry point every native function goes through.
//!
//! Each bound function is an engine closure whose data slot holds a
//! [`CallbackSlot`] object. The slot owns the type-erased Rust adapter and is
//! dropped by the class finalizer together with the function.

use std::any::Any;
use std::ffi::c_int;
use std::panic::{self, AssertUnwindSafe};

use crate::class::{class_id_of, InstanceCell};
use crate::context::Ctx;
use crate::core::{BindingError, BindingResult};
use crate::raw::{self, qjs, RawValue};
use crate::value::Value;

/// A monomorphized adapter with its native callable baked in.
///
/// Receives the receiver (`this`, or `new.target` for constructors) and the
/// supplied arguments, all borrowed; returns an owned result.
pub(crate) type NativeCallback = dyn Fn(&Ctx, RawValue, &[RawValue]) -> BindingResult<RawValue>;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum CallbackKind {
    Function,
    Constructor,
    Accessor,
}

pub(crate) struct CallbackSlot {
    name: String,
    kind: CallbackKind,
    callback: Box<NativeCallback>,
}

unsafe extern "C" fn trampoline(
    ctx: *mut qjs::JSContext,
    this: RawValue,
    argc: c_int,
    argv: *mut RawValue,
    _magic: c_int,
    data: *mut RawValue,
) -> RawValue {
    let Some(handle) = Ctx::from_raw(ctx) else {
        return BindingError::Lifecycle("native call on a foreign context".to_string()).throw(ctx);
    };
    let Some(cell) = InstanceCell::<CallbackSlot>::from_value(*data) else {
        return BindingError::Lifecycle("native callback was released".to_string()).throw(ctx);
    };
    let slot = match cell.borrow() {
        Ok(slot) => slot,
        Err(err) => return err.throw(ctx),
    };
    let args: &[RawValue] = if argc <= 0 || argv.is_null() {
        &[]
    } else {
        std::slice::from_raw_parts(argv, argc as usize)
    };

    match panic::catch_unwind(AssertUnwindSafe(|| (slot.callback)(&handle, this, args))) {
        Ok(Ok(value)) => value,
        Ok(Err(err)) => err.throw(ctx),
        Err(payload) => {
            let reason = panic_message(payload.as_ref());
            let message = match slot.kind {
                CallbackKind::Constructor => format!("Constructor failed: {reason}"),
                _ => format!("native function {} panicked: {reason}", slot.name),
            };
            crate::js_error!("{message}");
            BindingError::Native(message).throw(ctx)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Creates an engine function object backed by `callback`.
///
/// `length` becomes the function's `length` property; the engine pads
/// `argv` with `undefined` up to it.
pub(crate) fn new_function(
    ctx: &Ctx,
    name: &str,
    length: usize,
    kind: CallbackKind,
    callback: Box<NativeCallback>,
) -> BindingResult<Value> {
    let holder = ctx.check(unsafe {
        qjs::JS_NewObjectClass(ctx.as_ptr(), class_id_of::<CallbackSlot>() as _)
    })?;
    let slot = CallbackSlot {
        name: name.to_string(),
        kind,
        callback,
    };
    unsafe { InstanceCell::new(slot).attach(holder.as_raw()) };

    let mut data = [holder.as_raw()];
    let func = ctx.check(unsafe {
        qjs::JS_NewCFunctionData(
            ctx.as_ptr(),
            Some(trampoline),
            length as c_int,
            0,
            1,
            data.as_mut_ptr(),
        )
    })?;

    if kind != CallbackKind::Accessor {
        let display_name = unsafe { raw::new_string(ctx.as_ptr(), name) };
        let status = unsafe {
            qjs::JS_DefinePropertyValueStr(
                ctx.as_ptr(),
                func.as_raw(),
                c"name".as_ptr(),
                display_name,
                raw::PROP_CONFIGURABLE,
            )
        };
        if status < 0 {
            return Err(ctx.catch_exception());
        }
    }
    if kind == CallbackKind::Constructor {
        unsafe { qjs::JS_SetConstructorBit(ctx.as_ptr(), func.as_raw(), 1) };
    }
    Ok(func)
}
