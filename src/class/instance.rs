//! Native instances owned by engine objects.

use std::cell::{Ref, RefCell, RefMut};
use std::ffi::c_void;
use std::panic::{self, AssertUnwindSafe};

use super::registry::class_id_of;
use crate::core::{BindingError, BindingResult};
use crate::raw::{qjs, RawValue};

/// The opaque payload attached to every engine object of a bound class.
///
/// Boxed once at construction and released once, by the engine finalizer.
pub struct InstanceCell<T> {
    value: RefCell<T>,
}

impl<T: 'static> InstanceCell<T> {
    pub(crate) fn new(value: T) -> Box<Self> {
        Box::new(Self {
            value: RefCell::new(value),
        })
    }

    pub fn borrow(&self) -> BindingResult<Ref<'_, T>> {
        self.value
            .try_borrow()
            .map_err(|_| BindingError::Receiver("instance is mutably borrowed".to_string()))
    }

    pub fn borrow_mut(&self) -> BindingResult<RefMut<'_, T>> {
        self.value
            .try_borrow_mut()
            .map_err(|_| BindingError::Receiver("instance is already borrowed".to_string()))
    }

    /// Hands ownership of the cell to `object`.
    ///
    /// # Safety
    /// `object` must be a freshly created object of `T`'s class with no payload.
    pub(crate) unsafe fn attach(self: Box<Self>, object: RawValue) {
        qjs::JS_SetOpaque(object, Box::into_raw(self) as *mut c_void);
    }

    /// Looks up the live cell behind a borrowed receiver.
    ///
    /// # Safety
    /// The returned reference must not outlive the engine object.
    pub(crate) unsafe fn from_value<'a>(value: RawValue) -> Option<&'a Self> {
        let ptr = qjs::JS_GetOpaque(value, class_id_of::<T>()) as *const Self;
        ptr.as_ref()
    }

    /// Like [`from_value`](Self::from_value) but reports a receiver error.
    ///
    /// # Safety
    /// Same as `from_value`.
    pub(crate) unsafe fn receiver<'a>(value: RawValue) -> BindingResult<&'a Self> {
        Self::from_value(value).ok_or_else(|| {
            BindingError::Receiver(format!(
                "receiver is not a live {}",
                std::any::type_name::<T>()
            ))
        })
    }
}

pub(crate) unsafe extern "C" fn finalize_instance<T: 'static>(
    _rt: *mut qjs::JSRuntime,
    value: RawValue,
) {
    let ptr = qjs::JS_GetOpaque(value, class_id_of::<T>()) as *mut InstanceCell<T>;
    if ptr.is_null() {
        return;
    }
    qjs::JS_SetOpaque(value, std::ptr::null_mut());

    let cell = Box::from_raw(ptr);
    if panic::catch_unwind(AssertUnwindSafe(move || drop(cell))).is_err() {
        crate::js_error!(
            "destructor of {} panicked during finalization",
            std::any::type_name::<T>()
        );
    }
}
