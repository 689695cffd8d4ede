//! Process-wide class identifiers, one per native type.
//!
//! The engine hands out class ids globally, while class definitions
//! (name + finalizer) are installed per runtime. Ids are allocated lazily on
//! first use and never change afterwards.

use std::any::TypeId;
use std::collections::HashMap;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use super::instance::finalize_instance;
use crate::core::{BindingError, BindingResult};
use crate::raw::{self, qjs};

static CLASS_IDS: Lazy<RwLock<HashMap<TypeId, qjs::JSClassID>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Returns the engine class id for `T`, allocating it on first use.
pub fn class_id_of<T: 'static>() -> qjs::JSClassID {
    let key = TypeId::of::<T>();
    if let Some(id) = CLASS_IDS.read().get(&key) {
        return *id;
    }

    let mut ids = CLASS_IDS.write();
    *ids.entry(key).or_insert_with(|| {
        let mut id: qjs::JSClassID = 0;
        unsafe { qjs::JS_NewClassID(&mut id) };
        id
    })
}

/// Installs the class definition for `T` on `rt` if it is not there yet.
///
/// Objects of this class own a boxed `InstanceCell<T>` as their opaque
/// payload, which the finalizer drops.
pub(crate) fn register_class<T: 'static>(
    rt: *mut qjs::JSRuntime,
    name: &str,
) -> BindingResult<qjs::JSClassID> {
    let id = class_id_of::<T>();
    if unsafe { qjs::JS_IsRegisteredClass(rt, id) } != 0 {
        return Ok(id);
    }

    // The engine keeps the name pointer only long enough to create an atom.
    let class_name = raw::c_name(name)?;
    let def = qjs::JSClassDef {
        class_name: class_name.as_ptr(),
        finalizer: Some(finalize_instance::<T>),
        gc_mark: None,
        call: None,
        exotic: std::ptr::null_mut(),
    };
    if unsafe { qjs::JS_NewClass(rt, id, &def) } != 0 {
        return Err(BindingError::Registration(format!(
            "engine rejected class {name}"
        )));
    }
    crate::js_debug!("registered class {name} with id {id}");
    Ok(id)
}
