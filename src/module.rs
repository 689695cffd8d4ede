// ============================================================================
// 原生模块
// 在上下文中声明一个可被 `import` 的 ES 模块，收集函数和类导出
// ============================================================================

use std::ffi::{c_int, CString};

use crate::class::ClassBuilder;
use crate::context::Ctx;
use crate::core::{BindingError, BindingResult};
use crate::marshal::callback::{new_function, CallbackKind, NativeCallback};
use crate::marshal::NativeFunction;
use crate::raw::{self, qjs, RawValue};
use crate::value::Value;
use crate::{js_debug, js_warn};

/// 模块的导出记录，由上下文持有
///
/// 导出名在注册时声明给引擎；值在模块被链接（首次 `import`）时才写入。
pub(crate) struct ModuleRecord {
    name: String,
    def: *mut qjs::JSModuleDef,
    exports: Vec<(CString, RawValue)>,
    linked: bool,
}

impl ModuleRecord {
    /// 释放记录持有的导出值
    ///
    /// # Safety
    /// `ctx` 必须是创建该记录的上下文，且仍然存活。
    pub(crate) unsafe fn release(self, ctx: *mut qjs::JSContext) {
        for (_, value) in self.exports {
            raw::free(ctx, value);
        }
    }
}

/// 原生模块句柄
///
/// 轻量句柄，可自由复制；模块本身归所属上下文所有。
#[derive(Clone)]
pub struct Module {
    ctx: Ctx,
    index: usize,
}

impl Module {
    pub(crate) fn create(ctx: &Ctx, name: &str) -> BindingResult<Self> {
        if Self::find(ctx, name).is_some() {
            return Err(BindingError::Registration(format!(
                "module {name} already exists"
            )));
        }

        let c_name = raw::c_name(name)?;
        let def = unsafe { qjs::JS_NewCModule(ctx.as_ptr(), c_name.as_ptr(), Some(module_init)) };
        if def.is_null() {
            return Err(ctx.catch_exception());
        }

        let mut modules = ctx.inner.modules.borrow_mut();
        modules.push(ModuleRecord {
            name: name.to_string(),
            def,
            exports: Vec::new(),
            linked: false,
        });
        js_debug!("module {name} created");
        Ok(Self {
            ctx: ctx.clone(),
            index: modules.len() - 1,
        })
    }

    pub(crate) fn find(ctx: &Ctx, name: &str) -> Option<Self> {
        let index = ctx
            .inner
            .modules
            .borrow()
            .iter()
            .position(|record| record.name == name)?;
        Some(Self {
            ctx: ctx.clone(),
            index,
        })
    }

    pub(crate) fn ctx(&self) -> &Ctx {
        &self.ctx
    }

    /// 模块名（即 `import` 使用的说明符）
    pub fn name(&self) -> String {
        self.ctx.inner.modules.borrow()[self.index].name.clone()
    }

    /// 已声明的导出名，按注册顺序
    pub fn export_names(&self) -> Vec<String> {
        self.ctx.inner.modules.borrow()[self.index]
            .exports
            .iter()
            .map(|(name, _)| name.to_string_lossy().into_owned())
            .collect()
    }

    /// 导出任意值
    ///
    /// 导出名不可重复；模块被导入后不能再添加导出。
    pub fn add_export(&self, name: &str, value: Value) -> BindingResult<&Self> {
        let export_name = raw::c_name(name)?;
        let mut modules = self.ctx.inner.modules.borrow_mut();
        let record = &mut modules[self.index];

        if record.linked {
            return Err(BindingError::Registration(format!(
                "module {} is already linked; cannot add export {name}",
                record.name
            )));
        }
        if record.exports.iter().any(|(existing, _)| *existing == export_name) {
            return Err(BindingError::Registration(format!(
                "module {} already exports {name}",
                record.name
            )));
        }
        if value.ctx().is_some_and(|owner| owner.as_ptr() != self.ctx.as_ptr()) {
            return Err(BindingError::Registration(format!(
                "export {name} belongs to another context"
            )));
        }

        let status = unsafe {
            qjs::JS_AddModuleExport(self.ctx.as_ptr(), record.def, export_name.as_ptr())
        };
        if status < 0 {
            drop(modules);
            return Err(self.ctx.catch_exception());
        }

        let raw_value = if value.is_valid() {
            value.into_raw()
        } else {
            raw::undefined()
        };
        record.exports.push((export_name, raw_value));
        Ok(self)
    }

    /// 导出原生函数
    ///
    /// 参数和返回值的转换由函数签名决定；`Rest<T>` 参数接收剩余全部实参。
    pub fn function<F, Marker>(&self, name: &str, func: F) -> BindingResult<&Self>
    where
        F: NativeFunction<Marker>,
    {
        let callback: Box<NativeCallback> =
            Box::new(move |ctx: &Ctx, _this: RawValue, args: &[RawValue]| func.invoke(ctx, args));
        let value = new_function(&self.ctx, name, F::LENGTH, CallbackKind::Function, callback)?;
        self.add_export(name, value)
    }

    /// 开始绑定原生类型 `T`
    pub fn add_class<T: 'static>(&self, name: &str) -> BindingResult<ClassBuilder<'_, T>> {
        ClassBuilder::new(self, name)
    }
}

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name())
            .field("exports", &self.export_names())
            .finish()
    }
}

/// Writes every collected export into the module record when the engine links it.
unsafe extern "C" fn module_init(ctx: *mut qjs::JSContext, def: *mut qjs::JSModuleDef) -> c_int {
    let Some(handle) = Ctx::from_raw(ctx) else {
        return -1;
    };
    let Ok(mut modules) = handle.inner.modules.try_borrow_mut() else {
        js_warn!("module table busy during link");
        return -1;
    };
    let Some(record) = modules.iter_mut().find(|record| record.def == def) else {
        return -1;
    };

    for (name, value) in &record.exports {
        if qjs::JS_SetModuleExport(ctx, def, name.as_ptr(), raw::dup(ctx, *value)) < 0 {
            return -1;
        }
    }
    record.linked = true;
    js_debug!("module {} linked with {} exports", record.name, record.exports.len());
    0
}
