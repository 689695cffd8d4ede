// ============================================================================
// 执行上下文
// 一个隔离的脚本执行环境，绑定到某个运行时；持有模块导出和异常状态
// ============================================================================

use std::cell::RefCell;
use std::ffi::{c_void, CString};
use std::ptr::{self, NonNull};
use std::rc::Rc;

use crate::config::EvalConfig;
use crate::convert::ToJs;
use crate::core::{BindingError, BindingResult, Thrown};
use crate::eval::EvalOptions;
use crate::module::{Module, ModuleRecord};
use crate::raw::{self, qjs, RawValue};
use crate::runtime::{Runtime, RuntimeInner};
use crate::value::Value;
use crate::{js_debug, js_error, js_trace};

/// Callback invoked with the exception object whenever `eval` fails.
pub type ExceptionCallback = Rc<dyn Fn(&Value)>;

pub(crate) struct ContextInner {
    raw: NonNull<qjs::JSContext>,
    pub(crate) modules: RefCell<Vec<ModuleRecord>>,
    last_exception: RefCell<Option<RawValue>>,
    on_exception: RefCell<Option<ExceptionCallback>>,
    // Dropped after the context is freed.
    _runtime: Rc<RuntimeInner>,
}

impl Drop for ContextInner {
    fn drop(&mut self) {
        let ctx = self.raw.as_ptr();
        unsafe {
            for record in self.modules.get_mut().drain(..) {
                record.release(ctx);
            }
            if let Some(exception) = self.last_exception.get_mut().take() {
                raw::free(ctx, exception);
            }
            self.on_exception.get_mut().take();
            qjs::JS_SetContextOpaque(ctx, ptr::null_mut());
            qjs::JS_FreeContext(ctx);
        }
        js_trace!("context {:p} freed", self.raw);
    }
}

/// Shared handle to a live context.
///
/// Every [`Value`] holds one, so a context is only freed once the last value
/// created in it is gone.
#[derive(Clone)]
pub struct Ctx {
    pub(crate) inner: Rc<ContextInner>,
}

impl Ctx {
    fn new(runtime: &Runtime) -> BindingResult<Self> {
        let raw = NonNull::new(unsafe { qjs::JS_NewContext(runtime.as_ptr()) })
            .ok_or_else(|| BindingError::Lifecycle("failed to allocate context".to_string()))?;
        let inner = Rc::new(ContextInner {
            raw,
            modules: RefCell::new(Vec::new()),
            last_exception: RefCell::new(None),
            on_exception: RefCell::new(None),
            _runtime: Rc::clone(&runtime.inner),
        });
        unsafe {
            qjs::JS_SetContextOpaque(raw.as_ptr(), Rc::as_ptr(&inner) as *mut c_void);
        }
        Ok(Self { inner })
    }

    /// Recovers the handle for a context created by this crate.
    pub(crate) fn from_raw(ctx: *mut qjs::JSContext) -> Option<Self> {
        if ctx.is_null() {
            return None;
        }
        let ptr = unsafe { qjs::JS_GetContextOpaque(ctx) } as *const ContextInner;
        if ptr.is_null() {
            return None;
        }
        unsafe {
            Rc::increment_strong_count(ptr);
            Some(Self {
                inner: Rc::from_raw(ptr),
            })
        }
    }

    pub fn as_ptr(&self) -> *mut qjs::JSContext {
        self.inner.raw.as_ptr()
    }

    /// Takes the pending engine exception and turns it into an error.
    ///
    /// The exception object stays available through
    /// [`Context::get_exception`] until the next one replaces it.
    pub(crate) fn catch_exception(&self) -> BindingError {
        let ctx = self.as_ptr();
        let exception = unsafe { qjs::JS_GetException(ctx) };
        let message = unsafe { raw::to_rust_string(ctx, exception) }.unwrap_or_else(|| {
            unsafe { raw::free(ctx, qjs::JS_GetException(ctx)) };
            "unknown exception".to_string()
        });
        let stack = unsafe { raw::string_property(ctx, exception, c"stack") };

        let stashed = unsafe { raw::dup(ctx, exception) };
        if let Some(previous) = self.inner.last_exception.replace(Some(stashed)) {
            unsafe { raw::free(ctx, previous) };
        }
        BindingError::Exception {
            message,
            stack,
            thrown: Thrown::new(unsafe { Value::from_owned(self.clone(), exception) }),
        }
    }

    fn report_exception(&self) {
        let Some(exception) = self.stashed_exception() else {
            return;
        };
        let callback = self.inner.on_exception.borrow().clone();
        match callback {
            Some(callback) => callback(&exception),
            None => log_exception(&exception),
        }
    }

    fn stashed_exception(&self) -> Option<Value> {
        let stashed = *self.inner.last_exception.borrow();
        stashed.map(|raw| unsafe { Value::from_borrowed(self.clone(), raw) })
    }

    pub(crate) fn check(&self, value: RawValue) -> BindingResult<Value> {
        if raw::is_exception(value) {
            Err(self.catch_exception())
        } else {
            Ok(unsafe { Value::from_owned(self.clone(), value) })
        }
    }

    pub fn global(&self) -> Value {
        unsafe { Value::from_owned(self.clone(), qjs::JS_GetGlobalObject(self.as_ptr())) }
    }

    pub fn eval(&self, code: &str, filename: &str, options: EvalOptions) -> BindingResult<Value> {
        let source = CString::new(code)?;
        let file = raw::c_name(filename)?;
        let result = unsafe {
            qjs::JS_Eval(
                self.as_ptr(),
                source.as_ptr(),
                code.len() as _,
                file.as_ptr(),
                options.bits() as _,
            )
        };
        if !raw::is_exception(result) {
            return Ok(unsafe { Value::from_owned(self.clone(), result) });
        }

        let (message, stack) = match self.catch_exception() {
            BindingError::Exception { message, stack, .. } => (message, stack),
            other => (other.to_string(), None),
        };
        self.report_exception();
        Err(BindingError::Evaluation {
            filename: filename.to_string(),
            message,
            stack,
        })
    }

    pub fn parse_json(&self, text: &str) -> BindingResult<Value> {
        let source = CString::new(text)?;
        let result = unsafe {
            qjs::JS_ParseJSON(
                self.as_ptr(),
                source.as_ptr(),
                text.len() as _,
                c"<json>".as_ptr(),
            )
        };
        self.check(result)
    }

    fn define_global(&self, name: &str, value: RawValue, constant: bool) -> BindingResult<()> {
        let ctx = self.as_ptr();
        let name = match raw::c_name(name) {
            Ok(name) => name,
            Err(err) => {
                unsafe { raw::free(ctx, value) };
                return Err(err);
            }
        };
        let global = unsafe { qjs::JS_GetGlobalObject(ctx) };
        let status = unsafe {
            if constant {
                qjs::JS_DefinePropertyValueStr(
                    ctx,
                    global,
                    name.as_ptr(),
                    value,
                    raw::PROP_CONFIGURABLE | raw::PROP_WRITABLE,
                )
            } else {
                qjs::JS_SetPropertyStr(ctx, global, name.as_ptr(), value)
            }
        };
        unsafe { raw::free(ctx, global) };
        if status < 0 {
            return Err(self.catch_exception());
        }
        Ok(())
    }
}

fn log_exception(exception: &Value) {
    let message = exception
        .to_js_string()
        .unwrap_or_else(|_| "unknown exception".to_string());
    js_error!("[JS Exception]: {message}");
    if let Some(stack) = exception.get("stack").to_js_string().ok().filter(|s| !s.is_empty()) {
        js_error!("{stack}");
    }
}

/// 脚本执行上下文
///
/// 只能移动，不可复制。`Context::invalid()`（即 `Default`）创建一个
/// 无效上下文，只有在被一个有效上下文替换后才能使用。
#[derive(Default)]
pub struct Context {
    ctx: Option<Ctx>,
    eval_config: EvalConfig,
}

impl Context {
    /// 在运行时上创建新的上下文
    pub fn new(runtime: &Runtime) -> BindingResult<Self> {
        let ctx = Ctx::new(runtime)?;
        js_debug!("context created {:p}", ctx.as_ptr());
        Ok(Self {
            ctx: Some(ctx),
            eval_config: EvalConfig::default(),
        })
    }

    /// 创建上下文并使用给定的求值配置
    pub fn with_eval_config(runtime: &Runtime, eval_config: EvalConfig) -> BindingResult<Self> {
        let mut context = Self::new(runtime)?;
        context.eval_config = eval_config;
        Ok(context)
    }

    /// 创建无效上下文
    pub fn invalid() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.ctx.is_some()
    }

    /// 获取共享句柄
    pub fn ctx(&self) -> BindingResult<&Ctx> {
        self.ctx.as_ref().ok_or_else(BindingError::invalid_context)
    }

    pub fn as_ptr(&self) -> *mut qjs::JSContext {
        self.ctx
            .as_ref()
            .map_or(ptr::null_mut(), |ctx| ctx.as_ptr())
    }

    /// 执行脚本源码
    ///
    /// 失败时先调用异常回调，再返回携带消息和堆栈的 `Evaluation` 错误；
    /// 异常对象可通过 [`get_exception`](Self::get_exception) 获取。
    pub fn eval(&self, code: &str, filename: &str, options: EvalOptions) -> BindingResult<Value> {
        self.ctx()?.eval(code, filename, options)
    }

    /// 以默认文件名和选项执行全局脚本
    pub fn eval_global(&self, code: &str) -> BindingResult<Value> {
        self.eval(
            code,
            &self.eval_config.default_filename,
            self.eval_config.options(),
        )
    }

    pub fn global(&self) -> BindingResult<Value> {
        Ok(self.ctx()?.global())
    }

    /// 获取最近一次异常对象
    ///
    /// 没有记录的异常时取出引擎当前挂起的异常（可能为 `null`）。
    pub fn get_exception(&self) -> BindingResult<Value> {
        let ctx = self.ctx()?;
        if let Some(exception) = ctx.stashed_exception() {
            return Ok(exception);
        }
        Ok(unsafe { Value::from_owned(ctx.clone(), qjs::JS_GetException(ctx.as_ptr())) })
    }

    /// 注入全局变量
    pub fn add_variable<T: ToJs + ?Sized>(&self, name: &str, value: &T) -> BindingResult<&Self> {
        let ctx = self.ctx()?;
        let raw = value.to_js(ctx)?;
        ctx.define_global(name, raw, false)?;
        Ok(self)
    }

    /// 注入全局常量（不可枚举；属性层面仍可重新赋值）
    pub fn add_constant<T: ToJs + ?Sized>(&self, name: &str, value: &T) -> BindingResult<&Self> {
        let ctx = self.ctx()?;
        let raw = value.to_js(ctx)?;
        ctx.define_global(name, raw, true)?;
        Ok(self)
    }

    /// 创建原生模块
    pub fn add_module(&self, name: &str) -> BindingResult<Module> {
        Module::create(self.ctx()?, name)
    }

    /// 按名称查找已创建的模块
    pub fn module(&self, name: &str) -> Option<Module> {
        Module::find(self.ctx.as_ref()?, name)
    }

    pub fn parse_json(&self, text: &str) -> BindingResult<Value> {
        self.ctx()?.parse_json(text)
    }

    /// 设置异常回调，替换默认的日志输出
    pub fn set_exception_callback<F>(&self, callback: F) -> BindingResult<()>
    where
        F: Fn(&Value) + 'static,
    {
        *self.ctx()?.inner.on_exception.borrow_mut() = Some(Rc::new(callback));
        Ok(())
    }

    /// 恢复默认异常处理
    pub fn reset_exception_callback(&self) -> BindingResult<()> {
        self.ctx()?.inner.on_exception.borrow_mut().take();
        Ok(())
    }
}
