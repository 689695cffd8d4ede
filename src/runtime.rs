// ============================================================================
// 运行时
// 持有引擎进程级资源（堆、GC、类表）；所有上下文共享同一运行时
// ============================================================================

use std::ptr::{self, NonNull};
use std::rc::Rc;

use crate::class::registry;
use crate::config::RuntimeConfig;
use crate::core::{BindingError, BindingResult};
use crate::marshal::callback::CallbackSlot;
use crate::raw::qjs;
use crate::{js_debug, js_trace};

pub(crate) struct RuntimeInner {
    raw: NonNull<qjs::JSRuntime>,
}

impl RuntimeInner {
    pub(crate) fn as_ptr(&self) -> *mut qjs::JSRuntime {
        self.raw.as_ptr()
    }
}

impl Drop for RuntimeInner {
    fn drop(&mut self) {
        js_trace!("freeing runtime {:p}", self.raw);
        unsafe { qjs::JS_FreeRuntime(self.raw.as_ptr()) };
    }
}

/// 引擎运行时
///
/// 只能移动，不可复制。由它创建的 [`Context`](crate::Context) 共享其所有权，
/// 因此运行时总是在最后一个上下文之后才真正释放。
pub struct Runtime {
    pub(crate) inner: Rc<RuntimeInner>,
}

impl Runtime {
    /// 使用引擎默认参数创建运行时
    pub fn new() -> BindingResult<Self> {
        Self::with_config(&RuntimeConfig::default())
    }

    /// 按配置创建运行时
    pub fn with_config(config: &RuntimeConfig) -> BindingResult<Self> {
        let raw = NonNull::new(unsafe { qjs::JS_NewRuntime() })
            .ok_or_else(|| BindingError::Lifecycle("failed to allocate runtime".to_string()))?;
        let runtime = Self {
            inner: Rc::new(RuntimeInner { raw }),
        };

        if let Some(limit) = config.memory_limit {
            runtime.set_memory_limit(limit);
        }
        if let Some(threshold) = config.gc_threshold {
            runtime.set_gc_threshold(threshold);
        }
        if let Some(stack) = config.max_stack_size {
            runtime.set_max_stack_size(stack);
        }

        registry::register_class::<CallbackSlot>(runtime.as_ptr(), "NativeCallback")?;
        js_debug!("runtime created {:p}", raw);
        Ok(runtime)
    }

    pub fn is_valid(&self) -> bool {
        !self.as_ptr().is_null()
    }

    pub fn as_ptr(&self) -> *mut qjs::JSRuntime {
        self.inner.as_ptr()
    }

    /// 强制执行一次完整的垃圾回收
    pub fn run_gc(&self) {
        unsafe { qjs::JS_RunGC(self.as_ptr()) };
    }

    pub fn set_memory_limit(&self, limit: usize) {
        unsafe { qjs::JS_SetMemoryLimit(self.as_ptr(), limit as _) };
    }

    pub fn set_gc_threshold(&self, threshold: usize) {
        unsafe { qjs::JS_SetGCThreshold(self.as_ptr(), threshold as _) };
    }

    pub fn set_max_stack_size(&self, size: usize) {
        unsafe { qjs::JS_SetMaxStackSize(self.as_ptr(), size as _) };
    }

    pub fn is_job_pending(&self) -> bool {
        unsafe { qjs::JS_IsJobPending(self.as_ptr()) != 0 }
    }

    /// 执行所有待处理的任务（Promise 回调等），返回执行的数量
    ///
    /// 遇到第一个失败的任务即停止，并返回该任务抛出的异常。
    pub fn execute_pending_jobs(&self) -> BindingResult<usize> {
        let mut executed = 0;
        loop {
            let mut job_ctx: *mut qjs::JSContext = ptr::null_mut();
            let status = unsafe { qjs::JS_ExecutePendingJob(self.as_ptr(), &mut job_ctx) };
            if status == 0 {
                return Ok(executed);
            }
            if status < 0 {
                return Err(match crate::context::Ctx::from_raw(job_ctx) {
                    Some(ctx) => ctx.catch_exception(),
                    None => BindingError::Lifecycle("pending job failed".to_string()),
                });
            }
            executed += 1;
        }
    }
}
