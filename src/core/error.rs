//! 统一错误处理模块
//!
//! 绑定层的错误类型定义。
//!
//! ## 错误分类
//!
//! - **转换错误** (`Conversion`): 引擎值无法转换为请求的原生类型
//! - **参数个数错误** (`Arity`): 固定参数构造函数收到的参数过少
//! - **接收者错误** (`Receiver`): 方法/属性在不持有存活原生实例的对象上调用
//! - **原生错误** (`Native`): 用户原生代码在调用期间返回的错误或 panic
//! - **求值错误** (`Evaluation`): 脚本源码语法或运行时失败
//! - **生命周期错误** (`Lifecycle`): 运行时/上下文分配失败或使用无效上下文
//!
//! 适配器边界上的错误通过 [`BindingError::throw`] 转换为引擎异常，
//! 永远不会跨越 `extern "C"` 栈帧展开。

use std::ffi::CString;

use thiserror::Error;

use crate::raw::{qjs, RawValue};
use crate::value::Value;

/// The script value behind a [`BindingError::Exception`].
///
/// Equality only compares whether a value is present; the message and
/// stack beside it carry the comparable content.
#[derive(Clone, Debug, Default)]
pub struct Thrown(Option<Value>);

impl Thrown {
    pub(crate) fn new(value: Value) -> Self {
        Self(Some(value))
    }

    pub fn value(&self) -> Option<&Value> {
        self.0.as_ref()
    }

    /// Hands the value back to the engine if it belongs to `ctx`.
    fn take_for(&mut self, ctx: *mut qjs::JSContext) -> Option<RawValue> {
        let owner = self.0.as_ref()?.ctx()?.as_ptr();
        if owner != ctx {
            return None;
        }
        self.0.take().map(Value::into_raw)
    }
}

impl PartialEq for Thrown {
    fn eq(&self, other: &Self) -> bool {
        self.0.is_some() == other.0.is_some()
    }
}

/// 绑定层核心错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BindingError {
    #[error("Conversion error: expected {expected}, {detail}")]
    Conversion {
        expected: &'static str,
        detail: String,
    },

    #[error("Expected {expected} arguments but received {received}")]
    Arity { expected: usize, received: usize },

    #[error("Invalid native object: {0}")]
    Receiver(String),

    #[error("Class constructor {0} cannot be invoked without 'new'")]
    NotConstructor(String),

    #[error("Native error: {0}")]
    Native(String),

    #[error("Evaluation error in {filename}: {message}")]
    Evaluation {
        filename: String,
        message: String,
        stack: Option<String>,
    },

    /// 脚本抛出的异常在原生侧被观察到（调用、属性访问等）
    #[error("[JS Exception]: {message}")]
    Exception {
        message: String,
        stack: Option<String>,
        thrown: Thrown,
    },

    #[error("Lifecycle error: {0}")]
    Lifecycle(String),

    #[error("Registration error: {0}")]
    Registration(String),
}

pub type BindingResult<T> = Result<T, BindingError>;

impl BindingError {
    pub(crate) fn conversion(expected: &'static str, detail: impl Into<String>) -> Self {
        Self::Conversion {
            expected,
            detail: detail.into(),
        }
    }

    pub(crate) fn invalid_context() -> Self {
        Self::Lifecycle("context is not valid".to_string())
    }

    /// 是否应作为脚本 `TypeError` 抛出
    pub fn is_type_error(&self) -> bool {
        matches!(
            self,
            Self::Conversion { .. }
                | Self::Arity { .. }
                | Self::Receiver(_)
                | Self::NotConstructor(_)
        )
    }

    /// Raise this error inside the engine and return the exception sentinel.
    ///
    /// A script exception carried by this error is rethrown unchanged so
    /// scripts can still `catch` their own error objects.
    pub(crate) fn throw(mut self, ctx: *mut qjs::JSContext) -> qjs::JSValue {
        if let Self::Exception { thrown, .. } = &mut self {
            if let Some(exception) = thrown.take_for(ctx) {
                return unsafe { qjs::JS_Throw(ctx, exception) };
            }
        }

        let message = match &self {
            Self::Native(msg) => msg.clone(),
            other => other.to_string(),
        };
        let message = CString::new(message.replace('\0', " "))
            .unwrap_or_else(|_| CString::from(c"native error"));

        unsafe {
            if self.is_type_error() {
                qjs::JS_ThrowTypeError(ctx, c"%s".as_ptr(), message.as_ptr())
            } else {
                qjs::JS_ThrowInternalError(ctx, c"%s".as_ptr(), message.as_ptr())
            }
        }
    }
}

impl From<String> for BindingError {
    fn from(message: String) -> Self {
        Self::Native(message)
    }
}

impl From<&str> for BindingError {
    fn from(message: &str) -> Self {
        Self::Native(message.to_string())
    }
}

impl From<std::io::Error> for BindingError {
    fn from(err: std::io::Error) -> Self {
        Self::Native(format!("IO error: {err}"))
    }
}

impl From<std::ffi::NulError> for BindingError {
    fn from(err: std::ffi::NulError) -> Self {
        Self::conversion("string without interior NUL", err.to_string())
    }
}
