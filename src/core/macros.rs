//! 核心宏定义
//!
//! 提供统一的宏来减少代码重复

/// 为结构体实现Default trait的宏
///
/// 使用示例:
/// ```rust
/// use quickjs_bridge::impl_default;
///
/// struct Limits {
///     memory: usize,
///     label: String,
/// }
///
/// impl_default!(Limits {
///     memory: 0,
///     label: String::new(),
/// });
/// ```
#[macro_export]
macro_rules! impl_default {
    ($struct_name:ident {
        $($field:ident: $value:expr),* $(,)?
    }) => {
        impl Default for $struct_name {
            fn default() -> Self {
                Self {
                    $($field: $value),*
                }
            }
        }
    };
}

/// 通过诊断控制台输出 TRACE 级别日志
#[macro_export]
macro_rules! js_trace {
    ($($arg:tt)*) => {
        $crate::core::console::emit($crate::core::console::Level::TRACE, format_args!($($arg)*))
    };
}

/// 通过诊断控制台输出 DEBUG 级别日志
#[macro_export]
macro_rules! js_debug {
    ($($arg:tt)*) => {
        $crate::core::console::emit($crate::core::console::Level::DEBUG, format_args!($($arg)*))
    };
}

/// 通过诊断控制台输出 INFO 级别日志
#[macro_export]
macro_rules! js_info {
    ($($arg:tt)*) => {
        $crate::core::console::emit($crate::core::console::Level::INFO, format_args!($($arg)*))
    };
}

/// 通过诊断控制台输出 WARN 级别日志
#[macro_export]
macro_rules! js_warn {
    ($($arg:tt)*) => {
        $crate::core::console::emit($crate::core::console::Level::WARN, format_args!($($arg)*))
    };
}

/// 通过诊断控制台输出 ERROR 级别日志
#[macro_export]
macro_rules! js_error {
    ($($arg:tt)*) => {
        $crate::core::console::emit($crate::core::console::Level::ERROR, format_args!($($arg)*))
    };
}

/// Build a [`Field`](crate::Field) accessor pair for a public data member.
///
/// ```rust,ignore
/// builder.function("intMember", field!(TestClass, int_member))?;
/// ```
#[macro_export]
macro_rules! field {
    ($ty:ty, $member:ident) => {
        $crate::Field::<$ty, _>::new(
            |this: &$ty| &this.$member,
            |this: &mut $ty| &mut this.$member,
        )
    };
}
