//! 诊断控制台
//!
//! 绑定层所有日志输出的唯一出口。每次输出都在同一把互斥锁下进行，
//! 多个调用点的消息不会交错。实际写出由 `tracing` 完成，
//! 订阅者由 [`init_logging`] 安装。

use std::fmt;

use parking_lot::{const_mutex, Mutex};
pub use tracing::Level;

use crate::config::{LogLevel, LoggingConfig};

/// 日志目标
pub const TARGET: &str = "quickjs_bridge";

static CONSOLE: Mutex<()> = const_mutex(());

/// 输出一条诊断消息
pub fn emit(level: Level, args: fmt::Arguments<'_>) {
    let _guard = CONSOLE.lock();
    if level == Level::TRACE {
        tracing::trace!(target: TARGET, "{}", args);
    } else if level == Level::DEBUG {
        tracing::debug!(target: TARGET, "{}", args);
    } else if level == Level::INFO {
        tracing::info!(target: TARGET, "{}", args);
    } else if level == Level::WARN {
        tracing::warn!(target: TARGET, "{}", args);
    } else {
        tracing::error!(target: TARGET, "{}", args);
    }
}

/// 初始化日志系统
///
/// 优先使用 `RUST_LOG` 环境变量，否则使用配置中的级别。
/// 重复调用是安全的：已安装的全局订阅者会被保留。
pub fn init_logging(config: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.level.as_filter()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.ansi)
        .with_target(config.show_target)
        .try_init();
}

impl LogLevel {
    pub(crate) fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
