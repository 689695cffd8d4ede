/// 统一配置系统
///
/// 提供TOML/JSON配置文件、环境变量覆盖和配置验证
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::eval::EvalOptions;
use crate::impl_default;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 文件读取错误
    #[error("Config file error: {0}")]
    FileError(#[from] std::io::Error),
    /// 解析错误
    #[error("Config parse error: {0}")]
    ParseError(String),
    /// 验证错误
    #[error("Config validation error: {0}")]
    ValidationError(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// 绑定层主配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// 运行时资源配置
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// 求值配置
    #[serde(default)]
    pub eval: EvalConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BridgeConfig {
    /// 创建默认配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 从TOML文件加载配置
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_toml_str(&content)
    }

    /// 从TOML字符串解析配置
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 从JSON文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_json_str(&content)
    }

    /// 从JSON字符串解析配置
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 保存为TOML文件
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content).map_err(ConfigError::FileError)
    }

    /// 从环境变量覆盖配置
    pub fn apply_env_overrides(&mut self) {
        if let Some(limit) = env_usize("QJS_BRIDGE_MEMORY_LIMIT") {
            self.runtime.memory_limit = Some(limit);
        }
        if let Some(threshold) = env_usize("QJS_BRIDGE_GC_THRESHOLD") {
            self.runtime.gc_threshold = Some(threshold);
        }
        if let Some(stack) = env_usize("QJS_BRIDGE_MAX_STACK_SIZE") {
            self.runtime.max_stack_size = Some(stack);
        }
        if let Ok(val) = env::var("QJS_BRIDGE_STRICT") {
            self.eval.strict = val.parse().unwrap_or(self.eval.strict);
        }
        if let Ok(val) = env::var("QJS_BRIDGE_LOG_LEVEL") {
            if let Some(level) = LogLevel::parse(&val) {
                self.logging.level = level;
            }
        }
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        self.runtime.validate()?;
        self.eval.validate()?;
        Ok(())
    }
}

fn env_usize(key: &str) -> Option<usize> {
    env::var(key).ok().and_then(|val| val.trim().parse().ok())
}

/// 运行时资源配置
///
/// 未设置的字段保持引擎默认值。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// 堆内存上限（字节）
    #[serde(default)]
    pub memory_limit: Option<usize>,

    /// 触发垃圾回收的分配阈值（字节）
    #[serde(default)]
    pub gc_threshold: Option<usize>,

    /// 最大栈大小（字节），0 表示不限制
    #[serde(default)]
    pub max_stack_size: Option<usize>,
}

/// 引擎能正常启动所需的最小堆
const MIN_MEMORY_LIMIT: usize = 64 * 1024;

impl RuntimeConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(limit) = self.memory_limit {
            if limit < MIN_MEMORY_LIMIT {
                return Err(ConfigError::ValidationError(format!(
                    "memory_limit must be at least {MIN_MEMORY_LIMIT} bytes, got {limit}"
                )));
            }
        }
        if self.gc_threshold == Some(0) {
            return Err(ConfigError::ValidationError(
                "gc_threshold must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// 求值配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalConfig {
    /// 默认源文件名（出现在堆栈中）
    pub default_filename: String,

    /// 是否默认以严格模式求值
    pub strict: bool,
}

impl_default!(EvalConfig {
    default_filename: "<eval>".to_string(),
    strict: true,
});

impl EvalConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.default_filename.contains('\0') {
            return Err(ConfigError::ValidationError(
                "default_filename must not contain NUL".to_string(),
            ));
        }
        Ok(())
    }

    /// 全局求值使用的选项
    pub fn options(&self) -> EvalOptions {
        if self.strict {
            EvalOptions::TYPE_GLOBAL | EvalOptions::STRICT
        } else {
            EvalOptions::TYPE_GLOBAL
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别（`RUST_LOG` 优先）
    pub level: LogLevel,

    /// 是否使用 ANSI 颜色
    pub ansi: bool,

    /// 是否输出日志目标
    pub show_target: bool,
}

impl_default!(LoggingConfig {
    level: LogLevel::Info,
    ansi: true,
    show_target: true,
});

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    /// 跟踪
    Trace,
    /// 调试
    Debug,
    /// 信息
    Info,
    /// 警告
    Warn,
    /// 错误
    Error,
}

impl LogLevel {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BridgeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.eval.default_filename, "<eval>");
        assert_eq!(
            config.eval.options(),
            EvalOptions::TYPE_GLOBAL | EvalOptions::STRICT
        );
    }

    #[test]
    fn test_toml_serialization() {
        let mut config = BridgeConfig::default();
        config.runtime.memory_limit = Some(32 * 1024 * 1024);
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: BridgeConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.runtime, parsed.runtime);
    }

    #[test]
    fn test_json_serialization() {
        let config = BridgeConfig::default();
        let json_str = serde_json::to_string(&config).unwrap();
        let parsed = BridgeConfig::from_json_str(&json_str).unwrap();
        assert_eq!(config.eval, parsed.eval);
    }

    #[test]
    fn test_save_and_reload_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.toml");
        let mut config = BridgeConfig::default();
        config.runtime.gc_threshold = Some(512 * 1024);
        config.logging.level = LogLevel::Debug;
        config.save_toml(&path).unwrap();

        let loaded = BridgeConfig::from_toml_file(&path).unwrap();
        assert_eq!(loaded.runtime.gc_threshold, Some(512 * 1024));
        assert_eq!(loaded.logging.level, LogLevel::Debug);
    }

    #[test]
    fn test_missing_file_is_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = BridgeConfig::from_toml_file(dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::FileError(_))));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = BridgeConfig::from_toml_str(
            r#"
            [runtime]
            max_stack_size = 1048576
            "#,
        )
        .unwrap();
        assert_eq!(config.runtime.max_stack_size, Some(1_048_576));
        assert_eq!(config.runtime.memory_limit, None);
        assert!(config.eval.strict);
    }

    #[test]
    fn test_validation_rejects_tiny_heap() {
        let mut config = BridgeConfig::default();
        config.runtime.memory_limit = Some(1024);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!(LogLevel::parse("WARNING"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("verbose"), None);
    }
}
