//! 核心基础设施：错误类型、诊断控制台与公共宏

pub mod console;
pub mod error;
pub mod macros;

pub use error::{BindingError, BindingResult, Thrown};
