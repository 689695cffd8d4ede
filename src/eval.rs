//! Evaluation flags passed straight through to the engine.

use bitflags::bitflags;

bitflags! {
    /// Bitmask controlling how [`Context::eval`](crate::Context::eval) treats source text.
    ///
    /// The low two bits select the evaluation type; the remaining bits are
    /// independent flags. The layout matches the engine's `JS_EVAL_*` values.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EvalOptions: u32 {
        const TYPE_GLOBAL = 0;
        const TYPE_MODULE = 1;
        const TYPE_DIRECT = 2;
        const TYPE_INDIRECT = 3;
        const TYPE_MASK = 3;

        const STRICT = 1 << 3;
        const UNUSED = 1 << 4;
        const COMPILE_ONLY = 1 << 5;
        const BACKTRACE_BARRIER = 1 << 6;
        const ASYNC = 1 << 7;
    }
}

/// The evaluation type stored in the low bits of [`EvalOptions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalType {
    Global,
    Module,
    Direct,
    Indirect,
}

impl EvalOptions {
    pub fn eval_type(self) -> EvalType {
        match self.bits() & Self::TYPE_MASK.bits() {
            0 => EvalType::Global,
            1 => EvalType::Module,
            2 => EvalType::Direct,
            _ => EvalType::Indirect,
        }
    }

    /// Replace the type field, keeping every flag bit.
    pub fn with_type(self, eval_type: EvalType) -> Self {
        let ty = match eval_type {
            EvalType::Global => Self::TYPE_GLOBAL,
            EvalType::Module => Self::TYPE_MODULE,
            EvalType::Direct => Self::TYPE_DIRECT,
            EvalType::Indirect => Self::TYPE_INDIRECT,
        };
        Self::from_bits_retain((self.bits() & !Self::TYPE_MASK.bits()) | ty.bits())
    }

    pub fn is_module(self) -> bool {
        self.eval_type() == EvalType::Module
    }
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self::TYPE_GLOBAL | Self::STRICT
    }
}
