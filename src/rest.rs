//! Variadic trailing arguments.

use std::ops::{Deref, DerefMut};

use crate::context::Ctx;
use crate::convert::{FromJs, ToJs};
use crate::core::BindingResult;
use crate::raw::RawValue;

/// Collects every remaining positional argument of a native call.
///
/// As the sole parameter it receives all arguments, whatever their count:
///
/// ```rust,ignore
/// module.function("log", |Rest(parts): Rest<String>| parts.join(" "))?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rest<T>(pub Vec<T>);

impl<T> Rest<T> {
    pub fn into_inner(self) -> Vec<T> {
        self.0
    }
}

impl<T: FromJs> Rest<T> {
    /// Converts a raw argument list in order.
    pub fn from_args(ctx: &Ctx, args: &[RawValue]) -> BindingResult<Self> {
        args.iter()
            .map(|arg| T::from_js(ctx, *arg))
            .collect::<BindingResult<Vec<_>>>()
            .map(Rest)
    }
}

impl<T> Deref for Rest<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DerefMut for Rest<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T> IntoIterator for Rest<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<T> From<Vec<T>> for Rest<T> {
    fn from(items: Vec<T>) -> Self {
        Rest(items)
    }
}

impl<T: ToJs> ToJs for Rest<T> {
    fn to_js(&self, ctx: &Ctx) -> BindingResult<RawValue> {
        self.0.as_slice().to_js(ctx)
    }
}
