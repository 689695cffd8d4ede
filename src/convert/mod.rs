//! Bidirectional conversions between native types and engine values.
//!
//! Each supported native type implements [`ToJs`] and/or [`FromJs`]; the
//! conversion is chosen by the declared type, so an unsupported parameter or
//! return type is a build error rather than a runtime surprise.
//!
//! Ownership rules: `to_js` returns an owned engine reference, `from_js`
//! borrows its input and never frees it.

mod containers;
mod json;
mod primitives;
mod string;

use crate::context::Ctx;
use crate::core::BindingResult;
use crate::raw::RawValue;

pub use string::JsCString;

/// Native → engine.
pub trait ToJs {
    fn to_js(&self, ctx: &Ctx) -> BindingResult<RawValue>;
}

/// Engine → native.
///
/// Must fail with a conversion error, never misbehave, when the engine value
/// cannot be coerced to `Self`.
pub trait FromJs: Sized {
    fn from_js(ctx: &Ctx, value: RawValue) -> BindingResult<Self>;
}

/// Types that convert both ways.
pub trait TypeConverter: ToJs + FromJs {}

impl<T: ToJs + FromJs> TypeConverter for T {}

impl<T: ToJs + ?Sized> ToJs for &T {
    fn to_js(&self, ctx: &Ctx) -> BindingResult<RawValue> {
        (**self).to_js(ctx)
    }
}

impl<T: ToJs + ?Sized> ToJs for Box<T> {
    fn to_js(&self, ctx: &Ctx) -> BindingResult<RawValue> {
        (**self).to_js(ctx)
    }
}

impl ToJs for () {
    fn to_js(&self, _ctx: &Ctx) -> BindingResult<RawValue> {
        Ok(crate::raw::undefined())
    }
}

impl FromJs for () {
    fn from_js(_ctx: &Ctx, _value: RawValue) -> BindingResult<Self> {
        Ok(())
    }
}

#[cfg(test)]
mod property_tests;
