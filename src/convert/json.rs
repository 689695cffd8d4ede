//! `serde_json::Value` travels through the engine's own JSON codec.

use super::{FromJs, ToJs};
use crate::context::Ctx;
use crate::core::{BindingError, BindingResult};
use crate::raw::RawValue;
use crate::value::Value;

impl ToJs for serde_json::Value {
    fn to_js(&self, ctx: &Ctx) -> BindingResult<RawValue> {
        let text = serde_json::to_string(self)
            .map_err(|e| BindingError::conversion("JSON value", e.to_string()))?;
        ctx.parse_json(&text).map(Value::into_raw)
    }
}

impl FromJs for serde_json::Value {
    fn from_js(ctx: &Ctx, value: RawValue) -> BindingResult<Self> {
        let value = unsafe { Value::from_borrowed(ctx.clone(), value) };
        match value.to_json()? {
            Some(text) => serde_json::from_str(&text)
                .map_err(|e| BindingError::conversion("JSON value", e.to_string())),
            None => Ok(serde_json::Value::Null),
        }
    }
}
