//! Pulling native parameters out of an engine argument list, and pushing
//! native return values back.

use crate::context::Ctx;
use crate::convert::{FromJs, ToJs};
use crate::core::{BindingError, BindingResult};
use crate::raw::{self, RawValue};
use crate::rest::Rest;

/// Left-to-right reader over the arguments of one native call.
pub struct ArgCursor<'a> {
    args: &'a [RawValue],
    next: usize,
}

impl<'a> ArgCursor<'a> {
    pub fn new(args: &'a [RawValue]) -> Self {
        Self { args, next: 0 }
    }

    /// Number of arguments the caller actually supplied.
    pub fn supplied(&self) -> usize {
        self.args.len()
    }

    /// The next positional argument, `undefined` once exhausted.
    pub fn next_arg(&mut self) -> RawValue {
        let arg = self.args.get(self.next).copied().unwrap_or_else(raw::undefined);
        self.next += 1;
        arg
    }

    /// Everything not consumed yet.
    pub fn take_rest(&mut self) -> &'a [RawValue] {
        let rest = self.args.get(self.next..).unwrap_or(&[]);
        self.next = self.args.len();
        rest
    }
}

/// A native parameter type.
pub trait FromParam: Sized {
    /// How many positional arguments this parameter declares.
    const ARITY: usize;

    fn from_param(ctx: &Ctx, args: &mut ArgCursor<'_>) -> BindingResult<Self>;
}

impl<T: FromJs> FromParam for T {
    const ARITY: usize = 1;

    fn from_param(ctx: &Ctx, args: &mut ArgCursor<'_>) -> BindingResult<Self> {
        T::from_js(ctx, args.next_arg())
    }
}

impl<T: FromJs> FromParam for Rest<T> {
    const ARITY: usize = 0;

    fn from_param(ctx: &Ctx, args: &mut ArgCursor<'_>) -> BindingResult<Self> {
        Rest::from_args(ctx, args.take_rest())
    }
}

/// A native return type: plain values convert, `Err` becomes a native error.
pub trait IntoJsResult {
    fn into_js_result(self, ctx: &Ctx) -> BindingResult<RawValue>;
}

impl<T: ToJs> IntoJsResult for T {
    fn into_js_result(self, ctx: &Ctx) -> BindingResult<RawValue> {
        self.to_js(ctx)
    }
}

impl<T: ToJs, E: Into<BindingError>> IntoJsResult for Result<T, E> {
    fn into_js_result(self, ctx: &Ctx) -> BindingResult<RawValue> {
        self.map_err(Into::into)?.to_js(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::test_support::context;

    #[test]
    fn test_cursor_pads_with_undefined() {
        let (_rt, context) = context();
        let ctx = context.ctx().unwrap();
        let one = 1.to_js(ctx).unwrap();
        let args = [one];
        let mut cursor = ArgCursor::new(&args);
        assert_eq!(cursor.supplied(), 1);
        assert_eq!(i32::from_param(ctx, &mut cursor).unwrap(), 1);
        assert_eq!(raw::tag(cursor.next_arg()), raw::TAG_UNDEFINED);
        assert!(cursor.take_rest().is_empty());
    }

    #[test]
    fn test_rest_drains_remaining() {
        let (_rt, context) = context();
        let ctx = context.ctx().unwrap();
        let args: Vec<RawValue> = (1..=4).map(|n| n.to_js(ctx).unwrap()).collect();
        let mut cursor = ArgCursor::new(&args);
        let first = i32::from_param(ctx, &mut cursor).unwrap();
        let Rest(rest) = Rest::<i32>::from_param(ctx, &mut cursor).unwrap();
        assert_eq!(first, 1);
        assert_eq!(rest, vec![2, 3, 4]);
        assert_eq!(<Rest<i32> as FromParam>::ARITY, 0);
    }
}
