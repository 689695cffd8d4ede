//! Script functions called from native code with a fixed signature.

use std::marker::PhantomData;

use crate::context::Ctx;
use crate::convert::{FromJs, ToJs};
use crate::core::BindingResult;
use crate::value::Value;

/// An argument list for calling into script.
pub trait IntoJsArgs {
    fn into_js_args(self, ctx: &Ctx) -> BindingResult<Vec<Value>>;
}

impl IntoJsArgs for Vec<Value> {
    fn into_js_args(self, _ctx: &Ctx) -> BindingResult<Vec<Value>> {
        Ok(self)
    }
}

macro_rules! impl_into_js_args {
    ($($param:ident $arg:ident),*) => {
        impl<$($param: ToJs,)*> IntoJsArgs for ($($param,)*) {
            #[allow(unused_variables)]
            fn into_js_args(self, ctx: &Ctx) -> BindingResult<Vec<Value>> {
                let ($($arg,)*) = self;
                Ok(vec![$(
                    unsafe { Value::from_owned(ctx.clone(), $arg.to_js(ctx)?) },
                )*])
            }
        }
    };
}

impl_into_js_args!();
impl_into_js_args!(A a);
impl_into_js_args!(A a, B b);
impl_into_js_args!(A a, B b, C c);
impl_into_js_args!(A a, B b, C c, D d);
impl_into_js_args!(A a, B b, C c, D d, E e);
impl_into_js_args!(A a, B b, C c, D d, E e, F f);
impl_into_js_args!(A a, B b, C c, D d, E e, F f, G g);
impl_into_js_args!(A a, B b, C c, D d, E e, F f, G g, H h);

/// A script callable with its argument and result types fixed on the native side.
///
/// ```rust,ignore
/// let callback: JsFunction<(i32,), i32> = context.eval_global("x => x * 2")?.into_function()?;
/// assert_eq!(callback.call((123,))?, 246);
/// ```
pub struct JsFunction<Args, R> {
    func: Value,
    _signature: PhantomData<fn(Args) -> R>,
}

impl<Args: IntoJsArgs, R: FromJs> JsFunction<Args, R> {
    pub(crate) fn new(func: Value) -> Self {
        Self {
            func,
            _signature: PhantomData,
        }
    }

    pub fn call(&self, args: Args) -> BindingResult<R> {
        self.call_with_this(&Value::empty(), args)
    }

    pub fn call_with_this(&self, this: &Value, args: Args) -> BindingResult<R> {
        let ctx = self
            .func
            .ctx()
            .ok_or_else(|| crate::BindingError::Lifecycle("function is empty".to_string()))?;
        let argv = args.into_js_args(ctx)?;
        let result = self.func.call_with_this(this, &argv)?;
        result.to_rust()
    }

    pub fn as_value(&self) -> &Value {
        &self.func
    }

    pub fn into_value(self) -> Value {
        self.func
    }
}

impl<Args, R> Clone for JsFunction<Args, R> {
    fn clone(&self) -> Self {
        Self {
            func: self.func.clone(),
            _signature: PhantomData,
        }
    }
}
