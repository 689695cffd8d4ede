// ============================================================================
// 类构建器
// 为原生类型创建脚本侧原型、构造函数和成员绑定
// ============================================================================

use std::marker::PhantomData;

use super::instance::InstanceCell;
use super::registry;
use crate::context::Ctx;
use crate::core::{BindingError, BindingResult};
use crate::convert::FromJs;
use crate::marshal::callback::{new_function, CallbackKind, NativeCallback};
use crate::marshal::{getter, setter, ClassMember, Constructor, IntoJsResult};
use crate::module::Module;
use crate::raw::{self, qjs, RawValue};
use crate::value::Value;

/// 原生类型 `T` 的类构建器
///
/// 由 [`Module::add_class`] 创建。所有构造函数共享同一个原型对象；
/// 方法和属性定义在该原型上。构建器被丢弃时释放它持有的原型引用。
pub struct ClassBuilder<'m, T: 'static> {
    module: &'m Module,
    name: String,
    class_id: qjs::JSClassID,
    proto: Value,
    has_primary: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<'m, T: 'static> ClassBuilder<'m, T> {
    pub(crate) fn new(module: &'m Module, name: &str) -> BindingResult<Self> {
        let ctx = module.ctx();
        let rt = unsafe { qjs::JS_GetRuntime(ctx.as_ptr()) };
        let class_id = registry::register_class::<T>(rt, name)?;

        let proto = ctx.check(unsafe { qjs::JS_NewObject(ctx.as_ptr()) })?;
        unsafe {
            qjs::JS_SetClassProto(
                ctx.as_ptr(),
                class_id,
                raw::dup(ctx.as_ptr(), proto.as_raw()),
            )
        };

        Ok(Self {
            module,
            name: name.to_string(),
            class_id,
            proto,
            has_primary: false,
            _marker: PhantomData,
        })
    }

    fn ctx(&self) -> &Ctx {
        self.module.ctx()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 原型对象
    pub fn prototype(&self) -> &Value {
        &self.proto
    }

    /// 以类名导出构造函数
    pub fn constructor<F, Marker>(&mut self, factory: F) -> BindingResult<&mut Self>
    where
        F: Constructor<T, Marker>,
    {
        let name = self.name.clone();
        self.named_constructor(&name, factory)
    }

    /// 以 `T::default` 作为无参构造函数
    pub fn default_constructor(&mut self) -> BindingResult<&mut Self>
    where
        T: Default,
    {
        self.constructor(T::default)
    }

    /// 以指定导出名注册构造函数（例如按参数个数区分的第二个构造函数）
    ///
    /// 第一个注册的构造函数成为原型的 `constructor`；其余构造函数只共享原型。
    pub fn named_constructor<F, Marker>(
        &mut self,
        export_name: &str,
        factory: F,
    ) -> BindingResult<&mut Self>
    where
        F: Constructor<T, Marker>,
    {
        let class_id = self.class_id;
        let class_name = self.name.clone();
        let callback: Box<NativeCallback> =
            Box::new(move |ctx: &Ctx, new_target: RawValue, args: &[RawValue]| {
                construct_instance::<T, F, Marker>(ctx, &factory, class_id, &class_name, new_target, args)
            });
        let func = new_function(
            self.ctx(),
            export_name,
            F::LENGTH,
            CallbackKind::Constructor,
            callback,
        )?;

        let ctx = self.ctx().as_ptr();
        if self.has_primary {
            let status = unsafe {
                qjs::JS_DefinePropertyValueStr(
                    ctx,
                    func.as_raw(),
                    c"prototype".as_ptr(),
                    raw::dup(ctx, self.proto.as_raw()),
                    0,
                )
            };
            if status < 0 {
                return Err(self.ctx().catch_exception());
            }
            self.module.add_export(export_name, func)?;
        } else {
            // The module record keeps the function alive once exported.
            let raw_func = func.as_raw();
            self.module.add_export(export_name, func)?;
            unsafe { qjs::JS_SetConstructor(ctx, raw_func, self.proto.as_raw()) };
            self.has_primary = true;
        }

        crate::js_debug!("class {} exported constructor {export_name}", self.name);
        Ok(self)
    }

    /// 绑定成员：方法或数据成员，由类型在编译期决定
    pub fn function<M, Marker>(&mut self, name: &str, member: M) -> BindingResult<&mut Self>
    where
        M: ClassMember<T, Marker>,
    {
        member.bind(self, name)?;
        Ok(self)
    }

    /// 绑定方法（与 [`function`](Self::function) 相同）
    pub fn method<M, Marker>(&mut self, name: &str, member: M) -> BindingResult<&mut Self>
    where
        M: ClassMember<T, Marker>,
    {
        self.function(name, member)
    }

    /// 绑定计算属性
    pub fn property<G, S, R, V, SR>(
        &mut self,
        name: &str,
        get: G,
        set: S,
    ) -> BindingResult<&mut Self>
    where
        G: Fn(&T) -> R + 'static,
        R: IntoJsResult,
        S: Fn(&mut T, V) -> SR + 'static,
        V: FromJs,
        SR: IntoJsResult,
    {
        self.define_accessor(name, getter(get), Some(setter(set)))?;
        Ok(self)
    }

    /// 绑定只读属性
    pub fn readonly_property<G, R>(&mut self, name: &str, get: G) -> BindingResult<&mut Self>
    where
        G: Fn(&T) -> R + 'static,
        R: IntoJsResult,
    {
        self.define_accessor(name, getter(get), None)?;
        Ok(self)
    }

    pub(crate) fn define_method(
        &mut self,
        name: &str,
        length: usize,
        callback: Box<NativeCallback>,
    ) -> BindingResult<()> {
        let func = new_function(self.ctx(), name, length, CallbackKind::Function, callback)?;
        let prop = raw::c_name(name)?;
        let ctx = self.ctx().as_ptr();
        let status = unsafe {
            qjs::JS_DefinePropertyValueStr(
                ctx,
                self.proto.as_raw(),
                prop.as_ptr(),
                func.into_raw(),
                raw::PROP_CONFIGURABLE | raw::PROP_WRITABLE | raw::PROP_ENUMERABLE,
            )
        };
        if status < 0 {
            return Err(self.ctx().catch_exception());
        }
        Ok(())
    }

    pub(crate) fn define_accessor(
        &mut self,
        name: &str,
        get: Box<NativeCallback>,
        set: Option<Box<NativeCallback>>,
    ) -> BindingResult<()> {
        let getter = new_function(self.ctx(), name, 0, CallbackKind::Accessor, get)?;
        let setter = match set {
            Some(set) => Some(new_function(self.ctx(), name, 1, CallbackKind::Accessor, set)?),
            None => None,
        };
        let prop = raw::c_name(name)?;
        let ctx = self.ctx().as_ptr();

        let atom = unsafe { qjs::JS_NewAtom(ctx, prop.as_ptr()) };
        let status = unsafe {
            qjs::JS_DefinePropertyGetSet(
                ctx,
                self.proto.as_raw(),
                atom,
                getter.into_raw(),
                setter.map_or_else(raw::undefined, Value::into_raw),
                raw::PROP_CONFIGURABLE | raw::PROP_ENUMERABLE,
            )
        };
        unsafe { qjs::JS_FreeAtom(ctx, atom) };
        if status < 0 {
            return Err(self.ctx().catch_exception());
        }
        Ok(())
    }
}

/// Runs one `new` expression for class `T`.
fn construct_instance<T, F, Marker>(
    ctx: &Ctx,
    factory: &F,
    class_id: qjs::JSClassID,
    class_name: &str,
    new_target: RawValue,
    args: &[RawValue],
) -> BindingResult<RawValue>
where
    T: 'static,
    F: Constructor<T, Marker>,
{
    if unsafe { qjs::JS_IsConstructor(ctx.as_ptr(), new_target) } == 0 {
        return Err(BindingError::NotConstructor(class_name.to_string()));
    }

    let proto = unsafe { qjs::JS_GetPropertyStr(ctx.as_ptr(), new_target, c"prototype".as_ptr()) };
    let proto = ctx.check(proto)?;
    let object = ctx.check(unsafe {
        qjs::JS_NewObjectProtoClass(ctx.as_ptr(), proto.as_raw(), class_id)
    })?;
    drop(proto);

    if args.len() < F::LENGTH {
        return Err(BindingError::Arity {
            expected: F::LENGTH,
            received: args.len(),
        });
    }
    let instance = factory.construct(ctx, args).map_err(|err| match err {
        BindingError::Native(message) => BindingError::Native(format!("Constructor failed: {message}")),
        other => other,
    })?;

    unsafe { InstanceCell::new(instance).attach(object.as_raw()) };
    Ok(object.into_raw())
}
