use std::sync::atomic::{AtomicUsize, Ordering};

use quickjs_bridge::{
    field, BindingError, BindingResult, Context, EvalOptions, JsFunction, Module, Rest, Runtime,
    Value,
};

#[derive(Default)]
struct TestClass {
    int_member: i32,
    label: String,
    items: Vec<i32>,
}

impl TestClass {
    fn int_member_function(&self, a: i32) -> i32 {
        a * 2
    }
}

struct Point {
    x: f64,
    y: f64,
}

fn setup() -> (Runtime, Context) {
    let runtime = Runtime::new().unwrap();
    let context = Context::new(&runtime).unwrap();
    (runtime, context)
}

fn import_all(context: &Context, module: &str) {
    context
        .eval(
            &format!("import * as test from '{module}'; globalThis.test = test;"),
            "<import>",
            EvalOptions::TYPE_MODULE,
        )
        .unwrap();
}

fn register_test_class(module: &Module) {
    module
        .add_class::<TestClass>("TestClass")
        .unwrap()
        .default_constructor()
        .unwrap()
        .named_constructor("TestClassWithVector", |items: Vec<i32>| TestClass {
            items,
            ..TestClass::default()
        })
        .unwrap()
        .function("intMember", field!(TestClass, int_member))
        .unwrap()
        .function("intMemberFunction", TestClass::int_member_function)
        .unwrap()
        .function("setLabel", |this: &mut TestClass, label: String| {
            this.label = label;
        })
        .unwrap()
        .readonly_property("itemCount", |this: &TestClass| this.items.len() as i32)
        .unwrap()
        .property(
            "label",
            |this: &TestClass| this.label.clone(),
            |this: &mut TestClass, label: String| this.label = label.to_uppercase(),
        )
        .unwrap();
}

#[test]
fn test_free_function_call() {
    let (_rt, context) = setup();
    let module = context.add_module("TestModule").unwrap();
    module.function("add", |a: i32, b: i32| a + b).unwrap();
    import_all(&context, "TestModule");

    let result = context.eval_global("test.add(10, 20)").unwrap();
    assert_eq!(result.to_i32().unwrap(), 30);
}

#[test]
fn test_rest_function_receives_every_argument() {
    let (_rt, context) = setup();
    let module = context.add_module("TestModule").unwrap();
    module
        .function("count", |Rest(args): Rest<String>| args.len() as i32)
        .unwrap()
        .function("joined", |Rest(args): Rest<String>| args.join("|"))
        .unwrap();
    import_all(&context, "TestModule");

    assert_eq!(
        context.eval_global("test.count('a', 'b', 'c')").unwrap().to_i32().unwrap(),
        3
    );
    assert_eq!(
        context.eval_global("test.count('single arg')").unwrap().to_i32().unwrap(),
        1
    );
    assert_eq!(context.eval_global("test.count()").unwrap().to_i32().unwrap(), 0);
    assert_eq!(
        context
            .eval_global("test.joined('x', 1, true)")
            .unwrap()
            .to_js_string()
            .unwrap(),
        "x|1|true"
    );
}

#[test]
fn test_class_method_call() {
    let (_rt, context) = setup();
    let module = context.add_module("TestModule").unwrap();
    register_test_class(&module);
    import_all(&context, "TestModule");

    let result = context
        .eval_global("new test.TestClass().intMemberFunction(100)")
        .unwrap();
    assert_eq!(result.to_i32().unwrap(), 200);

    let has_methods = context
        .eval_global(
            "typeof test.TestClass.prototype.intMemberFunction === 'function' && \
             typeof test.TestClass.prototype.setLabel === 'function'",
        )
        .unwrap();
    assert!(has_methods.to_bool());
}

#[test]
fn test_script_callback_from_native() {
    let (_rt, context) = setup();
    context
        .eval_global("globalThis.jsCallback = function (msg, num) { return num * 2; };")
        .unwrap();

    let value = context.eval_global("jsCallback").unwrap();
    assert!(value.is_function());
    let callback: JsFunction<(String, i32), i32> = value.into_function().unwrap();
    assert_eq!(callback.call(("hello".to_string(), 123)).unwrap(), 246);
}

#[test]
fn test_constructor_arity_is_a_type_error() {
    let (_rt, context) = setup();
    let module = context.add_module("Geometry").unwrap();
    module
        .add_class::<Point>("Point")
        .unwrap()
        .constructor(|x: f64, y: f64| Point { x, y })
        .unwrap()
        .function("length", |this: &Point| this.x.hypot(this.y))
        .unwrap();
    import_all(&context, "Geometry");

    let message = context
        .eval_global(
            "(() => { try { new test.Point(1); return 'no error'; } \
             catch (e) { return (e instanceof TypeError) + ':' + e.message; } })()",
        )
        .unwrap()
        .to_js_string()
        .unwrap();
    assert_eq!(message, "true:Expected 2 arguments but received 1");

    let length = context.eval_global("new test.Point(3, 4).length()").unwrap();
    assert_eq!(length.to_f64().unwrap(), 5.0);
    assert_eq!(context.eval_global("test.Point.length").unwrap().to_i32().unwrap(), 2);
}

#[test]
fn test_constructor_requires_new() {
    let (_rt, context) = setup();
    let module = context.add_module("TestModule").unwrap();
    register_test_class(&module);
    import_all(&context, "TestModule");

    let is_type_error = context
        .eval_global("(() => { try { test.TestClass(); return false; } catch (e) { return e instanceof TypeError; } })()")
        .unwrap();
    assert!(is_type_error.to_bool());
}

#[test]
fn test_method_on_foreign_receiver_is_rejected() {
    let (_rt, context) = setup();
    let module = context.add_module("TestModule").unwrap();
    register_test_class(&module);
    import_all(&context, "TestModule");

    let message = context
        .eval_global(
            "(() => { try { test.TestClass.prototype.intMemberFunction.call({}, 1); return 'no error'; } \
             catch (e) { return (e instanceof TypeError) + ':' + e.message; } })()",
        )
        .unwrap()
        .to_js_string()
        .unwrap();
    assert!(message.starts_with("true:Invalid native object"), "{message}");

    // Getters on a plain object read as undefined rather than throwing.
    let missing = context
        .eval_global(
            "Object.getOwnPropertyDescriptor(test.TestClass.prototype, 'itemCount').get.call({})",
        )
        .unwrap();
    assert!(missing.is_undefined());
}

#[test]
fn test_properties_read_and_write() {
    let (_rt, context) = setup();
    let module = context.add_module("TestModule").unwrap();
    register_test_class(&module);
    import_all(&context, "TestModule");

    context
        .eval_global(
            "globalThis.obj = new test.TestClassWithVector([1, 2, 3]); \
             obj.intMember = 7; obj.label = 'abc';",
        )
        .unwrap();
    assert_eq!(context.eval_global("obj.intMember").unwrap().to_i32().unwrap(), 7);
    assert_eq!(context.eval_global("obj.itemCount").unwrap().to_i32().unwrap(), 3);
    assert_eq!(
        context.eval_global("obj.label").unwrap().to_js_string().unwrap(),
        "ABC"
    );

    let keys = context
        .eval_global("Object.keys(Object.getPrototypeOf(obj)).sort().join(',')")
        .unwrap()
        .to_js_string()
        .unwrap();
    assert!(keys.contains("intMember") && keys.contains("itemCount"), "{keys}");

    let obj = context.eval_global("obj").unwrap();
    let label = obj.with_instance(|this: &TestClass| this.label.clone()).unwrap();
    assert_eq!(label, "ABC");
    obj.with_instance_mut(|this: &mut TestClass| this.int_member = 99)
        .unwrap();
    assert_eq!(context.eval_global("obj.intMember").unwrap().to_i32().unwrap(), 99);
}

#[test]
fn test_secondary_constructor_shares_prototype() {
    let (_rt, context) = setup();
    let module = context.add_module("TestModule").unwrap();
    register_test_class(&module);
    import_all(&context, "TestModule");

    let shared = context
        .eval_global(
            "const v = new test.TestClassWithVector([5, 6]); \
             v instanceof test.TestClass && v.itemCount === 2 && \
             test.TestClassWithVector.prototype === test.TestClass.prototype && \
             test.TestClass.prototype.constructor === test.TestClass",
        )
        .unwrap();
    assert!(shared.to_bool());
}

#[test]
fn test_native_failures_are_catchable() {
    let (_rt, context) = setup();
    let module = context.add_module("Failing").unwrap();
    module
        .function("fail", |reason: String| -> Result<i32, String> { Err(reason) })
        .unwrap()
        .function("explode", || -> i32 { panic!("kaboom") })
        .unwrap()
        .function("double", |n: i32| n * 2)
        .unwrap();
    import_all(&context, "Failing");

    let caught = context
        .eval_global("(() => { try { test.fail('boom'); } catch (e) { return e.message; } })()")
        .unwrap()
        .to_js_string()
        .unwrap();
    assert_eq!(caught, "boom");

    let panicked = context
        .eval_global("(() => { try { test.explode(); } catch (e) { return e.message; } })()")
        .unwrap()
        .to_js_string()
        .unwrap();
    assert!(panicked.contains("kaboom"), "{panicked}");

    let conversion = context
        .eval_global("(() => { try { test.double('abc'); } catch (e) { return e instanceof TypeError; } })()")
        .unwrap();
    assert!(conversion.to_bool());

    // The context stays usable afterwards.
    assert_eq!(context.eval_global("test.double(21)").unwrap().to_i32().unwrap(), 42);
}

#[test]
fn test_uncaught_native_error_reaches_eval() {
    let (_rt, context) = setup();
    let module = context.add_module("Failing").unwrap();
    module
        .function("fail", || -> Result<(), String> { Err("native failure".to_string()) })
        .unwrap();
    import_all(&context, "Failing");

    match context.eval_global("test.fail()") {
        Err(BindingError::Evaluation { message, .. }) => {
            assert!(message.contains("native failure"), "{message}")
        }
        other => panic!("unexpected result {other:?}"),
    }
    assert!(context.get_exception().unwrap().is_error());
}

#[test]
fn test_script_exception_passes_through_native_code() {
    let (_rt, context) = setup();
    let module = context.add_module("Relay").unwrap();
    module
        .function("relay", |callback: quickjs_bridge::Value| {
            let callback: JsFunction<(), i32> = callback.into_function()?;
            callback.call(())
        })
        .unwrap();
    import_all(&context, "Relay");

    let result = context
        .eval_global(
            "class Custom extends Error {} \
             (() => { try { test.relay(() => { throw new Custom('inner'); }); } \
             catch (e) { return (e instanceof Custom) + ':' + e.message; } })()",
        )
        .unwrap()
        .to_js_string()
        .unwrap();
    assert_eq!(result, "true:inner");
}

static TRACKED_DROPS: AtomicUsize = AtomicUsize::new(0);

struct Tracked;

impl Drop for Tracked {
    fn drop(&mut self) {
        TRACKED_DROPS.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_instances_are_dropped_exactly_once() {
    let runtime = Runtime::new().unwrap();
    let context = Context::new(&runtime).unwrap();
    let module = context.add_module("Tracking").unwrap();
    module
        .add_class::<Tracked>("Tracked")
        .unwrap()
        .constructor(|| Tracked)
        .unwrap();
    import_all(&context, "Tracking");

    context.eval_global("void new test.Tracked(); 0").unwrap();
    runtime.run_gc();
    assert_eq!(TRACKED_DROPS.load(Ordering::SeqCst), 1);

    context.eval_global("globalThis.kept = new test.Tracked(); 0").unwrap();
    runtime.run_gc();
    assert_eq!(TRACKED_DROPS.load(Ordering::SeqCst), 1);

    drop(module);
    drop(context);
    drop(runtime);
    assert_eq!(TRACKED_DROPS.load(Ordering::SeqCst), 2);
}

static KEPT_DROPS: AtomicUsize = AtomicUsize::new(0);

struct Kept;

impl Drop for Kept {
    fn drop(&mut self) {
        KEPT_DROPS.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_teardown_finalizes_reachable_instances() {
    let runtime = Runtime::new().unwrap();
    let context = Context::new(&runtime).unwrap();
    context.add_variable("fromVec", &vec![1, 2, 3]).unwrap();
    let module = context.add_module("Keeping").unwrap();
    module
        .add_class::<Kept>("Kept")
        .unwrap()
        .constructor(|| Kept)
        .unwrap()
        .function("ping", |_this: &Kept| 1)
        .unwrap();
    import_all(&context, "Keeping");

    context.eval_global("globalThis.kept = new test.Kept(); kept.ping()").unwrap();
    runtime.run_gc();
    assert_eq!(KEPT_DROPS.load(Ordering::SeqCst), 0);

    drop(module);
    drop(context);
    drop(runtime);
    assert_eq!(KEPT_DROPS.load(Ordering::SeqCst), 1);
}

static FRAGILE_DROPS: AtomicUsize = AtomicUsize::new(0);

struct Fragile;

impl Drop for Fragile {
    fn drop(&mut self) {
        FRAGILE_DROPS.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_failed_constructors_leave_no_instance() {
    let (runtime, context) = setup();
    let module = context.add_module("Fragile").unwrap();
    module
        .add_class::<Fragile>("Fragile")
        .unwrap()
        .constructor(|ok: bool| -> Result<Fragile, String> {
            if ok {
                Ok(Fragile)
            } else {
                Err("nope".to_string())
            }
        })
        .unwrap()
        .named_constructor("FragilePanic", || -> Fragile { panic!("kaboom") })
        .unwrap()
        .named_constructor("FragilePair", |_a: i32, _b: i32| Fragile)
        .unwrap();
    import_all(&context, "Fragile");

    let message_of = |expr: &str| {
        context
            .eval_global(&format!(
                "(() => {{ try {{ {expr}; return 'no error'; }} catch (e) {{ return e.message; }} }})()"
            ))
            .unwrap()
            .to_js_string()
            .unwrap()
    };
    assert_eq!(message_of("new test.Fragile(false)"), "Constructor failed: nope");
    assert_eq!(message_of("new test.FragilePanic()"), "Constructor failed: kaboom");
    assert_eq!(message_of("new test.FragilePair(1)"), "Expected 2 arguments but received 1");

    runtime.run_gc();
    assert_eq!(FRAGILE_DROPS.load(Ordering::SeqCst), 0);

    context.eval_global("void new test.Fragile(true); 0").unwrap();
    runtime.run_gc();
    assert_eq!(FRAGILE_DROPS.load(Ordering::SeqCst), 1);
}

#[test]
fn test_native_error_rethrows_its_own_exception() {
    let (_rt, context) = setup();
    let module = context.add_module("Relay").unwrap();
    module
        .function("pickFirst", |a: Value, b: Value| -> BindingResult<i32> {
            let first = a.call(&[]).unwrap_err();
            let _second = b.call(&[]).unwrap_err();
            Err(first)
        })
        .unwrap();
    import_all(&context, "Relay");

    let message = context
        .eval_global(
            "(() => { try { test.pickFirst(() => { throw new Error('A'); },              () => { throw new Error('B'); }); return 'no error'; }              catch (e) { return 'rethrown: ' + e.message; } })()",
        )
        .unwrap()
        .to_js_string()
        .unwrap();
    assert_eq!(message, "rethrown: A");
}

#[test]
fn test_receiver_is_checked_before_arguments() {
    let (_rt, context) = setup();
    let module = context.add_module("TestModule").unwrap();
    register_test_class(&module);
    import_all(&context, "TestModule");

    let method = context
        .eval_global(
            "(() => { try { test.TestClass.prototype.intMemberFunction.call({}, 'abc'); return 'no error'; }              catch (e) { return e.message; } })()",
        )
        .unwrap()
        .to_js_string()
        .unwrap();
    assert!(method.starts_with("Invalid native object"), "{method}");

    let setter = context
        .eval_global(
            "(() => { try { Object.getOwnPropertyDescriptor(test.TestClass.prototype, 'intMember')\
             .set.call({}, 'abc'); return 'no error'; } catch (e) { return e.message; } })()",
        )
        .unwrap()
        .to_js_string()
        .unwrap();
    assert!(setter.starts_with("Invalid native object"), "{setter}");
}

struct Widget;

#[test]
fn test_rejected_constructor_name_keeps_prototype_free() {
    let (_rt, context) = setup();
    let module = context.add_module("Widgets").unwrap();
    module.function("Widget", || 0).unwrap();

    let mut builder = module.add_class::<Widget>("Widget").unwrap();
    assert!(matches!(
        builder.constructor(|| Widget),
        Err(BindingError::Registration(_))
    ));
    builder.named_constructor("WidgetNew", || Widget).unwrap();
    drop(builder);
    import_all(&context, "Widgets");

    let wired = context
        .eval_global(
            "test.WidgetNew.prototype.constructor === test.WidgetNew && \
             new test.WidgetNew() instanceof test.WidgetNew && test.Widget() === 0",
        )
        .unwrap();
    assert!(wired.to_bool());
}

#[test]
fn test_duplicate_export_is_rejected() {
    let (_rt, context) = setup();
    let module = context.add_module("TestModule").unwrap();
    module.function("same", || 1).unwrap();
    let err = module.function("same", || 2).unwrap_err();
    assert!(matches!(err, BindingError::Registration(_)));

    let mut builder = module.add_class::<TestClass>("TestClass").unwrap();
    builder.default_constructor().unwrap();
    assert!(matches!(
        builder.named_constructor("same", TestClass::default),
        Err(BindingError::Registration(_))
    ));
}

#[test]
fn test_globals_and_constants() {
    let (_rt, context) = setup();
    context
        .add_variable("globalVar", &42)
        .unwrap()
        .add_variable("globalString", "Hello from Rust")
        .unwrap()
        .add_constant("GLOBAL_CONST", &3.14159)
        .unwrap();

    assert_eq!(context.eval_global("globalVar + 8").unwrap().to_i32().unwrap(), 50);
    assert_eq!(
        context
            .eval_global("globalString + ' World!'")
            .unwrap()
            .to_js_string()
            .unwrap(),
        "Hello from Rust World!"
    );
    let doubled = context.eval_global("GLOBAL_CONST * 2").unwrap().to_f64().unwrap();
    assert!((doubled - 6.28318).abs() < 1e-12);
}

#[test]
fn test_pending_jobs_run_promise_callbacks() {
    let (runtime, context) = setup();
    context
        .eval_global("globalThis.done = false; Promise.resolve(1).then(() => { done = true; });")
        .unwrap();
    assert!(runtime.is_job_pending());
    runtime.execute_pending_jobs().unwrap();
    assert!(context.eval_global("done").unwrap().to_bool());
}
