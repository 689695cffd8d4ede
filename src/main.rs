use quickjs_bridge::{
    field, init_logging, js_info, BindingResult, BridgeConfig, Context, EvalOptions, JsFunction,
    Rest, Runtime,
};

struct TestClass {
    int_member: i32,
    double_member: f64,
    string_member: String,
    vec_member: Vec<i32>,
}

impl Default for TestClass {
    fn default() -> Self {
        js_info!("TestClass default constructor called");
        Self {
            int_member: 42,
            double_member: 3.14159,
            string_member: "hello from rust".to_string(),
            vec_member: Vec::new(),
        }
    }
}

impl TestClass {
    fn with_vector(vec: Vec<i32>) -> Self {
        js_info!("TestClass vector constructor called (size: {})", vec.len());
        Self {
            vec_member: vec,
            ..Self::default()
        }
    }

    fn void_member_function(&mut self) {
        js_info!("TestClass::void_member_function called");
    }

    fn int_member_function(&mut self, a: i32) -> i32 {
        a * 2
    }

    fn string_member_function(&mut self, s: String) -> String {
        format!("TestClass says: {s}")
    }
}

fn test_void_function() {
    js_info!("test_void_function called");
}

fn test_int_function(a: i32, b: i32) -> i32 {
    a + b
}

fn test_float_function(a: f64, b: f64) -> f64 {
    a * b
}

fn test_string_function(s: String) -> String {
    format!("echo: {s}")
}

fn test_rest_function(Rest(args): Rest<String>) {
    js_info!(
        "test_rest_function called with {} args: {}",
        args.len(),
        args.join(" ")
    );
}

struct Report {
    failures: usize,
}

impl Report {
    fn check(&mut self, name: &str, success: bool) {
        if success {
            js_info!("[PASS] {name}");
        } else {
            quickjs_bridge::js_error!("[FAIL] {name}");
            self.failures += 1;
        }
    }
}

fn run(report: &mut Report, config: &BridgeConfig) -> BindingResult<()> {
    let runtime = Runtime::with_config(&config.runtime)?;
    let context = Context::with_eval_config(&runtime, config.eval.clone())?;
    report.check(
        "Runtime/Context initialization",
        runtime.is_valid() && context.is_valid(),
    );

    let module = context.add_module("TestModule")?;
    module
        .function("testVoidFunction", test_void_function)?
        .function("testIntFunction", test_int_function)?
        .function("testFloatFunction", test_float_function)?
        .function("testStringFunction", test_string_function)?
        .function("testRestFunction", test_rest_function)?;

    module
        .add_class::<TestClass>("TestClass")?
        .default_constructor()?
        .named_constructor("TestClassWithVector", TestClass::with_vector)?
        .function("intMember", field!(TestClass, int_member))?
        .function("doubleMember", field!(TestClass, double_member))?
        .function("stringMember", field!(TestClass, string_member))?
        .function("vecMember", field!(TestClass, vec_member))?
        .function("voidMemberFunction", TestClass::void_member_function)?
        .function("intMemberFunction", TestClass::int_member_function)?
        .function("stringMemberFunction", TestClass::string_member_function)?;

    context.eval(
        r#"
            import * as test from 'TestModule';
            globalThis.test = test;
            test.testRestFunction("[JS] Module imported successfully");
        "#,
        "<module_import>",
        EvalOptions::TYPE_MODULE,
    )?;
    report.check("Module import", true);

    context.eval_global("test.testVoidFunction();")?;
    report.check("Void function call", true);

    let int_result = context.eval_global("test.testIntFunction(10, 20);")?;
    report.check("Int function call", int_result.to_i32()? == 30);

    let float_result = context.eval_global("test.testFloatFunction(2.5, 4.0);")?;
    report.check("Float function call", float_result.to_f64()? == 10.0);

    let string_result = context.eval_global(r#"test.testStringFunction("hello js");"#)?;
    report.check(
        "String function call",
        string_result.to_js_string()? == "echo: hello js",
    );

    context.eval_global(
        r#"
            test.testRestFunction("a", "b", "c", "d");
            test.testRestFunction("single arg");
        "#,
    )?;
    report.check("Rest function call", true);

    context.eval_global("let obj1 = new test.TestClass();")?;
    report.check("Class default constructor", true);

    context.eval_global("let obj2 = new test.TestClassWithVector([1, 2, 3, 4, 5]);")?;
    report.check("Class vector constructor", true);

    let member = context.eval_global("let obj3 = new test.TestClass(); obj3.intMember;")?;
    report.check("Class member variable read", member.to_i32()? == 42);

    let proto_check = context.eval_global(
        r#"
            let proto = test.TestClass.prototype;
            let hasVoid = typeof proto.voidMemberFunction === 'function';
            let hasInt = typeof proto.intMemberFunction === 'function';
            let hasString = typeof proto.stringMemberFunction === 'function';
            hasVoid && hasInt && hasString;
        "#,
    )?;
    report.check("Prototype has member functions", proto_check.to_bool());

    let void_call = context.eval_global("let obj9 = new test.TestClass(); obj9.voidMemberFunction();");
    report.check("Instance void member function call", void_call.is_ok());

    let int_call = context
        .eval_global("let obj10 = new test.TestClass(); obj10.intMemberFunction(100);")
        .and_then(|value| value.to_i32());
    report.check("Instance int member function call", matches!(int_call, Ok(200)));

    let string_call = context
        .eval_global(r#"let obj11 = new test.TestClass(); obj11.stringMemberFunction("js call");"#)
        .and_then(|value| value.to_js_string());
    report.check(
        "Instance string member function call",
        string_call.as_deref() == Ok("TestClass says: js call"),
    );

    context.eval_global(
        r#"
            globalThis.jsCallback = function (msg, num) {
                return num * 2;
            };
        "#,
    )?;
    let callback_value = context.eval_global("jsCallback")?;
    report.check("JS function is_function check", callback_value.is_function());

    let callback: JsFunction<(String, i32), i32> = callback_value.into_function()?;
    let callback_result = callback.call(("hello from rust".to_string(), 123))?;
    report.check("JS callback call from Rust", callback_result == 246);

    let global_test = context.global()?.get("test");
    report.check("Global object access", global_test.to_bool());

    context.set_exception_callback(|exception| {
        let stack = exception.get("stack");
        let detail = if stack.to_bool() {
            stack.to_js_string()
        } else {
            exception.to_js_string()
        };
        js_info!(
            "[JS] Expected exception caught: {}",
            detail.unwrap_or_default()
        );
    })?;
    let exception_caught = match context.eval_global("this is invalid javascript code") {
        Ok(_) => false,
        Err(err) => {
            js_info!("[ERROR]: {err}");
            true
        }
    };
    context.reset_exception_callback()?;
    report.check("Exception handling", exception_caught);

    let conversion = context.eval_global(
        r#"
            let boolVal = true;
            let nullVal = null;
            let undefinedVal = undefined;
            true;
        "#,
    )?;
    report.check("Type conversion (JS side)", conversion.to_bool());

    context
        .add_variable("globalVar", &42)?
        .add_variable("globalString", "Hello from Rust")?
        .add_constant("GLOBAL_CONST", &3.14159)?;

    let global_var = context.eval_global("globalVar + 8;")?;
    report.check("Global variable access", global_var.to_i32()? == 50);

    let global_string = context.eval_global(r#"globalString + " World!";"#)?;
    report.check(
        "Global string variable",
        global_string.to_js_string()? == "Hello from Rust World!",
    );

    let global_const = context.eval_global("GLOBAL_CONST * 2;")?;
    report.check(
        "Global constant access",
        (global_const.to_f64()? - 6.28318).abs() < 1e-9,
    );

    runtime.run_gc();
    Ok(())
}

fn main() {
    let mut config = match std::env::args().nth(1) {
        Some(path) => match BridgeConfig::from_toml_file(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config {path}: {e}");
                std::process::exit(1);
            }
        },
        None => BridgeConfig::default(),
    };
    config.apply_env_overrides();
    if let Err(e) = config.validate() {
        eprintln!("Invalid config: {e}");
        std::process::exit(1);
    }
    init_logging(&config.logging);

    let mut report = Report { failures: 0 };
    if let Err(e) = run(&mut report, &config) {
        quickjs_bridge::js_error!("Uncaught error: {e}");
        std::process::exit(1);
    }

    js_info!("===== All Tests Completed =====");
    if report.failures > 0 {
        std::process::exit(1);
    }
}
