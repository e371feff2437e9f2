use std::cell::Cell;
use std::rc::Rc;

use pledge::embedding::{NativeFunction, NativeFunctionBoxed};
use pledge::{
    Adapter, Context, Engine, FunctionArgs, JsFunction, PromiseState, RuntimeError,
    UnhandledRejections, Value,
};

#[ctor::ctor]
fn __init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default())
        .is_test(true)
        .try_init();
}

#[test]
fn engine_options_reach_the_event_loop() {
    let engine = Engine::new()
        .with_max_microtasks(10)
        .with_unhandled_rejections(UnhandledRejections::Ignore);
    let ctx = engine.new_context();

    let options = ctx.event_loop().options();
    assert_eq!(options.max_microtasks, Some(10));
    assert_eq!(options.unhandled_rejections, UnhandledRejections::Ignore);

    let defaults = Engine::new().options();
    assert_eq!(defaults.max_microtasks, None);
    assert_eq!(defaults.unhandled_rejections, UnhandledRejections::Warn);
}

#[test]
fn adapter_builds_settled_and_deferred_promises() {
    let ctx = Context::new();
    let adapter = Adapter::new(&ctx);

    let resolved = adapter.resolved(Value::Number(1.0));
    let rejected = adapter.rejected(Value::string("no"));
    rejected.catch_with(|_| Ok(Value::Undefined));
    let deferred = adapter.deferred();

    assert_eq!(resolved.state(), PromiseState::Fulfilled(Value::Number(1.0)));
    assert_eq!(rejected.state(), PromiseState::Rejected(Value::string("no")));
    assert!(deferred.promise.is_pending());

    deferred.reject.reject(Value::string("late"));
    deferred.resolve.resolve(Value::Number(2.0));
    assert_eq!(deferred.promise.reason(), Some(Value::string("late")));
    deferred.promise.catch_with(|_| Ok(Value::Undefined));

    ctx.run_microtasks().expect("drain should succeed");
    assert!(ctx.take_unhandled_rejections().is_empty());
}

#[test]
fn resolvers_work_as_function_values() {
    let ctx = Context::new();
    let (promise, resolve, _) = ctx.with_resolvers();
    let resolve = Value::from(resolve);

    let function = resolve.as_function().expect("resolve is a function");
    assert_eq!(function.name(), "resolve");
    let returned = function
        .call(FunctionArgs::call(vec![Value::Number(3.0)]))
        .expect("resolving never fails");

    assert_eq!(returned, Value::Undefined);
    assert_eq!(promise.value(), Some(Value::Number(3.0)));
}

#[test]
fn function_args_default_missing_values() {
    let args = FunctionArgs::new(Value::Null, vec![Value::Number(1.0)]);

    assert_eq!(args.len(), 1);
    assert!(!args.is_empty());
    assert_eq!(args.this(), &Value::Null);
    assert_eq!(args.get(0), Some(&Value::Number(1.0)));
    assert_eq!(args.get(1), None);
    assert_eq!(args.arg(1), Value::Undefined);
    assert!(FunctionArgs::call(Vec::new()).is_empty());
}

#[test]
fn getters_see_their_receiver() {
    let object = Value::object();
    object.set_property("label", Value::string("box"));
    object.define_getter(
        "describe",
        JsFunction::from_closure("get describe", |args| {
            let label = args.this().get_property("label")?;
            Ok(Value::string(format!("a {label}")))
        }),
    );

    assert_eq!(
        object.get_property("describe").ok(),
        Some(Value::string("a box"))
    );
    assert_eq!(object.get_property("missing").ok(), Some(Value::Undefined));
    assert!(!Value::Number(1.0).set_property("x", Value::Null));
}

#[test]
fn promise_exposes_callable_then_member() {
    let ctx = Context::new();
    let promise = Value::Promise(ctx.resolve(5.0));

    let then = promise.get_property("then").expect("reading then never fails");
    assert!(then.is_callable());
    assert_eq!(promise.get_property("finally").ok(), Some(Value::Undefined));

    let derived = then
        .as_function()
        .expect("then is a function")
        .call(FunctionArgs::call(vec![Value::function("double", |args| {
            Ok(Value::Number(args.arg(0).to_number() * 2.0))
        })]))
        .expect("then never fails");

    ctx.run_microtasks().expect("drain should succeed");
    let derived = derived.as_promise().expect("then returns a promise");
    assert_eq!(derived.value(), Some(Value::Number(10.0)));
}

#[test]
fn values_display_the_way_a_console_prints_them() {
    let ctx = Context::new();
    let object = Value::object();
    object.set_property("b", Value::Null);
    object.set_property("a", Value::Null);
    let rejected = ctx.reject(Value::type_error("bad"));
    rejected.catch_with(|_| Ok(Value::Undefined));

    assert_eq!(Value::Number(3.0).to_string(), "3");
    assert_eq!(Value::Number(1.5).to_string(), "1.5");
    assert_eq!(Value::Undefined.to_string(), "undefined");
    assert_eq!(object.to_string(), "{ a, b }");
    assert_eq!(
        Value::function("f", |_| Ok(Value::Undefined)).to_string(),
        "function f() { [native code] }"
    );
    assert_eq!(
        Value::Promise(ctx.with_resolvers().0).to_string(),
        "Promise { <pending> }"
    );
    assert_eq!(
        Value::Promise(ctx.resolve("x")).to_string(),
        "Promise { <fulfilled>: x }"
    );
    assert_eq!(
        Value::Promise(rejected).to_string(),
        "Promise { <rejected>: TypeError: bad }"
    );
}

#[test]
fn large_integers_display_without_saturating() {
    assert_eq!(Value::Number(1e20).to_string(), "100000000000000000000");
    assert_eq!(Value::Number(-1e20).to_string(), "-100000000000000000000");
    assert_eq!(Value::Number(9007199254740991.0).to_string(), "9007199254740991");
    assert_eq!(Value::Number(-42.0).to_string(), "-42");
}

#[test]
fn promises_holding_promises_display_one_level_deep() {
    let ctx = Context::new();
    let (first, _, reject_first) = ctx.with_resolvers();
    let (second, _, reject_second) = ctx.with_resolvers();
    let (outer, _, reject_outer) = ctx.with_resolvers();
    let (inner, _, _) = ctx.with_resolvers();

    reject_first.reject(Value::Promise(second.clone()));
    reject_second.reject(Value::Promise(first.clone()));
    reject_outer.reject(Value::Promise(inner));

    assert_eq!(
        Value::Promise(first.clone()).to_string(),
        "Promise { <rejected>: Promise { <rejected> } }"
    );
    assert_eq!(
        Value::Promise(outer).to_string(),
        "Promise { <rejected>: Promise { <pending> } }"
    );
    assert!(format!("{:?}", Value::Promise(second)).contains("rejected"));
    assert!(format!("{first:?}").contains("rejected"));
}

#[test]
fn self_referencing_objects_debug_by_keys() {
    let object = Value::object();
    object.set_property("me", object.clone());
    object.set_property("label", Value::string("loop"));

    assert_eq!(format!("{object:?}"), r#"Object(["label", "me"])"#);
    assert_eq!(object.to_string(), "{ label, me }");
}

#[test]
fn values_report_their_type() {
    assert_eq!(Value::Null.type_of(), "object");
    assert_eq!(Value::Boolean(true).type_of(), "boolean");
    assert_eq!(Value::function("f", |_| Ok(Value::Null)).type_of(), "function");
    assert!(Value::error("e").is_object_like());
    assert!(!Value::string("then").is_object_like());
    assert_eq!(Value::string(" 12 ").to_number(), 12.0);
    assert!(Value::Undefined.to_number().is_nan());
}

struct Counter {
    calls: Rc<Cell<u32>>,
}

impl NativeFunction for Counter {
    fn call(&self, args: FunctionArgs) -> Result<Value, RuntimeError> {
        self.calls.set(self.calls.get() + 1);
        Ok(Value::Number(args.arg(0).to_number() + f64::from(self.calls.get())))
    }
}

#[test]
fn native_function_impls_serve_as_handlers() {
    let ctx = Context::new();
    let calls = Rc::new(Cell::new(0));
    let handler = JsFunction::new(
        "counter",
        NativeFunctionBoxed::new(Counter {
            calls: calls.clone(),
        }),
    );

    let first = ctx.resolve(10.0).then(Some(handler.clone().into()), None);
    let second = ctx.resolve(20.0).then(Some(handler.into()), None);
    ctx.run_microtasks().expect("drain should succeed");

    assert_eq!(calls.get(), 2);
    assert_eq!(first.value(), Some(Value::Number(11.0)));
    assert_eq!(second.value(), Some(Value::Number(22.0)));
}
