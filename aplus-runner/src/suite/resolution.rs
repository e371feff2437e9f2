//! 2.3: the promise resolution procedure, driven through values returned
//! from `onFulfilled`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use pledge::{CHAINING_CYCLE, ErrorKind, FunctionArgs, JsFunction, Promise, RuntimeError, Value};

use super::Case;
use crate::harness::{Capture, CaseError, CaseResult, Harness, ensure, ensure_eq, sentinel};

pub const CASES: &[Case] = &[
    Case::new(
        "2.3.1",
        "returning promise2 from onFulfilled is a cycle",
        cycle_through_on_fulfilled,
    ),
    Case::new("2.3.1", "returning promise2 from onRejected is a cycle", cycle_through_on_rejected),
    Case::new("2.3.2.1", "pending promise keeps promise2 pending", adopts_pending_promise),
    Case::new("2.3.2.2", "fulfilled promise fulfills promise2", adopts_fulfilled_promise),
    Case::new("2.3.2.3", "rejected promise rejects promise2", adopts_rejected_promise),
    Case::new("2.3.3.1", "then is read exactly once", then_is_read_once),
    Case::new("2.3.3.2", "throwing then getter rejects promise2", then_getter_throws),
    Case::new("2.3.3.3", "then is called with x as receiver", then_receives_x),
    Case::new(
        "2.3.3.3.1",
        "resolvePromise value is resolved recursively",
        resolve_promise_recurses,
    ),
    Case::new("2.3.3.3.1", "resolvePromise with a later thenable", resolve_promise_later),
    Case::new("2.3.3.3.2", "rejectPromise rejects with r", reject_promise_rejects),
    Case::new(
        "2.3.3.3.2",
        "rejectPromise with a thenable is not unwrapped",
        reject_promise_keeps_thenable,
    ),
    Case::new("2.3.3.3.3", "first callback wins", first_callback_wins),
    Case::new("2.3.3.3.3", "repeated callbacks are ignored", repeated_callbacks_ignored),
    Case::new("2.3.3.3.4.1", "throw after a callback is ignored", throw_after_callback_ignored),
    Case::new("2.3.3.3.4.2", "throw before a callback rejects", throw_before_callback_rejects),
    Case::new("2.3.3.4", "non-callable then fulfills with x", non_callable_then_fulfills),
    Case::new("2.3.3", "functions with a then member are thenables", callable_thenable),
    Case::new("2.3.4", "primitives fulfill promise2 directly", primitives_fulfill),
];

/// `resolved(dummy).then(() => x)`: the promise resolved with `x` through
/// the resolution procedure.
fn resolved_through_handler(h: &Harness, x: Value) -> Promise {
    h.adapter()
        .resolved(Value::Null)
        .then_with(move |_| Ok(x.clone()))
}

fn thenable<F>(then: F) -> Value
where
    F: Fn(FunctionArgs) -> Result<Value, RuntimeError> + 'static,
{
    let object = Value::object();
    object.set_property("then", Value::function("then", then));
    object
}

fn call(callback: &Value, value: Value) -> Result<Value, RuntimeError> {
    match callback.as_function() {
        Some(function) => function.call(FunctionArgs::call(vec![value])),
        None => Err(RuntimeError::TypeError {
            message: format!("{callback} is not a function"),
        }),
    }
}

fn expect_fulfilled(promise: &Promise, expected: &Value) -> CaseResult {
    match promise.value() {
        Some(value) => ensure_eq("promise2 value", &value, expected),
        None => Err(CaseError::Failed(format!("promise2 is {}", promise.state().label()))),
    }
}

fn expect_rejected(promise: &Promise, expected: &Value) -> CaseResult {
    match promise.reason() {
        Some(reason) => ensure_eq("promise2 reason", &reason, expected),
        None => Err(CaseError::Failed(format!("promise2 is {}", promise.state().label()))),
    }
}

fn expect_cycle_error(promise: &Promise) -> CaseResult {
    let reason = promise.reason().unwrap_or(Value::Undefined);
    match reason.as_error() {
        Some(error) if error.kind() == ErrorKind::TypeError => {
            ensure(
                error.message() == CHAINING_CYCLE,
                format!("unexpected message: {error}"),
            )
        }
        _ => Err(CaseError::Failed(format!("expected a TypeError, got {reason}"))),
    }
}

fn handle(promise: &Promise) {
    promise.catch(Value::function("ignore", |_| Ok(Value::Undefined)));
}

fn cycle_through_on_fulfilled(h: &Harness) -> CaseResult {
    let slot: Rc<RefCell<Option<Promise>>> = Rc::new(RefCell::new(None));
    let own = slot.clone();
    let promise2 = h.adapter().resolved(Value::Null).then_with(move |_| {
        Ok(own.borrow().clone().map(Value::Promise).unwrap_or(Value::Undefined))
    });
    *slot.borrow_mut() = Some(promise2.clone());
    handle(&promise2);
    h.settle()?;
    slot.borrow_mut().take();

    expect_cycle_error(&promise2)
}

fn cycle_through_on_rejected(h: &Harness) -> CaseResult {
    let slot: Rc<RefCell<Option<Promise>>> = Rc::new(RefCell::new(None));
    let own = slot.clone();
    let promise2 = h.adapter().rejected(Value::Null).catch_with(move |_| {
        Ok(own.borrow().clone().map(Value::Promise).unwrap_or(Value::Undefined))
    });
    *slot.borrow_mut() = Some(promise2.clone());
    handle(&promise2);
    h.settle()?;
    slot.borrow_mut().take();

    expect_cycle_error(&promise2)
}

fn adopts_pending_promise(h: &Harness) -> CaseResult {
    let deferred = h.adapter().deferred();
    let promise2 = resolved_through_handler(h, Value::Promise(deferred.promise.clone()));
    h.settle()?;

    ensure(promise2.is_pending(), "promise2 should stay pending")
}

fn adopts_fulfilled_promise(h: &Harness) -> CaseResult {
    let value = sentinel("value");
    h.with_fulfilled(value.clone(), |x| {
        let promise2 = resolved_through_handler(h, Value::Promise(x.clone()));
        let value = value.clone();
        move || expect_fulfilled(&promise2, &value)
    })
}

fn adopts_rejected_promise(h: &Harness) -> CaseResult {
    let reason = sentinel("reason");
    h.with_rejected(reason.clone(), |x| {
        let promise2 = resolved_through_handler(h, Value::Promise(x.clone()));
        handle(&promise2);
        let reason = reason.clone();
        move || expect_rejected(&promise2, &reason)
    })
}

fn then_is_read_once(h: &Harness) -> CaseResult {
    let reads = Rc::new(Cell::new(0));
    let x = Value::object();
    let counter = reads.clone();
    x.define_getter(
        "then",
        JsFunction::from_closure("get then", move |_| {
            counter.set(counter.get() + 1);
            Ok(Value::function("then", |args| call(&args.arg(0), Value::Null)))
        }),
    );

    let promise2 = resolved_through_handler(h, x);
    h.settle()?;

    ensure(reads.get() == 1, format!("then was read {} times", reads.get()))?;
    expect_fulfilled(&promise2, &Value::Null)
}

fn then_getter_throws(h: &Harness) -> CaseResult {
    let error = sentinel("error");
    let x = Value::object();
    let thrown = error.clone();
    x.define_getter(
        "then",
        JsFunction::from_closure("get then", move |_| {
            Err(RuntimeError::throw(thrown.clone()))
        }),
    );

    let promise2 = resolved_through_handler(h, x);
    handle(&promise2);
    h.settle()?;

    expect_rejected(&promise2, &error)
}

fn then_receives_x(h: &Harness) -> CaseResult {
    let receiver = Capture::new();
    let seen = receiver.clone();
    let x = thenable(move |args| {
        seen.set(args.this().clone());
        call(&args.arg(0), Value::Null)
    });

    resolved_through_handler(h, x.clone());
    h.settle()?;

    receiver.expect("then receiver", &x)
}

fn resolve_promise_recurses(h: &Harness) -> CaseResult {
    let value = sentinel("value");
    let inner_value = value.clone();
    let inner = thenable(move |args| call(&args.arg(0), inner_value.clone()));
    let middle = thenable(move |args| call(&args.arg(0), inner.clone()));

    let promise2 = resolved_through_handler(h, middle);
    h.settle()?;

    expect_fulfilled(&promise2, &value)
}

fn resolve_promise_later(h: &Harness) -> CaseResult {
    let value = sentinel("value");
    let y = h.adapter().deferred();
    let y_promise = Value::Promise(y.promise.clone());
    let x = thenable(move |args| call(&args.arg(0), y_promise.clone()));

    let promise2 = resolved_through_handler(h, x);
    h.settle()?;
    ensure(promise2.is_pending(), "promise2 settled before y")?;

    let resolve = y.resolve.clone();
    let later_value = value.clone();
    h.later(move || resolve.resolve(later_value));
    h.settle()?;

    expect_fulfilled(&promise2, &value)
}

fn reject_promise_rejects(h: &Harness) -> CaseResult {
    let reason = sentinel("reason");
    let r = reason.clone();
    let promise2 = resolved_through_handler(h, thenable(move |args| call(&args.arg(1), r.clone())));
    handle(&promise2);
    h.settle()?;

    expect_rejected(&promise2, &reason)
}

fn reject_promise_keeps_thenable(h: &Harness) -> CaseResult {
    let unwrapped = Rc::new(Cell::new(false));
    let flag = unwrapped.clone();
    let reason = thenable(move |args| {
        flag.set(true);
        call(&args.arg(0), Value::Null)
    });
    let r = reason.clone();
    let promise2 = resolved_through_handler(h, thenable(move |args| call(&args.arg(1), r.clone())));
    handle(&promise2);
    h.settle()?;

    ensure(!unwrapped.get(), "rejection reason was treated as a thenable")?;
    expect_rejected(&promise2, &reason)
}

fn first_callback_wins(h: &Harness) -> CaseResult {
    let value = sentinel("value");
    let v = value.clone();
    let x = thenable(move |args| {
        call(&args.arg(0), v.clone())?;
        call(&args.arg(1), sentinel("reason"))
    });

    let promise2 = resolved_through_handler(h, x);
    h.settle()?;
    expect_fulfilled(&promise2, &value)?;

    let reason = sentinel("reason");
    let r = reason.clone();
    let x = thenable(move |args| {
        call(&args.arg(1), r.clone())?;
        call(&args.arg(0), sentinel("value"))
    });

    let promise2 = resolved_through_handler(h, x);
    handle(&promise2);
    h.settle()?;
    expect_rejected(&promise2, &reason)
}

fn repeated_callbacks_ignored(h: &Harness) -> CaseResult {
    let callbacks: Rc<RefCell<Option<(Value, Value)>>> = Rc::new(RefCell::new(None));
    let slot = callbacks.clone();
    let x = thenable(move |args| {
        *slot.borrow_mut() = Some((args.arg(0), args.arg(1)));
        Ok(Value::Undefined)
    });

    let promise2 = resolved_through_handler(h, x);
    h.settle()?;

    let Some((resolve, reject)) = callbacks.borrow_mut().take() else {
        return Err(CaseError::Failed("then was never called".into()));
    };
    let first = sentinel("first");
    call(&resolve, first.clone())?;
    call(&resolve, sentinel("second"))?;
    call(&reject, sentinel("reason"))?;
    h.settle()?;

    expect_fulfilled(&promise2, &first)
}

fn throw_after_callback_ignored(h: &Harness) -> CaseResult {
    let value = sentinel("value");
    let v = value.clone();
    let x = thenable(move |args| {
        call(&args.arg(0), v.clone())?;
        Err(RuntimeError::throw(sentinel("thrown")))
    });

    let promise2 = resolved_through_handler(h, x);
    h.settle()?;

    expect_fulfilled(&promise2, &value)
}

fn throw_before_callback_rejects(h: &Harness) -> CaseResult {
    let error = sentinel("thrown");
    let e = error.clone();
    let x = thenable(move |_| Err(RuntimeError::throw(e.clone())));

    let promise2 = resolved_through_handler(h, x);
    handle(&promise2);
    h.settle()?;

    expect_rejected(&promise2, &error)
}

fn non_callable_then_fulfills(h: &Harness) -> CaseResult {
    for then in [Value::Number(5.0), Value::object(), Value::Null, Value::string("then")] {
        let x = Value::object();
        x.set_property("then", then);

        let promise2 = resolved_through_handler(h, x.clone());
        h.settle()?;
        expect_fulfilled(&promise2, &x)?;
    }
    Ok(())
}

fn callable_thenable(h: &Harness) -> CaseResult {
    let value = sentinel("value");
    let x = Value::function("x", |_| Ok(Value::Undefined));
    let v = value.clone();
    x.set_property(
        "then",
        Value::function("then", move |args| call(&args.arg(0), v.clone())),
    );

    let promise2 = resolved_through_handler(h, x);
    h.settle()?;

    expect_fulfilled(&promise2, &value)
}

fn primitives_fulfill(h: &Harness) -> CaseResult {
    let primitives = [
        Value::Undefined,
        Value::Null,
        Value::Boolean(false),
        Value::Boolean(true),
        Value::Number(0.0),
        Value::Number(5.0),
        Value::string(""),
        Value::string("then"),
    ];

    for x in primitives {
        let promise2 = resolved_through_handler(h, x.clone());
        h.settle()?;
        expect_fulfilled(&promise2, &x)?;
    }
    Ok(())
}
