//! 2.2: the `then` method.

use pledge::{FunctionArgs, Promise, RuntimeError, Value};

use super::Case;
use crate::harness::{Capture, CaseResult, Harness, Recorder, ensure, ensure_eq, sentinel};

pub const CASES: &[Case] = &[
    Case::new("2.2.1.1", "non-function onFulfilled is ignored", non_function_on_fulfilled),
    Case::new("2.2.1.2", "non-function onRejected is ignored", non_function_on_rejected),
    Case::new("2.2.2.1", "onFulfilled receives the value", on_fulfilled_receives_value),
    Case::new("2.2.2.2", "onFulfilled waits for fulfillment", on_fulfilled_waits),
    Case::new("2.2.2.3", "onFulfilled runs at most once", on_fulfilled_runs_once),
    Case::new("2.2.3.1", "onRejected receives the reason", on_rejected_receives_reason),
    Case::new("2.2.3.2", "onRejected waits for rejection", on_rejected_waits),
    Case::new("2.2.3.3", "onRejected runs at most once", on_rejected_runs_once),
    Case::new("2.2.4", "handlers never run inside then", handlers_run_asynchronously),
    Case::new("2.2.4", "handler added inside a handler runs later", nested_then_runs_later),
    Case::new(
        "2.2.4",
        "handlers run after code that follows settlement",
        settlement_is_asynchronous,
    ),
    Case::new("2.2.4", "handlers queue behind earlier host jobs", handlers_queue_behind_jobs),
    Case::new("2.2.5", "handlers are called without a receiver", handlers_have_no_receiver),
    Case::new("2.2.6.1", "fulfillment handlers run in order", fulfilled_handlers_in_order),
    Case::new(
        "2.2.6.1",
        "a throwing handler does not stop the others",
        throwing_handler_is_isolated,
    ),
    Case::new("2.2.6.1", "branches keep their own results", branches_are_independent),
    Case::new("2.2.6.2", "rejection handlers run in order", rejected_handlers_in_order),
    Case::new("2.2.7", "then returns a new promise", then_returns_new_promise),
    Case::new("2.2.7.1", "handler result fulfills promise2", handler_result_fulfills),
    Case::new("2.2.7.2", "onFulfilled throw rejects promise2", fulfilled_throw_rejects),
    Case::new("2.2.7.2", "onRejected throw rejects promise2", rejected_throw_rejects),
    Case::new("2.2.7.3", "missing onFulfilled passes the value", missing_on_fulfilled_passes_value),
    Case::new("2.2.7.4", "missing onRejected passes the reason", missing_on_rejected_passes_reason),
];

const NON_FUNCTIONS: [Value; 4] = [
    Value::Undefined,
    Value::Null,
    Value::Boolean(false),
    Value::Number(5.0),
];

fn non_function_on_fulfilled(h: &Harness) -> CaseResult {
    for candidate in NON_FUNCTIONS.into_iter().chain([Value::object()]) {
        let calls = Recorder::new();
        h.adapter()
            .rejected(sentinel("reason"))
            .then(Some(candidate.clone()), Some(calls.handler("rejected")));
        h.settle()?;
        calls.expect(&["rejected"])?;
    }
    Ok(())
}

fn non_function_on_rejected(h: &Harness) -> CaseResult {
    for candidate in NON_FUNCTIONS.into_iter().chain([Value::object()]) {
        let calls = Recorder::new();
        h.adapter()
            .resolved(sentinel("value"))
            .then(Some(calls.handler("fulfilled")), Some(candidate.clone()));
        h.settle()?;
        calls.expect(&["fulfilled"])?;
    }
    Ok(())
}

fn on_fulfilled_receives_value(h: &Harness) -> CaseResult {
    let value = sentinel("value");
    h.with_fulfilled(value.clone(), |promise| {
        let seen = Capture::new();
        promise.then(Some(seen.handler()), None);
        let value = value.clone();
        move || seen.expect("fulfillment value", &value)
    })
}

fn on_fulfilled_waits(h: &Harness) -> CaseResult {
    let deferred = h.adapter().deferred();
    let calls = Recorder::new();
    deferred.promise.then(Some(calls.handler("fulfilled")), None);

    h.settle()?;
    calls.expect(&[])?;

    deferred.resolve.resolve(Value::Null);
    h.settle()?;
    calls.expect(&["fulfilled"])
}

fn on_fulfilled_runs_once(h: &Harness) -> CaseResult {
    let deferred = h.adapter().deferred();
    let calls = Recorder::new();
    deferred.promise.then(Some(calls.handler("fulfilled")), None);

    deferred.resolve.resolve(Value::Null);
    deferred.resolve.resolve(Value::Null);
    let resolve = deferred.resolve.clone();
    h.later(move || resolve.resolve(Value::Null));
    h.settle()?;
    h.settle()?;

    calls.expect(&["fulfilled"])
}

fn on_rejected_receives_reason(h: &Harness) -> CaseResult {
    let reason = sentinel("reason");
    h.with_rejected(reason.clone(), |promise| {
        let seen = Capture::new();
        promise.then(None, Some(seen.handler()));
        let reason = reason.clone();
        move || seen.expect("rejection reason", &reason)
    })
}

fn on_rejected_waits(h: &Harness) -> CaseResult {
    let deferred = h.adapter().deferred();
    let calls = Recorder::new();
    deferred.promise.then(None, Some(calls.handler("rejected")));

    h.settle()?;
    calls.expect(&[])?;

    deferred.reject.reject(Value::Null);
    h.settle()?;
    calls.expect(&["rejected"])
}

fn on_rejected_runs_once(h: &Harness) -> CaseResult {
    let deferred = h.adapter().deferred();
    let calls = Recorder::new();
    deferred.promise.then(None, Some(calls.handler("rejected")));

    deferred.reject.reject(Value::Null);
    deferred.reject.reject(Value::Null);
    deferred.resolve.resolve(Value::Null);
    h.settle()?;
    h.settle()?;

    calls.expect(&["rejected"])
}

fn handlers_run_asynchronously(h: &Harness) -> CaseResult {
    h.with_fulfilled(Value::Null, |promise| {
        let calls = Recorder::new();
        promise.then(Some(calls.handler("fulfilled")), None);
        let ran_inside_then = calls.len();
        calls.push("after then");
        move || {
            ensure(ran_inside_then == 0, "handler ran inside then")?;
            calls.expect(&["after then", "fulfilled"])
        }
    })?;

    h.with_rejected(Value::Null, |promise| {
        let calls = Recorder::new();
        promise.then(None, Some(calls.handler("rejected")));
        calls.push("after then");
        move || calls.expect(&["after then", "rejected"])
    })
}

fn nested_then_runs_later(h: &Harness) -> CaseResult {
    let promise = h.adapter().resolved(Value::Null);
    let calls = Recorder::new();

    let outer_calls = calls.clone();
    let inner_promise = promise.clone();
    promise.then_with(move |_| {
        inner_promise.then(Some(outer_calls.handler("inner")), None);
        outer_calls.push("outer done");
        Ok(Value::Undefined)
    });
    h.settle()?;

    calls.expect(&["outer done", "inner"])
}

fn settlement_is_asynchronous(h: &Harness) -> CaseResult {
    let deferred = h.adapter().deferred();
    let calls = Recorder::new();
    deferred.promise.then(Some(calls.handler("fulfilled")), None);

    deferred.resolve.resolve(Value::Null);
    calls.push("after resolve");
    h.settle()?;

    calls.expect(&["after resolve", "fulfilled"])
}

fn handlers_queue_behind_jobs(h: &Harness) -> CaseResult {
    let calls = Recorder::new();
    let job = calls.clone();
    h.context().queue_microtask(move || job.push("job"));
    h.adapter()
        .resolved(Value::Null)
        .then(Some(calls.handler("fulfilled")), None);
    calls.push("sync");
    h.settle()?;

    calls.expect(&["sync", "job", "fulfilled"])
}

fn handlers_have_no_receiver(h: &Harness) -> CaseResult {
    let receivers = Capture::new();
    let handler = {
        let receivers = receivers.clone();
        Value::function("receiver", move |args: FunctionArgs| {
            receivers.set(args.this().clone());
            Ok(Value::Undefined)
        })
    };

    h.adapter().resolved(Value::Null).then(Some(handler.clone()), None);
    h.settle()?;
    receivers.expect("onFulfilled receiver", &Value::Undefined)?;

    receivers.set(Value::Null);
    h.adapter().rejected(Value::Null).then(None, Some(handler));
    h.settle()?;
    receivers.expect("onRejected receiver", &Value::Undefined)
}

fn fulfilled_handlers_in_order(h: &Harness) -> CaseResult {
    h.with_fulfilled(sentinel("value"), |promise| {
        let calls = Recorder::new();
        for label in ["first", "second", "third"] {
            promise.then(Some(calls.handler(label)), Some(calls.handler("rejected")));
        }
        move || calls.expect(&["first", "second", "third"])
    })
}

fn throwing_handler_is_isolated(h: &Harness) -> CaseResult {
    h.with_fulfilled(Value::Null, |promise| {
        let calls = Recorder::new();
        promise.then(Some(calls.handler("first")), None);
        let throwing = promise.then_with(|_| Err(RuntimeError::throw(sentinel("thrown"))));
        promise.then(Some(calls.handler("third")), None);
        throwing.catch(Value::function("ignore", |_| Ok(Value::Undefined)));
        move || calls.expect(&["first", "third"])
    })
}

fn branches_are_independent(h: &Harness) -> CaseResult {
    let source = h.adapter().resolved(Value::Number(1.0));
    let plus = source.then_with(|v| Ok(Value::Number(v.to_number() + 1.0)));
    let times = source.then_with(|v| Ok(Value::Number(v.to_number() * 10.0)));
    let failing = source.then_with(|_| Err(RuntimeError::throw("branch failed")));
    failing.catch(Value::function("ignore", |_| Ok(Value::Undefined)));
    h.settle()?;

    ensure_eq("first branch", &value_of(&plus), &Value::Number(2.0))?;
    ensure_eq("second branch", &value_of(&times), &Value::Number(10.0))?;
    ensure(failing.is_rejected(), "third branch should be rejected")
}

fn rejected_handlers_in_order(h: &Harness) -> CaseResult {
    h.with_rejected(sentinel("reason"), |promise| {
        let calls = Recorder::new();
        for label in ["first", "second", "third"] {
            promise.then(Some(calls.handler("fulfilled")), Some(calls.handler(label)));
        }
        move || calls.expect(&["first", "second", "third"])
    })
}

fn then_returns_new_promise(h: &Harness) -> CaseResult {
    let promise = h.adapter().deferred().promise;
    let derived = promise.then(None, None);
    ensure(!derived.ptr_eq(&promise), "then returned the same promise")?;
    ensure(derived.is_pending(), "derived promise should start pending")
}

fn handler_result_fulfills(h: &Harness) -> CaseResult {
    let result = sentinel("result");

    let from_fulfilled = {
        let result = result.clone();
        h.adapter()
            .resolved(Value::Null)
            .then_with(move |_| Ok(result.clone()))
    };
    let from_rejected = {
        let result = result.clone();
        h.adapter()
            .rejected(Value::Null)
            .catch_with(move |_| Ok(result.clone()))
    };
    h.settle()?;

    ensure_eq("after onFulfilled", &value_of(&from_fulfilled), &result)?;
    ensure_eq("after onRejected", &value_of(&from_rejected), &result)
}

fn fulfilled_throw_rejects(h: &Harness) -> CaseResult {
    let thrown = sentinel("thrown");
    h.with_fulfilled(Value::Null, |promise| {
        let error = thrown.clone();
        let derived = promise.then_with(move |_| Err(RuntimeError::throw(error.clone())));
        let seen = Capture::new();
        derived.then(None, Some(seen.handler()));
        let thrown = thrown.clone();
        move || seen.expect("promise2 reason", &thrown)
    })
}

fn rejected_throw_rejects(h: &Harness) -> CaseResult {
    let thrown = sentinel("thrown");
    h.with_rejected(Value::Null, |promise| {
        let error = thrown.clone();
        let derived = promise.catch_with(move |_| Err(RuntimeError::throw(error.clone())));
        let seen = Capture::new();
        derived.then(None, Some(seen.handler()));
        let thrown = thrown.clone();
        move || seen.expect("promise2 reason", &thrown)
    })
}

fn missing_on_fulfilled_passes_value(h: &Harness) -> CaseResult {
    let value = sentinel("value");
    h.with_fulfilled(value.clone(), |promise| {
        let seen = Capture::new();
        promise
            .then(Some(Value::string("not a function")), None)
            .then(Some(seen.handler()), None);
        let value = value.clone();
        move || seen.expect("promise2 value", &value)
    })
}

fn missing_on_rejected_passes_reason(h: &Harness) -> CaseResult {
    let reason = sentinel("reason");
    let thenable_reason = {
        let object = Value::object();
        object.set_property(
            "then",
            Value::function("then", |_| Ok(Value::Undefined)),
        );
        object
    };

    for expected in [reason, thenable_reason] {
        h.with_rejected(expected.clone(), |promise| {
            let seen = Capture::new();
            promise
                .then(Some(Value::function("fulfilled", |_| Ok(Value::Undefined))), None)
                .then(None, Some(seen.handler()));
            let expected = expected.clone();
            move || seen.expect("promise2 reason", &expected)
        })?;
    }
    Ok(())
}

fn value_of(promise: &Promise) -> Value {
    promise.value().unwrap_or(Value::Undefined)
}
