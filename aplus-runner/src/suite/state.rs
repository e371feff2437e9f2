//! 2.1: promise states.

use pledge::Value;

use super::Case;
use crate::harness::{CaseResult, Harness, Recorder, ensure, ensure_eq, sentinel};

pub const CASES: &[Case] = &[
    Case::new("2.1.1", "pending promise may become fulfilled", pending_may_fulfill),
    Case::new("2.1.1", "pending promise may become rejected", pending_may_reject),
    Case::new("2.1.2.1", "fulfilled then rejected immediately", fulfilled_then_rejected),
    Case::new("2.1.2.1", "fulfilled then rejected later", fulfilled_then_rejected_later),
    Case::new("2.1.2.2", "fulfillment value never changes", fulfillment_value_is_stable),
    Case::new("2.1.3.1", "rejected then fulfilled immediately", rejected_then_fulfilled),
    Case::new("2.1.3.1", "rejected then fulfilled later", rejected_then_fulfilled_later),
    Case::new("2.1.3.2", "rejection reason never changes", rejection_reason_is_stable),
];

fn pending_may_fulfill(h: &Harness) -> CaseResult {
    let deferred = h.adapter().deferred();
    h.settle()?;
    ensure(deferred.promise.is_pending(), "deferred should start pending")?;

    deferred.resolve.resolve(Value::Number(1.0));
    ensure(deferred.promise.is_fulfilled(), "promise should be fulfilled")
}

fn pending_may_reject(h: &Harness) -> CaseResult {
    let deferred = h.adapter().deferred();
    let calls = Recorder::new();
    deferred.promise.then(None, Some(calls.handler("rejected")));

    deferred.reject.reject(Value::Number(1.0));
    h.settle()?;

    ensure(deferred.promise.is_rejected(), "promise should be rejected")?;
    calls.expect(&["rejected"])
}

fn fulfilled_then_rejected(h: &Harness) -> CaseResult {
    let deferred = h.adapter().deferred();
    let calls = Recorder::new();
    deferred.promise.then(
        Some(calls.handler("fulfilled")),
        Some(calls.handler("rejected")),
    );

    deferred.resolve.resolve(sentinel("value"));
    deferred.reject.reject(sentinel("reason"));
    h.settle()?;

    calls.expect(&["fulfilled"])
}

fn fulfilled_then_rejected_later(h: &Harness) -> CaseResult {
    let deferred = h.adapter().deferred();
    let calls = Recorder::new();
    deferred.promise.then(
        Some(calls.handler("fulfilled")),
        Some(calls.handler("rejected")),
    );

    deferred.resolve.resolve(sentinel("value"));
    let reject = deferred.reject.clone();
    h.later(move || reject.reject(sentinel("reason")));
    h.settle()?;

    calls.expect(&["fulfilled"])
}

fn fulfillment_value_is_stable(h: &Harness) -> CaseResult {
    let deferred = h.adapter().deferred();
    let first = sentinel("first");

    deferred.resolve.resolve(first.clone());
    deferred.resolve.resolve(sentinel("second"));
    let resolve = deferred.resolve.clone();
    h.later(move || resolve.resolve(sentinel("third")));
    h.settle()?;

    let value = deferred.promise.value().unwrap_or(Value::Undefined);
    ensure_eq("fulfillment value", &value, &first)
}

fn rejected_then_fulfilled(h: &Harness) -> CaseResult {
    let deferred = h.adapter().deferred();
    let calls = Recorder::new();
    deferred.promise.then(
        Some(calls.handler("fulfilled")),
        Some(calls.handler("rejected")),
    );

    deferred.reject.reject(sentinel("reason"));
    deferred.resolve.resolve(sentinel("value"));
    h.settle()?;

    calls.expect(&["rejected"])
}

fn rejected_then_fulfilled_later(h: &Harness) -> CaseResult {
    let deferred = h.adapter().deferred();
    let calls = Recorder::new();
    deferred.promise.then(
        Some(calls.handler("fulfilled")),
        Some(calls.handler("rejected")),
    );

    deferred.reject.reject(sentinel("reason"));
    let resolve = deferred.resolve.clone();
    h.later(move || resolve.resolve(sentinel("value")));
    h.settle()?;

    calls.expect(&["rejected"])
}

fn rejection_reason_is_stable(h: &Harness) -> CaseResult {
    let deferred = h.adapter().deferred();
    let first = sentinel("first");
    deferred.promise.catch(Value::function("ignore", |_| Ok(Value::Undefined)));

    deferred.reject.reject(first.clone());
    deferred.reject.reject(sentinel("second"));
    deferred.resolve.resolve(sentinel("third"));
    h.settle()?;

    let reason = deferred.promise.reason().unwrap_or(Value::Undefined);
    ensure_eq("rejection reason", &reason, &first)
}
