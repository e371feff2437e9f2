//! The promise resolution procedure.
//!
//! Every value headed for a promise's fulfilled state passes through
//! [`resolve_into`]: from a resolving function, from a reaction handler's
//! return value, or from a thenable reporting back. Thenables are adopted
//! recursively; anything else settles the target directly.

use std::cell::Cell;
use std::rc::Rc;

use super::Promise;
use crate::embedding::FunctionArgs;
use crate::errors::{CHAINING_CYCLE, RuntimeError};
use crate::runtime::value::{JsFunction, JsValue};

/// Outcome of probing a candidate for a callable `then` member.
#[derive(Debug, Clone)]
pub enum Thenable {
    Plain,
    Callable(JsFunction),
}

/// One-shot flag shared between callbacks handed to untrusted code.
#[derive(Debug, Clone, Default)]
pub struct Latch(Rc<Cell<bool>>);

impl Latch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` exactly once: for the first caller.
    pub fn fire(&self) -> bool {
        !self.0.replace(true)
    }

    pub fn is_fired(&self) -> bool {
        self.0.get()
    }
}

/// Reads `then` from `candidate` once. Getter failures are returned as-is.
pub fn probe(candidate: &JsValue) -> Result<Thenable, RuntimeError> {
    if !candidate.is_object_like() {
        return Ok(Thenable::Plain);
    }

    match candidate.get_property("then")? {
        JsValue::Function(then) => Ok(Thenable::Callable(then)),
        _ => Ok(Thenable::Plain),
    }
}

pub(crate) fn resolve_into(target: &Promise, candidate: JsValue) {
    if let JsValue::Promise(promise) = &candidate
        && promise.ptr_eq(target)
    {
        log::debug!("chaining cycle: promise resolved with itself");
        target.settle(true, JsValue::type_error(CHAINING_CYCLE));
        return;
    }

    match probe(&candidate) {
        Ok(Thenable::Plain) => target.settle(false, candidate),
        Ok(Thenable::Callable(then)) => adopt(target, candidate, &then),
        Err(err) => {
            log::trace!("reading `then` failed: {err}");
            target.settle(true, err.into_value());
        }
    }
}

fn adopt(target: &Promise, thenable: JsValue, then: &JsFunction) {
    let latch = Latch::new();

    let on_fulfilled = {
        let target = target.clone();
        let latch = latch.clone();
        JsFunction::from_closure("resolvePromise", move |args| {
            if latch.fire() {
                resolve_into(&target, args.arg(0));
            }
            Ok(JsValue::Undefined)
        })
    };
    let on_rejected = {
        let target = target.clone();
        let latch = latch.clone();
        JsFunction::from_closure("rejectPromise", move |args| {
            if latch.fire() {
                target.settle(true, args.arg(0));
            }
            Ok(JsValue::Undefined)
        })
    };

    let args = FunctionArgs::new(thenable, vec![on_fulfilled.into(), on_rejected.into()]);
    if let Err(err) = then.call(args) {
        if latch.fire() {
            target.settle(true, err.into_value());
        } else {
            log::trace!("ignoring failure from `then` after it reported: {err}");
        }
    }
}
