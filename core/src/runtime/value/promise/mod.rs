mod resolution;
mod state;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::embedding::FunctionArgs;
use crate::errors::{INVALID_RESOLVER, RuntimeError};
use crate::runtime::event_loop::{Microtask, RejectionOperation, SchedulerRef};
use crate::runtime::value::{JsFunction, JsValue};

pub use resolution::{Latch, Thenable, probe};
pub use state::PromiseState;

pub(crate) use resolution::resolve_into;

/// One `then` registration: both handlers plus the promise their result
/// settles. Missing handlers pass the settlement through unchanged.
#[derive(Debug, Clone)]
pub struct PromiseReaction {
    pub on_fulfilled: Option<JsFunction>,
    pub on_rejected: Option<JsFunction>,
    pub next: Promise,
}

impl PromiseReaction {
    pub(crate) fn run(self, is_reject: bool, value: JsValue) {
        let handler = if is_reject {
            self.on_rejected
        } else {
            self.on_fulfilled
        };

        match handler {
            Some(handler) => match handler.call(FunctionArgs::call(vec![value])) {
                Ok(result) => resolve_into(&self.next, result),
                Err(err) => {
                    log::trace!("reaction handler `{}` failed: {err}", handler.name());
                    self.next.settle(true, err.into_value());
                }
            },
            None if is_reject => self.next.settle(true, value),
            None => resolve_into(&self.next, value),
        }
    }
}

#[derive(Debug)]
pub struct JsPromise {
    pub state: PromiseState,
    pub reactions: Vec<PromiseReaction>,
    pub is_handled: bool,
}

impl JsPromise {
    pub fn pending() -> Self {
        Self {
            state: PromiseState::Pending,
            reactions: Vec::new(),
            is_handled: false,
        }
    }
}

struct PromiseCell {
    record: RefCell<JsPromise>,
    scheduler: SchedulerRef,
}

/// Shared handle to a promise record. Cloning yields another handle to the
/// same promise.
#[derive(Clone)]
pub struct Promise {
    inner: Rc<PromiseCell>,
}

impl Promise {
    /// A bare pending promise; only crate internals can settle it.
    pub(crate) fn pending(scheduler: &SchedulerRef) -> Self {
        Self {
            inner: Rc::new(PromiseCell {
                record: RefCell::new(JsPromise::pending()),
                scheduler: Rc::clone(scheduler),
            }),
        }
    }

    /// Creates a promise and runs `executor` synchronously with its resolving
    /// functions. An `Err` from the executor rejects the promise.
    pub fn new<F>(scheduler: &SchedulerRef, executor: F) -> Self
    where
        F: FnOnce(Resolve, Reject) -> Result<(), RuntimeError>,
    {
        let (promise, resolve, reject) = Self::with_resolvers(scheduler);

        if let Err(err) = executor(resolve, reject.clone()) {
            log::debug!("promise executor failed: {err}");
            reject.reject(err.into_value());
        }
        promise
    }

    /// A pending promise and the resolving functions that settle it.
    pub fn with_resolvers(scheduler: &SchedulerRef) -> (Self, Resolve, Reject) {
        let promise = Self::pending(scheduler);
        let latch = Latch::new();
        let resolve = Resolve {
            promise: promise.clone(),
            already_resolved: latch.clone(),
        };
        let reject = Reject {
            promise: promise.clone(),
            already_resolved: latch,
        };
        (promise, resolve, reject)
    }

    /// Dynamic constructor: `executor` must be callable.
    pub fn construct(scheduler: &SchedulerRef, executor: &JsValue) -> Result<Self, RuntimeError> {
        let Some(executor) = executor.as_function().cloned() else {
            return Err(RuntimeError::TypeError {
                message: INVALID_RESOLVER.to_string(),
            });
        };

        Ok(Self::new(scheduler, move |resolve, reject| {
            executor
                .call(FunctionArgs::call(vec![resolve.into(), reject.into()]))
                .map(drop)
        }))
    }

    /// A promise resolved with `value`; thenables are adopted.
    pub fn resolve(scheduler: &SchedulerRef, value: JsValue) -> Self {
        Self::new(scheduler, |resolve, _| {
            resolve.resolve(value);
            Ok(())
        })
    }

    /// A promise rejected with `reason`, verbatim.
    pub fn reject(scheduler: &SchedulerRef, reason: JsValue) -> Self {
        Self::new(scheduler, |_, reject| {
            reject.reject(reason);
            Ok(())
        })
    }

    /// Registers handlers and returns the derived promise. Handlers that are
    /// not callable are ignored. Handlers never run before this call returns.
    pub fn then(&self, on_fulfilled: Option<JsValue>, on_rejected: Option<JsValue>) -> Promise {
        self.then_functions(
            Self::normalize_handler(on_fulfilled),
            Self::normalize_handler(on_rejected),
        )
    }

    pub fn catch(&self, on_rejected: JsValue) -> Promise {
        self.then(None, Some(on_rejected))
    }

    pub fn then_with<F>(&self, on_fulfilled: F) -> Promise
    where
        F: Fn(JsValue) -> Result<JsValue, RuntimeError> + 'static,
    {
        let handler =
            JsFunction::from_closure("onFulfilled", move |args| on_fulfilled(args.arg(0)));
        self.then_functions(Some(handler), None)
    }

    pub fn catch_with<F>(&self, on_rejected: F) -> Promise
    where
        F: Fn(JsValue) -> Result<JsValue, RuntimeError> + 'static,
    {
        let handler = JsFunction::from_closure("onRejected", move |args| on_rejected(args.arg(0)));
        self.then_functions(None, Some(handler))
    }

    fn then_functions(
        &self,
        on_fulfilled: Option<JsFunction>,
        on_rejected: Option<JsFunction>,
    ) -> Promise {
        let next = Promise::pending(&self.inner.scheduler);
        let reaction = PromiseReaction {
            on_fulfilled,
            on_rejected,
            next: next.clone(),
        };

        self.mark_handled();
        let settled = match &self.inner.record.borrow().state {
            PromiseState::Pending => None,
            PromiseState::Fulfilled(value) => Some((false, value.clone())),
            PromiseState::Rejected(reason) => Some((true, reason.clone())),
        };

        match settled {
            None => self.inner.record.borrow_mut().reactions.push(reaction),
            Some((is_reject, value)) => {
                self.inner
                    .scheduler
                    .enqueue_microtask(Microtask::PromiseReactions {
                        reactions: vec![reaction],
                        is_reject,
                        value,
                    });
            }
        }

        next
    }

    /// Moves a pending promise to its final state and schedules its queued
    /// reactions. Does nothing once the promise has settled.
    pub(crate) fn settle(&self, is_reject: bool, value: JsValue) {
        let (reactions, is_handled) = {
            let mut record = self.inner.record.borrow_mut();
            if !record.state.is_pending() {
                log::trace!(
                    "ignoring settlement of already {} promise {:p}",
                    record.state.label(),
                    Rc::as_ptr(&self.inner)
                );
                return;
            }
            record.state = if is_reject {
                PromiseState::Rejected(value.clone())
            } else {
                PromiseState::Fulfilled(value.clone())
            };
            (std::mem::take(&mut record.reactions), record.is_handled)
        };

        log::debug!(
            "promise {:p} {} with {} queued reaction(s)",
            Rc::as_ptr(&self.inner),
            if is_reject { "rejected" } else { "fulfilled" },
            reactions.len()
        );

        if is_reject && !is_handled {
            self.inner
                .scheduler
                .track_rejection(self, RejectionOperation::Reject);
        }

        if !reactions.is_empty() {
            self.inner
                .scheduler
                .enqueue_microtask(Microtask::PromiseReactions {
                    reactions,
                    is_reject,
                    value,
                });
        }
    }

    pub(crate) fn mark_handled(&self) {
        let newly_handled_rejection = {
            let mut record = self.inner.record.borrow_mut();
            let was_handled = std::mem::replace(&mut record.is_handled, true);
            !was_handled && matches!(record.state, PromiseState::Rejected(_))
        };

        if newly_handled_rejection {
            self.inner
                .scheduler
                .track_rejection(self, RejectionOperation::Handle);
        }
    }

    pub(crate) fn is_handled(&self) -> bool {
        self.inner.record.borrow().is_handled
    }

    /// `then` and `catch` as callable members, so duck-typed callers see an
    /// ordinary thenable.
    pub(crate) fn method(&self, key: &str) -> JsValue {
        let promise = self.clone();
        match key {
            "then" => JsValue::function("then", move |args| {
                Ok(JsValue::Promise(
                    promise.then(args.get(0).cloned(), args.get(1).cloned()),
                ))
            }),
            "catch" => JsValue::function("catch", move |args| {
                Ok(JsValue::Promise(promise.then(None, args.get(0).cloned())))
            }),
            _ => JsValue::Undefined,
        }
    }

    pub fn state(&self) -> PromiseState {
        self.inner.record.borrow().state.clone()
    }

    pub fn is_pending(&self) -> bool {
        self.inner.record.borrow().state.is_pending()
    }

    pub fn is_fulfilled(&self) -> bool {
        matches!(self.inner.record.borrow().state, PromiseState::Fulfilled(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self.inner.record.borrow().state, PromiseState::Rejected(_))
    }

    pub fn value(&self) -> Option<JsValue> {
        match &self.inner.record.borrow().state {
            PromiseState::Fulfilled(value) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn reason(&self) -> Option<JsValue> {
        match &self.inner.record.borrow().state {
            PromiseState::Rejected(reason) => Some(reason.clone()),
            _ => None,
        }
    }

    pub fn scheduler(&self) -> &SchedulerRef {
        &self.inner.scheduler
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn normalize_handler(handler: Option<JsValue>) -> Option<JsFunction> {
        handler.and_then(|value| value.as_function().cloned())
    }
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.record.try_borrow() {
            Ok(record) => f
                .debug_struct("Promise")
                .field("state", &record.state.label())
                .field("reactions", &record.reactions.len())
                .finish(),
            Err(_) => f.write_str("Promise { <borrowed> }"),
        }
    }
}

/// The fulfilling half of a promise's resolving functions.
#[derive(Clone)]
pub struct Resolve {
    promise: Promise,
    already_resolved: Latch,
}

impl Resolve {
    /// Resolves the promise with `value`, adopting it if it is a thenable.
    /// Only the first call on either resolving function has any effect.
    pub fn resolve(&self, value: JsValue) {
        if self.already_resolved.fire() {
            resolve_into(&self.promise, value);
        }
    }

    pub fn to_function(&self) -> JsFunction {
        let this = self.clone();
        JsFunction::from_closure("resolve", move |args| {
            this.resolve(args.arg(0));
            Ok(JsValue::Undefined)
        })
    }
}

impl From<Resolve> for JsValue {
    fn from(resolve: Resolve) -> Self {
        JsValue::Function(resolve.to_function())
    }
}

impl fmt::Debug for Resolve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolve")
            .field("already_resolved", &self.already_resolved.is_fired())
            .finish()
    }
}

/// The rejecting half of a promise's resolving functions.
#[derive(Clone)]
pub struct Reject {
    promise: Promise,
    already_resolved: Latch,
}

impl Reject {
    pub fn reject(&self, reason: JsValue) {
        if self.already_resolved.fire() {
            self.promise.settle(true, reason);
        }
    }

    pub fn to_function(&self) -> JsFunction {
        let this = self.clone();
        JsFunction::from_closure("reject", move |args| {
            this.reject(args.arg(0));
            Ok(JsValue::Undefined)
        })
    }
}

impl From<Reject> for JsValue {
    fn from(reject: Reject) -> Self {
        JsValue::Function(reject.to_function())
    }
}

impl fmt::Debug for Reject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reject")
            .field("already_resolved", &self.already_resolved.is_fired())
            .finish()
    }
}
