use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use pledge::{Adapter, Context, Engine, Promise, RuntimeError, Value};

/// Why a case did not pass.
#[derive(Debug, Clone, PartialEq)]
pub enum CaseError {
    Failed(String),
    Skipped(String),
}

pub type CaseResult = Result<(), CaseError>;

impl From<RuntimeError> for CaseError {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::MicrotaskLimitExceeded { limit } => {
                CaseError::Skipped(format!("needs more than {limit} microtasks"))
            }
            other => CaseError::Failed(other.to_string()),
        }
    }
}

impl fmt::Display for CaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseError::Failed(reason) | CaseError::Skipped(reason) => f.write_str(reason),
        }
    }
}

pub fn ensure(condition: bool, message: impl Into<String>) -> CaseResult {
    if condition {
        Ok(())
    } else {
        Err(CaseError::Failed(message.into()))
    }
}

pub fn ensure_eq(what: &str, actual: &Value, expected: &Value) -> CaseResult {
    ensure(
        actual == expected,
        format!("{what}: expected {expected}, got {actual}"),
    )
}

/// How the promise under test reaches its final state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timing {
    Already,
    Immediately,
    Eventually,
}

impl Timing {
    pub const ALL: [Timing; 3] = [Timing::Already, Timing::Immediately, Timing::Eventually];

    pub fn label(self) -> &'static str {
        match self {
            Timing::Already => "already settled",
            Timing::Immediately => "settled immediately",
            Timing::Eventually => "settled eventually",
        }
    }
}

/// One fresh event loop plus the adapter every case drives.
pub struct Harness {
    context: Context,
    adapter: Adapter,
}

impl Harness {
    pub fn new(engine: &Engine) -> Self {
        let context = engine.new_context();
        let adapter = Adapter::new(&context);
        Self { context, adapter }
    }

    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Lets all queued work run.
    pub fn settle(&self) -> CaseResult {
        self.context.run_microtasks()?;
        Ok(())
    }

    /// Runs `job` after the work queued so far, and after whatever that
    /// work queues in turn.
    pub fn later<F>(&self, job: F)
    where
        F: FnOnce() + 'static,
    {
        let scheduler = self.context.scheduler().clone();
        self.context.queue_microtask(move || {
            let job = Cell::new(Some(job));
            let _ = Promise::resolve(&scheduler, Value::Undefined).then_with(move |_| {
                if let Some(job) = job.take() {
                    job();
                }
                Ok(Value::Undefined)
            });
        });
    }

    /// Runs `setup` against a promise fulfilled with `value` in each of the
    /// three timings, then checks the returned verifier once work settles.
    pub fn with_fulfilled<S, V>(&self, value: Value, setup: S) -> CaseResult
    where
        S: Fn(&Promise) -> V,
        V: FnOnce() -> CaseResult,
    {
        self.with_settled(false, value, setup)
    }

    pub fn with_rejected<S, V>(&self, reason: Value, setup: S) -> CaseResult
    where
        S: Fn(&Promise) -> V,
        V: FnOnce() -> CaseResult,
    {
        self.with_settled(true, reason, setup)
    }

    fn with_settled<S, V>(&self, is_reject: bool, value: Value, setup: S) -> CaseResult
    where
        S: Fn(&Promise) -> V,
        V: FnOnce() -> CaseResult,
    {
        for timing in Timing::ALL {
            let verify = match timing {
                Timing::Already => {
                    let promise = if is_reject {
                        self.adapter.rejected(value.clone())
                    } else {
                        self.adapter.resolved(value.clone())
                    };
                    setup(&promise)
                }
                Timing::Immediately => {
                    let deferred = self.adapter.deferred();
                    let verify = setup(&deferred.promise);
                    if is_reject {
                        deferred.reject.reject(value.clone());
                    } else {
                        deferred.resolve.resolve(value.clone());
                    }
                    verify
                }
                Timing::Eventually => {
                    let deferred = self.adapter.deferred();
                    let verify = setup(&deferred.promise);
                    let value = value.clone();
                    self.later(move || {
                        if is_reject {
                            deferred.reject.reject(value);
                        } else {
                            deferred.resolve.resolve(value);
                        }
                    });
                    verify
                }
            };

            self.settle()?;
            verify().map_err(|err| match err {
                CaseError::Failed(reason) => {
                    CaseError::Failed(format!("{}: {reason}", timing.label()))
                }
                skipped => skipped,
            })?;
        }
        Ok(())
    }
}

/// Ordered log of handler calls.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    entries: Rc<RefCell<Vec<String>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.entries.borrow_mut().push(entry.into());
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }

    /// Handler that logs `label` and returns `undefined`.
    pub fn handler(&self, label: &'static str) -> Value {
        let recorder = self.clone();
        Value::function(label, move |_| {
            recorder.push(label);
            Ok(Value::Undefined)
        })
    }

    pub fn expect(&self, expected: &[&str]) -> CaseResult {
        let entries = self.entries();
        ensure(
            entries == expected,
            format!("expected calls {expected:?}, got {entries:?}"),
        )
    }
}

/// Holds the last value a handler saw.
#[derive(Debug, Clone, Default)]
pub struct Capture {
    slot: Rc<RefCell<Option<Value>>>,
}

impl Capture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, value: Value) {
        *self.slot.borrow_mut() = Some(value);
    }

    pub fn get(&self) -> Option<Value> {
        self.slot.borrow().clone()
    }

    /// Handler that stores its first argument.
    pub fn handler(&self) -> Value {
        let capture = self.clone();
        Value::function("capture", move |args| {
            capture.set(args.arg(0));
            Ok(Value::Undefined)
        })
    }

    pub fn expect(&self, what: &str, expected: &Value) -> CaseResult {
        match self.get() {
            Some(actual) => ensure_eq(what, &actual, expected),
            None => Err(CaseError::Failed(format!("{what}: handler was never called"))),
        }
    }
}

/// A sentinel object, unique by identity.
pub fn sentinel(label: &str) -> Value {
    let object = Value::object();
    object.set_property("sentinel", Value::string(label));
    object
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_fulfilled_runs_every_timing() {
        let harness = Harness::new(&Engine::new());
        let runs = Recorder::new();

        let result = harness.with_fulfilled(Value::Number(1.0), |promise| {
            let seen = Capture::new();
            promise.then(Some(seen.handler()), None);
            runs.push("setup");
            move || seen.expect("value", &Value::Number(1.0))
        });

        assert_eq!(result, Ok(()));
        assert_eq!(runs.len(), 3);
    }

    #[test]
    fn test_failures_name_the_timing() {
        let harness = Harness::new(&Engine::new());

        let result = harness.with_rejected(Value::string("r"), |promise| {
            let seen = Capture::new();
            promise.then(Some(seen.handler()), None);
            move || seen.expect("value", &Value::string("r"))
        });

        assert_eq!(
            result,
            Err(CaseError::Failed(
                "already settled: value: handler was never called".into()
            ))
        );
    }

    #[test]
    fn test_microtask_limit_skips() {
        let harness = Harness::new(&Engine::new().with_max_microtasks(1));
        let chain = harness.adapter().resolved(Value::Null).then_with(Ok).then_with(Ok);

        assert!(chain.is_pending());
        assert_eq!(
            harness.settle(),
            Err(CaseError::Skipped("needs more than 1 microtasks".into()))
        );
    }

    #[test]
    fn test_later_runs_after_queued_reactions() {
        let harness = Harness::new(&Engine::new());
        let order = Recorder::new();

        let log = order.clone();
        harness.later(move || log.push("later"));
        harness
            .adapter()
            .resolved(Value::Null)
            .then(Some(order.handler("first")), None)
            .then(Some(order.handler("second")), None);

        harness.settle().expect("drain should succeed");
        order.expect(&["first", "later", "second"]).expect("ordering");
    }
}
