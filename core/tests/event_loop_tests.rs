use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use pledge::{
    Context, Engine, MAX_REPORTED_REJECTIONS, Microtask, Promise, PromiseState, RuntimeError,
    Scheduler, SchedulerRef, UnhandledRejections, Value,
};

#[ctor::ctor]
fn __init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default())
        .is_test(true)
        .try_init();
}

fn recorder() -> Rc<RefCell<Vec<String>>> {
    Rc::new(RefCell::new(Vec::new()))
}

#[test]
fn jobs_and_reactions_share_one_fifo_queue() {
    let ctx = Context::new();
    let order = recorder();

    let log = order.clone();
    ctx.queue_microtask(move || log.borrow_mut().push("job a".into()));
    let log = order.clone();
    ctx.resolve("reaction").then_with(move |v| {
        log.borrow_mut().push(v.to_string());
        Ok(Value::Undefined)
    });
    let log = order.clone();
    ctx.queue_microtask(move || log.borrow_mut().push("job b".into()));

    ctx.run_microtasks().expect("drain should succeed");
    assert_eq!(*order.borrow(), vec!["job a", "reaction", "job b"]);
}

#[test]
fn settlement_schedules_a_single_task_for_all_reactions() {
    let ctx = Context::new();
    let slot = RefCell::new(None);
    let promise = ctx.new_promise(|resolve, _| {
        *slot.borrow_mut() = Some(resolve);
        Ok(())
    });
    for _ in 0..3 {
        promise.then_with(Ok);
    }
    assert_eq!(ctx.event_loop().pending_microtasks(), 0);

    slot.into_inner()
        .expect("resolve should be captured")
        .resolve(Value::Number(1.0));

    assert_eq!(ctx.event_loop().pending_microtasks(), 1);
    ctx.run_microtasks().expect("drain should succeed");
}

#[test]
fn then_on_a_settled_promise_schedules_one_task_per_call() {
    let ctx = Context::new();
    let promise = ctx.resolve(1.0);

    promise.then_with(Ok);
    promise.then_with(Ok);

    assert_eq!(ctx.event_loop().pending_microtasks(), 2);
}

#[test]
fn work_queued_while_draining_runs_in_the_same_drain() {
    let ctx = Context::new();
    let result = ctx
        .resolve(1.0)
        .then_with(Ok)
        .then_with(Ok)
        .then_with(|v| Ok(Value::Number(v.to_number() + 1.0)));

    let ran = ctx.run_microtasks().expect("drain should succeed");

    assert_eq!(ran, 3);
    assert!(!ctx.event_loop().has_microtasks());
    assert_eq!(result.value(), Some(Value::Number(2.0)));
}

#[test]
fn microtask_budget_stops_a_drain() {
    let ctx = Engine::new().with_max_microtasks(2).new_context();
    let mut tail = ctx.resolve(0.0);
    for _ in 0..5 {
        tail = tail.then_with(|v| Ok(Value::Number(v.to_number() + 1.0)));
    }

    let err = ctx
        .run_microtasks()
        .expect_err("five chained reactions exceed a budget of two");

    assert!(matches!(err, RuntimeError::MicrotaskLimitExceeded { limit: 2 }));
    assert!(ctx.event_loop().has_microtasks());
    assert!(tail.is_pending());
}

#[test]
fn unhandled_rejections_are_reported_after_the_drain() {
    let ctx = Context::new();
    ctx.reject("boom");

    ctx.run_microtasks().expect("warn mode does not fail the drain");

    assert_eq!(ctx.take_unhandled_rejections(), vec![Value::string("boom")]);
    assert!(ctx.take_unhandled_rejections().is_empty());
}

#[test]
fn rejection_handled_in_the_same_turn_is_not_reported() {
    let ctx = Context::new();
    let promise = ctx.reject("caught");
    promise.catch_with(|_| Ok(Value::Undefined));

    ctx.run_microtasks().expect("drain should succeed");

    assert!(ctx.take_unhandled_rejections().is_empty());
}

#[test]
fn failure_at_the_end_of_a_chain_is_reported() {
    let ctx = Context::new();
    ctx.resolve(1.0)
        .then_with(|_| Err(RuntimeError::throw("late failure")))
        .then_with(Ok);

    ctx.run_microtasks().expect("drain should succeed");

    assert_eq!(
        ctx.take_unhandled_rejections(),
        vec![Value::string("late failure")]
    );
}

#[test]
fn error_mode_fails_the_drain() {
    let ctx = Engine::new()
        .with_unhandled_rejections(UnhandledRejections::Error)
        .new_context();
    ctx.reject("fatal");

    let err = ctx
        .run_microtasks()
        .expect_err("unhandled rejection should fail the drain");

    match err {
        RuntimeError::UnhandledRejection { reason } => assert_eq!(reason, Value::string("fatal")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn promise_rejected_with_itself_fails_the_drain_readably() {
    let ctx = Engine::new()
        .with_unhandled_rejections(UnhandledRejections::Error)
        .new_context();
    let (promise, _, reject) = ctx.with_resolvers();
    reject.reject(Value::Promise(promise.clone()));

    let err = ctx
        .run_microtasks()
        .expect_err("unhandled rejection should fail the drain");

    assert_eq!(
        err.to_string(),
        "Uncaught (in promise) Promise { <rejected>: Promise { <rejected> } }"
    );
    assert!(format!("{err:?}").contains("rejected"));
    assert!(format!("{promise:?}").contains("rejected"));
}

#[test]
fn reported_rejections_keep_only_the_newest() {
    let ctx = Context::new();
    let total = MAX_REPORTED_REJECTIONS + 10;
    for n in 0..total {
        ctx.reject(n as f64);
        ctx.run_microtasks().expect("warn mode does not fail the drain");
    }

    let reported = ctx.take_unhandled_rejections();

    assert_eq!(reported.len(), MAX_REPORTED_REJECTIONS);
    assert_eq!(reported.first(), Some(&Value::Number(10.0)));
    assert_eq!(reported.last(), Some(&Value::Number((total - 1) as f64)));
    assert!(ctx.take_unhandled_rejections().is_empty());
}

#[test]
fn ignore_mode_drops_unhandled_rejections() {
    let ctx = Engine::new()
        .with_unhandled_rejections(UnhandledRejections::Ignore)
        .new_context();
    ctx.reject("quiet");

    ctx.run_microtasks().expect("drain should succeed");

    assert!(ctx.take_unhandled_rejections().is_empty());
}

#[test]
fn run_until_settled_stops_once_the_promise_settles() {
    let ctx = Context::new();
    let slot = RefCell::new(None);
    let promise = ctx.new_promise(|resolve, _| {
        *slot.borrow_mut() = Some(resolve);
        Ok(())
    });
    let resolve = slot.into_inner().expect("resolve should be captured");

    ctx.queue_microtask(move || resolve.resolve(Value::Number(5.0)));
    ctx.queue_microtask(|| {});

    let state = ctx.run_until_settled(&promise).expect("loop should run");

    assert_eq!(state, PromiseState::Fulfilled(Value::Number(5.0)));
    assert_eq!(ctx.event_loop().pending_microtasks(), 1);
}

#[test]
fn awaited_rejection_is_not_reported() {
    let ctx = Context::new();
    let promise = ctx.resolve(1.0).then_with(|_| Err(RuntimeError::throw("awaited")));

    let state = ctx.run_until_settled(&promise).expect("loop should run");
    ctx.run_microtasks().expect("drain should succeed");

    assert_eq!(state, PromiseState::Rejected(Value::string("awaited")));
    assert!(ctx.take_unhandled_rejections().is_empty());
}

#[test]
fn unhandled_rejection_mode_parses_from_text() {
    assert_eq!("warn".parse(), Ok(UnhandledRejections::Warn));
    assert_eq!("ERROR".parse(), Ok(UnhandledRejections::Error));
    assert_eq!("ignore".parse(), Ok(UnhandledRejections::Ignore));
    assert!("loud".parse::<UnhandledRejections>().is_err());
}

#[derive(Default)]
struct ManualScheduler {
    queue: RefCell<VecDeque<Microtask>>,
}

impl Scheduler for ManualScheduler {
    fn enqueue_microtask(&self, task: Microtask) {
        self.queue.borrow_mut().push_back(task);
    }
}

impl ManualScheduler {
    fn step(&self) -> bool {
        let task = self.queue.borrow_mut().pop_front();
        match task {
            Some(task) => {
                task.run();
                true
            }
            None => false,
        }
    }
}

#[test]
fn promises_run_on_an_injected_scheduler() {
    let scheduler = Rc::new(ManualScheduler::default());
    let handle: SchedulerRef = scheduler.clone();

    let result = Promise::resolve(&handle, Value::Number(20.0))
        .then_with(|v| Ok(Value::Number(v.to_number() + 1.0)))
        .then_with(|v| Ok(Value::Number(v.to_number() * 2.0)));

    assert_eq!(scheduler.queue.borrow().len(), 1);
    assert!(result.is_pending());

    let mut steps = 0;
    while scheduler.step() {
        steps += 1;
    }

    assert_eq!(steps, 2);
    assert_eq!(result.value(), Some(Value::Number(42.0)));
}
