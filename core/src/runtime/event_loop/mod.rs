mod microtask_queue;
mod rejection_tracker;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::errors::RuntimeError;
use crate::runtime::value::promise::PromiseReaction;
use crate::runtime::value::{JsValue, Promise};

pub use microtask_queue::MicrotaskQueue;
pub use rejection_tracker::{MAX_REPORTED_REJECTIONS, RejectionTracker, UnhandledRejections};

/// A unit of deferred work.
pub enum Microtask {
    /// Reactions of one settlement, run in registration order.
    PromiseReactions {
        reactions: Vec<PromiseReaction>,
        is_reject: bool,
        value: JsValue,
    },
    /// Host work queued alongside promise jobs.
    Job(Box<dyn FnOnce()>),
}

impl Microtask {
    pub fn run(self) {
        match self {
            Microtask::PromiseReactions {
                reactions,
                is_reject,
                value,
            } => {
                for reaction in reactions {
                    reaction.run(is_reject, value.clone());
                }
            }
            Microtask::Job(job) => job(),
        }
    }
}

impl fmt::Debug for Microtask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Microtask::PromiseReactions {
                reactions,
                is_reject,
                ..
            } => f
                .debug_struct("PromiseReactions")
                .field("reactions", &reactions.len())
                .field("is_reject", is_reject)
                .finish(),
            Microtask::Job(_) => f.write_str("Job(..)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionOperation {
    /// A promise was rejected while nothing was attached to it.
    Reject,
    /// A handler was attached to a promise previously reported via `Reject`.
    Handle,
}

/// The deferred-task facility promises enqueue their work into.
///
/// Implementations must run tasks in FIFO order, and never inside the call
/// to `enqueue_microtask` itself.
pub trait Scheduler {
    fn enqueue_microtask(&self, task: Microtask);

    fn track_rejection(&self, _promise: &Promise, _operation: RejectionOperation) {}
}

pub type SchedulerRef = Rc<dyn Scheduler>;

#[derive(Debug, Clone, Default)]
pub struct EventLoopOptions {
    pub max_microtasks: Option<usize>,
    pub unhandled_rejections: UnhandledRejections,
}

/// Reference single-threaded scheduler: a FIFO microtask queue plus an
/// unhandled-rejection tracker.
pub struct EventLoop {
    options: EventLoopOptions,
    microtasks: RefCell<MicrotaskQueue>,
    rejections: RefCell<RejectionTracker>,
}

impl EventLoop {
    pub fn new() -> Rc<Self> {
        Self::with_options(EventLoopOptions::default())
    }

    pub fn with_options(options: EventLoopOptions) -> Rc<Self> {
        Rc::new(Self {
            options,
            microtasks: RefCell::new(MicrotaskQueue::default()),
            rejections: RefCell::new(RejectionTracker::default()),
        })
    }

    pub fn options(&self) -> &EventLoopOptions {
        &self.options
    }

    pub fn scheduler(self: &Rc<Self>) -> SchedulerRef {
        self.clone()
    }

    pub fn queue_job<F>(&self, job: F)
    where
        F: FnOnce() + 'static,
    {
        self.enqueue_microtask(Microtask::Job(Box::new(job)));
    }

    pub fn has_microtasks(&self) -> bool {
        !self.microtasks.borrow().is_empty()
    }

    pub fn pending_microtasks(&self) -> usize {
        self.microtasks.borrow().len()
    }

    pub fn pop_microtask(&self) -> Option<Microtask> {
        self.microtasks.borrow_mut().pop()
    }

    /// Runs queued microtasks, including ones queued while draining, until the
    /// queue is empty. Then reports rejections left unhandled. Returns the
    /// number of tasks run.
    pub fn run_microtasks(&self) -> Result<usize, RuntimeError> {
        let mut ran = 0;
        while self.has_microtasks() {
            self.check_budget(ran)?;
            self.run_next();
            ran += 1;
        }
        log::trace!("microtask drain finished after {ran} task(s)");
        self.flush_rejections()?;
        Ok(ran)
    }

    /// Runs microtasks one at a time until `promise` settles or the queue
    /// runs dry. Unhandled rejections are left for the next full drain.
    pub fn run_until_settled(&self, promise: &Promise) -> Result<usize, RuntimeError> {
        let mut ran = 0;
        while promise.is_pending() && self.has_microtasks() {
            self.check_budget(ran)?;
            self.run_next();
            ran += 1;
        }
        Ok(ran)
    }

    /// Rejections reported under [`UnhandledRejections::Warn`] since the last
    /// call.
    pub fn take_unhandled_rejections(&self) -> Vec<JsValue> {
        self.rejections.borrow_mut().take_reported()
    }

    /// Drops queued work and tracked rejections without running anything.
    pub fn clear(&self) {
        self.microtasks.borrow_mut().clear();
        self.rejections.borrow_mut().clear();
    }

    fn run_next(&self) {
        if let Some(task) = self.pop_microtask() {
            log::trace!("running microtask {task:?}");
            task.run();
        }
    }

    fn check_budget(&self, ran: usize) -> Result<(), RuntimeError> {
        match self.options.max_microtasks {
            Some(limit) if ran >= limit => {
                log::debug!(
                    "microtask limit {limit} reached with {} task(s) still queued",
                    self.pending_microtasks()
                );
                Err(RuntimeError::MicrotaskLimitExceeded { limit })
            }
            _ => Ok(()),
        }
    }

    fn flush_rejections(&self) -> Result<(), RuntimeError> {
        let unhandled = self.rejections.borrow_mut().drain_unhandled();
        let mut first = None;

        for reason in unhandled {
            match self.options.unhandled_rejections {
                UnhandledRejections::Ignore => {}
                UnhandledRejections::Warn => {
                    log::warn!("Uncaught (in promise) {reason}");
                    self.rejections.borrow_mut().report(reason);
                }
                UnhandledRejections::Error => {
                    if first.is_none() {
                        first = Some(reason);
                    }
                }
            }
        }

        match first {
            Some(reason) => Err(RuntimeError::UnhandledRejection { reason }),
            None => Ok(()),
        }
    }
}

impl Scheduler for EventLoop {
    fn enqueue_microtask(&self, task: Microtask) {
        log::trace!("enqueue microtask {task:?}");
        self.microtasks.borrow_mut().enqueue(task);
    }

    fn track_rejection(&self, promise: &Promise, operation: RejectionOperation) {
        self.rejections.borrow_mut().track(promise, operation);
    }
}
