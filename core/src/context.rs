use std::rc::Rc;

use crate::errors::RuntimeError;
use crate::runtime::event_loop::{EventLoop, EventLoopOptions, SchedulerRef};
use crate::runtime::value::promise::{Reject, Resolve};
use crate::runtime::value::{JsValue, Promise, PromiseState};

/// An event loop plus shortcuts for creating promises bound to it.
pub struct Context {
    event_loop: Rc<EventLoop>,
    scheduler: SchedulerRef,
}

impl Context {
    pub fn new() -> Self {
        Self::with_options(EventLoopOptions::default())
    }

    pub fn with_options(options: EventLoopOptions) -> Self {
        let event_loop = EventLoop::with_options(options);
        let scheduler = event_loop.scheduler();
        Self {
            event_loop,
            scheduler,
        }
    }

    pub fn event_loop(&self) -> &EventLoop {
        &self.event_loop
    }

    pub fn scheduler(&self) -> &SchedulerRef {
        &self.scheduler
    }

    pub fn new_promise<F>(&self, executor: F) -> Promise
    where
        F: FnOnce(Resolve, Reject) -> Result<(), RuntimeError>,
    {
        Promise::new(&self.scheduler, executor)
    }

    pub fn with_resolvers(&self) -> (Promise, Resolve, Reject) {
        Promise::with_resolvers(&self.scheduler)
    }

    pub fn construct_promise(&self, executor: &JsValue) -> Result<Promise, RuntimeError> {
        Promise::construct(&self.scheduler, executor)
    }

    pub fn resolve(&self, value: impl Into<JsValue>) -> Promise {
        Promise::resolve(&self.scheduler, value.into())
    }

    pub fn reject(&self, reason: impl Into<JsValue>) -> Promise {
        Promise::reject(&self.scheduler, reason.into())
    }

    pub fn queue_microtask<F>(&self, job: F)
    where
        F: FnOnce() + 'static,
    {
        self.event_loop.queue_job(job);
    }

    pub fn run_microtasks(&self) -> Result<usize, RuntimeError> {
        self.event_loop.run_microtasks()
    }

    /// Drives the loop until `promise` settles and returns its state. The
    /// caller takes responsibility for a rejection, so it is not reported as
    /// unhandled.
    pub fn run_until_settled(&self, promise: &Promise) -> Result<PromiseState, RuntimeError> {
        self.event_loop.run_until_settled(promise)?;
        if !promise.is_pending() {
            promise.mark_handled();
        }
        Ok(promise.state())
    }

    pub fn take_unhandled_rejections(&self) -> Vec<JsValue> {
        self.event_loop.take_unhandled_rejections()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
