//! Promise/A+ test adapter.
//!
//! Built only on the public constructors, so a conformance suite exercises
//! exactly what embedders see.

use crate::context::Context;
use crate::runtime::event_loop::SchedulerRef;
use crate::runtime::value::promise::{Reject, Resolve};
use crate::runtime::value::{JsValue, Promise};

/// A pending promise together with its resolving functions.
#[derive(Debug, Clone)]
pub struct Deferred {
    pub promise: Promise,
    pub resolve: Resolve,
    pub reject: Reject,
}

#[derive(Clone)]
pub struct Adapter {
    scheduler: SchedulerRef,
}

impl Adapter {
    pub fn new(context: &Context) -> Self {
        Self {
            scheduler: context.scheduler().clone(),
        }
    }

    pub fn resolved(&self, value: JsValue) -> Promise {
        Promise::resolve(&self.scheduler, value)
    }

    pub fn rejected(&self, reason: JsValue) -> Promise {
        Promise::reject(&self.scheduler, reason)
    }

    pub fn deferred(&self) -> Deferred {
        let (promise, resolve, reject) = Promise::with_resolvers(&self.scheduler);
        Deferred {
            promise,
            resolve,
            reject,
        }
    }
}
