//! A Promise/A+ deferred-value primitive.
//!
//! A [`Promise`] settles once, runs its reactions on a FIFO microtask queue
//! after the current call stack unwinds, and adopts the state of any
//! thenable it is resolved with. Scheduling is injected through the
//! [`Scheduler`] trait; [`EventLoop`] is the reference implementation and
//! [`Context`] bundles one with promise constructors.

pub mod adapter;
pub mod context;
pub mod embedding;
pub mod engine;
pub mod errors;
pub mod runtime;

pub use adapter::{Adapter, Deferred};
pub use context::Context;
pub use embedding::FunctionArgs;
pub use engine::Engine;
pub use errors::{CHAINING_CYCLE, INVALID_RESOLVER, RuntimeError};
pub use runtime::event_loop::{
    EventLoop, EventLoopOptions, MAX_REPORTED_REJECTIONS, Microtask, RejectionOperation, Scheduler,
    SchedulerRef, UnhandledRejections,
};
pub use runtime::value::promise::{Reject, Resolve};
pub use runtime::value::{ErrorKind, JsError, JsFunction, JsValue as Value, Promise, PromiseState};
