use crate::context::Context;
use crate::runtime::event_loop::{EventLoopOptions, UnhandledRejections};

/// Configuration shared by every context it creates.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    max_microtasks: Option<usize>,
    unhandled_rejections: UnhandledRejections,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the number of microtasks a single drain may run.
    pub fn with_max_microtasks(mut self, max: usize) -> Self {
        self.max_microtasks = Some(max);
        self
    }

    pub fn with_unhandled_rejections(mut self, mode: UnhandledRejections) -> Self {
        self.unhandled_rejections = mode;
        self
    }

    pub fn options(&self) -> EventLoopOptions {
        EventLoopOptions {
            max_microtasks: self.max_microtasks,
            unhandled_rejections: self.unhandled_rejections,
        }
    }

    pub fn new_context(&self) -> Context {
        Context::with_options(self.options())
    }
}
