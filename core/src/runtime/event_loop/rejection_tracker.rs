use std::collections::VecDeque;

use crate::runtime::value::{JsValue, Promise};

use super::RejectionOperation;

/// How many reported reasons are kept for `take_unhandled_rejections`. Older
/// ones are dropped first.
pub const MAX_REPORTED_REJECTIONS: usize = 256;

/// What the event loop does with rejections nobody handled by the end of a
/// drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnhandledRejections {
    Ignore,
    #[default]
    Warn,
    Error,
}

impl std::str::FromStr for UnhandledRejections {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ignore" => Ok(UnhandledRejections::Ignore),
            "warn" => Ok(UnhandledRejections::Warn),
            "error" => Ok(UnhandledRejections::Error),
            other => Err(format!(
                "unknown unhandled rejection mode '{other}' (expected ignore, warn or error)"
            )),
        }
    }
}

#[derive(Default)]
pub struct RejectionTracker {
    pending: Vec<Promise>,
    reported: VecDeque<JsValue>,
}

impl RejectionTracker {
    pub fn track(&mut self, promise: &Promise, operation: RejectionOperation) {
        match operation {
            RejectionOperation::Reject => self.pending.push(promise.clone()),
            RejectionOperation::Handle => self.pending.retain(|p| !p.ptr_eq(promise)),
        }
    }

    /// Reasons of tracked promises that are still unhandled. Clears the
    /// tracked set.
    pub fn drain_unhandled(&mut self) -> Vec<JsValue> {
        std::mem::take(&mut self.pending)
            .into_iter()
            .filter(|promise| !promise.is_handled())
            .filter_map(|promise| promise.reason())
            .collect()
    }

    pub fn report(&mut self, reason: JsValue) {
        if self.reported.len() == MAX_REPORTED_REJECTIONS {
            self.reported.pop_front();
            log::debug!("dropped oldest reported rejection");
        }
        self.reported.push_back(reason);
    }

    pub fn take_reported(&mut self) -> Vec<JsValue> {
        self.reported.drain(..).collect()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.reported.clear();
    }
}
