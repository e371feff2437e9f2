use crate::runtime::value::JsValue;

/// Lifecycle of a promise. Leaves `Pending` at most once.
#[derive(Debug, Clone, PartialEq)]
pub enum PromiseState {
    Pending,
    Fulfilled(JsValue),
    Rejected(JsValue),
}

impl PromiseState {
    pub fn is_pending(&self) -> bool {
        matches!(self, PromiseState::Pending)
    }

    pub fn label(&self) -> &'static str {
        match self {
            PromiseState::Pending => "pending",
            PromiseState::Fulfilled(_) => "fulfilled",
            PromiseState::Rejected(_) => "rejected",
        }
    }
}
