use miette::Diagnostic;
use thiserror::Error;

use crate::runtime::value::JsValue;

#[derive(Debug, Error, Diagnostic)]
pub enum RuntimeError {
    #[error("TypeError: {message}")]
    #[diagnostic(code(pledge::type_error))]
    TypeError { message: String },

    #[error("Uncaught {value}")]
    #[diagnostic(code(pledge::thrown))]
    Thrown { value: JsValue },

    #[error("Uncaught (in promise) {reason}")]
    #[diagnostic(
        code(pledge::unhandled_rejection),
        help("attach a rejection handler with `catch` or `then`")
    )]
    UnhandledRejection { reason: JsValue },

    #[error("microtask limit of {limit} exceeded in a single drain")]
    #[diagnostic(
        code(pledge::microtask_limit),
        help("a chain keeps scheduling work; raise the limit or break the chain")
    )]
    MicrotaskLimitExceeded { limit: usize },
}

impl RuntimeError {
    /// Wraps an arbitrary value as a thrown completion.
    pub fn throw(value: impl Into<JsValue>) -> Self {
        RuntimeError::Thrown {
            value: value.into(),
        }
    }

    /// Converts the failure into the value a promise is rejected with.
    pub fn into_value(self) -> JsValue {
        match self {
            RuntimeError::Thrown { value } => value,
            RuntimeError::TypeError { message } => JsValue::type_error(message),
            other => JsValue::error(other.to_string()),
        }
    }
}
