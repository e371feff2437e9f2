use std::fmt;

use super::JsValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Error,
    TypeError,
}

impl ErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Error => "Error",
            ErrorKind::TypeError => "TypeError",
        }
    }
}

/// An error object. Compared by identity when wrapped in a `JsValue`.
#[derive(Debug)]
pub struct JsError {
    kind: ErrorKind,
    message: String,
}

impl JsError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn property(&self, key: &str) -> JsValue {
        match key {
            "name" => JsValue::string(self.kind.name()),
            "message" => JsValue::string(self.message.clone()),
            _ => JsValue::Undefined,
        }
    }
}

impl fmt::Display for JsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            f.write_str(self.kind.name())
        } else {
            write!(f, "{}: {}", self.kind.name(), self.message)
        }
    }
}
