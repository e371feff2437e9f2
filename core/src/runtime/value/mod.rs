mod display;
pub mod error;
pub mod function;
pub mod object;
pub mod promise;

use std::cell::RefCell;
use std::rc::Rc;

pub use error::{ErrorKind, JsError};
pub use function::JsFunction;
pub use object::{JsObject, Property};
pub use promise::{Promise, PromiseState};

use crate::embedding::FunctionArgs;
use crate::errors::RuntimeError;

/// A dynamically typed payload: promise values, rejection reasons and
/// thenable candidates are all `JsValue`s.
#[derive(Clone)]
pub enum JsValue {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Error(Rc<JsError>),
    Object(Rc<RefCell<JsObject>>),
    Function(JsFunction),
    Promise(Promise),
}

impl PartialEq for JsValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (JsValue::Undefined, JsValue::Undefined) => true,
            (JsValue::Null, JsValue::Null) => true,
            (JsValue::Boolean(a), JsValue::Boolean(b)) => a == b,
            (JsValue::Number(a), JsValue::Number(b)) => a == b,
            (JsValue::String(a), JsValue::String(b)) => a == b,
            (JsValue::Error(a), JsValue::Error(b)) => Rc::ptr_eq(a, b),
            (JsValue::Object(a), JsValue::Object(b)) => Rc::ptr_eq(a, b),
            (JsValue::Function(a), JsValue::Function(b)) => a.ptr_eq(b),
            (JsValue::Promise(a), JsValue::Promise(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl JsValue {
    pub fn string(value: impl Into<String>) -> Self {
        JsValue::String(value.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        JsValue::Error(Rc::new(JsError::new(ErrorKind::Error, message)))
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        JsValue::Error(Rc::new(JsError::new(ErrorKind::TypeError, message)))
    }

    /// A fresh object with no properties.
    pub fn object() -> Self {
        JsValue::Object(Rc::new(RefCell::new(JsObject::new())))
    }

    pub fn function<F>(name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(FunctionArgs) -> Result<JsValue, RuntimeError> + 'static,
    {
        JsValue::Function(JsFunction::from_closure(name, callback))
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, JsValue::Function(_))
    }

    /// Objects, functions, promises and errors: the values that can carry a
    /// `then` member.
    pub fn is_object_like(&self) -> bool {
        matches!(
            self,
            JsValue::Object(_) | JsValue::Function(_) | JsValue::Promise(_) | JsValue::Error(_)
        )
    }

    pub fn as_function(&self) -> Option<&JsFunction> {
        match self {
            JsValue::Function(function) => Some(function),
            _ => None,
        }
    }

    pub fn as_promise(&self) -> Option<&Promise> {
        match self {
            JsValue::Promise(promise) => Some(promise),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&JsError> {
        match self {
            JsValue::Error(error) => Some(error),
            _ => None,
        }
    }

    pub fn type_of(&self) -> &'static str {
        match self {
            JsValue::Undefined => "undefined",
            JsValue::Boolean(_) => "boolean",
            JsValue::Number(_) => "number",
            JsValue::String(_) => "string",
            JsValue::Function(_) => "function",
            JsValue::Null | JsValue::Error(_) | JsValue::Object(_) | JsValue::Promise(_) => {
                "object"
            }
        }
    }

    pub fn to_number(&self) -> f64 {
        match self {
            JsValue::Undefined => f64::NAN,
            JsValue::Null => 0.0,
            JsValue::Boolean(b) => f64::from(u8::from(*b)),
            JsValue::Number(n) => *n,
            JsValue::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
            _ => f64::NAN,
        }
    }

    /// Reads a property, running its getter if it has one. Getter failures
    /// propagate to the caller.
    pub fn get_property(&self, key: &str) -> Result<JsValue, RuntimeError> {
        let property = match self {
            JsValue::Object(obj) => obj.borrow().get(key),
            JsValue::Function(function) => function.properties().borrow().get(key),
            JsValue::Promise(promise) => return Ok(promise.method(key)),
            JsValue::Error(error) => return Ok(error.property(key)),
            _ => None,
        };

        match property {
            Some(Property {
                getter: Some(getter),
                ..
            }) => getter.call(FunctionArgs::new(self.clone(), Vec::new())),
            Some(property) => Ok(property.value),
            None => Ok(JsValue::Undefined),
        }
    }

    /// Sets a data property on an object or function. Returns `false` for
    /// values that cannot hold properties.
    pub fn set_property(&self, key: impl Into<String>, value: JsValue) -> bool {
        match self {
            JsValue::Object(obj) => obj.borrow_mut().set(key.into(), value),
            JsValue::Function(function) => {
                function.properties().borrow_mut().set(key.into(), value)
            }
            _ => return false,
        }
        true
    }

    /// Installs an accessor property whose getter runs on every read.
    pub fn define_getter(&self, key: impl Into<String>, getter: JsFunction) -> bool {
        match self {
            JsValue::Object(obj) => obj.borrow_mut().set_getter(key.into(), getter),
            JsValue::Function(function) => {
                function.properties().borrow_mut().set_getter(key.into(), getter)
            }
            _ => return false,
        }
        true
    }
}

impl From<f64> for JsValue {
    fn from(value: f64) -> Self {
        JsValue::Number(value)
    }
}

impl From<bool> for JsValue {
    fn from(value: bool) -> Self {
        JsValue::Boolean(value)
    }
}

impl From<&str> for JsValue {
    fn from(value: &str) -> Self {
        JsValue::String(value.to_string())
    }
}

impl From<String> for JsValue {
    fn from(value: String) -> Self {
        JsValue::String(value)
    }
}

impl From<JsFunction> for JsValue {
    fn from(value: JsFunction) -> Self {
        JsValue::Function(value)
    }
}

impl From<Promise> for JsValue {
    fn from(value: Promise) -> Self {
        JsValue::Promise(value)
    }
}
