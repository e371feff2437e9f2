use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::{JsObject, JsValue};
use crate::embedding::{FunctionArgs, NativeFunctionBoxed};
use crate::errors::RuntimeError;

/// A callable value. Functions can carry properties too, which is how a
/// callable thenable is expressed.
#[derive(Clone)]
pub struct JsFunction {
    inner: Rc<FunctionData>,
}

struct FunctionData {
    name: String,
    handler: NativeFunctionBoxed,
    properties: RefCell<JsObject>,
}

impl JsFunction {
    pub fn new(name: impl Into<String>, handler: NativeFunctionBoxed) -> Self {
        Self {
            inner: Rc::new(FunctionData {
                name: name.into(),
                handler,
                properties: RefCell::new(JsObject::new()),
            }),
        }
    }

    pub fn from_closure<F>(name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(FunctionArgs) -> Result<JsValue, RuntimeError> + 'static,
    {
        Self::new(name, NativeFunctionBoxed::from_closure(callback))
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn call(&self, args: FunctionArgs) -> Result<JsValue, RuntimeError> {
        self.inner.handler.call(args)
    }

    pub fn properties(&self) -> &RefCell<JsObject> {
        &self.inner.properties
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for JsFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JsFunction({})", self.inner.name)
    }
}
