use std::fmt;
use std::rc::Rc;

use crate::embedding::function_args::FunctionArgs;
use crate::errors::RuntimeError;
use crate::runtime::value::JsValue;

/// Host code callable from promise machinery: handlers, executors, getters
/// and `then` members of foreign thenables.
pub trait NativeFunction {
    fn call(&self, args: FunctionArgs) -> Result<JsValue, RuntimeError>;
}

#[derive(Clone)]
pub struct NativeFunctionBoxed {
    callback: Rc<dyn NativeFunction>,
}

impl fmt::Debug for NativeFunctionBoxed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NativeFunctionBoxed(..)")
    }
}

impl NativeFunctionBoxed {
    pub fn new<T: NativeFunction + 'static>(callback: T) -> Self {
        Self {
            callback: Rc::new(callback),
        }
    }

    pub fn from_closure<F>(callback: F) -> Self
    where
        F: Fn(FunctionArgs) -> Result<JsValue, RuntimeError> + 'static,
    {
        Self::new(ClosureFunction { callback })
    }

    pub fn call(&self, args: FunctionArgs) -> Result<JsValue, RuntimeError> {
        self.callback.call(args)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.callback, &other.callback)
    }
}

struct ClosureFunction<F> {
    callback: F,
}

impl<F> NativeFunction for ClosureFunction<F>
where
    F: Fn(FunctionArgs) -> Result<JsValue, RuntimeError>,
{
    fn call(&self, args: FunctionArgs) -> Result<JsValue, RuntimeError> {
        (self.callback)(args)
    }
}
