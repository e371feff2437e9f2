use super::JsValue;
use super::promise::PromiseState;
use std::fmt;

/// Largest magnitude at which every integral `f64` is exact.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

impl fmt::Display for JsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::Undefined => write!(f, "undefined"),
            JsValue::Null => write!(f, "null"),
            JsValue::Boolean(b) => write!(f, "{b}"),
            JsValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
            JsValue::String(s) => write!(f, "{s}"),
            JsValue::Error(error) => write!(f, "{error}"),
            JsValue::Function(function) => {
                write!(f, "function {}() {{ [native code] }}", function.name())
            }
            JsValue::Object(obj) => match obj.try_borrow() {
                Ok(obj) => {
                    let mut keys: Vec<&str> = obj.properties.keys().map(String::as_str).collect();
                    keys.sort_unstable();
                    write!(f, "{{ {} }}", keys.join(", "))
                }
                Err(_) => write!(f, "{{ <borrowed> }}"),
            },
            JsValue::Promise(promise) => match promise.state() {
                PromiseState::Pending => write!(f, "Promise {{ <pending> }}"),
                PromiseState::Fulfilled(value) => {
                    write!(f, "Promise {{ <fulfilled>: {} }}", Nested(&value))
                }
                PromiseState::Rejected(reason) => {
                    write!(f, "Promise {{ <rejected>: {} }}", Nested(&reason))
                }
            },
        }
    }
}

/// A value held by a promise. Promises inside are shown by state only, so a
/// promise settled with itself (or a ring of promises) still prints.
struct Nested<'a>(&'a JsValue);

impl fmt::Display for Nested<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            JsValue::Promise(promise) => write!(f, "Promise {{ <{}> }}", promise.state().label()),
            value => write!(f, "{value}"),
        }
    }
}

impl fmt::Debug for JsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::Undefined => f.write_str("Undefined"),
            JsValue::Null => f.write_str("Null"),
            JsValue::Boolean(b) => f.debug_tuple("Boolean").field(b).finish(),
            JsValue::Number(n) => f.debug_tuple("Number").field(n).finish(),
            JsValue::String(s) => f.debug_tuple("String").field(s).finish(),
            JsValue::Error(error) => f.debug_tuple("Error").field(error).finish(),
            JsValue::Function(function) => f.debug_tuple("Function").field(function).finish(),
            // Keys only: objects may reference themselves.
            JsValue::Object(obj) => match obj.try_borrow() {
                Ok(obj) => {
                    let mut keys: Vec<&str> = obj.properties.keys().map(String::as_str).collect();
                    keys.sort_unstable();
                    f.debug_tuple("Object").field(&keys).finish()
                }
                Err(_) => f.write_str("Object(<borrowed>)"),
            },
            JsValue::Promise(promise) => f.debug_tuple("Promise").field(promise).finish(),
        }
    }
}
