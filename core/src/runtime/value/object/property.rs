use crate::runtime::value::{JsFunction, JsValue};

#[derive(Debug, Clone)]
pub struct Property {
    pub value: JsValue,
    pub getter: Option<JsFunction>,
}

impl Property {
    pub fn new(value: JsValue) -> Self {
        Self {
            value,
            getter: None,
        }
    }

    pub fn with_getter(getter: JsFunction) -> Self {
        Self {
            value: JsValue::Undefined,
            getter: Some(getter),
        }
    }
}
