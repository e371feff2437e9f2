mod property;

pub use property::Property;

use std::collections::HashMap;

use super::JsFunction;

/// A plain property bag. Enough structure for duck-typed thenables: data
/// properties and getters that run on access.
#[derive(Debug, Clone, Default)]
pub struct JsObject {
    pub properties: HashMap<String, Property>,
}

impl JsObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Property> {
        self.properties.get(key).cloned()
    }

    pub fn set(&mut self, key: String, value: super::JsValue) {
        if let Some(existing) = self.properties.get_mut(&key) {
            existing.value = value;
            existing.getter = None;
            return;
        }
        self.properties.insert(key, Property::new(value));
    }

    pub fn set_getter(&mut self, key: String, getter: JsFunction) {
        self.properties.insert(key, Property::with_getter(getter));
    }
}
