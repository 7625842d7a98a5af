use std::collections::BTreeMap;

use serde::ser::Serialize;
use serde_json::value::{to_value, Map, Value};

/// The data a template is rendered with.
///
/// Light wrapper around a `BTreeMap` for easier insertions of serializable
/// values. Cloned freely when a page derives the context of its parent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    data: BTreeMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Context::default()
    }

    /// Converts `val` to a [`Value`] and inserts it under `key`.
    ///
    /// Panics if the serialization fails, which only happens for types
    /// with a fallible custom `Serialize`.
    pub fn insert<T: Serialize + ?Sized, S: Into<String>>(&mut self, key: S, val: &T) {
        let key = key.into();
        let value = to_value(val)
            .unwrap_or_else(|err| panic!("Cannot serialize context value `{key}`: {err}"));
        self.data.insert(key, value);
    }

    pub fn get(&self, index: &str) -> Option<&Value> {
        self.data.get(index)
    }

    /// Converts the context to a `serde_json::Value` consuming the context.
    pub fn into_json(self) -> Value {
        Value::Object(self.data.into_iter().collect::<Map<_, _>>())
    }
}
