//! Typed render context.
//!
//! Front matter, site-wide values and pagination data all end up in a
//! [`Context`]: an ordered mapping from string keys to JSON-compatible
//! values. Templates read it by key; Rust code reads it through the typed
//! accessors below instead of reaching into the map.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
    values: Map<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw lookup.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// String lookup with a fallback.
    ///
    /// Non-string scalars are rendered with their JSON text (`3`, `true`),
    /// so `title: 2012` reads back as `"2012"`.
    pub fn get_str(&self, key: &str, default: &str) -> String {
        match self.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => default.to_string(),
            Some(Value::Array(_)) | Some(Value::Object(_)) => default.to_string(),
            Some(other) => other.to_string(),
        }
    }

    /// Boolean lookup with a fallback. Non-boolean values yield the fallback.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get(key)
            .and_then(Value::as_bool)
            .unwrap_or(default)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Overlay `other` on top of `self`; keys in `other` win.
    pub fn merge(&mut self, other: &Context) {
        for (k, v) in &other.values {
            self.values.insert(k.clone(), v.clone());
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.values)
    }
}

impl From<Map<String, Value>> for Context {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}
