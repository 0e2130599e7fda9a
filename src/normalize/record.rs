//! Case-insensitive, non-panicking view over one JSON object.

use std::collections::HashMap;

use serde_json::{Map, Value};

/// Borrowed view of a JSON object whose keys compare case-insensitively.
///
/// When two keys differ only by case, the later one in document order wins.
#[derive(Debug, Clone)]
pub struct RawRecord<'a> {
    fields: HashMap<String, &'a Value>,
}

impl<'a> RawRecord<'a> {
    /// Wraps a JSON object.
    #[must_use]
    pub fn new(object: &'a Map<String, Value>) -> Self {
        let fields = object
            .iter()
            .map(|(key, value)| (key.to_ascii_lowercase(), value))
            .collect();
        Self { fields }
    }

    /// Wraps `value` if it is an object.
    #[must_use]
    pub fn from_value(value: &'a Value) -> Option<Self> {
        value.as_object().map(Self::new)
    }

    /// Returns the raw value stored under `key`, truthy or not.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.fields.get(&key.to_ascii_lowercase()).copied()
    }

    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.fields.contains_key(&key.to_ascii_lowercase())
    }

    /// Returns true if any of `keys` is present.
    #[must_use]
    pub fn has_any(&self, keys: &[&str]) -> bool {
        keys.iter().any(|key| self.has(key))
    }

    /// Returns the first truthy value along an alias chain.
    pub fn first<'k>(&self, keys: impl IntoIterator<Item = &'k str>) -> Option<&'a Value> {
        keys.into_iter()
            .filter_map(|key| self.get(key))
            .find(|value| is_truthy(value))
    }

    /// Like [`first`](Self::first), rendered as a trimmed string.
    ///
    /// Strings are returned as is; numbers and booleans are formatted;
    /// arrays and objects are skipped.
    pub fn first_str<'k>(&self, keys: impl IntoIterator<Item = &'k str>) -> Option<String> {
        keys.into_iter()
            .filter_map(|key| self.get(key))
            .filter(|value| is_truthy(value))
            .find_map(scalar_to_string)
    }

    /// Returns the first truthy nested object along an alias chain.
    pub fn first_object<'k>(&self, keys: impl IntoIterator<Item = &'k str>) -> Option<RawRecord<'a>> {
        keys.into_iter()
            .filter_map(|key| self.get(key))
            .find_map(RawRecord::from_value)
    }

    /// Returns the first non-empty array along an alias chain.
    pub fn first_array<'k>(&self, keys: impl IntoIterator<Item = &'k str>) -> Option<&'a [Value]> {
        keys.into_iter()
            .filter_map(|key| self.get(key))
            .filter_map(Value::as_array)
            .find(|items| !items.is_empty())
            .map(Vec::as_slice)
    }

    /// True if any key along the chain holds a truthy value.
    pub fn flag<'k>(&self, keys: impl IntoIterator<Item = &'k str>) -> bool {
        self.first(keys).is_some()
    }
}

/// Truthiness of a JSON value: null, false, zero and empty containers are false.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}
