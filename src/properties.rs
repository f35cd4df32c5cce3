//! Flat property values and the merge policies applied to them

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Flat key/value map handed to the analytics sink
pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// A single property value: a JSON number or a string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Number(serde_json::Number),
    Text(String),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            PropertyValue::Number(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Number(n) => n.as_i64(),
            PropertyValue::Text(_) => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Number(n) => write!(f, "{}", n),
            PropertyValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Number(value.into())
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

/// Copy entries of `other` into `acc` only where `acc` has no value yet.
pub fn merge_first_wins(acc: &mut PropertyMap, other: PropertyMap) {
    for (key, value) in other {
        acc.entry(key).or_insert(value);
    }
}

/// Store `value` under `key`, joining it onto an existing value with `separator`.
pub fn append_value(map: &mut PropertyMap, key: String, value: PropertyValue, separator: &str) {
    match map.get_mut(&key) {
        Some(existing) => {
            let joined = format!("{}{}{}", existing, separator, value);
            *existing = PropertyValue::Text(joined);
        }
        None => {
            map.insert(key, value);
        }
    }
}
