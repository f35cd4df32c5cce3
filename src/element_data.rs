//! Element annotation data
//!
//! Builds the typed `data-*` attributes and properties schema used to
//! annotate a single element (an image, a product card) for the analytics
//! collector:
//!
//! ```text
//! {carName: "Mazda", price: 100}
//!   schema:     {"id": "str", "data-carName": {"name": "carName", "type": "str"},
//!                "data-price": {"name": "price", "type": "real"}}
//!   attributes: {"data-carName": "Mazda", "data-price": "100"}
//! ```

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::{Error, Result};

pub const ELEMENT_NAME_ATTR: &str = "data-fs-element";
pub const SCHEMA_ATTR: &str = "data-fs-properties-schema";
pub const TIMING_ATTR: &str = "elementtiming";

/// A typed annotation value
#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    Str(String),
    Real(f64),
    Int(i64),
    Bool(bool),
    /// ISO-8601 timestamp
    Date(String),
    List(Vec<ElementValue>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Str,
    Real,
    Int,
    Bool,
    Date,
    Strs,
    Reals,
    Ints,
    Bools,
    Dates,
}

impl DataType {
    fn plural(self) -> Self {
        match self {
            DataType::Str | DataType::Strs => DataType::Strs,
            DataType::Real | DataType::Reals => DataType::Reals,
            DataType::Int | DataType::Ints => DataType::Ints,
            DataType::Bool | DataType::Bools => DataType::Bools,
            DataType::Date | DataType::Dates => DataType::Dates,
        }
    }
}

impl ElementValue {
    /// Convert JSON, where numbers are `real`. Objects and nulls are rejected.
    pub fn from_json(key: &str, value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(ElementValue::Str(s)),
            Value::Number(n) => Ok(ElementValue::Real(n.as_f64().unwrap_or_default())),
            Value::Bool(b) => Ok(ElementValue::Bool(b)),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Array(_) => Err(unsupported(key, "object")),
                    other => ElementValue::from_json(key, other),
                })
                .collect::<Result<Vec<_>>>()
                .map(ElementValue::List),
            Value::Object(_) => Err(unsupported(key, "object")),
            Value::Null => Err(unsupported(key, "null")),
        }
    }

    fn data_type(&self) -> DataType {
        match self {
            ElementValue::Str(_) => DataType::Str,
            ElementValue::Real(_) => DataType::Real,
            ElementValue::Int(_) => DataType::Int,
            ElementValue::Bool(_) => DataType::Bool,
            ElementValue::Date(_) => DataType::Date,
            ElementValue::List(items) => items
                .first()
                .map(|first| first.data_type().plural())
                .unwrap_or(DataType::Strs),
        }
    }

    fn attribute_value(&self) -> Value {
        match self {
            ElementValue::Str(s) | ElementValue::Date(s) => Value::String(s.clone()),
            ElementValue::Real(n) => Value::String(n.to_string()),
            ElementValue::Int(n) => Value::String(n.to_string()),
            ElementValue::Bool(b) => Value::String(b.to_string()),
            ElementValue::List(items) => Value::Array(items.iter().map(Self::attribute_value).collect()),
        }
    }
}

fn unsupported(key: &str, kind: &'static str) -> Error {
    Error::UnsupportedElementData {
        key: key.to_string(),
        kind,
    }
}

/// Schema plus `data-*` attribute values for one element
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementData {
    pub name: Option<String>,
    pub schema: Map<String, Value>,
    pub attributes: Map<String, Value>,
}

impl ElementData {
    /// Build from values in display order.
    pub fn build(name: Option<&str>, values: Vec<(String, ElementValue)>) -> Result<Self> {
        let mut schema = Map::new();
        let mut attributes = Map::new();
        schema.insert("id".to_string(), json!("str"));

        for (key, value) in values {
            if let ElementValue::List(items) = &value {
                if items.iter().any(|item| matches!(item, ElementValue::List(_))) {
                    return Err(unsupported(&key, "object"));
                }
            }

            let attr = format!("data-{}", key);
            schema.insert(attr.clone(), json!({ "name": key, "type": value.data_type() }));
            attributes.insert(attr, value.attribute_value());
        }

        Ok(Self {
            name: name.map(String::from),
            schema,
            attributes,
        })
    }

    /// Build from a JSON object, keeping its key order.
    pub fn from_json(name: Option<&str>, data: Map<String, Value>) -> Result<Self> {
        let values = data
            .into_iter()
            .map(|(key, value)| ElementValue::from_json(&key, value).map(|v| (key, v)))
            .collect::<Result<Vec<_>>>()?;
        Self::build(name, values)
    }

    /// Element Timing identifier: the element name with whitespace
    /// collapsed to `-`, or nothing for an unnamed element.
    pub fn timing_name(&self) -> Option<String> {
        let name = self.name.as_deref()?;
        let timing = name.split_whitespace().collect::<Vec<_>>().join("-");
        if timing.is_empty() {
            None
        } else {
            Some(timing)
        }
    }

    /// Attributes ready to set on the element: the timing name, the element
    /// name, the schema as JSON, then each `data-*` value (lists JSON-encoded).
    pub fn html_attributes(&self) -> Vec<(String, String)> {
        let mut attrs = Vec::with_capacity(self.attributes.len() + 3);

        if let Some(timing) = self.timing_name() {
            attrs.push((TIMING_ATTR.to_string(), timing));
        }
        if let Some(name) = &self.name {
            attrs.push((ELEMENT_NAME_ATTR.to_string(), name.clone()));
        }
        attrs.push((SCHEMA_ATTR.to_string(), Value::Object(self.schema.clone()).to_string()));

        for (key, value) in &self.attributes {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            attrs.push((key.clone(), rendered));
        }

        attrs
    }
}
