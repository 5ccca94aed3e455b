//! Tagged body-value unions.
//!
//! The kind of every payload is decided once, at the point the data is
//! produced (decode time for inbound, handler return for outbound). Nothing
//! downstream inspects runtime types; it matches on these enums.

use bytes::Bytes;
use serde_json::Value;
use std::collections::HashMap;

/// A value bound to a form or query key.
///
/// A key seen once holds `Single`; the first repeat converts it into a
/// two-element `Many`, further repeats append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Single(String),
    Many(Vec<String>),
}

impl FormValue {
    /// The sole value, if the key was not repeated.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FormValue::Single(value) => Some(value),
            FormValue::Many(_) => None,
        }
    }

    /// All values in arrival order.
    pub fn values(&self) -> Vec<&str> {
        match self {
            FormValue::Single(value) => vec![value.as_str()],
            FormValue::Many(items) => items.iter().map(String::as_str).collect(),
        }
    }

    fn push(&mut self, value: String) {
        match self {
            FormValue::Single(first) => {
                let first = std::mem::take(first);
                *self = FormValue::Many(vec![first, value]);
            }
            FormValue::Many(items) => items.push(value),
        }
    }
}

/// An insertion-ordered multimap for query parameters and form bodies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormMap {
    entries: Vec<(String, FormValue)>,
}

impl FormMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, collapsing repeats of `key` into an ordered sequence.
    pub fn insert(&mut self, key: String, value: String) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, bound)) => bound.push(value),
            None => self.entries.push((key, FormValue::Single(value))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&FormValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys and values in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FormValue)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value))
    }

    /// JSON view: single values become strings, repeats become arrays.
    pub fn to_json(&self) -> Value {
        let mut map = serde_json::Map::new();
        for (key, value) in &self.entries {
            let rendered = match value {
                FormValue::Single(single) => Value::String(single.clone()),
                FormValue::Many(items) => {
                    Value::Array(items.iter().cloned().map(Value::String).collect())
                }
            };
            map.insert(key.clone(), rendered);
        }
        Value::Object(map)
    }
}

/// What a handler hands back (or a response serializes out).
#[derive(Debug, Clone, PartialEq)]
pub enum BodyValue {
    /// No body at all.
    Empty,
    /// Text, encoded with the configured charset on the wire.
    Text(String),
    /// Raw bytes, passed through unchanged.
    Bytes(Bytes),
    /// A JSON value, serialized at emission time.
    Json(Value),
}

impl From<String> for BodyValue {
    fn from(value: String) -> Self {
        BodyValue::Text(value)
    }
}

impl From<&str> for BodyValue {
    fn from(value: &str) -> Self {
        BodyValue::Text(value.to_string())
    }
}

impl From<Value> for BodyValue {
    fn from(value: Value) -> Self {
        BodyValue::Json(value)
    }
}

impl From<Bytes> for BodyValue {
    fn from(value: Bytes) -> Self {
        BodyValue::Bytes(value)
    }
}

/// A decoded HTTP request body.
#[derive(Debug, Clone)]
pub enum RequestData {
    /// Parsed `application/json` payload; a zero-length body decodes to an
    /// empty JSON object.
    Json(Value),
    /// Parsed `application/x-www-form-urlencoded` payload.
    Form(FormMap),
    /// `multipart/form-data` parts: declared part name to raw payload bytes.
    Multipart(HashMap<String, Bytes>),
    /// Anything else, unmodified.
    Raw(Bytes),
}

impl From<RequestData> for BodyValue {
    fn from(data: RequestData) -> Self {
        match data {
            RequestData::Json(value) => BodyValue::Json(value),
            RequestData::Form(form) => BodyValue::Json(form.to_json()),
            RequestData::Multipart(parts) => BodyValue::Json(Value::Object(
                parts
                    .into_iter()
                    .map(|(name, payload)| {
                        (
                            name,
                            Value::String(String::from_utf8_lossy(&payload).into_owned()),
                        )
                    })
                    .collect(),
            )),
            RequestData::Raw(raw) => BodyValue::Bytes(raw),
        }
    }
}

/// A decoded WebSocket message.
#[derive(Debug, Clone)]
pub enum MessageData {
    Json(Value),
    Text(String),
}
