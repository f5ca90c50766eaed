//! Canonical cell values, caller payloads and result records.

use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value as JsonValue;

use crate::error::{ExplorerError, ExplorerResult};

/// Core value types for SQLite operations
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Boolean(bool),
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = match self {
            Value::Null => SqlValue::Null,
            Value::Integer(i) => SqlValue::Integer(*i),
            Value::Real(f) => SqlValue::Real(*f),
            Value::Text(s) => return Ok(ToSqlOutput::from(s.as_str())),
            Value::Boolean(b) => SqlValue::Integer(i64::from(*b)),
        };
        Ok(ToSqlOutput::Owned(value))
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Real(f) => serializer.serialize_f64(*f),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Boolean(b) => serializer.serialize_bool(*b),
        }
    }
}

/// A caller-supplied field value before validation.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(Value),
    /// Any JSON shape outside the canonical set (object, array)
    Unrecognized(&'static str),
}

impl From<&JsonValue> for FieldValue {
    fn from(json: &JsonValue) -> Self {
        match json {
            JsonValue::Null => FieldValue::Scalar(Value::Null),
            JsonValue::Bool(b) => FieldValue::Scalar(Value::Boolean(*b)),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Scalar(Value::Integer(i)),
                // u64 beyond i64::MAX and fractional numbers
                None => match n.as_f64() {
                    Some(f) => FieldValue::Scalar(Value::Real(f)),
                    None => FieldValue::Unrecognized("number"),
                },
            },
            JsonValue::String(s) => FieldValue::Scalar(Value::Text(s.clone())),
            JsonValue::Array(_) => FieldValue::Unrecognized("array"),
            JsonValue::Object(_) => FieldValue::Unrecognized("object"),
        }
    }
}

fn json_kind(json: &JsonValue) -> &'static str {
    match json {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// Write payload: field name to caller value, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    fields: Vec<(String, FieldValue)>,
}

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, replacing an earlier one with the same name
    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.insert(name, FieldValue::Scalar(value.into()));
        self
    }

    pub fn insert(&mut self, name: &str, value: FieldValue) {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    /// Build a payload from an optional request body.
    ///
    /// A missing body is an empty payload; anything but a JSON object is
    /// `InvalidBody`.
    pub fn from_json(body: Option<&JsonValue>) -> ExplorerResult<Self> {
        match body {
            None | Some(JsonValue::Null) => Ok(Self::new()),
            Some(JsonValue::Object(map)) => {
                let mut payload = Self::new();
                for (name, value) in map {
                    payload.insert(name, FieldValue::from(value));
                }
                Ok(payload)
            }
            Some(other) => Err(ExplorerError::InvalidBody(json_kind(other))),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One result row, keyed by column name in result-set order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.fields.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
