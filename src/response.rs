//! Uniform response envelope.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value as JsonValue;

use crate::error::{ExplorerError, Status};
use crate::value::{Record, Value};

/// Successful payload, discriminated by operation kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Tables(Vec<String>),
    Records(Vec<Record>),
    Record(Record),
    /// New row's key, reported under the primary key's column name
    Inserted { key: String, id: Value },
    Updated(u64),
    Deleted(u64),
}

impl Serialize for ResponseBody {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            ResponseBody::Tables(names) => map.serialize_entry("tables", names)?,
            ResponseBody::Records(records) => map.serialize_entry("records", records)?,
            ResponseBody::Record(record) => map.serialize_entry("record", record)?,
            ResponseBody::Inserted { key, id } => map.serialize_entry(key, id)?,
            ResponseBody::Updated(count) => map.serialize_entry("updated", count)?,
            ResponseBody::Deleted(count) => map.serialize_entry("deleted", count)?,
        }
        map.end()
    }
}

/// What the transport adapter writes back for every operation.
#[derive(Debug)]
pub enum Envelope {
    Success(ResponseBody),
    Failure(ExplorerError),
}

impl Envelope {
    pub fn status(&self) -> Option<Status> {
        match self {
            Envelope::Success(_) => None,
            Envelope::Failure(err) => Some(err.status()),
        }
    }

    /// HTTP status code, 200 on success
    pub fn http_code(&self) -> u16 {
        self.status().map_or(200, Status::http_code)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success(_))
    }

    pub fn body(&self) -> Option<&ResponseBody> {
        match self {
            Envelope::Success(body) => Some(body),
            Envelope::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ExplorerError> {
        match self {
            Envelope::Success(_) => None,
            Envelope::Failure(err) => Some(err),
        }
    }

    /// `{"response": ...}` or `{"error": "..."}`
    pub fn to_json(&self) -> JsonValue {
        // String keys and scalar leaves only; non-finite floats become null.
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }
}

impl From<Result<ResponseBody, ExplorerError>> for Envelope {
    fn from(result: Result<ResponseBody, ExplorerError>) -> Self {
        match result {
            Ok(body) => Envelope::Success(body),
            Err(err) => Envelope::Failure(err),
        }
    }
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Envelope::Success(body) => map.serialize_entry("response", body)?,
            Envelope::Failure(err) => map.serialize_entry("error", &err.to_string())?,
        }
        map.end()
    }
}
