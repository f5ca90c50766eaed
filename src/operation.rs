//! Inbound operation descriptors built by the transport adapter.

use std::collections::HashMap;

use serde_json::Value as JsonValue;

/// Logical CRUD method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    ListTables,
    List,
    GetById,
    Create,
    Update,
    Delete,
}

/// One request against the explorer.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub method: Method,
    pub table: String,
    pub id: Option<String>,
    /// Query string parameters; `limit` and `offset` are recognized
    pub query: HashMap<String, String>,
    pub body: Option<JsonValue>,
}

impl Operation {
    pub fn new(method: Method, table: &str) -> Self {
        Self {
            method,
            table: table.to_string(),
            id: None,
            query: HashMap::new(),
            body: None,
        }
    }

    pub fn list_tables() -> Self {
        Self::new(Method::ListTables, "")
    }

    pub fn list(table: &str) -> Self {
        Self::new(Method::List, table)
    }

    pub fn get(table: &str, id: &str) -> Self {
        Self::new(Method::GetById, table).with_id(id)
    }

    pub fn create(table: &str, body: JsonValue) -> Self {
        Self::new(Method::Create, table).with_body(body)
    }

    pub fn update(table: &str, id: &str, body: JsonValue) -> Self {
        Self::new(Method::Update, table).with_id(id).with_body(body)
    }

    pub fn delete(table: &str, id: &str) -> Self {
        Self::new(Method::Delete, table).with_id(id)
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Add a query string parameter
    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }
}
