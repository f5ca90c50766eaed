//! The seam between the explorer and a concrete database driver.

use async_trait::async_trait;
use rusqlite::types::Value as SqlValue;

use crate::error::StoreError;
use crate::query::SqlQuery;
use crate::schema::Column;

/// Rows returned by a select, still in driver representation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>, // row-major
}

/// Outcome of a statement that modifies data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Execution {
    pub affected: u64,
    pub last_insert_id: i64,
}

/// A relational store the explorer can introspect and query.
///
/// Each call is one round trip; implementations must not hold a connection
/// between calls.
#[async_trait]
pub trait Store: Send + Sync {
    /// Names of every user table, in the store's own listing order
    async fn table_names(&self) -> Result<Vec<String>, StoreError>;

    /// Column metadata for one table, in declaration order
    async fn table_columns(&self, table: &str) -> Result<Vec<Column>, StoreError>;

    async fn query(&self, query: SqlQuery) -> Result<Rows, StoreError>;

    async fn execute(&self, query: SqlQuery) -> Result<Execution, StoreError>;
}
