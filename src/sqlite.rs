use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection, InterruptHandle};
use serde::Deserialize;

use crate::error::StoreError;
use crate::query::SqlQuery;
use crate::schema::Column;
use crate::store::{Execution, Rows, Store};

const fn default_busy_timeout_ms() -> u64 {
    5_000
}

/// SQLite store configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
    /// Path to the SQLite database file, `:memory:` for a private in-memory database
    pub db_path: String,
    /// How long a statement waits on a locked database file
    pub busy_timeout_ms: u64,
    /// Upper bound for a single statement, lock wait included. `None` never interrupts.
    pub statement_timeout_ms: Option<u64>,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            db_path: ":memory:".to_string(),
            busy_timeout_ms: default_busy_timeout_ms(),
            statement_timeout_ms: None,
        }
    }
}

impl SqliteConfig {
    /// Create a new SQLite config for the given path
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            ..Self::default()
        }
    }

    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn statement_timeout(&self) -> Option<Duration> {
        self.statement_timeout_ms.map(Duration::from_millis)
    }
}

// Lifecycle of one blocking call, shared with the timeout watcher.
const WAITING: u8 = 0;
const RUNNING: u8 = 1;
const CANCELLED: u8 = 2;
const DONE: u8 = 3;

/// [`Store`] over a single rusqlite connection.
///
/// Calls run on tokio's blocking pool and take turns on the connection, so
/// every statement sees a consistent `last_insert_rowid`.
#[derive(Clone)]
pub struct SqliteStore {
    connection: Arc<Mutex<Connection>>,
    interrupt: Arc<InterruptHandle>,
    statement_timeout: Option<Duration>,
}

impl SqliteStore {
    pub fn open(config: &SqliteConfig) -> Result<Self, StoreError> {
        let connection = Connection::open(&config.db_path)?;
        connection.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        info!("opened sqlite store at {}", config.db_path);
        Ok(Self::from_connection(connection, config.statement_timeout()))
    }

    /// Wrap an already prepared connection.
    pub fn from_connection(connection: Connection, statement_timeout: Option<Duration>) -> Self {
        let interrupt = Arc::new(connection.get_interrupt_handle());
        Self {
            connection: Arc::new(Mutex::new(connection)),
            interrupt,
            statement_timeout,
        }
    }

    async fn run<T, F>(&self, work: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let connection = Arc::clone(&self.connection);
        let state = Arc::new(AtomicU8::new(WAITING));
        let task_state = Arc::clone(&state);

        let mut task = tokio::task::spawn_blocking(move || {
            let conn = connection.lock().map_err(|_| StoreError::Poisoned)?;
            if task_state
                .compare_exchange(WAITING, RUNNING, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                return Err(StoreError::Task("cancelled before start".to_string()));
            }
            let result = work(&conn).map_err(StoreError::from);
            task_state.store(DONE, Ordering::SeqCst);
            result
        });

        let limit = match self.statement_timeout {
            Some(limit) => limit,
            None => return task.await.map_err(|e| StoreError::Task(e.to_string()))?,
        };
        if let Ok(joined) = tokio::time::timeout(limit, &mut task).await {
            return joined.map_err(|e| StoreError::Task(e.to_string()))?;
        }

        // Still queued on the lock: it bails out before touching the database.
        if state
            .compare_exchange(WAITING, CANCELLED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            warn!("statement waited longer than {:?}, cancelled", limit);
            return Err(StoreError::Timeout(limit));
        }
        if state
            .compare_exchange(RUNNING, CANCELLED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.interrupt.interrupt();
        }
        // The statement may have committed before the interrupt landed.
        let joined = task.await.map_err(|e| StoreError::Task(e.to_string()))?;
        settle(joined, limit)
    }
}

/// Outcome of a call that outlived its timeout.
///
/// Only a statement SQLite actually interrupted is a timeout; anything that
/// finished in the meantime reports what it did.
fn settle<T>(result: Result<T, StoreError>, limit: Duration) -> Result<T, StoreError> {
    match result {
        Err(StoreError::Sqlite(rusqlite::Error::SqliteFailure(err, _)))
            if err.code == rusqlite::ErrorCode::OperationInterrupted =>
        {
            warn!("statement exceeded {:?}, interrupted", limit);
            Err(StoreError::Timeout(limit))
        }
        other => other,
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn table_names(&self) -> Result<Vec<String>, StoreError> {
        self.run(|conn| {
            let mut stmt = conn.prepare(
                "SELECT name FROM sqlite_master \
                 WHERE type = 'table' AND substr(name, 1, 7) != 'sqlite_'",
            )?;
            let names = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(names)
        })
        .await
    }

    async fn table_columns(&self, table: &str) -> Result<Vec<Column>, StoreError> {
        let table = table.to_string();
        self.run(move |conn| {
            let create_sql: Option<String> = conn.query_row(
                "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [&table],
                |row| row.get(0),
            )?;
            let without_rowid = create_sql
                .map(|sql| sql.to_ascii_uppercase().contains("WITHOUT ROWID"))
                .unwrap_or(false);

            let mut stmt = conn.prepare(
                "SELECT name, type, \"notnull\", pk FROM pragma_table_info(?1) ORDER BY cid",
            )?;
            let mut columns = stmt
                .query_map([&table], |row| {
                    let mut column = Column::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?);
                    column.nullable = row.get::<_, i64>(2)? == 0;
                    column.is_primary_key = row.get::<_, i64>(3)? > 0;
                    Ok(column)
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            // A lone INTEGER PRIMARY KEY aliases the rowid and is assigned on insert.
            let key_count = columns.iter().filter(|c| c.is_primary_key).count();
            if key_count == 1 && !without_rowid {
                for column in columns.iter_mut().filter(|c| c.is_primary_key) {
                    column.is_auto_generated = column.declared_type.eq_ignore_ascii_case("INTEGER");
                }
            }
            Ok(columns)
        })
        .await
    }

    async fn query(&self, query: SqlQuery) -> Result<Rows, StoreError> {
        debug!("query: {} {:?}", query.statement, query.params);
        self.run(move |conn| {
            let mut stmt = conn.prepare(&query.statement)?;
            let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
            let mut rows = stmt.query(params_from_iter(query.params.iter()))?;

            let mut result = Vec::new();
            while let Some(row) = rows.next()? {
                let mut values = Vec::with_capacity(columns.len());
                for i in 0..columns.len() {
                    values.push(row.get::<_, SqlValue>(i)?);
                }
                result.push(values);
            }
            Ok(Rows {
                columns,
                rows: result,
            })
        })
        .await
    }

    async fn execute(&self, query: SqlQuery) -> Result<Execution, StoreError> {
        debug!("execute: {} {:?}", query.statement, query.params);
        self.run(move |conn| {
            let affected = conn.execute(&query.statement, params_from_iter(query.params.iter()))?;
            Ok(Execution {
                affected: affected as u64,
                last_insert_id: conn.last_insert_rowid(),
            })
        })
        .await
    }
}
