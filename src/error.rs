//! Error taxonomy for the explorer and its store adapter.

use std::time::Duration;

use thiserror::Error;

/// Result type for explorer operations
pub type ExplorerResult<T> = Result<T, ExplorerError>;

/// Failures raised while talking to the underlying store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Error reported by SQLite itself, surfaced verbatim
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Statement did not finish within the configured limit
    #[error("statement timed out after {0:?}")]
    Timeout(Duration),

    /// The blocking task running the statement panicked or was cancelled
    #[error("store task failed: {0}")]
    Task(String),

    /// A previous statement panicked while holding the connection
    #[error("store connection is poisoned")]
    Poisoned,
}

/// Every failure a dispatched operation can end in.
#[derive(Debug, Error)]
pub enum ExplorerError {
    // ==================
    // Startup
    // ==================
    /// Schema discovery failed; no catalog, no service
    #[error("schema error: {0}")]
    Schema(String),

    // ==================
    // Not found
    // ==================
    #[error("unknown table")]
    UnknownTable(String),

    #[error("record not found")]
    RecordNotFound,

    // ==================
    // Bad request
    // ==================
    #[error("invalid id")]
    InvalidId(String),

    /// Payload value does not fit the column, or targets the primary key
    #[error("field {0} has invalid type")]
    TypeMismatch(String),

    #[error("nothing to update")]
    NoFieldsToUpdate,

    /// Body was present but is not a JSON object
    #[error("invalid body: expected an object, got {0}")]
    InvalidBody(&'static str),

    /// Only raised under `UnknownFieldPolicy::Reject`
    #[error("unknown field {0}")]
    UnknownField(String),

    // ==================
    // Internal
    // ==================
    #[error("{0}")]
    Store(#[from] StoreError),
}

/// Coarse classification the transport layer maps onto its own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    NotFound,
    BadRequest,
    Internal,
}

impl Status {
    /// HTTP status code for this class
    pub fn http_code(self) -> u16 {
        match self {
            Status::NotFound => 404,
            Status::BadRequest => 400,
            Status::Internal => 500,
        }
    }
}

impl ExplorerError {
    pub fn status(&self) -> Status {
        match self {
            ExplorerError::UnknownTable(_) | ExplorerError::RecordNotFound => Status::NotFound,

            ExplorerError::InvalidId(_)
            | ExplorerError::TypeMismatch(_)
            | ExplorerError::NoFieldsToUpdate
            | ExplorerError::InvalidBody(_)
            | ExplorerError::UnknownField(_) => Status::BadRequest,

            ExplorerError::Store(_) | ExplorerError::Schema(_) => Status::Internal,
        }
    }

    pub(crate) fn schema(err: impl std::fmt::Display) -> Self {
        ExplorerError::Schema(err.to_string())
    }
}
