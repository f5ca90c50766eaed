//! Schema-driven CRUD access over an introspected SQLite database.
//!
//! # Intention
//!
//! - Discover every table of a live database once, at startup.
//! - Serve list/get/create/update/delete over any of them through one
//!   generic, parameterized, validated path.
//! - Answer every operation with a uniform envelope.
//!
//! # Architectural Boundaries
//!
//! - Only catalog, validation, statement building and dispatch belong here.
//! - Listening, route splitting and wire encoding live in the transport
//!   adapter, which builds [`Operation`]s and writes back [`Envelope`]s.

pub mod catalog;
pub mod coerce;
pub mod config;
pub mod error;
pub mod explorer;
pub mod operation;
pub mod query;
pub mod response;
pub mod schema;
pub mod sqlite;
pub mod store;
pub mod value;

pub use catalog::Catalog;
pub use config::{ExplorerConfig, UnknownFieldPolicy};
pub use error::{ExplorerError, ExplorerResult, Status, StoreError};
pub use explorer::Explorer;
pub use operation::{Method, Operation};
pub use response::{Envelope, ResponseBody};
pub use schema::{Column, Table, TypeFamily};
pub use sqlite::{SqliteConfig, SqliteStore};
pub use store::{Execution, Rows, Store};
pub use value::{FieldValue, Payload, Record, Value};
