//! Request dispatch: operation in, envelope out.

use std::sync::Arc;

use log::{debug, warn};

use crate::catalog::Catalog;
use crate::coerce::{self, WriteKind};
use crate::config::ExplorerConfig;
use crate::error::{ExplorerError, ExplorerResult, Status};
use crate::operation::{Method, Operation};
use crate::query::{self, Page};
use crate::response::{Envelope, ResponseBody};
use crate::schema::Table;
use crate::sqlite::{SqliteConfig, SqliteStore};
use crate::store::Store;
use crate::value::{Payload, Value};

/// Generic CRUD front over every table of a store.
///
/// Cheap to clone; clones share the catalog and the store.
#[derive(Clone)]
pub struct Explorer {
    catalog: Arc<Catalog>,
    store: Arc<dyn Store>,
    config: ExplorerConfig,
}

impl Explorer {
    /// Open a SQLite database and discover its schema.
    pub async fn open(sqlite: &SqliteConfig, config: ExplorerConfig) -> ExplorerResult<Self> {
        let store = SqliteStore::open(sqlite).map_err(ExplorerError::schema)?;
        Self::with_store(Arc::new(store), config).await
    }

    /// Discover the schema behind an existing store.
    pub async fn with_store(store: Arc<dyn Store>, config: ExplorerConfig) -> ExplorerResult<Self> {
        let catalog = Catalog::discover(store.as_ref()).await?;
        Ok(Self {
            catalog: Arc::new(catalog),
            store,
            config,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    /// Run an operation and wrap the outcome; never fails.
    pub async fn handle(&self, op: Operation) -> Envelope {
        let method = op.method;
        let result = self.dispatch(op).await;
        if let Err(err) = &result {
            match err.status() {
                Status::Internal => warn!("{:?} failed: {}", method, err),
                _ => debug!("{:?} rejected: {}", method, err),
            }
        }
        Envelope::from(result)
    }

    pub async fn dispatch(&self, op: Operation) -> ExplorerResult<ResponseBody> {
        debug!("dispatch {:?} on {:?}", op.method, op.table);
        match op.method {
            Method::ListTables => Ok(ResponseBody::Tables(self.catalog.table_names().to_vec())),
            Method::List => self.list(&op).await,
            Method::GetById => self.get(&op).await,
            Method::Create => self.create(&op).await,
            Method::Update => self.update(&op).await,
            Method::Delete => self.delete(&op).await,
        }
    }

    async fn list(&self, op: &Operation) -> ExplorerResult<ResponseBody> {
        let table = self.catalog.lookup(&op.table)?;
        let page = Page::from_query(&op.query, self.config.default_limit);

        let rows = self.store.query(query::select_page(table, page)).await?;
        Ok(ResponseBody::Records(coerce::records(table, rows)))
    }

    async fn get(&self, op: &Operation) -> ExplorerResult<ResponseBody> {
        let table = self.catalog.lookup(&op.table)?;
        let id = parse_op_id(op)?;

        let rows = self.store.query(query::select_by_id(table, id)).await?;
        coerce::records(table, rows)
            .into_iter()
            .next()
            .map(ResponseBody::Record)
            .ok_or(ExplorerError::RecordNotFound)
    }

    async fn create(&self, op: &Operation) -> ExplorerResult<ResponseBody> {
        let table = self.catalog.lookup(&op.table)?;
        let payload = Payload::from_json(op.body.as_ref())?;
        let assignments =
            coerce::validate_payload(table, &payload, WriteKind::Create, self.config.unknown_fields)?;

        let insert = query::insert(table, &assignments);
        let execution = self.store.execute(insert).await?;

        let key = table.primary_key();
        let id = assignments
            .iter()
            .find(|a| a.column.name == key.name)
            .map(|a| a.value.clone())
            .unwrap_or_else(|| inserted_key(table, execution.last_insert_id));
        Ok(ResponseBody::Inserted {
            key: key.name.clone(),
            id,
        })
    }

    async fn update(&self, op: &Operation) -> ExplorerResult<ResponseBody> {
        let table = self.catalog.lookup(&op.table)?;
        let id = parse_op_id(op)?;
        let payload = Payload::from_json(op.body.as_ref())?;
        let assignments =
            coerce::validate_payload(table, &payload, WriteKind::Update, self.config.unknown_fields)?;

        let update = query::update(table, &assignments, id)?;
        let execution = self.store.execute(update).await?;
        Ok(ResponseBody::Updated(execution.affected))
    }

    async fn delete(&self, op: &Operation) -> ExplorerResult<ResponseBody> {
        let table = self.catalog.lookup(&op.table)?;
        let id = parse_op_id(op)?;

        let execution = self.store.execute(query::delete(table, id)).await?;
        Ok(ResponseBody::Deleted(execution.affected))
    }
}

fn parse_op_id(op: &Operation) -> ExplorerResult<i64> {
    match op.id.as_deref() {
        Some(token) => query::parse_id(token),
        None => Err(ExplorerError::InvalidId(String::new())),
    }
}

/// Key of a row the caller did not name a key for.
fn inserted_key(table: &Table, last_insert_id: i64) -> Value {
    let key = table.primary_key();
    if key.is_auto_generated {
        Value::Integer(last_insert_id)
    } else {
        // A key left out of the payload was written as its zero value
        query::zero_value(key)
    }
}
