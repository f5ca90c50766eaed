//! Table catalog discovered from the live store.
//!
//! Built once before any request is served and never mutated afterwards;
//! share it behind an `Arc`.

use std::collections::HashMap;

use log::{debug, info};

use crate::error::{ExplorerError, ExplorerResult};
use crate::schema::Table;
use crate::store::Store;

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tables: HashMap<String, Table>,
    /// Table names in discovery order
    order: Vec<String>,
}

impl Catalog {
    /// Introspect every table visible to the store.
    ///
    /// All or nothing: any failed query or malformed table fails the whole
    /// discovery with `ExplorerError::Schema`.
    pub async fn discover(store: &dyn Store) -> ExplorerResult<Self> {
        let names = store.table_names().await.map_err(ExplorerError::schema)?;

        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            let columns = store
                .table_columns(&name)
                .await
                .map_err(|e| ExplorerError::Schema(format!("table {name}: {e}")))?;
            debug!("discovered table {} with {} columns", name, columns.len());
            tables.push(Table::new(name, columns)?);
        }

        let catalog = Self::from_tables(tables);
        info!("schema catalog ready: {} tables", catalog.len());
        Ok(catalog)
    }

    /// Build a catalog from already assembled tables, keeping their order.
    pub fn from_tables(tables: impl IntoIterator<Item = Table>) -> Self {
        let mut catalog = Self::default();
        for table in tables {
            let name = table.name().to_string();
            if catalog.tables.insert(name.clone(), table).is_none() {
                catalog.order.push(name);
            }
        }
        catalog
    }

    pub fn lookup(&self, name: &str) -> ExplorerResult<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| ExplorerError::UnknownTable(name.to_string()))
    }

    pub fn table_names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
