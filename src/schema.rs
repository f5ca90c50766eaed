//! Discovered table structure.

use crate::error::{ExplorerError, ExplorerResult};

/// Coarse family a declared column type falls into.
///
/// Classification follows SQLite's affinity rules loosely: the declared type
/// is matched by substring, case-insensitively, so `varchar(255)`, `int(11)`
/// and `DOUBLE PRECISION` all land where a reader expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFamily {
    Integer,
    Real,
    Text,
    Boolean,
    Blob,
    /// No recognizable declared type (SQLite untyped columns)
    Other,
}

impl TypeFamily {
    pub fn classify(declared_type: &str) -> Self {
        let ty = declared_type.to_ascii_lowercase();
        let has = |needle: &str| ty.contains(needle);

        if has("bool") {
            TypeFamily::Boolean
        } else if has("int") {
            TypeFamily::Integer
        } else if has("char") || has("clob") || has("text") {
            TypeFamily::Text
        } else if has("blob") || has("binary") {
            TypeFamily::Blob
        } else if has("real") || has("floa") || has("doub") || has("dec") || has("numeric") {
            TypeFamily::Real
        } else if has("date") || has("time") || has("json") || has("uuid") || has("enum") {
            TypeFamily::Text
        } else {
            TypeFamily::Other
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, TypeFamily::Integer | TypeFamily::Real | TypeFamily::Boolean)
    }

    pub fn is_text(self) -> bool {
        self == TypeFamily::Text
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    /// Raw type string as the store reports it
    pub declared_type: String,
    pub nullable: bool,
    pub is_primary_key: bool,
    /// Store assigns the value on insert
    pub is_auto_generated: bool,
    pub family: TypeFamily,
}

impl Column {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        let declared_type = declared_type.into();
        Self {
            name: name.into(),
            family: TypeFamily::classify(&declared_type),
            declared_type,
            nullable: true,
            is_primary_key: false,
            is_auto_generated: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    pub fn auto_generated(mut self) -> Self {
        self.is_auto_generated = true;
        self
    }
}

/// A table as discovered at startup. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    primary_key: usize,
}

impl Table {
    /// Assemble a table, enforcing that exactly one column is the primary key.
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> ExplorerResult<Self> {
        let name = name.into();
        let mut keys = columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_primary_key)
            .map(|(i, _)| i);

        let primary_key = match (keys.next(), keys.next()) {
            (Some(index), None) => index,
            (None, _) => {
                return Err(ExplorerError::Schema(format!(
                    "table {name} has no primary key"
                )))
            }
            (Some(_), Some(_)) => {
                return Err(ExplorerError::Schema(format!(
                    "table {name} has a composite primary key"
                )))
            }
        };

        Ok(Self {
            name,
            columns,
            primary_key,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn primary_key(&self) -> &Column {
        &self.columns[self.primary_key]
    }
}
