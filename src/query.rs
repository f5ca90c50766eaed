//! Parameterized statement construction.
//!
//! Only identifiers taken from the [`Catalog`](crate::catalog::Catalog) are
//! written into statement text, always quoted. Every value travels as a `?`
//! placeholder in [`SqlQuery::params`].

use std::collections::HashMap;

use log::debug;

use crate::error::{ExplorerError, ExplorerResult};
use crate::schema::{Column, Table, TypeFamily};
use crate::value::Value;

/// SQL statement with positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub statement: String,
    pub params: Vec<Value>,
}

impl SqlQuery {
    pub fn new(statement: &str) -> Self {
        Self {
            statement: statement.to_string(),
            params: Vec::new(),
        }
    }

    pub fn with_params(mut self, params: Vec<Value>) -> Self {
        self.params = params;
        self
    }

    /// Number of `?` placeholders outside quoted identifiers
    pub fn placeholder_count(&self) -> usize {
        let mut quoted = false;
        let mut count = 0;
        for c in self.statement.chars() {
            match c {
                '"' => quoted = !quoted,
                '?' if !quoted => count += 1,
                _ => {}
            }
        }
        count
    }

    fn checked(self) -> Self {
        debug_assert_eq!(
            self.placeholder_count(),
            self.params.len(),
            "placeholder count mismatch in {}",
            self.statement
        );
        debug!("built statement: {}", self.statement);
        self
    }
}

/// Quote an identifier for SQLite, doubling embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Page window of a list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    /// Read `limit` and `offset` from query parameters.
    ///
    /// Unparseable or negative values fall back to `default_limit` and 0.
    pub fn from_query(query: &HashMap<String, String>, default_limit: u32) -> Self {
        let parse = |key: &str| {
            query
                .get(key)
                .and_then(|raw| raw.trim().parse::<i64>().ok())
                .filter(|v| *v >= 0)
        };
        Self {
            limit: parse("limit").unwrap_or(i64::from(default_limit)),
            offset: parse("offset").unwrap_or(0),
        }
    }
}

/// Parse an id token as the primary key's integer value.
pub fn parse_id(token: &str) -> ExplorerResult<i64> {
    token
        .trim()
        .parse::<i64>()
        .map_err(|_| ExplorerError::InvalidId(token.to_string()))
}

/// Validated value bound for one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment<'a> {
    pub column: &'a Column,
    pub value: Value,
}

pub fn select_page(table: &Table, page: Page) -> SqlQuery {
    SqlQuery::new(&format!(
        "SELECT * FROM {} LIMIT ? OFFSET ?",
        quote_identifier(table.name())
    ))
    .with_params(vec![Value::Integer(page.limit), Value::Integer(page.offset)])
    .checked()
}

pub fn select_by_id(table: &Table, id: i64) -> SqlQuery {
    SqlQuery::new(&format!(
        "SELECT * FROM {} WHERE {} = ?",
        quote_identifier(table.name()),
        quote_identifier(&table.primary_key().name)
    ))
    .with_params(vec![Value::Integer(id)])
    .checked()
}

/// Zero-equivalent used for a NOT NULL column the caller left out.
pub fn zero_value(column: &Column) -> Value {
    match column.family {
        TypeFamily::Integer | TypeFamily::Boolean => Value::Integer(0),
        TypeFamily::Real => Value::Real(0.0),
        TypeFamily::Text | TypeFamily::Blob | TypeFamily::Other => Value::Text(String::new()),
    }
}

/// Insert built from validated assignments.
///
/// Columns the caller left out get a zero value when NOT NULL; a key column
/// counts as NOT NULL since a NULL key addresses nothing. Auto-generated
/// columns are never written.
pub fn insert(table: &Table, assignments: &[Assignment<'_>]) -> SqlQuery {
    let mut names = Vec::new();
    let mut params = Vec::new();

    for column in table.columns() {
        if column.is_auto_generated {
            continue;
        }
        match assignments.iter().find(|a| a.column.name == column.name) {
            Some(assignment) => params.push(assignment.value.clone()),
            None if !column.nullable || column.is_primary_key => params.push(zero_value(column)),
            None => continue,
        }
        names.push(quote_identifier(&column.name));
    }

    let target = quote_identifier(table.name());
    let statement = if names.is_empty() {
        format!("INSERT INTO {target} DEFAULT VALUES")
    } else {
        format!(
            "INSERT INTO {target} ({}) VALUES ({})",
            names.join(", "),
            vec!["?"; names.len()].join(", ")
        )
    };
    SqlQuery::new(&statement).with_params(params).checked()
}

pub fn update(table: &Table, assignments: &[Assignment<'_>], id: i64) -> ExplorerResult<SqlQuery> {
    if assignments.is_empty() {
        return Err(ExplorerError::NoFieldsToUpdate);
    }

    let sets: Vec<String> = assignments
        .iter()
        .map(|a| format!("{} = ?", quote_identifier(&a.column.name)))
        .collect();
    let mut params: Vec<Value> = assignments.iter().map(|a| a.value.clone()).collect();
    params.push(Value::Integer(id));

    Ok(SqlQuery::new(&format!(
        "UPDATE {} SET {} WHERE {} = ?",
        quote_identifier(table.name()),
        sets.join(", "),
        quote_identifier(&table.primary_key().name)
    ))
    .with_params(params)
    .checked())
}

pub fn delete(table: &Table, id: i64) -> SqlQuery {
    SqlQuery::new(&format!(
        "DELETE FROM {} WHERE {} = ?",
        quote_identifier(table.name()),
        quote_identifier(&table.primary_key().name)
    ))
    .with_params(vec![Value::Integer(id)])
    .checked()
}
