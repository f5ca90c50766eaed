//! Read-side value coercion and write-side payload validation.

use rusqlite::types::Value as SqlValue;

use crate::config::UnknownFieldPolicy;
use crate::error::{ExplorerError, ExplorerResult};
use crate::query::Assignment;
use crate::schema::{Column, Table, TypeFamily};
use crate::store::Rows;
use crate::value::{FieldValue, Payload, Record, Value};

/// Convert a driver value into its canonical form for a column family.
///
/// `None` means the result column is not a known table column (an alias or
/// expression); the value is then converted without family hints.
pub fn coerce(raw: SqlValue, family: Option<TypeFamily>) -> Value {
    match raw {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(i) if family == Some(TypeFamily::Boolean) => Value::Boolean(i != 0),
        SqlValue::Integer(i) => Value::Integer(i),
        SqlValue::Real(f) => Value::Real(f),
        SqlValue::Text(s) => Value::Text(s),
        // No byte kind in the canonical set
        SqlValue::Blob(bytes) => Value::Text(String::from_utf8_lossy(&bytes).into_owned()),
    }
}

/// Turn driver rows into records, keyed by result-set column names.
pub fn records(table: &Table, rows: Rows) -> Vec<Record> {
    let families: Vec<Option<TypeFamily>> = rows
        .columns
        .iter()
        .map(|name| table.column(name).map(|c| c.family))
        .collect();

    rows.rows
        .into_iter()
        .map(|row| {
            let mut record = Record::new();
            for ((name, family), raw) in rows.columns.iter().zip(&families).zip(row) {
                record.push(name.as_str(), coerce(raw, *family));
            }
            record
        })
        .collect()
}

/// Check one caller value against a column.
///
/// Coarse by intent: it stops gross type confusion, range and precision are
/// left to the store.
pub fn validate(value: &FieldValue, column: &Column) -> ExplorerResult<Value> {
    let scalar = match value {
        FieldValue::Scalar(scalar) => scalar,
        FieldValue::Unrecognized(_) => return Err(ExplorerError::TypeMismatch(column.name.clone())),
    };

    let fits = match (scalar, column.family) {
        (Value::Null, _) => column.nullable && !column.is_primary_key,
        (_, TypeFamily::Other) => true,
        (Value::Text(_), family) => family.is_text() || family == TypeFamily::Blob,
        (Value::Integer(_) | Value::Real(_), family) => family.is_numeric(),
        (Value::Boolean(_), family) => {
            matches!(family, TypeFamily::Boolean | TypeFamily::Integer)
        }
    };

    if fits {
        Ok(scalar.clone())
    } else {
        Err(ExplorerError::TypeMismatch(column.name.clone()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Create,
    Update,
}

/// Validate a whole payload against a table, stopping at the first violation.
///
/// Create skips auto-generated columns whatever the payload holds. Update
/// refuses the primary key.
pub fn validate_payload<'t>(
    table: &'t Table,
    payload: &Payload,
    kind: WriteKind,
    policy: UnknownFieldPolicy,
) -> ExplorerResult<Vec<Assignment<'t>>> {
    if policy == UnknownFieldPolicy::Reject {
        if let Some(unknown) = payload.names().find(|name| table.column(name).is_none()) {
            return Err(ExplorerError::UnknownField(unknown.to_string()));
        }
    }

    let mut assignments = Vec::new();
    for column in table.columns() {
        let Some(value) = payload.get(&column.name) else {
            continue;
        };
        match kind {
            WriteKind::Create if column.is_auto_generated => continue,
            WriteKind::Update if column.is_primary_key => {
                return Err(ExplorerError::TypeMismatch(column.name.clone()))
            }
            _ => {}
        }
        let value = validate(value, column)?;
        assignments.push(Assignment { column, value });
    }
    Ok(assignments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Table {
        Table::new(
            "users",
            vec![
                Column::new("user_id", "INTEGER").primary_key().auto_generated(),
                Column::new("login", "varchar(255)").not_null(),
                Column::new("age", "int(11)"),
                Column::new("score", "DOUBLE"),
                Column::new("active", "BOOLEAN").not_null(),
                Column::new("info", "TEXT"),
                Column::new("anything", ""),
            ],
        )
        .unwrap()
    }

    fn scalar(v: impl Into<Value>) -> FieldValue {
        FieldValue::Scalar(v.into())
    }

    #[test]
    fn test_coerce_driver_values() {
        assert_eq!(coerce(SqlValue::Null, Some(TypeFamily::Text)), Value::Null);
        assert_eq!(coerce(SqlValue::Integer(7), Some(TypeFamily::Integer)), Value::Integer(7));
        assert_eq!(coerce(SqlValue::Integer(1), Some(TypeFamily::Boolean)), Value::Boolean(true));
        assert_eq!(coerce(SqlValue::Real(1.5), None), Value::Real(1.5));
        assert_eq!(
            coerce(SqlValue::Blob(b"hello".to_vec()), Some(TypeFamily::Text)),
            Value::Text("hello".into())
        );
        assert_eq!(
            coerce(SqlValue::Text("x".into()), Some(TypeFamily::Text)),
            Value::Text("x".into())
        );
    }

    #[test]
    fn test_records_follow_result_columns() {
        let table = users();
        let rows = Rows {
            columns: vec!["user_id".into(), "active".into(), "total".into()],
            rows: vec![vec![SqlValue::Integer(1), SqlValue::Integer(0), SqlValue::Integer(3)]],
        };

        let out = records(&table, rows);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].get("user_id"), Some(&Value::Integer(1)));
        assert_eq!(out[0].get("active"), Some(&Value::Boolean(false)));
        assert_eq!(out[0].get("total"), Some(&Value::Integer(3)));
    }

    #[test]
    fn test_validate_null_follows_nullability() {
        let table = users();
        assert!(validate(&scalar(Value::Null), table.column("age").unwrap()).is_ok());
        assert!(matches!(
            validate(&scalar(Value::Null), table.column("login").unwrap()),
            Err(ExplorerError::TypeMismatch(field)) if field == "login"
        ));
    }

    #[test]
    fn test_validate_null_never_fits_primary_key() {
        let key = Column::new("id", "int(11)").primary_key();
        assert!(key.nullable);
        assert!(matches!(
            validate(&scalar(Value::Null), &key),
            Err(ExplorerError::TypeMismatch(field)) if field == "id"
        ));
        assert!(validate(&scalar(7i64), &key).is_ok());
    }

    #[test]
    fn test_validate_kinds_against_families() {
        let table = users();
        let login = table.column("login").unwrap();
        let age = table.column("age").unwrap();
        let score = table.column("score").unwrap();
        let active = table.column("active").unwrap();

        assert!(validate(&scalar("bob"), login).is_ok());
        assert!(validate(&scalar(42i64), login).is_err());
        assert!(validate(&scalar(true), login).is_err());

        assert!(validate(&scalar(42i64), age).is_ok());
        assert!(validate(&scalar(4.2), age).is_ok());
        assert!(validate(&scalar("42"), age).is_err());

        assert!(validate(&scalar(4.2), score).is_ok());
        assert!(validate(&scalar(true), score).is_err());

        assert!(validate(&scalar(true), active).is_ok());
        assert!(validate(&scalar(1i64), active).is_ok());
    }

    #[test]
    fn test_validate_unrecognized_always_fails() {
        let table = users();
        for column in table.columns() {
            assert!(validate(&FieldValue::Unrecognized("object"), column).is_err());
        }
    }

    #[test]
    fn test_untyped_column_accepts_any_scalar() {
        let table = users();
        let anything = table.column("anything").unwrap();
        assert!(validate(&scalar("x"), anything).is_ok());
        assert!(validate(&scalar(1i64), anything).is_ok());
        assert!(validate(&scalar(false), anything).is_ok());
    }

    #[test]
    fn test_create_ignores_auto_key_and_unknown_fields() {
        let table = users();
        let payload = Payload::new()
            .with_field("user_id", 99i64)
            .with_field("login", "bob")
            .with_field("nope", 1i64);

        let assignments =
            validate_payload(&table, &payload, WriteKind::Create, UnknownFieldPolicy::Ignore)
                .unwrap();
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].column.name, "login");
    }

    #[test]
    fn test_update_rejects_primary_key() {
        let table = users();
        let payload = Payload::new().with_field("user_id", 2i64).with_field("login", "bob");

        let err = validate_payload(&table, &payload, WriteKind::Update, UnknownFieldPolicy::Ignore)
            .unwrap_err();
        assert!(matches!(err, ExplorerError::TypeMismatch(field) if field == "user_id"));
    }

    #[test]
    fn test_reject_policy_names_unknown_field() {
        let table = users();
        let payload = Payload::new().with_field("login", "bob").with_field("nope", 1i64);

        let err = validate_payload(&table, &payload, WriteKind::Update, UnknownFieldPolicy::Reject)
            .unwrap_err();
        assert!(matches!(err, ExplorerError::UnknownField(field) if field == "nope"));
    }

    #[test]
    fn test_first_violation_aborts() {
        let table = users();
        let payload = Payload::new()
            .with_field("login", 5i64)
            .with_field("age", "old");

        let err = validate_payload(&table, &payload, WriteKind::Create, UnknownFieldPolicy::Ignore)
            .unwrap_err();
        assert!(matches!(err, ExplorerError::TypeMismatch(field) if field == "login"));
    }
}
