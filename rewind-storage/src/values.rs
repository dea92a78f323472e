//! Conversions between `rewind_core::Value` and SQLite storage classes.

use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Row, Statement};

use rewind_core::errors::RewindResult;
use rewind_core::models::{RawRow, Value};

use crate::to_storage_err;

/// Binds a `Value` as a positional parameter. Typed values are lowered to
/// the storage class they are written with.
pub struct Bind<'a>(pub &'a Value);

impl ToSql for Bind<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self.0 {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Integer(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            Value::Real(r) => ToSqlOutput::Borrowed(ValueRef::Real(*r)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
            Value::Boolean(b) => ToSqlOutput::Borrowed(ValueRef::Integer(i64::from(*b))),
            Value::DateTime(dt) => {
                ToSqlOutput::Owned(rusqlite::types::Value::Text(dt.format("%Y-%m-%d %H:%M:%S").to_string()))
            }
            Value::Json(j) => ToSqlOutput::Owned(rusqlite::types::Value::Text(j.to_string())),
        })
    }
}

pub fn from_value_ref(value: ValueRef<'_>) -> RewindResult<Value> {
    Ok(match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(r) => Value::Real(r),
        ValueRef::Text(t) => Value::Text(
            std::str::from_utf8(t)
                .map_err(|e| to_storage_err(format!("non-utf8 text column: {e}")))?
                .to_string(),
        ),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    })
}

/// Column names of a prepared statement, owned so the statement can be
/// borrowed mutably for execution.
pub fn column_names(stmt: &Statement<'_>) -> Vec<String> {
    stmt.column_names().into_iter().map(String::from).collect()
}

pub fn row_to_raw(row: &Row<'_>, columns: &[String]) -> RewindResult<RawRow> {
    let mut raw = RawRow::new();
    for (i, name) in columns.iter().enumerate() {
        let value = row.get_ref(i).map_err(|e| to_storage_err(e.to_string()))?;
        raw.insert(name.clone(), from_value_ref(value)?);
    }
    Ok(raw)
}
