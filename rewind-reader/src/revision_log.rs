//! Revision table rows.

use chrono::{DateTime, Utc};

use rewind_core::errors::{RewindResult, StorageError};
use rewind_core::models::{RawRow, Revision, Value};
use rewind_core::schema::codec::parse_datetime;

/// Parse a row selected with the `id`, `timestamp`, `author` aliases.
pub(crate) fn revision_from_row(row: &RawRow) -> RewindResult<Revision> {
    let id = row.get("id").and_then(Value::as_i64).ok_or_else(|| unsupported("id", row.get("id")))?;
    let timestamp = row
        .get("timestamp")
        .and_then(timestamp_of)
        .ok_or_else(|| unsupported("timestamp", row.get("timestamp")))?;
    let author = match row.get("author") {
        Some(Value::Text(author)) => author.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    Ok(Revision {
        id,
        timestamp,
        author,
    })
}

/// Timestamps may be stored as text in any accepted format or as unix seconds.
fn timestamp_of(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::DateTime(dt) => Some(*dt),
        Value::Text(s) => parse_datetime(s).or_else(|| {
            s.parse::<i64>()
                .ok()
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
        }),
        Value::Integer(secs) => DateTime::from_timestamp(*secs, 0),
        _ => None,
    }
}

fn unsupported(column: &str, value: Option<&Value>) -> StorageError {
    StorageError::UnsupportedValue {
        column: column.to_string(),
        reason: format!(
            "not a revision {column}: {}",
            value.unwrap_or(&Value::Null)
        ),
    }
}
