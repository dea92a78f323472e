//! `AuditStore` over SQLite.

use std::sync::Arc;

use rusqlite::params_from_iter;
use tracing::trace;

use rewind_core::errors::RewindResult;
use rewind_core::models::{Query, RawRow};
use rewind_core::traits::AuditStore;

use crate::connection::SqliteConnection;
use crate::to_storage_err;
use crate::values::{column_names, row_to_raw, Bind};

/// Reads revision tables from a SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteAuditStore {
    conn: Arc<SqliteConnection>,
}

impl SqliteAuditStore {
    pub fn new(conn: Arc<SqliteConnection>) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Arc<SqliteConnection> {
        &self.conn
    }

    fn run(&self, query: &Query, limit: Option<usize>) -> RewindResult<Vec<RawRow>> {
        trace!(sql = %query.sql, params = query.params.len(), "audit query");
        self.conn.with_conn(|conn| {
            let mut stmt = conn
                .prepare(&query.sql)
                .map_err(|e| to_storage_err(e.to_string()))?;
            let columns = column_names(&stmt);
            let mut rows = stmt
                .query(params_from_iter(query.params.iter().map(Bind)))
                .map_err(|e| to_storage_err(e.to_string()))?;

            let mut out = Vec::new();
            while let Some(row) = rows.next().map_err(|e| to_storage_err(e.to_string()))? {
                out.push(row_to_raw(row, &columns)?);
                if limit.is_some_and(|n| out.len() >= n) {
                    break;
                }
            }
            Ok(out)
        })
    }
}

impl AuditStore for SqliteAuditStore {
    fn fetch_one(&self, query: &Query) -> RewindResult<Option<RawRow>> {
        Ok(self.run(query, Some(1))?.into_iter().next())
    }

    fn fetch_all(&self, query: &Query) -> RewindResult<Vec<RawRow>> {
        self.run(query, None)
    }
}
