//! A single SQLite connection shared between store endpoints.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

use rewind_core::errors::RewindResult;

use crate::to_storage_err;

/// Mutex-guarded connection. Both the audit store and the live source may
/// hold the same instance when audit and live tables share a database.
#[derive(Debug)]
pub struct SqliteConnection {
    inner: Mutex<Connection>,
}

impl SqliteConnection {
    pub fn open(path: impl AsRef<Path>) -> RewindResult<Self> {
        let conn = Connection::open(path).map_err(|e| to_storage_err(e.to_string()))?;
        Ok(Self::new(conn))
    }

    pub fn open_in_memory() -> RewindResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| to_storage_err(e.to_string()))?;
        Ok(Self::new(conn))
    }

    pub fn new(conn: Connection) -> Self {
        Self {
            inner: Mutex::new(conn),
        }
    }

    /// Run `f` with exclusive access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> RewindResult<T>
    where
        F: FnOnce(&Connection) -> RewindResult<T>,
    {
        let guard = self
            .inner
            .lock()
            .map_err(|e| to_storage_err(format!("connection lock poisoned: {e}")))?;
        f(&guard)
    }
}
