//! # rewind-storage
//!
//! SQLite implementations of the reader's two store endpoints: the audit
//! store holding revision tables and the live source for non-audited state.

pub mod audit_store;
pub mod connection;
pub mod live_source;
pub mod values;

pub use audit_store::SqliteAuditStore;
pub use connection::SqliteConnection;
pub use live_source::SqliteLiveSource;

/// Helper to convert a string message into a `RewindError::Storage`.
pub fn to_storage_err(msg: String) -> rewind_core::RewindError {
    rewind_core::RewindError::Storage(rewind_core::StorageError::SqliteError { message: msg })
}
