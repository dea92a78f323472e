/// Storage-layer errors from the underlying data store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("unsupported value in column {column}: {reason}")]
    UnsupportedValue { column: String, reason: String },
}
