use super::{AuditError, SchemaError, StorageError};

/// Top-level error type for the rewind reader.
/// All subsystem errors convert into this via `From` impls.
#[derive(Debug, thiserror::Error)]
pub enum RewindError {
    #[error("audit error: {0}")]
    Audit(#[from] AuditError),

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("config error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RewindError {
    /// True when a row was located but it is a deletion tombstone.
    pub fn is_deleted(&self) -> bool {
        matches!(self, Self::Audit(AuditError::Deleted { .. }))
    }

    /// True when no row exists at or before the requested revision.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Audit(AuditError::NoRevisionFound { .. } | AuditError::InvalidRevision { .. })
        )
    }
}

/// Convenience type alias.
pub type RewindResult<T> = Result<T, RewindError>;
