mod audit_error;
mod rewind_error;
mod schema_error;
mod storage_error;

pub use audit_error::AuditError;
pub use rewind_error::{RewindError, RewindResult};
pub use schema_error::SchemaError;
pub use storage_error::StorageError;
