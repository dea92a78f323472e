//! `AuditStore`: read access to the append-only revision tables.

use std::sync::Arc;

use crate::errors::RewindResult;
use crate::models::{Query, RawRow};

/// Executes parameterized queries against the audit store.
///
/// Failures are returned unchanged to the caller; the reader never retries.
pub trait AuditStore: Send + Sync {
    /// First row of the result, if any.
    fn fetch_one(&self, query: &Query) -> RewindResult<Option<RawRow>>;

    /// Every row of the result, in store order.
    fn fetch_all(&self, query: &Query) -> RewindResult<Vec<RawRow>>;
}

impl<T: AuditStore + ?Sized> AuditStore for Arc<T> {
    fn fetch_one(&self, query: &Query) -> RewindResult<Option<RawRow>> {
        (**self).fetch_one(query)
    }
    fn fetch_all(&self, query: &Query) -> RewindResult<Vec<RawRow>> {
        (**self).fetch_all(query)
    }
}
