//! Shared, read-only state behind every reader handle and lazy proxy.

use std::sync::Arc;

use rewind_core::config::AuditConfig;
use rewind_core::schema::SchemaCatalog;
use rewind_core::traits::{AuditStore, LiveSource};

use crate::query::RevisionQueryBuilder;

pub(crate) struct ReaderContext {
    pub catalog: Arc<SchemaCatalog>,
    pub store: Arc<dyn AuditStore>,
    pub live: Arc<dyn LiveSource>,
    pub config: AuditConfig,
}

impl ReaderContext {
    pub fn queries(&self) -> RevisionQueryBuilder<'_> {
        RevisionQueryBuilder::new(&self.catalog, &self.config)
    }
}
