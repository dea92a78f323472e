//! AuditReader: point-in-time reads, revision history and diffs over an
//! audit store.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use rewind_core::config::{AuditConfig, LoadPolicy, RewindConfig};
use rewind_core::errors::{AuditError, RewindResult, StorageError};
use rewind_core::models::{EntityKey, FieldDiff, Identifier, Revision, RevisionType, Value};
use rewind_core::schema::{EntityTypeDescriptor, SchemaCatalog};
use rewind_core::traits::{AuditStore, LiveSource};

use crate::context::ReaderContext;
use crate::diff::Differ;
use crate::revision_log::revision_from_row;
use crate::snapshot::reconstruct::split_revision_row;
use crate::snapshot::{DeletionMode, Reconstruction, Snapshot};

/// Per-call overrides for [`AuditReader::find_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindOptions {
    /// Fail with `AuditError::Deleted` instead of reconstructing the
    /// deletion row.
    pub resolve_delete_as_error: bool,
    /// Replaces the reader's load policy for this call only.
    pub load_policy: Option<LoadPolicy>,
}

impl FindOptions {
    pub fn deletions_as_errors(mut self) -> Self {
        self.resolve_delete_as_error = true;
        self
    }

    pub fn with_load_policy(mut self, policy: LoadPolicy) -> Self {
        self.load_policy = Some(policy);
        self
    }
}

/// One entity written at a given revision.
#[derive(Debug, Clone)]
pub struct ChangedEntity {
    /// Concrete type of the entity.
    pub entity_type: String,
    pub id: EntityKey,
    pub change: RevisionType,
    pub snapshot: Snapshot,
}

/// Reads historical entity state out of an audit store.
///
/// Cheap to clone; clones share the catalog and stores. The load policy is
/// per handle and is copied into each reconstruction, so concurrent calls
/// never observe each other's settings.
#[derive(Clone)]
pub struct AuditReader {
    ctx: Arc<ReaderContext>,
    load_policy: LoadPolicy,
}

impl AuditReader {
    pub fn new(
        catalog: Arc<SchemaCatalog>,
        store: Arc<dyn AuditStore>,
        live: Arc<dyn LiveSource>,
        config: RewindConfig,
    ) -> RewindResult<Self> {
        config.audit.validate()?;
        info!(
            "audit reader ready: {} audited type(s), suffix {:?}",
            catalog.all_audited_types().len(),
            config.audit.table_suffix
        );
        Ok(Self {
            ctx: Arc::new(ReaderContext {
                catalog,
                store,
                live,
                config: config.audit,
            }),
            load_policy: config.load_policy,
        })
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.ctx.catalog
    }

    pub fn config(&self) -> &AuditConfig {
        &self.ctx.config
    }

    pub fn load_policy(&self) -> LoadPolicy {
        self.load_policy
    }

    pub fn set_load_policy(&mut self, policy: LoadPolicy) {
        self.load_policy = policy;
    }

    pub fn with_load_policy(mut self, policy: LoadPolicy) -> Self {
        self.load_policy = policy;
        self
    }

    pub fn set_load_audited_collections(&mut self, enabled: bool) {
        self.load_policy.load_audited_collections = enabled;
    }

    pub fn set_load_audited_entities(&mut self, enabled: bool) {
        self.load_policy.load_audited_entities = enabled;
    }

    pub fn set_load_native_collections(&mut self, enabled: bool) {
        self.load_policy.load_native_collections = enabled;
    }

    pub fn set_load_native_entities(&mut self, enabled: bool) {
        self.load_policy.load_native_entities = enabled;
    }

    /// The entity as of `revision`: its latest row at or before it.
    ///
    /// A deletion row is reconstructed like any other; use
    /// [`find_with`](Self::find_with) to treat it as an error.
    pub fn find(
        &self,
        entity_type: &str,
        id: impl Into<Identifier>,
        revision: i64,
    ) -> RewindResult<Snapshot> {
        self.find_with(entity_type, id, revision, &FindOptions::default())
    }

    pub fn find_with(
        &self,
        entity_type: &str,
        id: impl Into<Identifier>,
        revision: i64,
        options: &FindOptions,
    ) -> RewindResult<Snapshot> {
        let id: Identifier = id.into();
        let mode = if options.resolve_delete_as_error {
            DeletionMode::Error
        } else {
            DeletionMode::Materialize
        };
        let policy = options.load_policy.unwrap_or(self.load_policy);

        let mut reconstruction = Reconstruction::new(&self.ctx, policy);
        let root = reconstruction.find(entity_type, id.values(), revision, mode)?;
        Ok(Snapshot::new(Arc::new(reconstruction.finish()), root))
    }

    /// A page of the revision log, newest first.
    pub fn find_revision_history(&self, limit: usize, offset: usize) -> RewindResult<Vec<Revision>> {
        let query = self.ctx.queries().revision_history(limit, offset);
        self.ctx
            .store
            .fetch_all(&query)?
            .iter()
            .map(revision_from_row)
            .collect()
    }

    /// Fails with `InvalidRevision` if no such revision was recorded.
    pub fn find_revision(&self, revision: i64) -> RewindResult<Revision> {
        let query = self.ctx.queries().revision(revision);
        match self.ctx.store.fetch_one(&query)? {
            Some(row) => revision_from_row(&row),
            None => Err(AuditError::InvalidRevision { revision }.into()),
        }
    }

    /// Revisions at which the entity was written, newest first.
    pub fn find_revisions(
        &self,
        entity_type: &str,
        id: impl Into<Identifier>,
    ) -> RewindResult<Vec<Revision>> {
        let id: Identifier = id.into();
        let desc = self.audited(entity_type)?;
        let query = self.ctx.queries().revisions_for_entity(desc, id.values())?;
        self.ctx
            .store
            .fetch_all(&query)?
            .iter()
            .map(revision_from_row)
            .collect()
    }

    /// The latest revision at which the entity was written, if any.
    pub fn get_current_revision(
        &self,
        entity_type: &str,
        id: impl Into<Identifier>,
    ) -> RewindResult<Option<i64>> {
        let id: Identifier = id.into();
        let desc = self.audited(entity_type)?;
        let query = self.ctx.queries().current_revision(desc, id.values())?;
        let Some(row) = self.ctx.store.fetch_one(&query)? else {
            return Ok(None);
        };

        let column = &self.ctx.config.revision_field_name;
        let revision = row.get(column).and_then(Value::as_i64).ok_or_else(|| {
            StorageError::UnsupportedValue {
                column: column.clone(),
                reason: "revision is not an integer".to_string(),
            }
        })?;
        Ok(Some(revision))
    }

    /// Every entity written at exactly `revision`, by audited type in
    /// catalog registration order, then row order. Each entry is
    /// reconstructed independently.
    pub fn find_entities_changed_at_revision(&self, revision: i64) -> RewindResult<Vec<ChangedEntity>> {
        let mut changed = Vec::new();
        for entity_type in self.ctx.catalog.all_audited_types() {
            let desc = self.ctx.catalog.descriptor_for(entity_type)?;
            let Some(query) = self.ctx.queries().changes_at_revision(desc, revision)? else {
                debug!("{entity_type} is reported through its subtypes");
                continue;
            };

            for raw in self.ctx.store.fetch_all(&query)? {
                let row = split_revision_row(&self.ctx.config, raw)?;
                let change = row.change;
                let mut reconstruction = Reconstruction::new(&self.ctx, self.load_policy);
                let handle = reconstruction.materialize(desc, row, revision)?;
                let snapshot = Snapshot::new(Arc::new(reconstruction.finish()), handle);
                changed.push(ChangedEntity {
                    entity_type: snapshot.entity_type().to_string(),
                    id: snapshot.key().clone(),
                    change,
                    snapshot,
                });
            }
        }
        debug!("{} entity change(s) at revision {revision}", changed.len());
        Ok(changed)
    }

    /// One snapshot per stored row of the entity, deletions included,
    /// newest first. The snapshots share one graph.
    pub fn get_entity_history(
        &self,
        entity_type: &str,
        id: impl Into<Identifier>,
    ) -> RewindResult<Vec<Snapshot>> {
        let id: Identifier = id.into();
        let desc = self.audited(entity_type)?;
        let query = self.ctx.queries().entity_history(desc, id.values())?;
        let rows = self.ctx.store.fetch_all(&query)?;

        let mut reconstruction = Reconstruction::new(&self.ctx, self.load_policy);
        let mut handles = Vec::with_capacity(rows.len());
        for raw in rows {
            let row = split_revision_row(&self.ctx.config, raw)?;
            let revision = row.revision.ok_or_else(|| StorageError::UnsupportedValue {
                column: self.ctx.config.revision_field_name.clone(),
                reason: "history row without a revision".to_string(),
            })?;
            handles.push(reconstruction.materialize(desc, row, revision)?);
        }

        let graph = Arc::new(reconstruction.finish());
        Ok(handles
            .into_iter()
            .map(|h| Snapshot::new(Arc::clone(&graph), h))
            .collect())
    }

    /// Field changes between two revisions of one entity.
    pub fn diff(
        &self,
        entity_type: &str,
        id: impl Into<Identifier>,
        old_revision: i64,
        new_revision: i64,
    ) -> RewindResult<Vec<FieldDiff>> {
        let id: Identifier = id.into();
        let old = self.find(entity_type, id.clone(), old_revision)?;
        let new = self.find(entity_type, id, new_revision)?;
        Ok(Differ::diff(&self.entity_values(&old)?, &self.entity_values(&new)?))
    }

    /// Scalar fields of the type the snapshot was read as. A `Vehicle`
    /// row that maps to `SportsCar` yields only `Vehicle` fields.
    pub fn entity_values(&self, snapshot: &Snapshot) -> RewindResult<BTreeMap<String, Value>> {
        let desc = self.ctx.catalog.descriptor_for(snapshot.hydrated_as())?;
        Ok(desc
            .fields
            .iter()
            .map(|f| {
                let value = snapshot.field(&f.name).cloned().unwrap_or(Value::Null);
                (f.name.clone(), value)
            })
            .collect())
    }

    fn audited(&self, entity_type: &str) -> RewindResult<&EntityTypeDescriptor> {
        if !self.ctx.catalog.is_audited(entity_type) {
            return Err(AuditError::NotAudited {
                entity_type: entity_type.to_string(),
            }
            .into());
        }
        Ok(self.ctx.catalog.descriptor_for(entity_type)?.as_ref())
    }
}

impl fmt::Debug for AuditReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditReader")
            .field("config", &self.ctx.config)
            .field("load_policy", &self.load_policy)
            .finish()
    }
}
