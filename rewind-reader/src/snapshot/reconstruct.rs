//! Entity reconstruction: audit row to entity node, following relations
//! at the same revision.
//!
//! Algorithm for one row:
//! 1. Derive the identifier; return the cached node if one exists
//! 2. Resolve the concrete type from the discriminator; abstract types
//!    re-dispatch to the concrete subtype
//! 3. Register the node before anything else, so cycles find it
//! 4. Decode scalars through their codecs
//! 5. Resolve every association per the load policy

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use rewind_core::config::{AuditConfig, LoadPolicy};
use rewind_core::errors::{AuditError, RewindError, RewindResult, SchemaError, StorageError};
use rewind_core::models::{
    ColumnFilter, EntityKey, KeyValue, RawRow, RevisionRow, RevisionType, Value,
};
use rewind_core::schema::{AssociationDescriptor, EntityTypeDescriptor};

use super::cache::ReconstructionCache;
use super::graph::{EntityGraph, EntityHandle, EntityNode, Relation};
use crate::context::ReaderContext;
use crate::relation::{LazyRelationProxy, LiveReference};

/// What a point-in-time lookup does when the latest row is a deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeletionMode {
    /// Fail with `AuditError::Deleted`.
    Error,
    /// Build the entity from the deletion row.
    Materialize,
}

/// One reconstruction call: a cache, the arena it fills, and the load
/// policy in force.
pub(crate) struct Reconstruction<'c> {
    ctx: &'c Arc<ReaderContext>,
    policy: LoadPolicy,
    cache: ReconstructionCache,
}

impl<'c> Reconstruction<'c> {
    pub fn new(ctx: &'c Arc<ReaderContext>, policy: LoadPolicy) -> Self {
        Self {
            ctx,
            policy,
            cache: ReconstructionCache::new(),
        }
    }

    /// The entity as it was at `revision`.
    pub fn find(
        &mut self,
        entity_type: &str,
        id: &[KeyValue],
        revision: i64,
        mode: DeletionMode,
    ) -> RewindResult<EntityHandle> {
        let ctx = self.ctx;
        if !ctx.catalog.is_audited(entity_type) {
            return Err(AuditError::NotAudited {
                entity_type: entity_type.to_string(),
            }
            .into());
        }

        let desc = ctx.catalog.descriptor_for(entity_type)?;
        let id = normalized_id(desc, id)?;
        let key = EntityKey::new(entity_type, id.clone());
        if let Some(handle) = self.cache.get(&key, revision) {
            if mode == DeletionMode::Error && self.cache.node(handle).change == RevisionType::Delete {
                return Err(deleted(&key, revision));
            }
            return Ok(handle);
        }

        let query = ctx.queries().point_in_time(desc, &id, revision)?;
        let raw = ctx.store.fetch_one(&query)?.ok_or_else(|| AuditError::NoRevisionFound {
            entity_type: entity_type.to_string(),
            id: key.id_string(),
            revision,
        })?;

        let row = split_revision_row(&ctx.config, raw)?;
        if row.change == RevisionType::Delete && mode == DeletionMode::Error {
            return Err(deleted(&key, revision));
        }
        debug!("reconstructing {key} at revision {revision}");
        self.materialize(desc, row, revision)
    }

    /// Build (or fetch from cache) the entity a row describes.
    pub fn materialize(
        &mut self,
        desc: &'c EntityTypeDescriptor,
        row: RevisionRow,
        revision: i64,
    ) -> RewindResult<EntityHandle> {
        let key = entity_key(desc, &row.values)?;
        if let Some(handle) = self.cache.get(&key, revision) {
            return Ok(handle);
        }

        let concrete = match &desc.inheritance {
            None => desc.name.clone(),
            Some(inh) => {
                let value = row
                    .values
                    .get(&inh.discriminator_column)
                    .and_then(Value::discriminator)
                    .ok_or_else(|| {
                        SchemaError::inconsistent(
                            &desc.name,
                            format!("expecting discriminator value in column {}", inh.discriminator_column),
                        )
                    })?;
                let mapped = inh.discriminator_map.get(&value).ok_or_else(|| {
                    SchemaError::inconsistent(&desc.name, format!("no mapping found for [{value}]"))
                })?;
                if inh.discriminator_value.is_none() {
                    if *mapped == desc.name {
                        return Err(SchemaError::inconsistent(
                            &desc.name,
                            "abstract type is mapped to itself",
                        )
                        .into());
                    }
                    debug!("{key} is a {mapped}, re-dispatching");
                    return self.find(mapped, &key.values, revision, DeletionMode::Materialize);
                }
                mapped.clone()
            }
        };

        let handle = self.cache.insert(
            key.clone(),
            revision,
            EntityNode {
                key: key.retyped(concrete.as_str()),
                entity_type: concrete,
                hydrated_as: desc.name.clone(),
                revision,
                change: row.change,
                fields: BTreeMap::new(),
                relations: BTreeMap::new(),
            },
        );

        let mut fields = BTreeMap::new();
        for field in &desc.fields {
            let raw = row.values.get(&field.name).unwrap_or(&Value::Null);
            let value = field.codec.decode(raw).map_err(|e| SchemaError::FieldDecode {
                field: format!("{}.{}", desc.name, field.name),
                reason: e.to_string(),
            })?;
            fields.insert(field.name.clone(), value);
        }
        self.cache.node_mut(handle).fields = fields;

        for assoc in &desc.associations {
            let relation = self.resolve_association(desc, assoc, &row.values, handle, revision)?;
            self.cache
                .node_mut(handle)
                .relations
                .insert(assoc.field.clone(), relation);
        }

        Ok(handle)
    }

    /// Entities of `target` matching `filter` at `revision`, deletions
    /// excluded, in identifier order.
    pub fn load_related(
        &mut self,
        target: &'c EntityTypeDescriptor,
        filter: &[ColumnFilter],
        revision: i64,
    ) -> RewindResult<Vec<EntityHandle>> {
        let ctx = self.ctx;
        let query = ctx.queries().related_at_revision(target, filter, revision)?;
        let rows = ctx.store.fetch_all(&query)?;

        let mut handles = Vec::with_capacity(rows.len());
        for raw in rows {
            let row = split_revision_row(&ctx.config, raw)?;
            handles.push(self.materialize(target, row, revision)?);
        }
        Ok(handles)
    }

    pub fn finish(self) -> EntityGraph {
        self.cache.into_graph()
    }

    fn resolve_association(
        &mut self,
        owner: &'c EntityTypeDescriptor,
        assoc: &'c AssociationDescriptor,
        values: &RawRow,
        handle: EntityHandle,
        revision: i64,
    ) -> RewindResult<Relation> {
        let ctx = self.ctx;
        let target = ctx.catalog.descriptor_for(&assoc.target)?;

        if assoc.kind.is_to_one() {
            if target.audited {
                if !self.policy.load_audited_entities {
                    return Ok(Relation::Null);
                }
                return self.resolve_audited_to_one(owner, assoc, target, values, handle, revision);
            }

            if !self.policy.load_native_entities {
                return Ok(Relation::Null);
            }
            if assoc.owning_side {
                return Ok(match owning_key(owner, assoc, target, values)? {
                    Some(key) => Relation::Reference(LiveReference::new(
                        Arc::clone(&ctx.live),
                        Arc::clone(target),
                        key,
                    )),
                    None => Relation::Null,
                });
            }
            let Some(filter) = self.inverse_filter(owner, assoc, target, handle)? else {
                return Ok(Relation::Null);
            };
            return Ok(match ctx.live.load_to_one_entity(target, &filter)? {
                Some(entity) => Relation::LiveEntity(entity),
                None => Relation::Null,
            });
        }

        if assoc.kind.is_one_to_many() {
            let enabled = if target.audited {
                self.policy.load_audited_collections
            } else {
                self.policy.load_native_collections
            };
            if !enabled {
                return Ok(Relation::EmptyCollection);
            }
            let Some(filter) = self.inverse_filter(owner, assoc, target, handle)? else {
                return Ok(Relation::EmptyCollection);
            };
            if target.audited {
                return Ok(Relation::Collection(LazyRelationProxy::new(
                    Arc::clone(ctx),
                    target.name.clone(),
                    filter,
                    revision,
                    self.policy,
                )));
            }
            return Ok(Relation::LiveCollection(
                ctx.live.load_to_many_collection(target, &filter)?,
            ));
        }

        Ok(Relation::EmptyCollection)
    }

    fn resolve_audited_to_one(
        &mut self,
        owner: &'c EntityTypeDescriptor,
        assoc: &'c AssociationDescriptor,
        target: &'c EntityTypeDescriptor,
        values: &RawRow,
        handle: EntityHandle,
        revision: i64,
    ) -> RewindResult<Relation> {
        if !assoc.owning_side {
            let Some(filter) = self.inverse_filter(owner, assoc, target, handle)? else {
                return Ok(Relation::Null);
            };
            let found = self.load_related(target, &filter, revision)?;
            return Ok(found.first().map_or(Relation::Null, |h| Relation::Entity(*h)));
        }

        let Some(key) = owning_key(owner, assoc, target, values)? else {
            return Ok(Relation::Null);
        };
        match self.find(&target.name, &key.values, revision, DeletionMode::Error) {
            Ok(found) => Ok(Relation::Entity(found)),
            Err(e) if e.is_deleted() => {
                debug!("{key} deleted at revision {revision}, {} left unset", assoc.field);
                Ok(Relation::Null)
            }
            Err(e) => Err(e),
        }
    }

    /// Foreign-key filter for an inverse side: the owning association's
    /// join columns on the target, equal to the owner's referenced fields.
    /// `None` when any referenced value is null.
    fn inverse_filter(
        &self,
        owner: &EntityTypeDescriptor,
        assoc: &AssociationDescriptor,
        target: &EntityTypeDescriptor,
        handle: EntityHandle,
    ) -> RewindResult<Option<Vec<ColumnFilter>>> {
        let mapped_by = assoc.mapped_by.as_deref().ok_or_else(|| {
            SchemaError::inconsistent(&owner.name, format!("{} has no owning side", assoc.field))
        })?;
        let owning = target.association(mapped_by).ok_or_else(|| {
            SchemaError::inconsistent(
                &owner.name,
                format!("{} is mapped by missing {}.{mapped_by}", assoc.field, target.name),
            )
        })?;

        let node = self.cache.node(handle);
        let mut filter = Vec::with_capacity(owning.join_columns.len());
        for jc in &owning.join_columns {
            let field = owner.field_for_column(&jc.referenced_column).ok_or_else(|| {
                SchemaError::MissingColumnMapping {
                    entity_type: owner.name.clone(),
                    field: jc.referenced_column.clone(),
                }
            })?;
            let value = node.fields.get(&field.name).cloned().unwrap_or(Value::Null);
            if value.is_null() {
                return Ok(None);
            }
            filter.push(ColumnFilter::new(jc.column.clone(), value));
        }
        Ok(Some(filter))
    }
}

fn deleted(key: &EntityKey, revision: i64) -> RewindError {
    AuditError::Deleted {
        entity_type: key.entity_type.clone(),
        id: key.id_string(),
        revision,
    }
    .into()
}

/// Split the bookkeeping columns off an audit row.
pub(crate) fn split_revision_row(config: &AuditConfig, mut raw: RawRow) -> RewindResult<RevisionRow> {
    let code = raw.remove(&config.revision_type_field_name);
    let change = code
        .as_ref()
        .and_then(Value::as_str)
        .and_then(RevisionType::from_code)
        .ok_or_else(|| StorageError::UnsupportedValue {
            column: config.revision_type_field_name.clone(),
            reason: format!("unknown revision type {}", code.as_ref().unwrap_or(&Value::Null)),
        })?;
    let revision = raw
        .remove(&config.revision_field_name)
        .as_ref()
        .and_then(Value::as_i64);
    Ok(RevisionRow {
        values: raw,
        revision,
        change,
    })
}

/// Caller-supplied identifier parts passed through the identifier codecs,
/// so `"1"` and `1` name the same cached entity. Left as given when the
/// arity is wrong; the query builder reports that.
fn normalized_id(desc: &EntityTypeDescriptor, id: &[KeyValue]) -> RewindResult<Vec<KeyValue>> {
    if id.len() != desc.identifier.len() {
        return Ok(id.to_vec());
    }
    desc.identifier
        .iter()
        .zip(id)
        .map(|(name, part)| -> RewindResult<KeyValue> {
            let Some(field) = desc.field(name) else {
                return Ok(part.clone());
            };
            let decoded = field.codec.decode(&part.to_value()).map_err(|e| SchemaError::FieldDecode {
                field: format!("{}.{}", desc.name, field.name),
                reason: e.to_string(),
            })?;
            KeyValue::from_value(&decoded).ok_or_else(|| {
                SchemaError::inconsistent(&desc.name, format!("identifier {name} is {}", decoded.type_name()))
                    .into()
            })
        })
        .collect()
}

/// Identifier of the entity a row describes. Scalar identifiers are read
/// by field name, association identifiers by join column.
pub(crate) fn entity_key(desc: &EntityTypeDescriptor, values: &RawRow) -> RewindResult<EntityKey> {
    let missing = |id: &str| SchemaError::MissingColumnMapping {
        entity_type: desc.name.clone(),
        field: id.to_string(),
    };

    let mut parts = Vec::with_capacity(desc.identifier.len());
    for id in &desc.identifier {
        let value = match desc.field(id) {
            Some(field) => {
                let raw = values.get(&field.name).ok_or_else(|| missing(id))?;
                field.codec.decode(raw).map_err(|e| SchemaError::FieldDecode {
                    field: format!("{}.{}", desc.name, field.name),
                    reason: e.to_string(),
                })?
            }
            None => {
                let column = desc.identifier_column(id).ok_or_else(|| missing(id))?;
                values.get(column).cloned().ok_or_else(|| missing(id))?
            }
        };
        let part = KeyValue::from_value(&value).ok_or_else(|| {
            SchemaError::inconsistent(&desc.name, format!("identifier {id} is {}", value.type_name()))
        })?;
        parts.push(part);
    }
    Ok(EntityKey::new(desc.name.clone(), parts))
}

/// Target key from an owning association's join columns, or `None` when
/// any component is null. A composite key with a null part cannot match
/// a stored identifier, so a partial key is treated like a missing one.
fn owning_key(
    owner: &EntityTypeDescriptor,
    assoc: &AssociationDescriptor,
    target: &EntityTypeDescriptor,
    values: &RawRow,
) -> RewindResult<Option<EntityKey>> {
    let mut parts = Vec::with_capacity(target.identifier.len());
    for id in &target.identifier {
        let referenced = target.identifier_column(id).ok_or_else(|| SchemaError::MissingColumnMapping {
            entity_type: target.name.clone(),
            field: id.clone(),
        })?;
        let jc = assoc
            .join_columns
            .iter()
            .find(|jc| jc.referenced_column == referenced)
            .ok_or_else(|| SchemaError::MissingColumnMapping {
                entity_type: owner.name.clone(),
                field: format!("{}.{referenced}", assoc.field),
            })?;

        let raw = values.get(&jc.column).unwrap_or(&Value::Null);
        if raw.is_null() {
            return Ok(None);
        }
        let value = match target.field(id) {
            Some(field) => field.codec.decode(raw).map_err(|e| SchemaError::FieldDecode {
                field: format!("{}.{}", owner.name, assoc.field),
                reason: e.to_string(),
            })?,
            None => raw.clone(),
        };
        let part = KeyValue::from_value(&value).ok_or_else(|| {
            SchemaError::inconsistent(
                &owner.name,
                format!("{} references {} by a {}", assoc.field, target.name, value.type_name()),
            )
        })?;
        parts.push(part);
    }
    Ok(Some(EntityKey::new(target.name.clone(), parts)))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rewind_core::models::Query;
    use rewind_core::traits::AuditStore;
    use test_fixtures::{rev, AuditDb};

    use super::*;

    struct CountingStore {
        inner: Arc<dyn AuditStore>,
        queries: AtomicUsize,
    }

    impl AuditStore for CountingStore {
        fn fetch_one(&self, query: &Query) -> RewindResult<Option<RawRow>> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch_one(query)
        }
        fn fetch_all(&self, query: &Query) -> RewindResult<Vec<RawRow>> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch_all(query)
        }
    }

    fn counting_context(db: &AuditDb) -> (Arc<ReaderContext>, Arc<CountingStore>) {
        let store = Arc::new(CountingStore {
            inner: db.audit_store(),
            queries: AtomicUsize::new(0),
        });
        let ctx = Arc::new(ReaderContext {
            catalog: Arc::clone(&db.catalog),
            store: Arc::clone(&store) as Arc<dyn AuditStore>,
            live: db.live_source(),
            config: AuditConfig::default(),
        });
        (ctx, store)
    }

    #[test]
    fn text_identifier_hits_cached_entity() {
        let db = AuditDb::new();
        db.seed_scenario();
        let (ctx, store) = counting_context(&db);
        let mut reconstruction = Reconstruction::new(&ctx, LoadPolicy::none());

        let by_integer = reconstruction
            .find("Person", &[KeyValue::Integer(1)], rev::CREATED, DeletionMode::Materialize)
            .unwrap();
        let queries = store.queries.load(Ordering::SeqCst);
        let by_text = reconstruction
            .find("Person", &[KeyValue::Text("1".to_string())], rev::CREATED, DeletionMode::Materialize)
            .unwrap();

        assert_eq!(by_integer, by_text);
        assert_eq!(store.queries.load(Ordering::SeqCst), queries);
        assert_eq!(reconstruction.finish().len(), 1);
    }

    #[test]
    fn text_identifier_is_decoded_before_lookup() {
        let db = AuditDb::new();
        db.seed_scenario();
        let (ctx, _store) = counting_context(&db);
        let mut reconstruction = Reconstruction::new(&ctx, LoadPolicy::none());

        let handle = reconstruction
            .find("Person", &[KeyValue::Text("1".to_string())], rev::CREATED, DeletionMode::Materialize)
            .unwrap();
        let again = reconstruction
            .find("Person", &[KeyValue::Integer(1)], rev::CREATED, DeletionMode::Materialize)
            .unwrap();

        assert_eq!(handle, again);
        let graph = reconstruction.finish();
        assert_eq!(graph.node(handle).key.values, vec![KeyValue::Integer(1)]);
    }

    #[test]
    fn undecodable_identifier_is_a_decode_error() {
        let db = AuditDb::new();
        let (ctx, _store) = counting_context(&db);
        let mut reconstruction = Reconstruction::new(&ctx, LoadPolicy::none());

        let err = reconstruction
            .find("Person", &[KeyValue::Text("one".to_string())], rev::CREATED, DeletionMode::Materialize)
            .unwrap_err();
        assert!(matches!(err, RewindError::Schema(SchemaError::FieldDecode { .. })));
    }

    const SEATING: &str = r#"
[[entity]]
name = "Seat"
identifier = ["row", "number"]
fields = [
    { name = "row", codec = "text" },
    { name = "number", codec = "integer" },
]

[[entity]]
name = "Ticket"
identifier = ["id"]
fields = [{ name = "id", codec = "integer" }]
associations = [
    { field = "seat", kind = "many_to_one", target = "Seat", join_columns = [
        { column = "seat_row", referenced_column = "row" },
        { column = "seat_number", referenced_column = "number" },
    ] },
]
"#;

    #[test]
    fn composite_key_with_null_part_is_unset() {
        let catalog = rewind_core::schema::SchemaCatalog::from_toml(SEATING).unwrap();
        let ticket = catalog.descriptor_for("Ticket").unwrap();
        let seat = catalog.descriptor_for("Seat").unwrap();
        let assoc = ticket.association("seat").unwrap();

        let full: RawRow = [
            ("seat_row", Value::from("C")),
            ("seat_number", Value::Text("12".to_string())),
        ]
        .into_iter()
        .collect();
        let key = owning_key(ticket, assoc, seat, &full).unwrap().unwrap();
        assert_eq!(key.values, vec![KeyValue::Text("C".to_string()), KeyValue::Integer(12)]);

        let partial: RawRow = [("seat_row", Value::from("C")), ("seat_number", Value::Null)]
            .into_iter()
            .collect();
        assert!(owning_key(ticket, assoc, seat, &partial).unwrap().is_none());

        let missing: RawRow = [("seat_number", Value::Integer(12))].into_iter().collect();
        assert!(owning_key(ticket, assoc, seat, &missing).unwrap().is_none());
    }
}
