//! Reconstructed entities, stored in an arena so reference cycles between
//! snapshots are plain indices.

use std::collections::BTreeMap;
use std::sync::Arc;

use rewind_core::models::{EntityKey, LiveEntity, RevisionType, Value};

use crate::relation::{LazyRelationProxy, LiveReference};

/// Index of a node within its [`EntityGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityHandle(pub(crate) usize);

/// A relationship slot on a reconstructed entity.
#[derive(Debug)]
pub enum Relation {
    /// No target, a deleted target, or a relation the load policy skipped.
    Null,
    /// Audited to-one, reconstructed at the same revision.
    Entity(EntityHandle),
    /// Non-audited to-one by foreign key, read from live state on access.
    Reference(LiveReference),
    /// Non-audited inverse to-one, read from live state.
    LiveEntity(LiveEntity),
    /// Audited to-many, loaded at the same revision on first access.
    Collection(LazyRelationProxy),
    /// Non-audited to-many, read from live state.
    LiveCollection(Vec<LiveEntity>),
    /// Skipped by the load policy, or a relation kind that is not followed.
    EmptyCollection,
}

impl Relation {
    pub fn is_null(&self) -> bool {
        matches!(self, Relation::Null)
    }
}

/// One entity as it was at a revision.
#[derive(Debug)]
pub struct EntityNode {
    /// Concrete type after discriminator resolution.
    pub entity_type: String,
    /// Type whose descriptor filled `fields`. Differs from `entity_type`
    /// when a concrete supertype row maps to a subtype.
    pub hydrated_as: String,
    pub key: EntityKey,
    /// The revision the entity was requested at.
    pub revision: i64,
    /// Change kind of the row it was built from.
    pub change: RevisionType,
    pub fields: BTreeMap<String, Value>,
    pub relations: BTreeMap<String, Relation>,
}

/// Arena of nodes built by one reconstruction.
#[derive(Debug, Default)]
pub struct EntityGraph {
    nodes: Vec<EntityNode>,
}

impl EntityGraph {
    pub(crate) fn push(&mut self, node: EntityNode) -> EntityHandle {
        self.nodes.push(node);
        EntityHandle(self.nodes.len() - 1)
    }

    pub fn node(&self, handle: EntityHandle) -> &EntityNode {
        &self.nodes[handle.0]
    }

    pub(crate) fn node_mut(&mut self, handle: EntityHandle) -> &mut EntityNode {
        &mut self.nodes[handle.0]
    }

    pub fn get(&self, handle: EntityHandle) -> EntityRef<'_> {
        EntityRef {
            graph: self,
            handle,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Borrowed view of one node that can follow relations through the graph.
#[derive(Debug, Clone, Copy)]
pub struct EntityRef<'g> {
    graph: &'g EntityGraph,
    handle: EntityHandle,
}

impl<'g> EntityRef<'g> {
    fn node(&self) -> &'g EntityNode {
        self.graph.node(self.handle)
    }

    pub fn handle(&self) -> EntityHandle {
        self.handle
    }

    pub fn entity_type(&self) -> &'g str {
        &self.node().entity_type
    }

    pub fn key(&self) -> &'g EntityKey {
        &self.node().key
    }

    pub fn hydrated_as(&self) -> &'g str {
        &self.node().hydrated_as
    }

    pub fn revision(&self) -> i64 {
        self.node().revision
    }

    pub fn change(&self) -> RevisionType {
        self.node().change
    }

    pub fn field(&self, name: &str) -> Option<&'g Value> {
        self.node().fields.get(name)
    }

    pub fn fields(&self) -> &'g BTreeMap<String, Value> {
        &self.node().fields
    }

    pub fn relation(&self, name: &str) -> Option<&'g Relation> {
        self.node().relations.get(name)
    }

    /// The audited to-one target, if the relation resolved to one.
    pub fn to_one(&self, name: &str) -> Option<EntityRef<'g>> {
        match self.relation(name)? {
            Relation::Entity(handle) => Some(self.graph.get(*handle)),
            _ => None,
        }
    }

    /// The lazy audited collection, if the relation resolved to one.
    pub fn collection(&self, name: &str) -> Option<&'g LazyRelationProxy> {
        match self.relation(name)? {
            Relation::Collection(proxy) => Some(proxy),
            _ => None,
        }
    }

    /// Same node, compared by identity within one graph.
    pub fn same_as(&self, other: &EntityRef<'_>) -> bool {
        std::ptr::eq(self.graph, other.graph) && self.handle == other.handle
    }
}

/// A reconstructed entity together with the graph it lives in.
///
/// Snapshots returned by one reader call share a graph, so an entity
/// reachable from several of them is a single node.
#[derive(Debug, Clone)]
pub struct Snapshot {
    graph: Arc<EntityGraph>,
    root: EntityHandle,
}

impl Snapshot {
    pub(crate) fn new(graph: Arc<EntityGraph>, root: EntityHandle) -> Self {
        Self { graph, root }
    }

    pub fn entity(&self) -> EntityRef<'_> {
        self.graph.get(self.root)
    }

    pub fn graph(&self) -> &Arc<EntityGraph> {
        &self.graph
    }

    pub fn handle(&self) -> EntityHandle {
        self.root
    }

    pub fn entity_type(&self) -> &str {
        self.entity().entity_type()
    }

    pub fn key(&self) -> &EntityKey {
        self.entity().key()
    }

    pub fn hydrated_as(&self) -> &str {
        self.entity().hydrated_as()
    }

    pub fn revision(&self) -> i64 {
        self.entity().revision()
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.entity().field(name)
    }

    pub fn to_one(&self, name: &str) -> Option<EntityRef<'_>> {
        self.entity().to_one(name)
    }

    pub fn collection(&self, name: &str) -> Option<&LazyRelationProxy> {
        self.entity().collection(name)
    }

    /// True when both snapshots point at the same node of the same graph.
    pub fn same_node(&self, other: &Snapshot) -> bool {
        Arc::ptr_eq(&self.graph, &other.graph) && self.root == other.root
    }
}
