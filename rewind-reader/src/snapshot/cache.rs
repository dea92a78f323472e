//! Per-call reconstruction cache keyed by `(type, identifier, revision)`.

use rustc_hash::FxHashMap;
use tracing::debug;

use rewind_core::models::EntityKey;

use super::graph::{EntityGraph, EntityHandle, EntityNode};

/// Owns the arena being built and remembers which node stands for each
/// requested `(key, revision)`. Entries are registered before their
/// relations are resolved, which is what terminates reference cycles.
#[derive(Debug, Default)]
pub struct ReconstructionCache {
    graph: EntityGraph,
    index: FxHashMap<i64, FxHashMap<EntityKey, EntityHandle>>,
}

impl ReconstructionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &EntityKey, revision: i64) -> Option<EntityHandle> {
        let hit = self
            .index
            .get(&revision)
            .and_then(|at_revision| at_revision.get(key))
            .copied();
        if hit.is_some() {
            debug!("reconstruction cache hit for {key}@{revision}");
        }
        hit
    }

    pub fn insert(&mut self, key: EntityKey, revision: i64, node: EntityNode) -> EntityHandle {
        let handle = self.graph.push(node);
        self.index.entry(revision).or_default().insert(key, handle);
        handle
    }

    pub fn node(&self, handle: EntityHandle) -> &EntityNode {
        self.graph.node(handle)
    }

    pub fn node_mut(&mut self, handle: EntityHandle) -> &mut EntityNode {
        self.graph.node_mut(handle)
    }

    pub fn len(&self) -> usize {
        self.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    pub fn into_graph(self) -> EntityGraph {
        self.graph
    }
}
