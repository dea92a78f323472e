//! Audited to-many relations, loaded at the owner's revision on first access.

use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::debug;

use rewind_core::config::LoadPolicy;
use rewind_core::errors::RewindResult;
use rewind_core::models::ColumnFilter;

use crate::context::ReaderContext;
use crate::snapshot::{EntityGraph, EntityHandle, EntityRef, Reconstruction, Snapshot};

/// Deferred point-in-time collection.
///
/// Holds everything needed to list the collection later: the target type,
/// the foreign-key filter, the revision and the load policy of the call
/// that created it. The first successful load is memoized; a failed load
/// is returned to the caller and retried on the next access.
pub struct LazyRelationProxy {
    ctx: Arc<ReaderContext>,
    target: String,
    filter: Vec<ColumnFilter>,
    revision: i64,
    policy: LoadPolicy,
    loaded: OnceLock<LoadedCollection>,
}

impl LazyRelationProxy {
    pub(crate) fn new(
        ctx: Arc<ReaderContext>,
        target: String,
        filter: Vec<ColumnFilter>,
        revision: i64,
        policy: LoadPolicy,
    ) -> Self {
        Self {
            ctx,
            target,
            filter,
            revision,
            policy,
            loaded: OnceLock::new(),
        }
    }

    pub fn target_type(&self) -> &str {
        &self.target
    }

    pub fn revision(&self) -> i64 {
        self.revision
    }

    pub fn filter(&self) -> &[ColumnFilter] {
        &self.filter
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.get().is_some()
    }

    /// Load the collection, or return the memoized result.
    pub fn get(&self) -> RewindResult<&LoadedCollection> {
        if let Some(loaded) = self.loaded.get() {
            return Ok(loaded);
        }
        let collection = self.load()?;
        // A concurrent loader may have won; either result is equivalent.
        Ok(self.loaded.get_or_init(|| collection))
    }

    pub fn len(&self) -> RewindResult<usize> {
        Ok(self.get()?.len())
    }

    pub fn is_empty(&self) -> RewindResult<bool> {
        Ok(self.get()?.is_empty())
    }

    fn load(&self) -> RewindResult<LoadedCollection> {
        let target = self.ctx.catalog.descriptor_for(&self.target)?;
        let mut reconstruction = Reconstruction::new(&self.ctx, self.policy);
        let members = reconstruction.load_related(target, &self.filter, self.revision)?;
        debug!(
            "loaded {} {} at revision {}",
            members.len(),
            self.target,
            self.revision
        );
        Ok(LoadedCollection {
            graph: Arc::new(reconstruction.finish()),
            members,
        })
    }
}

impl fmt::Debug for LazyRelationProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyRelationProxy")
            .field("target", &self.target)
            .field("filter", &self.filter)
            .field("revision", &self.revision)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

/// The members of a loaded collection, in identifier order.
#[derive(Debug)]
pub struct LoadedCollection {
    graph: Arc<EntityGraph>,
    members: Vec<EntityHandle>,
}

impl LoadedCollection {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<EntityRef<'_>> {
        self.members.get(index).map(|h| self.graph.get(*h))
    }

    pub fn iter(&self) -> impl Iterator<Item = EntityRef<'_>> {
        self.members.iter().map(|h| self.graph.get(*h))
    }

    /// Members as owned snapshots sharing this collection's graph.
    pub fn snapshots(&self) -> Vec<Snapshot> {
        self.members
            .iter()
            .map(|h| Snapshot::new(Arc::clone(&self.graph), *h))
            .collect()
    }
}
