//! Deferred handle on a non-audited entity.

use std::fmt;
use std::sync::{Arc, OnceLock};

use rewind_core::errors::RewindResult;
use rewind_core::models::{EntityKey, LiveEntity};
use rewind_core::schema::EntityTypeDescriptor;
use rewind_core::traits::LiveSource;

/// Points at a live row by key. The row is read on first access, so it
/// reflects current state rather than the owner's revision.
pub struct LiveReference {
    source: Arc<dyn LiveSource>,
    target: Arc<EntityTypeDescriptor>,
    key: EntityKey,
    loaded: OnceLock<Option<LiveEntity>>,
}

impl LiveReference {
    pub(crate) fn new(
        source: Arc<dyn LiveSource>,
        target: Arc<EntityTypeDescriptor>,
        key: EntityKey,
    ) -> Self {
        Self {
            source,
            target,
            key,
            loaded: OnceLock::new(),
        }
    }

    pub fn key(&self) -> &EntityKey {
        &self.key
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.get().is_some()
    }

    /// `None` if the live row no longer exists.
    pub fn get(&self) -> RewindResult<Option<&LiveEntity>> {
        if let Some(loaded) = self.loaded.get() {
            return Ok(loaded.as_ref());
        }
        let entity = self.source.load(&self.target, &self.key)?;
        Ok(self.loaded.get_or_init(|| entity).as_ref())
    }
}

impl fmt::Debug for LiveReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveReference")
            .field("key", &self.key)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
