//! `LiveSource`: current (non-historical) state for non-audited relations.

use crate::errors::RewindResult;
use crate::models::{ColumnFilter, EntityKey, LiveEntity};
use crate::schema::EntityTypeDescriptor;

/// Reads non-audited entities from the source store.
pub trait LiveSource: Send + Sync {
    /// Load one entity by identifier.
    fn load(
        &self,
        target: &EntityTypeDescriptor,
        key: &EntityKey,
    ) -> RewindResult<Option<LiveEntity>>;

    /// Inverse side of a to-one: the target row whose foreign key matches.
    fn load_to_one_entity(
        &self,
        target: &EntityTypeDescriptor,
        filter: &[ColumnFilter],
    ) -> RewindResult<Option<LiveEntity>>;

    /// Every target row whose foreign key matches, in identifier order.
    fn load_to_many_collection(
        &self,
        target: &EntityTypeDescriptor,
        filter: &[ColumnFilter],
    ) -> RewindResult<Vec<LiveEntity>>;
}
