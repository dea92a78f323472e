//! Relationship load policy.

use serde::{Deserialize, Serialize};

/// Decides, per relationship category, whether reconstruction follows it.
///
/// Passed into each reconstruction so concurrent callers never share toggles.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoadPolicy {
    /// Audited to-many relations become lazy point-in-time collections.
    pub load_audited_collections: bool,
    /// Audited to-one relations are resolved at the same revision.
    pub load_audited_entities: bool,
    /// Non-audited to-many relations are read from live state.
    pub load_native_collections: bool,
    /// Non-audited to-one relations become live references.
    pub load_native_entities: bool,
}

impl Default for LoadPolicy {
    fn default() -> Self {
        Self::all()
    }
}

impl LoadPolicy {
    /// Follow every relationship.
    pub fn all() -> Self {
        Self {
            load_audited_collections: true,
            load_audited_entities: true,
            load_native_collections: true,
            load_native_entities: true,
        }
    }

    /// Scalars only; every relationship is left unset or empty.
    pub fn none() -> Self {
        Self {
            load_audited_collections: false,
            load_audited_entities: false,
            load_native_collections: false,
            load_native_entities: false,
        }
    }
}
