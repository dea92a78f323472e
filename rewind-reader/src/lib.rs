//! # rewind-reader
//!
//! Point-in-time reconstruction of audited entities.
//! Rebuilds an entity graph as it was at any revision, pages through the
//! revision log, lists what changed at a revision, and diffs two states.

mod context;
pub mod diff;
pub mod query;
pub mod reader;
pub mod relation;
mod revision_log;
pub mod snapshot;

pub use diff::Differ;
pub use query::RevisionQueryBuilder;
pub use reader::{AuditReader, ChangedEntity, FindOptions};
pub use relation::{LazyRelationProxy, LiveReference, LoadedCollection};
pub use snapshot::{EntityGraph, EntityHandle, EntityRef, Relation, Snapshot};
