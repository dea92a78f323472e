//! Snapshot reconstruction: arena graph, per-call cache, and the
//! row-to-entity algorithm.

pub mod cache;
pub mod graph;
pub(crate) mod reconstruct;

pub use cache::ReconstructionCache;
pub use graph::{EntityGraph, EntityHandle, EntityNode, EntityRef, Relation, Snapshot};
pub(crate) use reconstruct::{DeletionMode, Reconstruction};
