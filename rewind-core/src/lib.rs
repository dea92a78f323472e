//! # rewind-core
//!
//! Foundation crate for point-in-time entity reconstruction.
//! Defines the data model, schema catalog, field codecs, errors, config,
//! and the store traits every other crate in the workspace depends on.

pub mod config;
pub mod errors;
pub mod logging;
pub mod models;
pub mod schema;
pub mod traits;

pub use config::{AuditConfig, LoadPolicy, RewindConfig};
pub use errors::{AuditError, RewindError, RewindResult, SchemaError, StorageError};
pub use models::{EntityKey, Identifier, KeyValue, Revision, RevisionType, Value};
pub use schema::{EntityTypeDescriptor, SchemaCatalog};
pub use traits::{AuditStore, LiveSource};
