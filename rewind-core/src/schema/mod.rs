//! Schema catalog: what the reader knows about each entity type.

pub mod catalog;
pub mod codec;
pub mod definition;
pub mod descriptor;
pub mod layout;

pub use catalog::{CatalogBuilder, SchemaCatalog};
pub use codec::{BuiltinCodec, DecodeError, FieldCodec};
pub use definition::{
    AssociationDefinition, CatalogDefinition, EntityDefinition, FieldDefinition,
    InheritanceDefinition,
};
pub use descriptor::{
    AssociationDescriptor, AssociationKind, EntityTypeDescriptor, FieldDescriptor,
    InheritanceDescriptor, InheritanceStrategy, JoinColumn,
};
pub use layout::{LayoutTable, TableLayout};
