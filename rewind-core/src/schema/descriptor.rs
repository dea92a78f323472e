//! Per-type schema descriptors. Built once by the catalog and shared
//! read-only across reconstructions.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::{RewindResult, SchemaError};

use super::codec::FieldCodec;

/// A scalar field and the column it is stored in.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: String,
    pub column: String,
    pub codec: Arc<dyn FieldCodec>,
    /// The type whose table stores this column. Differs from the owning
    /// descriptor for fields inherited under joined-table inheritance.
    pub declared_in: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationKind {
    OneToOne,
    ManyToOne,
    OneToMany,
    ManyToMany,
}

impl AssociationKind {
    pub fn is_to_one(self) -> bool {
        matches!(self, AssociationKind::OneToOne | AssociationKind::ManyToOne)
    }

    /// Collections backed by a foreign key on the target table.
    pub fn is_one_to_many(self) -> bool {
        self == AssociationKind::OneToMany
    }
}

/// `column` lives on the owning side's table and references
/// `referenced_column` on the other side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinColumn {
    pub column: String,
    pub referenced_column: String,
}

#[derive(Debug, Clone)]
pub struct AssociationDescriptor {
    pub field: String,
    pub kind: AssociationKind,
    pub target: String,
    pub owning_side: bool,
    /// Only populated on the owning side.
    pub join_columns: Vec<JoinColumn>,
    /// Name of the owning association on the target, for inverse sides.
    pub mapped_by: Option<String>,
    pub declared_in: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InheritanceStrategy {
    SingleTable,
    Joined,
}

#[derive(Debug, Clone)]
pub struct InheritanceDescriptor {
    pub strategy: InheritanceStrategy,
    pub discriminator_column: String,
    /// This type's own discriminator value; `None` for abstract types.
    pub discriminator_value: Option<String>,
    /// Discriminator value to concrete type, shared by the whole hierarchy.
    pub discriminator_map: BTreeMap<String, String>,
    pub root: String,
    /// Ancestors from the root down, excluding this type.
    pub ancestors: Vec<String>,
    /// Every descendant type, in registration order.
    pub subclasses: Vec<String>,
}

impl InheritanceDescriptor {
    /// Reverse lookup of a type's discriminator value.
    pub fn discriminator_for(&self, entity_type: &str) -> Option<&str> {
        self.discriminator_map
            .iter()
            .find(|(_, ty)| ty.as_str() == entity_type)
            .map(|(value, _)| value.as_str())
    }
}

/// Static description of one logical entity type.
#[derive(Debug, Clone)]
pub struct EntityTypeDescriptor {
    pub name: String,
    /// Live table name. Audit table names derive from it.
    pub table: String,
    pub identifier: Vec<String>,
    pub fields: Vec<FieldDescriptor>,
    pub associations: Vec<AssociationDescriptor>,
    pub inheritance: Option<InheritanceDescriptor>,
    pub audited: bool,
}

impl EntityTypeDescriptor {
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_for_column(&self, column: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.column == column)
    }

    pub fn association(&self, field: &str) -> Option<&AssociationDescriptor> {
        self.associations.iter().find(|a| a.field == field)
    }

    pub fn is_identifier(&self, name: &str) -> bool {
        self.identifier.iter().any(|id| id == name)
    }

    /// Column storing an identifier field: its own column for scalars, the
    /// first join column for association identifiers.
    pub fn identifier_column(&self, id_field: &str) -> Option<&str> {
        if let Some(field) = self.field(id_field) {
            return Some(&field.column);
        }
        self.association(id_field)
            .and_then(|assoc| assoc.join_columns.first())
            .map(|jc| jc.column.as_str())
    }

    /// Identifier columns in identifier order. Fails with
    /// `MissingColumnMapping` for an identifier with no column.
    pub fn identifier_columns(&self) -> RewindResult<Vec<&str>> {
        let mut columns = Vec::with_capacity(self.identifier.len());
        for id in &self.identifier {
            let column = self.identifier_column(id).ok_or_else(|| SchemaError::MissingColumnMapping {
                entity_type: self.name.clone(),
                field: id.clone(),
            })?;
            columns.push(column);
        }
        Ok(columns)
    }

    /// Owning-side to-one associations, whose join columns are stored on
    /// this type's rows.
    pub fn owning_to_one(&self) -> impl Iterator<Item = &AssociationDescriptor> {
        self.associations
            .iter()
            .filter(|a| a.kind.is_to_one() && a.owning_side)
    }

    pub fn is_abstract(&self) -> bool {
        self.inheritance
            .as_ref()
            .is_some_and(|inh| inh.discriminator_value.is_none())
    }

    pub fn is_single_table(&self) -> bool {
        self.inheritance
            .as_ref()
            .is_some_and(|inh| inh.strategy == InheritanceStrategy::SingleTable)
    }

    /// A joined-table subtype whose row must be joined to its ancestors'.
    pub fn is_joined_subtype(&self) -> bool {
        self.inheritance.as_ref().is_some_and(|inh| {
            inh.strategy == InheritanceStrategy::Joined && inh.root != self.name
        })
    }

    pub fn has_subclasses(&self) -> bool {
        self.inheritance
            .as_ref()
            .is_some_and(|inh| !inh.subclasses.is_empty())
    }
}
