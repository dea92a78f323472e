//! Serializable schema definitions, the input to the catalog builder.
//!
//! Subtypes declare only what they add: table, identifier, fields and
//! associations of ancestors are merged in by the catalog.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::descriptor::{AssociationKind, InheritanceStrategy, JoinColumn};

/// A whole catalog, as read from TOML (`[[entity]]` tables).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDefinition {
    #[serde(default, rename = "entity")]
    pub entities: Vec<EntityDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityDefinition {
    pub name: String,
    /// Defaults to the root's table under single-table inheritance,
    /// otherwise to the lower-cased type name.
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default = "default_audited")]
    pub audited: bool,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub discriminator_value: Option<String>,
    /// Inherited from the root when empty.
    #[serde(default)]
    pub identifier: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    #[serde(default)]
    pub associations: Vec<AssociationDefinition>,
    /// Only on hierarchy roots.
    #[serde(default)]
    pub inheritance: Option<InheritanceDefinition>,
}

fn default_audited() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    /// Defaults to the field name.
    #[serde(default)]
    pub column: Option<String>,
    /// A builtin codec name or one registered on the builder.
    pub codec: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssociationDefinition {
    pub field: String,
    pub kind: AssociationKind,
    pub target: String,
    #[serde(default)]
    pub join_columns: Vec<JoinColumn>,
    #[serde(default)]
    pub mapped_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InheritanceDefinition {
    pub strategy: InheritanceStrategy,
    pub discriminator_column: String,
    pub discriminator_map: BTreeMap<String, String>,
}

impl EntityDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
            audited: true,
            parent: None,
            discriminator_value: None,
            identifier: Vec::new(),
            fields: Vec::new(),
            associations: Vec::new(),
            inheritance: None,
        }
    }
}
