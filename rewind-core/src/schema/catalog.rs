//! SchemaCatalog: registered entity types, read-only after build.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::debug;

use crate::errors::{RewindResult, SchemaError};

use super::codec::{BuiltinCodec, FieldCodec};
use super::definition::{CatalogDefinition, EntityDefinition};
use super::descriptor::{
    AssociationDescriptor, EntityTypeDescriptor, FieldDescriptor, InheritanceDescriptor,
    InheritanceStrategy,
};

/// Every registered entity type, in registration order.
#[derive(Debug, Clone)]
pub struct SchemaCatalog {
    types: Vec<Arc<EntityTypeDescriptor>>,
    index: HashMap<String, usize>,
}

impl SchemaCatalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    /// Build a catalog from TOML definitions using the builtin codecs.
    pub fn from_toml(toml_str: &str) -> RewindResult<Self> {
        Self::builder().definitions_from_toml(toml_str)?.build()
    }

    /// Fails with `UnknownType` if the type was never registered.
    pub fn descriptor_for(&self, entity_type: &str) -> RewindResult<&Arc<EntityTypeDescriptor>> {
        self.index
            .get(entity_type)
            .map(|&i| &self.types[i])
            .ok_or_else(|| {
                SchemaError::UnknownType {
                    entity_type: entity_type.to_string(),
                }
                .into()
            })
    }

    pub fn is_audited(&self, entity_type: &str) -> bool {
        self.index
            .get(entity_type)
            .is_some_and(|&i| self.types[i].audited)
    }

    /// Audited type names in registration order.
    pub fn all_audited_types(&self) -> Vec<&str> {
        self.types
            .iter()
            .filter(|d| d.audited)
            .map(|d| d.name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Collects definitions and custom codecs, then resolves inheritance and
/// validates the whole set at once.
#[derive(Debug)]
pub struct CatalogBuilder {
    codecs: HashMap<String, Arc<dyn FieldCodec>>,
    definitions: Vec<EntityDefinition>,
}

impl Default for CatalogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogBuilder {
    pub fn new() -> Self {
        let codecs = BuiltinCodec::ALL
            .into_iter()
            .map(|c| (c.as_str().to_string(), Arc::new(c) as Arc<dyn FieldCodec>))
            .collect();
        Self {
            codecs,
            definitions: Vec::new(),
        }
    }

    /// Register a custom codec under `name`, replacing any builtin of that name.
    pub fn codec(mut self, name: impl Into<String>, codec: Arc<dyn FieldCodec>) -> Self {
        self.codecs.insert(name.into(), codec);
        self
    }

    pub fn entity(mut self, definition: EntityDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    pub fn definitions_from_toml(mut self, toml_str: &str) -> RewindResult<Self> {
        let parsed: CatalogDefinition = toml::from_str(toml_str)
            .map_err(|e| crate::RewindError::Config(format!("schema definition: {e}")))?;
        self.definitions.extend(parsed.entities);
        Ok(self)
    }

    pub fn build(self) -> RewindResult<SchemaCatalog> {
        let mut by_name: HashMap<&str, &EntityDefinition> = HashMap::new();
        for def in &self.definitions {
            if by_name.insert(def.name.as_str(), def).is_some() {
                return Err(SchemaError::inconsistent(&def.name, "registered twice").into());
            }
        }

        let mut types = Vec::with_capacity(self.definitions.len());
        for def in &self.definitions {
            types.push(Arc::new(self.resolve(def, &by_name)?));
        }

        let index = types
            .iter()
            .enumerate()
            .map(|(i, d)| (d.name.clone(), i))
            .collect();
        let catalog = SchemaCatalog { types, index };
        validate_references(&catalog)?;

        debug!(
            "schema catalog built: {} type(s), {} audited",
            catalog.len(),
            catalog.all_audited_types().len()
        );
        Ok(catalog)
    }

    /// Merge a definition with its ancestors into a descriptor.
    fn resolve(
        &self,
        def: &EntityDefinition,
        by_name: &HashMap<&str, &EntityDefinition>,
    ) -> RewindResult<EntityTypeDescriptor> {
        let ancestors = ancestor_chain(def, by_name)?;
        let root = ancestors.first().copied().unwrap_or(def);

        let inheritance = match (&root.inheritance, ancestors.is_empty()) {
            (Some(inh), _) => Some(InheritanceDescriptor {
                strategy: inh.strategy,
                discriminator_column: checked(&inh.discriminator_column)?,
                discriminator_value: def.discriminator_value.clone(),
                discriminator_map: inh.discriminator_map.clone(),
                root: root.name.clone(),
                ancestors: ancestors.iter().map(|a| a.name.clone()).collect(),
                subclasses: self
                    .definitions
                    .iter()
                    .filter(|other| {
                        ancestor_chain(other, by_name)
                            .map(|chain| chain.iter().any(|a| a.name == def.name))
                            .unwrap_or(false)
                    })
                    .map(|other| other.name.clone())
                    .collect(),
            }),
            (None, true) => None,
            (None, false) => {
                return Err(SchemaError::inconsistent(
                    &def.name,
                    format!("parent hierarchy root {} declares no inheritance", root.name),
                )
                .into())
            }
        };

        let single_table = inheritance
            .as_ref()
            .is_some_and(|inh| inh.strategy == InheritanceStrategy::SingleTable);
        let table = match (&def.table, single_table && !ancestors.is_empty()) {
            (_, true) => table_of(root),
            (Some(table), false) => table.clone(),
            (None, false) => table_of(def),
        };

        let identifier = if def.identifier.is_empty() {
            root.identifier.clone()
        } else {
            def.identifier.clone()
        };

        // Ancestors first so a subtype can override an inherited field.
        let mut fields: Vec<FieldDescriptor> = Vec::new();
        let mut associations: Vec<AssociationDescriptor> = Vec::new();
        for owner in ancestors.iter().copied().chain(std::iter::once(def)) {
            for f in &owner.fields {
                let codec = self.codecs.get(&f.codec).cloned().ok_or_else(|| {
                    SchemaError::inconsistent(
                        &def.name,
                        format!("field {} uses unknown codec {}", f.name, f.codec),
                    )
                })?;
                let descriptor = FieldDescriptor {
                    name: checked(&f.name)?,
                    column: checked(f.column.as_deref().unwrap_or(&f.name))?,
                    codec,
                    declared_in: owner.name.clone(),
                };
                fields.retain(|existing| existing.name != descriptor.name);
                fields.push(descriptor);
            }
            for a in &owner.associations {
                for jc in &a.join_columns {
                    checked(&jc.column)?;
                    checked(&jc.referenced_column)?;
                }
                let descriptor = AssociationDescriptor {
                    field: checked(&a.field)?,
                    kind: a.kind,
                    target: a.target.clone(),
                    owning_side: a.mapped_by.is_none(),
                    join_columns: a.join_columns.clone(),
                    mapped_by: a.mapped_by.clone(),
                    declared_in: owner.name.clone(),
                };
                associations.retain(|existing| existing.field != descriptor.field);
                associations.push(descriptor);
            }
        }

        let descriptor = EntityTypeDescriptor {
            name: def.name.clone(),
            table: checked(&table)?,
            identifier,
            fields,
            associations,
            inheritance,
            audited: def.audited,
        };

        if descriptor.identifier.is_empty() {
            return Err(SchemaError::inconsistent(&def.name, "no identifier fields").into());
        }
        for id_field in &descriptor.identifier {
            if descriptor.identifier_column(id_field).is_none() {
                return Err(SchemaError::MissingColumnMapping {
                    entity_type: def.name.clone(),
                    field: id_field.clone(),
                }
                .into());
            }
        }

        Ok(descriptor)
    }
}

/// Ancestors of `def`, root first. Empty for types without a parent.
fn ancestor_chain<'a>(
    def: &'a EntityDefinition,
    by_name: &HashMap<&str, &'a EntityDefinition>,
) -> RewindResult<Vec<&'a EntityDefinition>> {
    let mut chain = Vec::new();
    let mut current = def;
    while let Some(parent) = &current.parent {
        let parent_def = by_name.get(parent.as_str()).copied().ok_or_else(|| {
            SchemaError::UnknownType {
                entity_type: parent.clone(),
            }
        })?;
        if parent_def.name == def.name || chain.iter().any(|c: &&EntityDefinition| c.name == parent_def.name) {
            return Err(SchemaError::inconsistent(&def.name, "cyclic parent chain").into());
        }
        chain.push(parent_def);
        current = parent_def;
    }
    chain.reverse();
    Ok(chain)
}

fn table_of(def: &EntityDefinition) -> String {
    def.table.clone().unwrap_or_else(|| def.name.to_lowercase())
}

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is a valid regex")
    })
}

/// Names end up in SQL text, so they must be plain identifiers.
pub(crate) fn checked(name: &str) -> RewindResult<String> {
    if identifier_pattern().is_match(name) {
        Ok(name.to_string())
    } else {
        Err(SchemaError::InvalidIdentifier {
            name: name.to_string(),
        }
        .into())
    }
}

/// Cross-type checks that need every descriptor resolved.
fn validate_references(catalog: &SchemaCatalog) -> RewindResult<()> {
    for desc in &catalog.types {
        for assoc in &desc.associations {
            let target = catalog.descriptor_for(&assoc.target)?;
            if let Some(mapped_by) = &assoc.mapped_by {
                let owning = target.association(mapped_by).ok_or_else(|| {
                    SchemaError::inconsistent(
                        &desc.name,
                        format!("{} is mapped by missing {}.{}", assoc.field, target.name, mapped_by),
                    )
                })?;
                if owning.join_columns.is_empty() {
                    return Err(SchemaError::inconsistent(
                        &target.name,
                        format!("{mapped_by} owns {} but has no join columns", assoc.field),
                    )
                    .into());
                }
            } else if assoc.kind.is_one_to_many() {
                return Err(SchemaError::inconsistent(
                    &desc.name,
                    format!("one-to-many {} must be mapped by the target", assoc.field),
                )
                .into());
            } else if assoc.kind.is_to_one() && assoc.join_columns.is_empty() {
                return Err(SchemaError::inconsistent(
                    &desc.name,
                    format!("owning association {} has no join columns", assoc.field),
                )
                .into());
            }
        }
        if let Some(inh) = &desc.inheritance {
            for concrete in inh.discriminator_map.values() {
                catalog.descriptor_for(concrete)?;
            }
        }
    }
    Ok(())
}
