//! Table aliases for a type's storage layout.
//!
//! A joined-table subtype is spread over its own table (`e`) and one table
//! per ancestor: the root as `re`, intermediates as `p1..pn`. Every other
//! type lives in a single table aliased `e`.

use crate::errors::RewindResult;

use super::catalog::SchemaCatalog;
use super::descriptor::EntityTypeDescriptor;

pub const PRIMARY_ALIAS: &str = "e";
pub const ROOT_ALIAS: &str = "re";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutTable {
    pub alias: String,
    /// Live table name; audit readers map it through `AuditConfig`.
    pub table: String,
    pub entity_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    primary: LayoutTable,
    ancestors: Vec<LayoutTable>,
    root_holds_discriminator: bool,
}

impl TableLayout {
    pub fn of(catalog: &SchemaCatalog, desc: &EntityTypeDescriptor) -> RewindResult<Self> {
        let primary = LayoutTable {
            alias: PRIMARY_ALIAS.to_string(),
            table: desc.table.clone(),
            entity_type: desc.name.clone(),
        };

        let mut ancestors = Vec::new();
        if desc.is_joined_subtype() {
            if let Some(inh) = &desc.inheritance {
                for (depth, ancestor) in inh.ancestors.iter().enumerate() {
                    let ancestor_desc = catalog.descriptor_for(ancestor)?;
                    let alias = if depth == 0 {
                        ROOT_ALIAS.to_string()
                    } else {
                        format!("p{depth}")
                    };
                    ancestors.push(LayoutTable {
                        alias,
                        table: ancestor_desc.table.clone(),
                        entity_type: ancestor_desc.name.clone(),
                    });
                }
            }
        }

        Ok(Self {
            primary,
            root_holds_discriminator: !ancestors.is_empty(),
            ancestors,
        })
    }

    pub fn primary(&self) -> &LayoutTable {
        &self.primary
    }

    /// Ancestor tables joined to the primary one, root first.
    pub fn ancestors(&self) -> &[LayoutTable] {
        &self.ancestors
    }

    /// Alias of the table storing columns declared by `declared_in`.
    pub fn alias_for(&self, declared_in: &str) -> &str {
        self.ancestors
            .iter()
            .find(|t| t.entity_type == declared_in)
            .map_or(PRIMARY_ALIAS, |t| t.alias.as_str())
    }

    /// Alias for any column of the type. Identifier columns are present on
    /// every table of the hierarchy and are always read from `e`.
    pub fn column_alias(&self, desc: &EntityTypeDescriptor, column: &str) -> &str {
        if let Some(field) = desc.field_for_column(column) {
            if desc.is_identifier(&field.name) {
                return PRIMARY_ALIAS;
            }
            return self.alias_for(&field.declared_in);
        }
        let owner = desc.associations.iter().find(|a| {
            a.join_columns.iter().any(|jc| jc.column == column)
        });
        match owner {
            Some(assoc) if !desc.is_identifier(&assoc.field) => self.alias_for(&assoc.declared_in),
            _ => PRIMARY_ALIAS,
        }
    }

    pub fn discriminator_alias(&self) -> &str {
        if self.root_holds_discriminator {
            ROOT_ALIAS
        } else {
            PRIMARY_ALIAS
        }
    }
}
