//! Audit query construction for point-in-time, history, changes-at-revision,
//! related listings, and revision table lookups.
//!
//! Every builder returns a [`Query`] whose values are bound positionally.
//! Only names vetted by the catalog and the config are spliced into SQL.

pub mod changes;
pub mod point_in_time;
pub mod related;
pub mod revisions;

use rewind_core::config::AuditConfig;
use rewind_core::errors::{RewindResult, SchemaError};
use rewind_core::models::{KeyValue, Value};
use rewind_core::schema::{EntityTypeDescriptor, InheritanceStrategy, SchemaCatalog, TableLayout};

pub use rewind_core::models::Query;

/// Builds queries against the audit tables of one catalog.
#[derive(Debug, Clone, Copy)]
pub struct RevisionQueryBuilder<'a> {
    catalog: &'a SchemaCatalog,
    config: &'a AuditConfig,
}

/// Select list and FROM clause yielding complete entity rows.
#[derive(Debug)]
pub(crate) struct EntitySource {
    pub select: String,
    pub from: String,
    pub layout: TableLayout,
}

impl<'a> RevisionQueryBuilder<'a> {
    pub fn new(catalog: &'a SchemaCatalog, config: &'a AuditConfig) -> Self {
        Self { catalog, config }
    }

    fn audit_table(&self, table: &str) -> String {
        self.config.table_name_for(table)
    }

    /// `e.revtype, e.rev`, every field aliased to its field name, owning
    /// join columns and the discriminator under their column names, read
    /// from the type's audit table joined to its ancestors' at the same
    /// revision.
    pub(crate) fn entity_source(&self, desc: &EntityTypeDescriptor) -> RewindResult<EntitySource> {
        let layout = TableLayout::of(self.catalog, desc)?;
        let rev = &self.config.revision_field_name;
        let revtype = &self.config.revision_type_field_name;

        let mut columns = vec![format!("e.{revtype} AS {revtype}"), format!("e.{rev} AS {rev}")];
        for field in &desc.fields {
            columns.push(format!(
                "{}.{} AS {}",
                layout.column_alias(desc, &field.column),
                field.column,
                field.name
            ));
        }
        for assoc in desc.owning_to_one() {
            for jc in &assoc.join_columns {
                let column = format!(
                    "{}.{} AS {}",
                    layout.column_alias(desc, &jc.column),
                    jc.column,
                    jc.column
                );
                if !columns.contains(&column) {
                    columns.push(column);
                }
            }
        }
        if let Some(inh) = &desc.inheritance {
            columns.push(format!(
                "{}.{} AS {}",
                layout.discriminator_alias(),
                inh.discriminator_column,
                inh.discriminator_column
            ));
        }

        let id_columns = desc.identifier_columns()?;
        let mut from = format!("{} e", self.audit_table(&layout.primary().table));
        for ancestor in layout.ancestors() {
            let alias = &ancestor.alias;
            from.push_str(&format!(
                " INNER JOIN {} {alias} ON {alias}.{rev} = e.{rev}",
                self.audit_table(&ancestor.table)
            ));
            for column in &id_columns {
                from.push_str(&format!(" AND {alias}.{column} = e.{column}"));
            }
        }

        Ok(EntitySource {
            select: columns.join(", "),
            from,
            layout,
        })
    }

    /// `e.<id col> = ?` per identifier component.
    pub(crate) fn identifier_clause(
        &self,
        desc: &EntityTypeDescriptor,
        id: &[KeyValue],
        clauses: &mut Vec<String>,
        params: &mut Vec<Value>,
    ) -> RewindResult<()> {
        let id_columns = desc.identifier_columns()?;
        if id_columns.len() != id.len() {
            return Err(SchemaError::inconsistent(
                &desc.name,
                format!(
                    "expected {} identifier value(s), got {}",
                    id_columns.len(),
                    id.len()
                ),
            )
            .into());
        }
        for (column, value) in id_columns.iter().zip(id) {
            clauses.push(format!("e.{column} = ?"));
            params.push(value.to_value());
        }
        Ok(())
    }

    /// Restricts a single-table subtype to its own and its descendants'
    /// discriminator values. `None` when the type owns its whole table.
    pub(crate) fn subclass_filter(
        &self,
        desc: &EntityTypeDescriptor,
        layout: &TableLayout,
    ) -> Option<(String, Vec<Value>)> {
        let inh = desc.inheritance.as_ref()?;
        if inh.strategy != InheritanceStrategy::SingleTable || inh.root == desc.name {
            return None;
        }

        let mut values: Vec<Value> = Vec::new();
        if let Some(own) = &inh.discriminator_value {
            values.push(Value::Text(own.clone()));
        }
        for sub in &inh.subclasses {
            if let Some(value) = inh.discriminator_for(sub) {
                values.push(Value::Text(value.to_string()));
            }
        }
        if values.is_empty() {
            return None;
        }

        let placeholders = vec!["?"; values.len()].join(", ");
        Some((
            format!(
                "{}.{} IN ({placeholders})",
                layout.discriminator_alias(),
                inh.discriminator_column
            ),
            values,
        ))
    }

    /// `e.<id col>` list for ORDER BY.
    pub(crate) fn identifier_order(&self, desc: &EntityTypeDescriptor) -> RewindResult<String> {
        Ok(desc
            .identifier_columns()?
            .iter()
            .map(|c| format!("e.{c}"))
            .collect::<Vec<_>>()
            .join(", "))
    }

    pub fn config(&self) -> &AuditConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rewind_core::models::ColumnFilter;

    #[test]
    fn point_in_time_binds_revision_then_identifier() {
        let catalog = test_fixtures::catalog();
        let config = AuditConfig::default();
        let builder = RevisionQueryBuilder::new(&catalog, &config);
        let person = catalog.descriptor_for("Person").unwrap();

        let query = builder.point_in_time(person, &[KeyValue::Integer(1)], 3).unwrap();
        assert_eq!(
            query.sql,
            "SELECT e.revtype AS revtype, e.rev AS rev, e.id AS id, e.name AS name, \
             e.age AS age, e.active AS active, e.address_id AS address_id, \
             e.team_id AS team_id, e.pet_id AS pet_id \
             FROM person_audit e WHERE e.rev <= ? AND e.id = ? ORDER BY e.rev DESC LIMIT 1"
        );
        assert_eq!(query.params, vec![Value::Integer(3), Value::Integer(1)]);
    }

    #[test]
    fn joined_subtype_joins_ancestors_at_the_same_revision() {
        let catalog = test_fixtures::catalog();
        let config = AuditConfig::default();
        let builder = RevisionQueryBuilder::new(&catalog, &config);
        let sports = catalog.descriptor_for("SportsCar").unwrap();

        let sql = builder.point_in_time(sports, &[KeyValue::Integer(22)], 6).unwrap().sql;
        assert!(sql.contains(
            "FROM sports_car_audit e \
             INNER JOIN vehicle_audit re ON re.rev = e.rev AND re.id = e.id \
             INNER JOIN car_audit p1 ON p1.rev = e.rev AND p1.id = e.id"
        ));
        assert!(sql.contains("re.make AS make"));
        assert!(sql.contains("p1.doors AS doors"));
        assert!(sql.contains("e.top_speed AS top_speed"));
        assert!(sql.contains("re.vtype AS vtype"));
    }

    #[test]
    fn single_table_subtype_filters_by_discriminator() {
        let catalog = test_fixtures::catalog();
        let config = AuditConfig::default();
        let builder = RevisionQueryBuilder::new(&catalog, &config);

        let cat = catalog.descriptor_for("Cat").unwrap();
        let query = builder.point_in_time(cat, &[KeyValue::Integer(7)], 4).unwrap();
        assert!(query.sql.contains("FROM animal_audit e"));
        assert!(query.sql.contains("AND e.kind IN (?)"));
        assert_eq!(query.params.last(), Some(&Value::from("cat")));

        let animal = catalog.descriptor_for("Animal").unwrap();
        let query = builder.point_in_time(animal, &[KeyValue::Integer(7)], 4).unwrap();
        assert!(!query.sql.contains(" IN ("));
    }

    #[test]
    fn changes_skip_types_reported_through_subtypes() {
        let catalog = test_fixtures::catalog();
        let config = AuditConfig::default();
        let builder = RevisionQueryBuilder::new(&catalog, &config);
        let changes = |name: &str| {
            builder
                .changes_at_revision(catalog.descriptor_for(name).unwrap(), 6)
                .unwrap()
        };

        assert!(changes("Animal").is_none());
        assert!(changes("Cat").unwrap().sql.contains("e.kind = ?"));
        assert!(changes("Car").unwrap().sql.contains("re.vtype = ?"));
        assert!(changes("Vehicle").unwrap().sql.contains("e.vtype = ?"));
        assert!(changes("Person")
            .unwrap()
            .sql
            .ends_with("WHERE e.rev = ? ORDER BY e.id"));
    }

    #[test]
    fn related_listing_excludes_deletions_and_stale_rows() {
        let catalog = test_fixtures::catalog();
        let config = AuditConfig::default();
        let builder = RevisionQueryBuilder::new(&catalog, &config);
        let post = catalog.descriptor_for("Post").unwrap();

        let filter = [ColumnFilter::new("author_id", Value::Integer(1))];
        let query = builder.related_at_revision(post, &filter, 2).unwrap();
        assert!(query.sql.contains(
            "WHERE e.rev <= ? AND e.author_id = ? AND e.revtype <> ? \
             AND e.rev = (SELECT MAX(x.rev) FROM post_audit x WHERE x.rev <= ? AND x.id = e.id) \
             ORDER BY e.id"
        ));
        assert_eq!(
            query.params,
            vec![
                Value::Integer(2),
                Value::Integer(1),
                Value::from("DEL"),
                Value::Integer(2)
            ]
        );
    }

    #[test]
    fn configured_names_are_used() {
        let catalog = test_fixtures::catalog();
        let config = AuditConfig {
            table_prefix: "aud_".to_string(),
            table_suffix: String::new(),
            revision_field_name: "revision_id".to_string(),
            revision_table_name: "revision_log".to_string(),
            revision_author_field_name: "username".to_string(),
            ..AuditConfig::default()
        };
        let builder = RevisionQueryBuilder::new(&catalog, &config);
        let person = catalog.descriptor_for("Person").unwrap();

        let sql = builder.point_in_time(person, &[KeyValue::Integer(1)], 1).unwrap().sql;
        assert!(sql.contains("FROM aud_person e WHERE e.revision_id <= ?"));

        assert_eq!(
            builder.revision_history(5, 0).sql,
            "SELECT r.id AS id, r.timestamp AS timestamp, r.username AS author \
             FROM revision_log r ORDER BY r.id DESC LIMIT ? OFFSET ?"
        );
    }
}
