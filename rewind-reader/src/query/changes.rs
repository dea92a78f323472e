//! Rows written at exactly one revision.

use rewind_core::errors::RewindResult;
use rewind_core::models::{Query, Value};
use rewind_core::schema::EntityTypeDescriptor;

use super::RevisionQueryBuilder;

impl RevisionQueryBuilder<'_> {
    /// Rows of `desc` written at `revision`, or `None` when the type is
    /// reported through its subtypes instead.
    ///
    /// Single-table types with subclasses and abstract hierarchy types are
    /// skipped. Every other hierarchy member is restricted to its own
    /// discriminator so a row is reported once, under its concrete type.
    pub fn changes_at_revision(
        &self,
        desc: &EntityTypeDescriptor,
        revision: i64,
    ) -> RewindResult<Option<Query>> {
        if desc.is_single_table() && desc.has_subclasses() {
            return Ok(None);
        }

        let source = self.entity_source(desc)?;
        let rev = &self.config.revision_field_name;

        let mut clauses = vec![format!("e.{rev} = ?")];
        let mut params = vec![Value::Integer(revision)];
        if let Some(inh) = &desc.inheritance {
            let Some(own) = &inh.discriminator_value else {
                return Ok(None);
            };
            clauses.push(format!(
                "{}.{} = ?",
                source.layout.discriminator_alias(),
                inh.discriminator_column
            ));
            params.push(Value::Text(own.clone()));
        }

        let sql = format!(
            "SELECT {} FROM {} WHERE {} ORDER BY {}",
            source.select,
            source.from,
            clauses.join(" AND "),
            self.identifier_order(desc)?
        );
        Ok(Some(Query::new(sql, params)))
    }
}
