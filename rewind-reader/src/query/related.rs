//! Point-in-time filtered listings, for collections and inverse to-ones.

use rewind_core::errors::RewindResult;
use rewind_core::models::{ColumnFilter, Query, RevisionType, Value};
use rewind_core::schema::EntityTypeDescriptor;

use super::RevisionQueryBuilder;

impl RevisionQueryBuilder<'_> {
    /// Entities of `desc` whose state at `revision` matches `filter` and
    /// is not a deletion. Each row is the entity's latest at or before
    /// `revision`.
    ///
    /// ```sql
    /// SELECT ... FROM post_audit e
    /// WHERE e.rev <= ? AND e.author_id = ? AND e.revtype <> ?
    ///   AND e.rev = (SELECT MAX(x.rev) FROM post_audit x WHERE x.rev <= ? AND x.id = e.id)
    /// ORDER BY e.id
    /// ```
    pub fn related_at_revision(
        &self,
        desc: &EntityTypeDescriptor,
        filter: &[ColumnFilter],
        revision: i64,
    ) -> RewindResult<Query> {
        let source = self.entity_source(desc)?;
        let rev = &self.config.revision_field_name;
        let revtype = &self.config.revision_type_field_name;
        let id_columns = desc.identifier_columns()?;

        let mut clauses = vec![format!("e.{rev} <= ?")];
        let mut params = vec![Value::Integer(revision)];
        for f in filter {
            clauses.push(format!(
                "{}.{} = ?",
                source.layout.column_alias(desc, &f.column),
                f.column
            ));
            params.push(f.value.clone());
        }
        clauses.push(format!("e.{revtype} <> ?"));
        params.push(Value::Text(RevisionType::Delete.as_code().to_string()));

        let correlated: Vec<String> = id_columns
            .iter()
            .map(|c| format!("x.{c} = e.{c}"))
            .collect();
        clauses.push(format!(
            "e.{rev} = (SELECT MAX(x.{rev}) FROM {} x WHERE x.{rev} <= ? AND {})",
            self.audit_table(&source.layout.primary().table),
            correlated.join(" AND ")
        ));
        params.push(Value::Integer(revision));

        if let Some((clause, values)) = self.subclass_filter(desc, &source.layout) {
            clauses.push(clause);
            params.extend(values);
        }

        let sql = format!(
            "SELECT {} FROM {} WHERE {} ORDER BY {}",
            source.select,
            source.from,
            clauses.join(" AND "),
            self.identifier_order(desc)?
        );
        Ok(Query::new(sql, params))
    }
}
