//! Revision table queries. Columns are aliased to `id`, `timestamp` and
//! `author` whatever the configured names.

use rewind_core::errors::RewindResult;
use rewind_core::models::{KeyValue, Query, Value};
use rewind_core::schema::EntityTypeDescriptor;

use super::RevisionQueryBuilder;

impl RevisionQueryBuilder<'_> {
    fn revision_columns(&self) -> String {
        let c = self.config;
        format!(
            "r.{} AS id, r.{} AS timestamp, r.{} AS author",
            c.revision_id_field_name, c.revision_timestamp_field_name, c.revision_author_field_name
        )
    }

    /// A page of the revision log, newest first.
    pub fn revision_history(&self, limit: usize, offset: usize) -> Query {
        let sql = format!(
            "SELECT {} FROM {} r ORDER BY r.{} DESC LIMIT ? OFFSET ?",
            self.revision_columns(),
            self.config.revision_table_name,
            self.config.revision_id_field_name
        );
        Query::new(
            sql,
            vec![Value::Integer(to_i64(limit)), Value::Integer(to_i64(offset))],
        )
    }

    pub fn revision(&self, revision: i64) -> Query {
        let sql = format!(
            "SELECT {} FROM {} r WHERE r.{} = ?",
            self.revision_columns(),
            self.config.revision_table_name,
            self.config.revision_id_field_name
        );
        Query::new(sql, vec![Value::Integer(revision)])
    }

    /// Revisions at which one entity was written, newest first.
    pub fn revisions_for_entity(
        &self,
        desc: &EntityTypeDescriptor,
        id: &[KeyValue],
    ) -> RewindResult<Query> {
        let source = self.entity_source(desc)?;
        let mut clauses = Vec::new();
        let mut params = Vec::new();
        self.identifier_clause(desc, id, &mut clauses, &mut params)?;
        if let Some((clause, values)) = self.subclass_filter(desc, &source.layout) {
            clauses.push(clause);
            params.extend(values);
        }

        let rev_id = &self.config.revision_id_field_name;
        let sql = format!(
            "SELECT {} FROM {} r INNER JOIN {} e ON r.{rev_id} = e.{} WHERE {} ORDER BY r.{rev_id} DESC",
            self.revision_columns(),
            self.config.revision_table_name,
            self.audit_table(&source.layout.primary().table),
            self.config.revision_field_name,
            clauses.join(" AND ")
        );
        Ok(Query::new(sql, params))
    }
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
