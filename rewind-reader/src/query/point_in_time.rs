//! Point-in-time and per-entity history queries.

use rewind_core::errors::RewindResult;
use rewind_core::models::{KeyValue, Query, Value};
use rewind_core::schema::EntityTypeDescriptor;

use super::RevisionQueryBuilder;

impl RevisionQueryBuilder<'_> {
    /// Latest row of an entity written at or before `revision`.
    ///
    /// ```sql
    /// SELECT ... FROM person_audit e
    /// WHERE e.rev <= ? AND e.id = ?
    /// ORDER BY e.rev DESC LIMIT 1
    /// ```
    pub fn point_in_time(
        &self,
        desc: &EntityTypeDescriptor,
        id: &[KeyValue],
        revision: i64,
    ) -> RewindResult<Query> {
        let source = self.entity_source(desc)?;
        let rev = &self.config.revision_field_name;

        let mut clauses = vec![format!("e.{rev} <= ?")];
        let mut params = vec![Value::Integer(revision)];
        self.identifier_clause(desc, id, &mut clauses, &mut params)?;
        if let Some((clause, values)) = self.subclass_filter(desc, &source.layout) {
            clauses.push(clause);
            params.extend(values);
        }

        let sql = format!(
            "SELECT {} FROM {} WHERE {} ORDER BY e.{rev} DESC LIMIT 1",
            source.select,
            source.from,
            clauses.join(" AND ")
        );
        Ok(Query::new(sql, params))
    }

    /// Every row of an entity, newest first.
    pub fn entity_history(&self, desc: &EntityTypeDescriptor, id: &[KeyValue]) -> RewindResult<Query> {
        let source = self.entity_source(desc)?;
        let rev = &self.config.revision_field_name;

        let mut clauses = Vec::new();
        let mut params = Vec::new();
        self.identifier_clause(desc, id, &mut clauses, &mut params)?;
        if let Some((clause, values)) = self.subclass_filter(desc, &source.layout) {
            clauses.push(clause);
            params.extend(values);
        }

        let sql = format!(
            "SELECT {} FROM {} WHERE {} ORDER BY e.{rev} DESC",
            source.select,
            source.from,
            clauses.join(" AND ")
        );
        Ok(Query::new(sql, params))
    }

    /// Highest revision at which the entity was written.
    pub fn current_revision(&self, desc: &EntityTypeDescriptor, id: &[KeyValue]) -> RewindResult<Query> {
        let source = self.entity_source(desc)?;
        let rev = &self.config.revision_field_name;

        let mut clauses = Vec::new();
        let mut params = Vec::new();
        self.identifier_clause(desc, id, &mut clauses, &mut params)?;
        if let Some((clause, values)) = self.subclass_filter(desc, &source.layout) {
            clauses.push(clause);
            params.extend(values);
        }

        let sql = format!(
            "SELECT e.{rev} AS {rev} FROM {} WHERE {} ORDER BY e.{rev} DESC LIMIT 1",
            source.from,
            clauses.join(" AND ")
        );
        Ok(Query::new(sql, params))
    }
}
