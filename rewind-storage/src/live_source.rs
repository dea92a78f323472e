//! `LiveSource` over SQLite: current state of non-audited types.

use std::collections::BTreeMap;
use std::sync::Arc;

use rusqlite::params_from_iter;
use tracing::{debug, trace};

use rewind_core::errors::{RewindResult, SchemaError};
use rewind_core::models::{ColumnFilter, EntityKey, KeyValue, LiveEntity, RawRow, Value};
use rewind_core::schema::{EntityTypeDescriptor, SchemaCatalog, TableLayout};
use rewind_core::traits::LiveSource;

use crate::connection::SqliteConnection;
use crate::to_storage_err;
use crate::values::{column_names, row_to_raw, Bind};

/// Reads live tables named by the catalog.
#[derive(Debug, Clone)]
pub struct SqliteLiveSource {
    conn: Arc<SqliteConnection>,
    catalog: Arc<SchemaCatalog>,
}

impl SqliteLiveSource {
    pub fn new(conn: Arc<SqliteConnection>, catalog: Arc<SchemaCatalog>) -> Self {
        Self { conn, catalog }
    }

    /// `SELECT <fields> FROM <table> [JOIN ancestors] WHERE <filter> ORDER BY <ids>`.
    fn select(
        &self,
        target: &EntityTypeDescriptor,
        filter: &[ColumnFilter],
    ) -> RewindResult<Vec<LiveEntity>> {
        let layout = TableLayout::of(&self.catalog, target)?;
        let primary = layout.primary();

        let columns: Vec<String> = target
            .fields
            .iter()
            .map(|f| format!("{}.{} AS {}", layout.column_alias(target, &f.column), f.column, f.name))
            .collect();
        let id_columns = target.identifier_columns()?;

        let mut sql = format!(
            "SELECT {} FROM {} {}",
            columns.join(", "),
            primary.table,
            primary.alias
        );
        for ancestor in layout.ancestors() {
            let on: Vec<String> = id_columns
                .iter()
                .map(|c| format!("{}.{c} = {}.{c}", ancestor.alias, primary.alias))
                .collect();
            sql.push_str(&format!(
                " INNER JOIN {} {} ON {}",
                ancestor.table,
                ancestor.alias,
                on.join(" AND ")
            ));
        }
        if !filter.is_empty() {
            let predicates: Vec<String> = filter
                .iter()
                .map(|f| format!("{}.{} = ?", layout.column_alias(target, &f.column), f.column))
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&predicates.join(" AND "));
        }
        let order: Vec<String> = id_columns
            .iter()
            .map(|c| format!("{}.{c}", primary.alias))
            .collect();
        sql.push_str(" ORDER BY ");
        sql.push_str(&order.join(", "));

        trace!(sql = %sql, "live query");
        let rows = self.conn.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql).map_err(|e| to_storage_err(e.to_string()))?;
            let names = column_names(&stmt);
            let mut rows = stmt
                .query(params_from_iter(filter.iter().map(|f| Bind(&f.value))))
                .map_err(|e| to_storage_err(e.to_string()))?;
            let mut out = Vec::new();
            while let Some(row) = rows.next().map_err(|e| to_storage_err(e.to_string()))? {
                out.push(row_to_raw(row, &names)?);
            }
            Ok(out)
        })?;

        rows.into_iter().map(|raw| to_live_entity(target, raw)).collect()
    }
}

impl LiveSource for SqliteLiveSource {
    fn load(
        &self,
        target: &EntityTypeDescriptor,
        key: &EntityKey,
    ) -> RewindResult<Option<LiveEntity>> {
        let id_columns = target.identifier_columns()?;
        let filter: Vec<ColumnFilter> = id_columns
            .iter()
            .zip(&key.values)
            .map(|(column, value)| ColumnFilter::new(*column, value.to_value()))
            .collect();
        debug!("live load {key}");
        Ok(self.select(target, &filter)?.into_iter().next())
    }

    fn load_to_one_entity(
        &self,
        target: &EntityTypeDescriptor,
        filter: &[ColumnFilter],
    ) -> RewindResult<Option<LiveEntity>> {
        Ok(self.select(target, filter)?.into_iter().next())
    }

    fn load_to_many_collection(
        &self,
        target: &EntityTypeDescriptor,
        filter: &[ColumnFilter],
    ) -> RewindResult<Vec<LiveEntity>> {
        self.select(target, filter)
    }
}

/// Decode a live row; columns are aliased by field name.
fn to_live_entity(desc: &EntityTypeDescriptor, mut raw: RawRow) -> RewindResult<LiveEntity> {
    let mut fields = BTreeMap::new();
    for field in &desc.fields {
        let value = raw.remove(&field.name).unwrap_or(Value::Null);
        let decoded = field.codec.decode(&value).map_err(|e| SchemaError::FieldDecode {
            field: format!("{}.{}", desc.name, field.name),
            reason: e.to_string(),
        })?;
        fields.insert(field.name.clone(), decoded);
    }

    let mut key_values = Vec::with_capacity(desc.identifier.len());
    for id in &desc.identifier {
        let value = fields.get(id).and_then(KeyValue::from_value).ok_or_else(|| {
            SchemaError::MissingColumnMapping {
                entity_type: desc.name.clone(),
                field: id.clone(),
            }
        })?;
        key_values.push(value);
    }

    Ok(LiveEntity {
        key: EntityKey::new(desc.name.clone(), key_values),
        fields,
    })
}
