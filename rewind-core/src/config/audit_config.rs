//! Audit table naming configuration.

use serde::{Deserialize, Serialize};

use crate::errors::RewindResult;
use crate::schema::catalog::checked;

/// Names of the audit tables and their bookkeeping columns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AuditConfig {
    pub table_prefix: String,
    pub table_suffix: String,

    // Columns added to every audit table
    pub revision_field_name: String,
    pub revision_type_field_name: String,

    // Revision table
    pub revision_table_name: String,
    pub revision_id_field_name: String,
    pub revision_timestamp_field_name: String,
    pub revision_author_field_name: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            table_prefix: String::new(),
            table_suffix: "_audit".to_string(),
            revision_field_name: "rev".to_string(),
            revision_type_field_name: "revtype".to_string(),
            revision_table_name: "revisions".to_string(),
            revision_id_field_name: "id".to_string(),
            revision_timestamp_field_name: "timestamp".to_string(),
            revision_author_field_name: "author".to_string(),
        }
    }
}

impl AuditConfig {
    /// Audit table name for a live table.
    pub fn table_name_for(&self, table: &str) -> String {
        format!("{}{}{}", self.table_prefix, table, self.table_suffix)
    }

    /// Every configured name, for identifier validation.
    pub fn identifiers(&self) -> [&str; 6] {
        [
            &self.revision_field_name,
            &self.revision_type_field_name,
            &self.revision_table_name,
            &self.revision_id_field_name,
            &self.revision_timestamp_field_name,
            &self.revision_author_field_name,
        ]
    }

    /// Fails with `InvalidIdentifier` if any configured name, or a table
    /// name derived through the prefix and suffix, is not a plain identifier.
    pub fn validate(&self) -> RewindResult<()> {
        for name in self.identifiers() {
            checked(name)?;
        }
        checked(&self.table_name_for("t"))?;
        Ok(())
    }
}
