//! Live (non-audited) state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{EntityKey, Value};

/// A row of a non-audited type read from current state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveEntity {
    pub key: EntityKey,
    pub fields: BTreeMap<String, Value>,
}

impl LiveEntity {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// Equality predicate on one column, used for foreign-key lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnFilter {
    pub column: String,
    pub value: Value,
}

impl ColumnFilter {
    pub fn new(column: impl Into<String>, value: Value) -> Self {
        Self {
            column: column.into(),
            value,
        }
    }
}
