//! Rows as returned by the stores.

use std::collections::BTreeMap;

use super::{RevisionType, Value};

/// Column name to value mapping for one result row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow(BTreeMap<String, Value>);

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        self.0.insert(column.into(), value);
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.0.remove(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// An audit row with its bookkeeping columns split off.
#[derive(Debug, Clone, PartialEq)]
pub struct RevisionRow {
    /// Entity columns, scalar fields keyed by field name and join columns
    /// keyed by column name.
    pub values: RawRow,
    /// The revision the row was written at, when selected.
    pub revision: Option<i64>,
    pub change: RevisionType,
}
