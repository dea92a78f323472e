//! Field-level comparison of two flattened entity states.

use std::collections::{BTreeMap, BTreeSet};

use rewind_core::models::{FieldDiff, Value};

/// Compares field maps. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct Differ;

impl Differ {
    /// One entry per field whose values differ, in ascending field order.
    /// A field missing from one side compares as null.
    pub fn diff(old: &BTreeMap<String, Value>, new: &BTreeMap<String, Value>) -> Vec<FieldDiff> {
        let fields: BTreeSet<&String> = old.keys().chain(new.keys()).collect();

        fields
            .into_iter()
            .filter_map(|field| {
                let old_value = old.get(field).unwrap_or(&Value::Null);
                let new_value = new.get(field).unwrap_or(&Value::Null);
                (old_value != new_value).then(|| FieldDiff {
                    field: field.clone(),
                    old_value: old_value.clone(),
                    new_value: new_value.clone(),
                })
            })
            .collect()
    }
}
