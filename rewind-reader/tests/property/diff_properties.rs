//! Differ invariants over arbitrary field maps.

use std::collections::BTreeMap;

use proptest::prelude::*;

use rewind_core::models::Value;
use rewind_reader::Differ;

fn value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        (0i64..5).prop_map(Value::Integer),
        "[a-c]{0,2}".prop_map(Value::Text),
        any::<bool>().prop_map(Value::Boolean),
    ]
}

fn fields() -> impl Strategy<Value = BTreeMap<String, Value>> {
    prop::collection::btree_map("[a-f]", value(), 0..6)
}

proptest! {
    #[test]
    fn diff_with_self_is_empty(state in fields()) {
        prop_assert!(Differ::diff(&state, &state).is_empty());
    }

    #[test]
    fn diff_is_sorted_and_only_lists_changes(old in fields(), new in fields()) {
        let diff = Differ::diff(&old, &new);
        for pair in diff.windows(2) {
            prop_assert!(pair[0].field < pair[1].field);
        }
        for entry in &diff {
            prop_assert_ne!(&entry.old_value, &entry.new_value);
            prop_assert_eq!(&entry.old_value, old.get(&entry.field).unwrap_or(&Value::Null));
            prop_assert_eq!(&entry.new_value, new.get(&entry.field).unwrap_or(&Value::Null));
        }
    }

    #[test]
    fn swapping_sides_swaps_values(old in fields(), new in fields()) {
        let forward = Differ::diff(&old, &new);
        let backward = Differ::diff(&new, &old);
        prop_assert_eq!(forward.len(), backward.len());
        for (f, b) in forward.iter().zip(&backward) {
            prop_assert_eq!(&f.field, &b.field);
            prop_assert_eq!(&f.old_value, &b.new_value);
            prop_assert_eq!(&f.new_value, &b.old_value);
        }
    }

    #[test]
    fn single_field_change_yields_one_entry(state in fields(), field in "[a-f]", v in value()) {
        let mut changed = state.clone();
        changed.insert(field.clone(), v.clone());
        let diff = Differ::diff(&state, &changed);
        let before = state.get(&field).unwrap_or(&Value::Null);
        if before == &v {
            prop_assert!(diff.is_empty());
        } else {
            prop_assert_eq!(diff.len(), 1);
            prop_assert_eq!(&diff[0].field, &field);
        }
    }
}
