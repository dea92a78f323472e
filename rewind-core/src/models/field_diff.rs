use serde::{Deserialize, Serialize};

use super::Value;

/// One field whose value differs between two snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDiff {
    pub field: String,
    pub old_value: Value,
    pub new_value: Value,
}
