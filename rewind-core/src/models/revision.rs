//! Revision log types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A point in the audit log's total order. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub author: String,
}

/// The change kind recorded on an audit row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionType {
    Insert,
    Update,
    Delete,
}

impl RevisionType {
    /// Parse the stored `revtype` code (`INS`, `UPD`, `DEL`).
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "INS" => Some(RevisionType::Insert),
            "UPD" => Some(RevisionType::Update),
            "DEL" => Some(RevisionType::Delete),
            _ => None,
        }
    }

    pub fn as_code(self) -> &'static str {
        match self {
            RevisionType::Insert => "INS",
            RevisionType::Update => "UPD",
            RevisionType::Delete => "DEL",
        }
    }
}
